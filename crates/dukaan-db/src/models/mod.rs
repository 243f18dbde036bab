//! Database models.

pub mod ledger;
pub mod payment;
pub mod stock;
pub mod store;
pub mod sync_log;
pub mod voucher;

pub use ledger::{upsert_ledger_entry, LedgerEntryRow};
pub use payment::{upsert_payment_entry, PaymentEntryRow};
pub use stock::{upsert_stock_item, StockItemRow};
pub use store::Store;
pub use sync_log::{SyncLog, SyncLogStatus, MAX_ERROR_LEN};
pub use voucher::{upsert_voucher, VoucherItemRow, VoucherRow, VoucherTable};
