//! # Core types
//!
//! Shared foundation for the dukaan back-office sync platform:
//!
//! - [`ids`] - Type-safe identifiers (`StoreId`)
//! - [`report`] - The accounting report kinds exported from Tally
//! - [`window`] - Sync window planning over the resume boundary
//! - [`records`] - Normalized record and payload types that flow from
//!   the local connector to the cloud ingestion API

pub mod ids;
pub mod records;
pub mod report;
pub mod window;

pub use ids::{ParseIdError, StoreId};
pub use records::{
    LedgerBalance, PaymentEntry, PaymentKind, StockSnapshot, SyncPayload, Voucher, VoucherItem,
    LEDGER_GROUPS,
};
pub use report::ReportKind;
pub use window::SyncWindow;
