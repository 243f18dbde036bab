//! Normalized records and the sync payload.
//!
//! These are the wire types the local connector produces from raw
//! accounting exports and the cloud ingestion API consumes. Field names
//! are the JSON contract between the two sides.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Ledger groups that may leave the store's premises.
///
/// Balances for any group outside this list are never exported and are
/// dropped on ingestion if they somehow arrive.
pub const LEDGER_GROUPS: [&str; 6] = [
    "Sales Accounts",
    "Purchase Accounts",
    "Cash-in-Hand",
    "Bank Accounts",
    "Sundry Debtors",
    "Sundry Creditors",
];

/// One inventory line of a sales or purchase voucher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoucherItem {
    pub item_name: String,
    pub quantity: f64,
    pub unit: String,
    pub rate: f64,
    pub amount: f64,
    /// GST rate label as the books carry it, e.g. "18%". Empty when the
    /// item carries no rate.
    #[serde(default)]
    pub gst_rate: String,
}

/// A dated sales or purchase voucher with its line items and tax split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voucher {
    pub voucher_number: String,
    pub voucher_date: NaiveDate,
    pub total_amount: f64,
    pub cgst_amount: f64,
    pub sgst_amount: f64,
    pub igst_amount: f64,
    pub items: Vec<VoucherItem>,
}

/// Point-in-time closing position of one stock item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub item_name: String,
    #[serde(default)]
    pub item_group: String,
    pub unit: String,
    pub closing_qty: f64,
    pub closing_rate: f64,
    pub closing_value: f64,
    pub snapshot_date: NaiveDate,
}

/// Closing balance of one allow-listed ledger group.
///
/// The balance is signed: positive for debit balances, negative for
/// credit balances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerBalance {
    pub ledger_group: String,
    pub closing_balance: f64,
    pub snapshot_date: NaiveDate,
}

/// Direction of a money-movement voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Payment,
    Receipt,
}

/// A payment or receipt voucher against a bank or cash ledger.
///
/// Carries the instrument ("Cash" or "Bank") and amount only; the
/// counterparty never leaves the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentEntry {
    pub voucher_number: String,
    pub voucher_date: NaiveDate,
    pub payment_type: PaymentKind,
    pub bank_or_cash: String,
    pub amount: f64,
}

/// Everything one sync cycle pushes to the cloud in a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncPayload {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub connector_version: String,
    #[serde(default)]
    pub sync_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sales_vouchers: Vec<Voucher>,
    #[serde(default)]
    pub purchase_vouchers: Vec<Voucher>,
    #[serde(default)]
    pub stock_items: Vec<StockSnapshot>,
    #[serde(default)]
    pub ledger_entries: Vec<LedgerBalance>,
    #[serde(default)]
    pub payment_entries: Vec<PaymentEntry>,
}

impl SyncPayload {
    /// Total records across all sections, used in run logs.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.sales_vouchers.len()
            + self.purchase_vouchers.len()
            + self.stock_items.len()
            + self.ledger_entries.len()
            + self.payment_entries.len()
    }

    /// True when the window produced nothing worth pushing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> SyncPayload {
        SyncPayload {
            from_date: "2025-03-01".parse().unwrap(),
            to_date: "2025-03-07".parse().unwrap(),
            connector_version: "0.1.0".into(),
            sync_started_at: None,
            sales_vouchers: vec![Voucher {
                voucher_number: "SV-101".into(),
                voucher_date: "2025-03-02".parse().unwrap(),
                total_amount: 1180.0,
                cgst_amount: 90.0,
                sgst_amount: 90.0,
                igst_amount: 0.0,
                items: vec![VoucherItem {
                    item_name: "Rice 5kg".into(),
                    quantity: 2.0,
                    unit: "Bag".into(),
                    rate: 500.0,
                    amount: 1000.0,
                    gst_rate: "18%".into(),
                }],
            }],
            purchase_vouchers: vec![],
            stock_items: vec![],
            ledger_entries: vec![LedgerBalance {
                ledger_group: "Cash-in-Hand".into(),
                closing_balance: 25000.0,
                snapshot_date: "2025-03-07".parse().unwrap(),
            }],
            payment_entries: vec![],
        }
    }

    #[test]
    fn record_count_spans_all_sections() {
        let p = sample_payload();
        assert_eq!(p.record_count(), 2);
        assert!(!p.is_empty());
    }

    #[test]
    fn payload_json_round_trips() {
        let p = sample_payload();
        let json = serde_json::to_string(&p).unwrap();
        let back: SyncPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let p: SyncPayload = serde_json::from_str(
            r#"{"from_date":"2025-03-01","to_date":"2025-03-07","connector_version":"0.1.0"}"#,
        )
        .unwrap();
        assert!(p.is_empty());
        assert!(p.sync_started_at.is_none());
    }

    #[test]
    fn payment_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&PaymentKind::Receipt).unwrap(),
            "\"receipt\""
        );
    }

    #[test]
    fn allow_list_has_the_six_groups() {
        assert_eq!(LEDGER_GROUPS.len(), 6);
        assert!(LEDGER_GROUPS.contains(&"Sundry Debtors"));
        assert!(!LEDGER_GROUPS.contains(&"Capital Account"));
    }
}
