//! Report kinds exported from the accounting server.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The exports a sync cycle pulls from the accounting server.
///
/// Voucher kinds carry a date range and a voucher type filter; snapshot
/// kinds (stock, ledger) are point-in-time and ignore the range filter
/// beyond the as-of date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    SalesVouchers,
    PurchaseVouchers,
    PaymentVouchers,
    ReceiptVouchers,
    StockSummary,
    LedgerBalances,
}

impl ReportKind {
    /// Stable machine name used in logs and sync diagnostics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SalesVouchers => "sales_vouchers",
            Self::PurchaseVouchers => "purchase_vouchers",
            Self::PaymentVouchers => "payment_vouchers",
            Self::ReceiptVouchers => "receipt_vouchers",
            Self::StockSummary => "stock_summary",
            Self::LedgerBalances => "ledger_balances",
        }
    }

    /// The report name the accounting server expects in the request
    /// envelope.
    #[must_use]
    pub fn report_name(&self) -> &'static str {
        match self {
            Self::SalesVouchers
            | Self::PurchaseVouchers
            | Self::PaymentVouchers
            | Self::ReceiptVouchers => "Voucher Register",
            Self::StockSummary => "Stock Summary",
            Self::LedgerBalances => "Group Summary",
        }
    }

    /// Voucher type filter for voucher-register exports, `None` for
    /// snapshot reports.
    #[must_use]
    pub fn voucher_type_name(&self) -> Option<&'static str> {
        match self {
            Self::SalesVouchers => Some("Sales"),
            Self::PurchaseVouchers => Some("Purchase"),
            Self::PaymentVouchers => Some("Payment"),
            Self::ReceiptVouchers => Some("Receipt"),
            Self::StockSummary | Self::LedgerBalances => None,
        }
    }

    /// Whether this report is a point-in-time snapshot rather than a
    /// dated transaction register.
    #[must_use]
    pub fn is_snapshot(&self) -> bool {
        matches!(self, Self::StockSummary | Self::LedgerBalances)
    }
}

impl Display for ReportKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sales_vouchers" => Ok(Self::SalesVouchers),
            "purchase_vouchers" => Ok(Self::PurchaseVouchers),
            "payment_vouchers" => Ok(Self::PaymentVouchers),
            "receipt_vouchers" => Ok(Self::ReceiptVouchers),
            "stock_summary" => Ok(Self::StockSummary),
            "ledger_balances" => Ok(Self::LedgerBalances),
            _ => Err(format!("Unknown report kind: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voucher_kinds_use_voucher_register() {
        for kind in [
            ReportKind::SalesVouchers,
            ReportKind::PurchaseVouchers,
            ReportKind::PaymentVouchers,
            ReportKind::ReceiptVouchers,
        ] {
            assert_eq!(kind.report_name(), "Voucher Register");
            assert!(kind.voucher_type_name().is_some());
            assert!(!kind.is_snapshot());
        }
    }

    #[test]
    fn snapshot_kinds_have_no_voucher_filter() {
        assert_eq!(ReportKind::StockSummary.report_name(), "Stock Summary");
        assert_eq!(ReportKind::LedgerBalances.report_name(), "Group Summary");
        assert_eq!(ReportKind::StockSummary.voucher_type_name(), None);
        assert_eq!(ReportKind::LedgerBalances.voucher_type_name(), None);
        assert!(ReportKind::StockSummary.is_snapshot());
        assert!(ReportKind::LedgerBalances.is_snapshot());
    }

    #[test]
    fn round_trips_through_str() {
        for kind in [
            ReportKind::SalesVouchers,
            ReportKind::PurchaseVouchers,
            ReportKind::PaymentVouchers,
            ReportKind::ReceiptVouchers,
            ReportKind::StockSummary,
            ReportKind::LedgerBalances,
        ] {
            assert_eq!(kind.as_str().parse::<ReportKind>().unwrap(), kind);
        }
    }
}
