//! Request envelopes for the accounting server's XML-over-HTTP API.
//!
//! Tally Prime matches report names and static variables verbatim, so
//! these builders are wire-exact: `Voucher Register` exports take a
//! date range plus a voucher type filter, the snapshot reports take
//! only an as-of date, and all dates go over the wire as `YYYYMMDD`.

use chrono::NaiveDate;
use dukaan_core::{ReportKind, SyncWindow};

/// Renders a date the way the accounting server expects it.
#[must_use]
pub fn tally_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Escapes the five XML special characters for element content and
/// attribute values.
#[must_use]
pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Builds the export request envelope for one report over one window.
///
/// Snapshot reports ignore the window start; they export the closing
/// position as of the window end.
#[must_use]
pub fn export_envelope(kind: ReportKind, window: SyncWindow) -> String {
    match kind.voucher_type_name() {
        Some(vtype) => format!(
            "<ENVELOPE>\n \
             <HEADER><TALLYREQUEST>Export Data</TALLYREQUEST></HEADER>\n \
             <BODY><EXPORTDATA><REQUESTDESC>\n  \
             <REPORTNAME>{report}</REPORTNAME>\n  \
             <STATICVARIABLES>\n   \
             <SVEXPORTFORMAT>$$SysName:XML</SVEXPORTFORMAT>\n   \
             <SVFROMDATE>{from}</SVFROMDATE>\n   \
             <SVTODATE>{to}</SVTODATE>\n   \
             <VOUCHERTYPENAME>{vtype}</VOUCHERTYPENAME>\n  \
             </STATICVARIABLES>\n \
             </REQUESTDESC></EXPORTDATA></BODY>\n\
             </ENVELOPE>",
            report = kind.report_name(),
            from = tally_date(window.from),
            to = tally_date(window.to),
        ),
        None => format!(
            "<ENVELOPE>\n \
             <HEADER><TALLYREQUEST>Export Data</TALLYREQUEST></HEADER>\n \
             <BODY><EXPORTDATA><REQUESTDESC>\n  \
             <REPORTNAME>{report}</REPORTNAME>\n  \
             <STATICVARIABLES>\n   \
             <SVEXPORTFORMAT>$$SysName:XML</SVEXPORTFORMAT>\n   \
             <SVTODATE>{to}</SVTODATE>\n  \
             </STATICVARIABLES>\n \
             </REQUESTDESC></EXPORTDATA></BODY>\n\
             </ENVELOPE>",
            report = kind.report_name(),
            to = tally_date(window.to),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> SyncWindow {
        SyncWindow {
            from: "2025-03-01".parse().unwrap(),
            to: "2025-03-07".parse().unwrap(),
        }
    }

    #[test]
    fn voucher_envelope_carries_range_and_type_filter() {
        let xml = export_envelope(ReportKind::SalesVouchers, window());
        assert!(xml.contains("<TALLYREQUEST>Export Data</TALLYREQUEST>"));
        assert!(xml.contains("<REPORTNAME>Voucher Register</REPORTNAME>"));
        assert!(xml.contains("<SVEXPORTFORMAT>$$SysName:XML</SVEXPORTFORMAT>"));
        assert!(xml.contains("<SVFROMDATE>20250301</SVFROMDATE>"));
        assert!(xml.contains("<SVTODATE>20250307</SVTODATE>"));
        assert!(xml.contains("<VOUCHERTYPENAME>Sales</VOUCHERTYPENAME>"));
    }

    #[test]
    fn snapshot_envelope_has_only_the_as_of_date() {
        let xml = export_envelope(ReportKind::StockSummary, window());
        assert!(xml.contains("<REPORTNAME>Stock Summary</REPORTNAME>"));
        assert!(xml.contains("<SVTODATE>20250307</SVTODATE>"));
        assert!(!xml.contains("SVFROMDATE"));
        assert!(!xml.contains("VOUCHERTYPENAME"));
    }

    #[test]
    fn ledger_envelope_uses_group_summary() {
        let xml = export_envelope(ReportKind::LedgerBalances, window());
        assert!(xml.contains("<REPORTNAME>Group Summary</REPORTNAME>"));
    }

    #[test]
    fn escape_covers_the_five_specials() {
        assert_eq!(
            escape_xml(r#"A & B <"C's">"#),
            "A &amp; B &lt;&quot;C&apos;s&quot;&gt;"
        );
    }
}
