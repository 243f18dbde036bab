//! Transforms raw export XML into normalized records.
//!
//! One pure function per report kind. Each returns `Err` only when the
//! whole document is malformed; individually unusable vouchers (missing
//! number or date) are skipped. The caller decides how to isolate a
//! failed report from the rest of the run.
//!
//! Normalization rules:
//! - dates arrive as 8-digit `YYYYMMDD` tokens
//! - tax lines are matched by case-insensitive `CGST`/`SGST`/`IGST`
//!   substring on the ledger name and summed across lines
//! - quantities embed the unit as a trailing token (`"30 Bag"`)
//! - amounts are stored as absolute values
//! - ledger balances outside the six-group allow-list are dropped

use chrono::NaiveDate;
use dukaan_core::{
    LedgerBalance, PaymentEntry, PaymentKind, StockSnapshot, Voucher, VoucherItem, LEDGER_GROUPS,
};
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

/// The export document could not be parsed at all.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("malformed export XML: {0}")]
    Malformed(String),
}

/// Numeric token with optional thousands separators; unusable values
/// normalize to zero.
fn parse_amount(raw: &str) -> f64 {
    raw.trim().replace(',', "").parse().unwrap_or(0.0)
}

/// 8-digit `YYYYMMDD` token, anything else is unusable.
fn parse_tally_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
        NaiveDate::parse_from_str(raw, "%Y%m%d").ok()
    } else {
        None
    }
}

/// `"30 Bag"` splits into magnitude and unit; missing parts default to
/// zero and empty.
fn split_quantity(raw: &str) -> (f64, String) {
    let mut parts = raw.split_whitespace();
    let qty = parts
        .next()
        .and_then(|p| p.replace(',', "").parse().ok())
        .unwrap_or(0.0);
    let unit = parts.next().unwrap_or("").to_string();
    (qty, unit)
}

#[derive(Debug, Default)]
struct RawItem {
    name: String,
    actual_qty: String,
    rate: f64,
    amount: f64,
    gst_rate: String,
}

#[derive(Debug, Default)]
struct RawVoucher {
    voucher_type: String,
    number: String,
    date: String,
    amount: f64,
    ledger_lines: Vec<(String, f64)>,
    items: Vec<RawItem>,
}

/// Walks a voucher-register document and collects every `VOUCHER`
/// element with its direct fields, ledger lines, and inventory lines.
///
/// Direct-child semantics matter: a nested allocation list inside a
/// ledger entry carries its own `AMOUNT`, which must not leak into the
/// entry. The element stack makes "direct child" checks exact.
fn collect_vouchers(xml: &str) -> Result<Vec<RawVoucher>, TransformError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut vouchers = Vec::new();
    let mut voucher: Option<RawVoucher> = None;
    let mut ledger_line: Option<(String, f64)> = None;
    let mut item: Option<RawItem> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match name.as_str() {
                    "VOUCHER" => voucher = Some(RawVoucher::default()),
                    "ALLLEDGERENTRIES.LIST" if voucher.is_some() && ledger_line.is_none() => {
                        ledger_line = Some((String::new(), 0.0));
                    }
                    "ALLINVENTORYENTRIES.LIST" if voucher.is_some() && item.is_none() => {
                        item = Some(RawItem::default());
                    }
                    _ => {}
                }
                stack.push(name);
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().unwrap_or_default().into_owned();
                let parent = if stack.len() >= 2 {
                    stack[stack.len() - 2].as_str()
                } else {
                    ""
                };
                let current = stack.last().map(String::as_str).unwrap_or("");
                match parent {
                    "VOUCHER" => {
                        if let Some(v) = voucher.as_mut() {
                            match current {
                                "VOUCHERTYPENAME" => v.voucher_type = text,
                                "VOUCHERNUMBER" => v.number = text,
                                "DATE" => v.date = text,
                                "AMOUNT" => v.amount = parse_amount(&text),
                                _ => {}
                            }
                        }
                    }
                    "ALLLEDGERENTRIES.LIST" => {
                        if let Some(line) = ledger_line.as_mut() {
                            match current {
                                "LEDGERNAME" => line.0 = text,
                                "AMOUNT" => line.1 = parse_amount(&text),
                                _ => {}
                            }
                        }
                    }
                    "ALLINVENTORYENTRIES.LIST" => {
                        if let Some(i) = item.as_mut() {
                            match current {
                                "STOCKITEMNAME" => i.name = text,
                                "ACTUALQTY" => i.actual_qty = text,
                                "RATE" => {
                                    // rendered as "500.00/Bag"
                                    let numeric = text.split('/').next().unwrap_or("");
                                    i.rate = parse_amount(numeric);
                                }
                                "AMOUNT" => i.amount = parse_amount(&text).abs(),
                                "GSTOVRDNSRATE" => i.gst_rate = text,
                                _ => {}
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(_)) => {
                let name = stack.pop().unwrap_or_default();
                match name.as_str() {
                    "ALLLEDGERENTRIES.LIST" => {
                        if let (Some(v), Some(line)) = (voucher.as_mut(), ledger_line.take()) {
                            v.ledger_lines.push(line);
                        }
                    }
                    "ALLINVENTORYENTRIES.LIST" => {
                        if let (Some(v), Some(i)) = (voucher.as_mut(), item.take()) {
                            v.items.push(i);
                        }
                    }
                    "VOUCHER" => {
                        if let Some(v) = voucher.take() {
                            vouchers.push(v);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(TransformError::Malformed(e.to_string())),
            _ => {}
        }
    }
    Ok(vouchers)
}

fn to_voucher(raw: RawVoucher) -> Option<Voucher> {
    if raw.number.is_empty() {
        return None;
    }
    let date = parse_tally_date(&raw.date)?;

    let mut cgst = 0.0;
    let mut sgst = 0.0;
    let mut igst = 0.0;
    for (name, amount) in &raw.ledger_lines {
        let upper = name.to_uppercase();
        let amount = amount.abs();
        if upper.contains("CGST") {
            cgst += amount;
        } else if upper.contains("SGST") {
            sgst += amount;
        } else if upper.contains("IGST") {
            igst += amount;
        }
    }

    let items = raw
        .items
        .into_iter()
        .filter(|i| !i.name.is_empty())
        .map(|i| {
            let (quantity, unit) = split_quantity(&i.actual_qty);
            VoucherItem {
                item_name: i.name,
                quantity,
                unit,
                rate: i.rate,
                amount: i.amount,
                gst_rate: i.gst_rate,
            }
        })
        .collect();

    Some(Voucher {
        voucher_number: raw.number,
        voucher_date: date,
        total_amount: raw.amount.abs(),
        cgst_amount: cgst,
        sgst_amount: sgst,
        igst_amount: igst,
        items,
    })
}

fn parse_typed_vouchers(xml: &str, type_name: &str) -> Result<Vec<Voucher>, TransformError> {
    Ok(collect_vouchers(xml)?
        .into_iter()
        .filter(|v| v.voucher_type.eq_ignore_ascii_case(type_name))
        .filter_map(to_voucher)
        .collect())
}

/// Sales vouchers from a `Voucher Register` export.
pub fn parse_sales_vouchers(xml: &str) -> Result<Vec<Voucher>, TransformError> {
    parse_typed_vouchers(xml, "Sales")
}

/// Purchase vouchers from a `Voucher Register` export.
pub fn parse_purchase_vouchers(xml: &str) -> Result<Vec<Voucher>, TransformError> {
    parse_typed_vouchers(xml, "Purchase")
}

/// Payment or receipt vouchers, reduced to instrument and amount.
pub fn parse_money_vouchers(
    xml: &str,
    kind: PaymentKind,
) -> Result<Vec<PaymentEntry>, TransformError> {
    Ok(collect_vouchers(xml)?
        .into_iter()
        .filter_map(|raw| {
            if raw.number.is_empty() {
                return None;
            }
            let date = parse_tally_date(&raw.date)?;
            let mut bank_or_cash = String::new();
            for (name, _) in &raw.ledger_lines {
                let lower = name.to_lowercase();
                if lower == "cash" || lower == "petty cash" {
                    bank_or_cash = "Cash".to_string();
                    break;
                }
                if lower.contains("bank") {
                    bank_or_cash = "Bank".to_string();
                    break;
                }
            }
            Some(PaymentEntry {
                voucher_number: raw.number,
                voucher_date: date,
                payment_type: kind,
                bank_or_cash,
                amount: raw.amount.abs(),
            })
        })
        .collect())
}

/// Stock positions from a `Stock Summary` export, stamped with the
/// as-of date the window requested (the export itself is dateless).
pub fn parse_stock_summary(
    xml: &str,
    snapshot_date: NaiveDate,
) -> Result<Vec<StockSnapshot>, TransformError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut snapshots = Vec::new();
    let mut current: Option<StockSnapshot> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "STOCKITEM" {
                    let mut snap = StockSnapshot {
                        item_name: String::new(),
                        item_group: String::new(),
                        unit: String::new(),
                        closing_qty: 0.0,
                        closing_rate: 0.0,
                        closing_value: 0.0,
                        snapshot_date,
                    };
                    // name may also arrive as an attribute
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"NAME" {
                            snap.item_name =
                                attr.unescape_value().unwrap_or_default().into_owned();
                        }
                    }
                    current = Some(snap);
                }
                stack.push(name);
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().unwrap_or_default().into_owned();
                let parent = if stack.len() >= 2 {
                    stack[stack.len() - 2].as_str()
                } else {
                    ""
                };
                let tag = stack.last().map(String::as_str).unwrap_or("");
                if parent == "STOCKITEM" {
                    if let Some(snap) = current.as_mut() {
                        match tag {
                            "NAME" => snap.item_name = text,
                            "PARENT" => snap.item_group = text,
                            "BASEUNITS" => snap.unit = text,
                            "CLOSINGBALANCE" => {
                                snap.closing_qty = split_quantity(&text).0.abs();
                            }
                            "CLOSINGRATE" => {
                                let numeric = text.split('/').next().unwrap_or("");
                                snap.closing_rate = parse_amount(numeric).abs();
                            }
                            "CLOSINGVALUE" => snap.closing_value = parse_amount(&text).abs(),
                            _ => {}
                        }
                    }
                }
            }
            Ok(Event::End(_)) => {
                let name = stack.pop().unwrap_or_default();
                if name == "STOCKITEM" {
                    if let Some(snap) = current.take() {
                        if !snap.item_name.is_empty() {
                            snapshots.push(snap);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(TransformError::Malformed(e.to_string())),
            _ => {}
        }
    }
    Ok(snapshots)
}

/// Allow-listed group balances from a `Group Summary` export.
///
/// Balances keep their sign: debit positive, credit negative.
pub fn parse_ledger_balances(
    xml: &str,
    snapshot_date: NaiveDate,
) -> Result<Vec<LedgerBalance>, TransformError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut balances = Vec::new();
    let mut name = String::new();
    let mut balance = 0.0f64;
    let mut in_group = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if tag == "GROUP" {
                    in_group = true;
                    name.clear();
                    balance = 0.0;
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"NAME" {
                            name = attr.unescape_value().unwrap_or_default().into_owned();
                        }
                    }
                }
                stack.push(tag);
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().unwrap_or_default().into_owned();
                let parent = if stack.len() >= 2 {
                    stack[stack.len() - 2].as_str()
                } else {
                    ""
                };
                let tag = stack.last().map(String::as_str).unwrap_or("");
                if in_group && parent == "GROUP" {
                    match tag {
                        "NAME" => name = text,
                        "CLOSINGBALANCE" => balance = parse_amount(&text),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(_)) => {
                let tag = stack.pop().unwrap_or_default();
                if tag == "GROUP" {
                    in_group = false;
                    if LEDGER_GROUPS.contains(&name.as_str()) {
                        balances.push(LedgerBalance {
                            ledger_group: std::mem::take(&mut name),
                            closing_balance: balance,
                            snapshot_date,
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(TransformError::Malformed(e.to_string())),
            _ => {}
        }
    }
    Ok(balances)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALES_XML: &str = r#"<ENVELOPE><BODY><DATA><TALLYMESSAGE>
<VOUCHER>
 <DATE>20250110</DATE>
 <VOUCHERTYPENAME>Sales</VOUCHERTYPENAME>
 <VOUCHERNUMBER>S-001</VOUCHERNUMBER>
 <AMOUNT>-1050.00</AMOUNT>
 <ALLLEDGERENTRIES.LIST>
  <LEDGERNAME>CGST Output</LEDGERNAME>
  <AMOUNT>15.00</AMOUNT>
 </ALLLEDGERENTRIES.LIST>
 <ALLLEDGERENTRIES.LIST>
  <LEDGERNAME>CGST Input</LEDGERNAME>
  <AMOUNT>-10.00</AMOUNT>
 </ALLLEDGERENTRIES.LIST>
 <ALLLEDGERENTRIES.LIST>
  <LEDGERNAME>SGST Output</LEDGERNAME>
  <AMOUNT>25.00</AMOUNT>
 </ALLLEDGERENTRIES.LIST>
 <ALLINVENTORYENTRIES.LIST>
  <STOCKITEMNAME>Rice</STOCKITEMNAME>
  <ACTUALQTY>10 Bag</ACTUALQTY>
  <RATE>100.00/Bag</RATE>
  <AMOUNT>-1000.00</AMOUNT>
  <GSTOVRDNSRATE>5%</GSTOVRDNSRATE>
 </ALLINVENTORYENTRIES.LIST>
</VOUCHER>
<VOUCHER>
 <DATE>20250111</DATE>
 <VOUCHERTYPENAME>Purchase</VOUCHERTYPENAME>
 <VOUCHERNUMBER>P-001</VOUCHERNUMBER>
 <AMOUNT>500.00</AMOUNT>
</VOUCHER>
<VOUCHER>
 <DATE>BADDATE1</DATE>
 <VOUCHERTYPENAME>Sales</VOUCHERTYPENAME>
 <VOUCHERNUMBER>S-002</VOUCHERNUMBER>
 <AMOUNT>100.00</AMOUNT>
</VOUCHER>
</TALLYMESSAGE></DATA></BODY></ENVELOPE>"#;

    #[test]
    fn sales_parse_filters_types_and_skips_bad_dates() {
        let vouchers = parse_sales_vouchers(SALES_XML).unwrap();
        assert_eq!(vouchers.len(), 1);
        let v = &vouchers[0];
        assert_eq!(v.voucher_number, "S-001");
        assert_eq!(v.voucher_date, "2025-01-10".parse().unwrap());
        assert_eq!(v.total_amount, 1050.0);
    }

    #[test]
    fn tax_lines_with_shared_substring_are_summed() {
        let v = &parse_sales_vouchers(SALES_XML).unwrap()[0];
        assert_eq!(v.cgst_amount, 25.0);
        assert_eq!(v.sgst_amount, 25.0);
        assert_eq!(v.igst_amount, 0.0);
    }

    #[test]
    fn quantities_split_into_magnitude_and_unit() {
        let v = &parse_sales_vouchers(SALES_XML).unwrap()[0];
        assert_eq!(v.items.len(), 1);
        let item = &v.items[0];
        assert_eq!(item.item_name, "Rice");
        assert_eq!(item.quantity, 10.0);
        assert_eq!(item.unit, "Bag");
        assert_eq!(item.rate, 100.0);
        assert_eq!(item.amount, 1000.0);
        assert_eq!(item.gst_rate, "5%");
    }

    #[test]
    fn purchase_parse_picks_the_other_voucher() {
        let vouchers = parse_purchase_vouchers(SALES_XML).unwrap();
        assert_eq!(vouchers.len(), 1);
        assert_eq!(vouchers[0].voucher_number, "P-001");
        assert_eq!(vouchers[0].total_amount, 500.0);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(parse_sales_vouchers("<ENVELOPE><VOUCHER></ENVELOPE>").is_err());
    }

    #[test]
    fn money_vouchers_detect_cash_and_bank() {
        let xml = r#"<ENVELOPE>
<VOUCHER>
 <DATE>20250110</DATE>
 <VOUCHERNUMBER>PMT-1</VOUCHERNUMBER>
 <AMOUNT>-2000.00</AMOUNT>
 <ALLLEDGERENTRIES.LIST>
  <LEDGERNAME>Petty Cash</LEDGERNAME>
  <AMOUNT>-2000.00</AMOUNT>
 </ALLLEDGERENTRIES.LIST>
</VOUCHER>
<VOUCHER>
 <DATE>20250111</DATE>
 <VOUCHERNUMBER>PMT-2</VOUCHERNUMBER>
 <AMOUNT>3000.00</AMOUNT>
 <ALLLEDGERENTRIES.LIST>
  <LEDGERNAME>HDFC Bank A/c</LEDGERNAME>
  <AMOUNT>3000.00</AMOUNT>
 </ALLLEDGERENTRIES.LIST>
</VOUCHER>
</ENVELOPE>"#;
        let entries = parse_money_vouchers(xml, PaymentKind::Payment).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].bank_or_cash, "Cash");
        assert_eq!(entries[0].amount, 2000.0);
        assert_eq!(entries[1].bank_or_cash, "Bank");
        assert_eq!(entries[1].payment_type, PaymentKind::Payment);
    }

    #[test]
    fn stock_summary_reads_name_from_element_or_attribute() {
        let xml = r#"<ENVELOPE>
<STOCKITEM NAME="Sugar 1kg">
 <PARENT>Groceries</PARENT>
 <BASEUNITS>Pkt</BASEUNITS>
 <CLOSINGBALANCE>40 Pkt</CLOSINGBALANCE>
 <CLOSINGRATE>45.00/Pkt</CLOSINGRATE>
 <CLOSINGVALUE>-1800.00</CLOSINGVALUE>
</STOCKITEM>
<STOCKITEM>
 <NAME>Rice 5kg</NAME>
 <BASEUNITS>Bag</BASEUNITS>
 <CLOSINGBALANCE>12 Bag</CLOSINGBALANCE>
 <CLOSINGVALUE>6000.00</CLOSINGVALUE>
</STOCKITEM>
</ENVELOPE>"#;
        let snap_date: NaiveDate = "2025-03-07".parse().unwrap();
        let items = parse_stock_summary(xml, snap_date).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item_name, "Sugar 1kg");
        assert_eq!(items[0].item_group, "Groceries");
        assert_eq!(items[0].closing_qty, 40.0);
        assert_eq!(items[0].closing_rate, 45.0);
        assert_eq!(items[0].closing_value, 1800.0);
        assert_eq!(items[1].item_name, "Rice 5kg");
        assert_eq!(items[1].snapshot_date, snap_date);
    }

    #[test]
    fn ledger_balances_keep_only_allow_listed_groups() {
        let xml = r#"<ENVELOPE>
<GROUP><NAME>Sales Accounts</NAME><CLOSINGBALANCE>-150000.00</CLOSINGBALANCE></GROUP>
<GROUP><NAME>Capital Account</NAME><CLOSINGBALANCE>99999.00</CLOSINGBALANCE></GROUP>
<GROUP NAME="Cash-in-Hand"><CLOSINGBALANCE>25000.00</CLOSINGBALANCE></GROUP>
</ENVELOPE>"#;
        let snap_date: NaiveDate = "2025-03-07".parse().unwrap();
        let balances = parse_ledger_balances(xml, snap_date).unwrap();
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0].ledger_group, "Sales Accounts");
        assert_eq!(balances[0].closing_balance, -150000.0);
        assert_eq!(balances[1].ledger_group, "Cash-in-Hand");
        assert_eq!(balances[1].closing_balance, 25000.0);
    }

    #[test]
    fn amount_parsing_strips_thousands_separators() {
        assert_eq!(parse_amount("1,05,000.50"), 105000.5);
        assert_eq!(parse_amount("garbage"), 0.0);
    }

    #[test]
    fn missing_quantity_defaults_to_zero_and_empty_unit() {
        assert_eq!(split_quantity(""), (0.0, String::new()));
        assert_eq!(split_quantity("7"), (7.0, String::new()));
    }
}
