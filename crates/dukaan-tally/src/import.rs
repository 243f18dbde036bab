//! Voucher import protocol for the accounting server.
//!
//! Builds `Import Data` envelopes that create a Purchase voucher in the
//! books, plus the master-creation envelopes the voucher depends on.
//!
//! The sign convention is load-bearing: debit lines carry
//! `ISDEEMEDPOSITIVE=Yes` with a negative amount, the credit line
//! carries `No` with a positive amount. Getting it wrong does not fail
//! the import, it silently produces wrong ledgers.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::envelope::escape_xml;
use crate::error::TallyError;

const IMPORT_TIMEOUT_SECS: u64 = 30;
const MASTERS_TIMEOUT_SECS: u64 = 15;

/// One line of an inbound supplier invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub rate: f64,
    pub amount: f64,
}

/// A supplier invoice to be recorded as a Purchase voucher.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseInvoice {
    pub supplier_name: String,
    pub invoice_number: String,
    /// Raw date text as entered; parsed leniently at build time.
    pub invoice_date: String,
    pub items: Vec<InvoiceItem>,
    pub cgst: f64,
    pub sgst: f64,
    pub igst: f64,
    pub total_amount: f64,
}

/// Result of a voucher import round-trip.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    pub created: u32,
    pub message: String,
}

/// Parses a date in any common hand-entered format into the `YYYYMMDD`
/// token the import envelope needs.
///
/// Years outside 2000..=2099 are rejected even when a format matches:
/// two-digit years can otherwise parse as year 25 AD, which the
/// accounting server reports as a missing voucher date.
pub fn parse_flexible_date(raw: &str) -> Result<String, TallyError> {
    const FORMATS: [&str; 10] = [
        "%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%Y%m%d", "%d-%b-%Y", "%d %b %Y", "%d %B %Y",
        "%Y/%m/%d", "%d-%m-%y", "%d/%m/%y",
    ];
    let raw = raw.trim();
    for fmt in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            let year = chrono::Datelike::year(&date);
            if (2000..=2099).contains(&year) {
                return Ok(date.format("%Y%m%d").to_string());
            }
        }
    }
    Err(TallyError::UnparseableDate {
        raw: raw.to_string(),
    })
}

fn format_qty(qty: f64) -> String {
    if qty.fract() == 0.0 {
        format!("{}", qty as i64)
    } else {
        format!("{qty}")
    }
}

/// Builds the Purchase voucher creation envelope.
///
/// With inventory entries the voucher needs its stock items to exist in
/// the books; without them it is a pure accounting voucher that still
/// records amount, tax split, and supplier correctly.
pub fn build_purchase_envelope(
    invoice: &PurchaseInvoice,
    with_inventory: bool,
) -> Result<String, TallyError> {
    let date = parse_flexible_date(&invoice.invoice_date)?;
    let supplier = escape_xml(&invoice.supplier_name);
    let base_amount = invoice.total_amount - invoice.cgst - invoice.sgst - invoice.igst;
    let obj_view = if with_inventory {
        "Invoice Voucher View"
    } else {
        "Accounting Voucher View"
    };
    let is_invoice = if with_inventory { "Yes" } else { "No" };

    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<ENVELOPE>\n");
    xml.push_str("  <HEADER><TALLYREQUEST>Import Data</TALLYREQUEST></HEADER>\n");
    xml.push_str("  <BODY>\n    <IMPORTDATA>\n");
    xml.push_str("      <REQUESTDESC>\n        <REPORTNAME>Vouchers</REPORTNAME>\n      </REQUESTDESC>\n");
    xml.push_str("      <REQUESTDATA>\n");
    xml.push_str("        <TALLYMESSAGE xmlns:UDF=\"TallyUDF\">\n");
    xml.push_str(&format!(
        "          <VOUCHER VCHTYPE=\"Purchase\" ACTION=\"Create\" OBJVIEW=\"{obj_view}\">\n"
    ));
    xml.push_str(&format!("            <DATE>{date}</DATE>\n"));
    xml.push_str("            <VOUCHERTYPENAME>Purchase</VOUCHERTYPENAME>\n");
    xml.push_str(&format!(
        "            <VOUCHERNUMBER>{}</VOUCHERNUMBER>\n",
        escape_xml(&invoice.invoice_number)
    ));
    xml.push_str(&format!(
        "            <PARTYLEDGERNAME>{supplier}</PARTYLEDGERNAME>\n"
    ));
    xml.push_str(&format!("            <ISINVOICE>{is_invoice}</ISINVOICE>\n"));

    if with_inventory {
        for item in &invoice.items {
            let unit = if item.unit.is_empty() {
                "Pcs"
            } else {
                item.unit.as_str()
            };
            let qty = format_qty(item.quantity);
            xml.push_str("            <ALLINVENTORYENTRIES.LIST>\n");
            xml.push_str(&format!(
                "              <STOCKITEMNAME>{}</STOCKITEMNAME>\n",
                escape_xml(&item.name)
            ));
            xml.push_str("              <ISDEEMEDPOSITIVE>Yes</ISDEEMEDPOSITIVE>\n");
            xml.push_str(&format!(
                "              <RATE>{:.2}/{unit}</RATE>\n",
                item.rate
            ));
            xml.push_str(&format!("              <AMOUNT>-{:.2}</AMOUNT>\n", item.amount));
            xml.push_str(&format!("              <ACTUALQTY>{qty} {unit}</ACTUALQTY>\n"));
            xml.push_str(&format!("              <BILLEDQTY>{qty} {unit}</BILLEDQTY>\n"));
            xml.push_str("            </ALLINVENTORYENTRIES.LIST>\n");
        }
    }

    // Purchase ledger, debit
    push_ledger_line(&mut xml, "Purchase", true, base_amount);

    // Input tax ledgers, debit, only when the invoice carries that tax
    for (ledger, amount) in [
        ("Input CGST", invoice.cgst),
        ("Input SGST", invoice.sgst),
        ("Input IGST", invoice.igst),
    ] {
        if amount > 0.0 {
            push_ledger_line(&mut xml, ledger, true, amount);
        }
    }

    // Supplier ledger, credit
    push_ledger_line(&mut xml, &supplier, false, invoice.total_amount);

    xml.push_str("          </VOUCHER>\n");
    xml.push_str("        </TALLYMESSAGE>\n");
    xml.push_str("      </REQUESTDATA>\n    </IMPORTDATA>\n  </BODY>\n</ENVELOPE>");
    Ok(xml)
}

fn push_ledger_line(xml: &mut String, ledger: &str, debit: bool, amount: f64) {
    let (flag, rendered) = if debit {
        ("Yes", format!("-{amount:.2}"))
    } else {
        ("No", format!("{amount:.2}"))
    };
    xml.push_str("            <ALLLEDGERENTRIES.LIST>\n");
    xml.push_str(&format!("              <LEDGERNAME>{ledger}</LEDGERNAME>\n"));
    xml.push_str(&format!(
        "              <ISDEEMEDPOSITIVE>{flag}</ISDEEMEDPOSITIVE>\n"
    ));
    xml.push_str(&format!("              <AMOUNT>{rendered}</AMOUNT>\n"));
    xml.push_str("            </ALLLEDGERENTRIES.LIST>\n");
}

/// Master-creation envelope for every ledger the voucher touches.
///
/// Duplicates come back as a non-fatal error the caller ignores.
#[must_use]
pub fn build_ledger_masters(invoice: &PurchaseInvoice) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<ENVELOPE>\n");
    xml.push_str("  <HEADER><TALLYREQUEST>Import Data</TALLYREQUEST></HEADER>\n");
    xml.push_str("  <BODY><IMPORTDATA>\n");
    xml.push_str("    <REQUESTDESC><REPORTNAME>All Masters</REPORTNAME></REQUESTDESC>\n");
    xml.push_str("    <REQUESTDATA>\n");

    push_ledger_master(&mut xml, "Purchase", "Purchase Accounts");
    for (ledger, amount) in [
        ("Input CGST", invoice.cgst),
        ("Input SGST", invoice.sgst),
        ("Input IGST", invoice.igst),
    ] {
        if amount > 0.0 {
            push_ledger_master(&mut xml, ledger, "Duties &amp; Taxes");
        }
    }
    let supplier = invoice.supplier_name.trim();
    if !supplier.is_empty() {
        push_ledger_master(&mut xml, &escape_xml(supplier), "Sundry Creditors");
    }

    xml.push_str("    </REQUESTDATA>\n  </IMPORTDATA></BODY>\n</ENVELOPE>");
    xml
}

fn push_ledger_master(xml: &mut String, name: &str, parent: &str) {
    xml.push_str("      <TALLYMESSAGE xmlns:UDF=\"TallyUDF\">\n");
    xml.push_str(&format!("        <LEDGER NAME=\"{name}\" ACTION=\"Create\">\n"));
    xml.push_str(&format!("          <NAME>{name}</NAME>\n"));
    xml.push_str(&format!("          <PARENT>{parent}</PARENT>\n"));
    xml.push_str("        </LEDGER>\n");
    xml.push_str("      </TALLYMESSAGE>\n");
}

/// Master-creation envelope for the voucher's stock items.
#[must_use]
pub fn build_stock_item_masters(items: &[InvoiceItem]) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<ENVELOPE>\n");
    xml.push_str("  <HEADER><TALLYREQUEST>Import Data</TALLYREQUEST></HEADER>\n");
    xml.push_str("  <BODY><IMPORTDATA>\n");
    xml.push_str("    <REQUESTDESC><REPORTNAME>All Masters</REPORTNAME></REQUESTDESC>\n");
    xml.push_str("    <REQUESTDATA>\n");
    for item in items {
        let name = escape_xml(item.name.trim());
        if name.is_empty() {
            continue;
        }
        xml.push_str("      <TALLYMESSAGE xmlns:UDF=\"TallyUDF\">\n");
        xml.push_str(&format!("        <STOCKITEM NAME=\"{name}\" ACTION=\"Create\">\n"));
        xml.push_str(&format!("          <NAME>{name}</NAME>\n"));
        xml.push_str("          <PARENT></PARENT>\n");
        xml.push_str("          <BASEUNITS></BASEUNITS>\n");
        xml.push_str("        </STOCKITEM>\n");
        xml.push_str("      </TALLYMESSAGE>\n");
    }
    xml.push_str("    </REQUESTDATA>\n  </IMPORTDATA></BODY>\n</ENVELOPE>");
    xml
}

/// Interprets the accounting server's import response.
///
/// `LINEERROR` and `ERROR` elements signal rejection; a positive
/// `CREATED` count signals success. The server occasionally answers
/// with plain text on success, so an unparseable body mentioning
/// "created" is accepted.
pub fn parse_import_response(body: &str) -> Result<ImportOutcome, TallyError> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut current = String::new();
    let mut line_errors: Vec<String> = Vec::new();
    let mut created: Option<u32> = None;
    let mut error_text: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                current = String::from_utf8_lossy(e.name().as_ref()).into_owned();
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().unwrap_or_default().trim().to_string();
                if text.is_empty() {
                    continue;
                }
                match current.as_str() {
                    "LINEERROR" => line_errors.push(text),
                    "CREATED" => created = text.parse().ok(),
                    "ERROR" => error_text = Some(text),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => current.clear(),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => {
                if body.to_lowercase().contains("created") {
                    return Ok(ImportOutcome {
                        created: 1,
                        message: "Voucher created successfully".to_string(),
                    });
                }
                let snippet: String = body.chars().take(200).collect();
                return Err(TallyError::UnexpectedResponse { snippet });
            }
        }
    }

    if !line_errors.is_empty() {
        return Err(TallyError::ImportRejected {
            message: line_errors.join("; "),
        });
    }
    if let Some(n) = created {
        if n > 0 {
            return Ok(ImportOutcome {
                created: n,
                message: format!("{n} voucher(s) created"),
            });
        }
    }
    if let Some(message) = error_text {
        return Err(TallyError::ImportRejected { message });
    }
    // no error markers at all; the server accepted the request
    Ok(ImportOutcome {
        created: 0,
        message: "Import request accepted".to_string(),
    })
}

/// Posts import envelopes to the accounting server.
pub struct TallyImporter {
    base_url: String,
    http: reqwest::Client,
}

impl TallyImporter {
    /// Builds an importer against the given base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, TallyError> {
        let base_url = base_url.into();
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| TallyError::ConnectionFailed {
                url: base_url.clone(),
                message: e.to_string(),
            })?;
        Ok(Self { base_url, http })
    }

    async fn post(&self, body: String, timeout_secs: u64) -> Result<String, TallyError> {
        let resp = self
            .http
            .post(&self.base_url)
            .header("Content-Type", "application/xml")
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .body(body)
            .send()
            .await
            .map_err(|e| TallyError::from_reqwest(e, &self.base_url, timeout_secs))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TallyError::HttpStatus {
                status: status.as_u16(),
            });
        }
        resp.text()
            .await
            .map_err(|e| TallyError::from_reqwest(e, &self.base_url, timeout_secs))
    }

    /// Records a supplier invoice as a Purchase voucher, creating any
    /// missing masters first. Duplicate-master responses are ignored.
    pub async fn import_invoice(
        &self,
        invoice: &PurchaseInvoice,
        with_inventory: bool,
    ) -> Result<ImportOutcome, TallyError> {
        let envelope = build_purchase_envelope(invoice, with_inventory)?;

        if let Err(e) = self
            .post(build_ledger_masters(invoice), MASTERS_TIMEOUT_SECS)
            .await
        {
            warn!(error = %e, "ledger master creation failed, continuing");
        }
        if with_inventory {
            if let Err(e) = self
                .post(build_stock_item_masters(&invoice.items), MASTERS_TIMEOUT_SECS)
                .await
            {
                warn!(error = %e, "stock item master creation failed, continuing");
            }
        }

        debug!(invoice = %invoice.invoice_number, "posting voucher import");
        let body = self.post(envelope, IMPORT_TIMEOUT_SECS).await?;
        parse_import_response(&body)
    }
}
