//! # Tally integration
//!
//! Everything that speaks the accounting server's XML-over-HTTP
//! protocol:
//!
//! - [`client`] - export client fetching report XML
//! - [`envelope`] - wire-exact request envelope builders
//! - [`transform`] - export XML to normalized records
//! - [`import`] - Purchase voucher creation protocol
//! - [`error`] - transport and import error taxonomy

pub mod client;
pub mod envelope;
pub mod error;
pub mod import;
pub mod transform;

pub use client::{ExportClient, HttpExportClient};
pub use error::TallyError;
pub use import::{ImportOutcome, InvoiceItem, PurchaseInvoice, TallyImporter};
pub use transform::TransformError;
