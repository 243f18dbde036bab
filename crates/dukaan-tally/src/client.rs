//! HTTP export client for the accounting server.

use async_trait::async_trait;
use dukaan_core::{ReportKind, SyncWindow};
use tracing::debug;

use crate::envelope::export_envelope;
use crate::error::TallyError;

/// Export requests can take a while on large books.
const EXPORT_TIMEOUT_SECS: u64 = 60;

/// Seam between the orchestrator and the accounting server, so sync
/// runs can be driven against a fake in tests.
#[async_trait]
pub trait ExportClient: Send + Sync {
    /// Fetches one report as raw XML. No retry: the caller treats any
    /// failure as fatal for the run.
    async fn fetch(&self, kind: ReportKind, window: SyncWindow) -> Result<String, TallyError>;
}

/// Talks to Tally Prime's XML-over-HTTP server, usually on
/// `http://localhost:9000`.
pub struct HttpExportClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpExportClient {
    /// Builds a client against the given base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, TallyError> {
        let base_url = base_url.into();
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(EXPORT_TIMEOUT_SECS))
            .build()
            .map_err(|e| TallyError::ConnectionFailed {
                url: base_url.clone(),
                message: e.to_string(),
            })?;
        Ok(Self { base_url, http })
    }

    async fn post_xml(&self, body: String) -> Result<String, TallyError> {
        let resp = self
            .http
            .post(&self.base_url)
            .header("Content-Type", "application/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| TallyError::from_reqwest(e, &self.base_url, EXPORT_TIMEOUT_SECS))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TallyError::HttpStatus {
                status: status.as_u16(),
            });
        }
        resp.text()
            .await
            .map_err(|e| TallyError::from_reqwest(e, &self.base_url, EXPORT_TIMEOUT_SECS))
    }
}

#[async_trait]
impl ExportClient for HttpExportClient {
    async fn fetch(&self, kind: ReportKind, window: SyncWindow) -> Result<String, TallyError> {
        debug!(report = %kind, from = %window.from, to = %window.to, "fetching export");
        self.post_xml(export_envelope(kind, window)).await
    }
}
