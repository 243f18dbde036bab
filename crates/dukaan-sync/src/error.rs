//! Error taxonomy for a sync run.

use std::path::PathBuf;

use dukaan_core::ReportKind;
use dukaan_tally::TallyError;
use thiserror::Error;

/// Error that aborts or fails a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The cloud API pre-flight failed; nothing was fetched.
    #[error("cloud API unreachable: {message}")]
    HealthCheckFailed { message: String },

    /// One export fetch failed; the run stops before any push.
    #[error("export fetch failed for {report}: {source}")]
    Fetch {
        report: ReportKind,
        #[source]
        source: TallyError,
    },

    /// The cloud answered the push with a non-success status.
    #[error("cloud rejected the push with HTTP {status}: {body}")]
    PushRejected { status: u16, body: String },

    /// The push never reached the cloud.
    #[error("network error pushing to cloud: {message}")]
    PushTransport { message: String },

    /// All push attempts were exhausted.
    #[error("cloud push failed after {attempts} attempts: {message}")]
    PushExhausted { attempts: u32, message: String },

    /// The durable sync state could not be written.
    #[error("cannot persist sync state at {path}: {source}")]
    State {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Whether the push step may retry after this error. Fetch and
    /// state errors never retry; a 4xx rejection is final.
    #[must_use]
    pub fn is_retryable_push(&self) -> bool {
        match self {
            Self::PushTransport { .. } => true,
            Self::PushRejected { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
