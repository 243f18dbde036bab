//! Error types for the Tally HTTP surface.
//!
//! Transport errors carry a transient/permanent classification so the
//! caller can decide what is worth retrying. Export fetches are never
//! retried; the classification matters for the import path and for run
//! diagnostics.

use thiserror::Error;

/// Error from talking to the accounting server over HTTP.
#[derive(Debug, Error)]
pub enum TallyError {
    /// Could not reach the accounting server at all.
    #[error("cannot connect to Tally at {url}: {message}")]
    ConnectionFailed { url: String, message: String },

    /// The accounting server did not answer within the deadline.
    #[error("Tally did not respond within {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The accounting server answered with a non-success status.
    #[error("Tally returned HTTP {status}")]
    HttpStatus { status: u16 },

    /// The import request reached the server but was rejected.
    #[error("Tally rejected the import: {message}")]
    ImportRejected { message: String },

    /// The import response could not be interpreted.
    #[error("unexpected Tally response: {snippet}")]
    UnexpectedResponse { snippet: String },

    /// A date string could not be read in any supported format.
    #[error("cannot read date '{raw}'; expected a format like YYYY-MM-DD")]
    UnparseableDate { raw: String },
}

impl TallyError {
    /// Whether a retry could plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout { .. } => true,
            Self::HttpStatus { status } => *status >= 500,
            Self::ImportRejected { .. }
            | Self::UnexpectedResponse { .. }
            | Self::UnparseableDate { .. } => false,
        }
    }

    /// Classifies a reqwest transport failure against the request URL.
    pub fn from_reqwest(err: reqwest::Error, url: &str, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout_secs }
        } else if let Some(status) = err.status() {
            Self::HttpStatus {
                status: status.as_u16(),
            }
        } else {
            Self::ConnectionFailed {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failures_are_transient() {
        assert!(TallyError::Timeout { timeout_secs: 60 }.is_transient());
        assert!(TallyError::HttpStatus { status: 503 }.is_transient());
    }

    #[test]
    fn rejections_are_permanent() {
        assert!(!TallyError::HttpStatus { status: 404 }.is_transient());
        assert!(!TallyError::ImportRejected {
            message: "duplicate voucher".into()
        }
        .is_transient());
    }
}
