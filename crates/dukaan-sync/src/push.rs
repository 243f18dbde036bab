//! Cloud push client with bounded retries.

use std::time::Duration;

use async_trait::async_trait;
use dukaan_core::SyncPayload;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::SyncError;

const HEALTH_TIMEOUT_SECS: u64 = 15;
const PUSH_TIMEOUT_SECS: u64 = 120;
const ERROR_BODY_SNIPPET: usize = 300;

/// Ingestion acknowledgement from the cloud.
#[derive(Debug, Clone, Deserialize)]
pub struct PushAck {
    pub status: String,
    pub sales_count: i64,
    pub purchase_count: i64,
}

/// Seam between the orchestrator and the cloud API.
#[async_trait]
pub trait CloudClient: Send + Sync {
    /// Pre-flight reachability probe.
    async fn check_health(&self) -> Result<(), SyncError>;

    /// Pushes one window's payload. A single attempt; retry policy
    /// lives in [`push_with_retry`].
    async fn push(&self, payload: &SyncPayload) -> Result<PushAck, SyncError>;
}

/// Exponential backoff policy for the push step.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt after `attempt` (1-indexed): base
    /// doubled per attempt.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Pushes with bounded retries: transport errors and 5xx responses are
/// retried with doubling backoff, a 4xx response is raised immediately.
pub async fn push_with_retry(
    client: &dyn CloudClient,
    payload: &SyncPayload,
    policy: &RetryPolicy,
) -> Result<PushAck, SyncError> {
    let mut last_error: Option<SyncError> = None;
    for attempt in 1..=policy.max_attempts {
        info!(attempt, max = policy.max_attempts, "pushing sync payload");
        match client.push(payload).await {
            Ok(ack) => return Ok(ack),
            Err(e) if e.is_retryable_push() => {
                warn!(attempt, error = %e, "push attempt failed");
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.delay_after(attempt)).await;
        }
    }
    Err(SyncError::PushExhausted {
        attempts: policy.max_attempts,
        message: last_error.map(|e| e.to_string()).unwrap_or_default(),
    })
}

/// HTTP implementation against the cloud ingestion API.
pub struct HttpCloudClient {
    endpoint: String,
    api_key: String,
    http: reqwest::Client,
}

impl HttpCloudClient {
    /// Builds a client for the `POST /sync` endpoint.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| SyncError::PushTransport {
                message: e.to_string(),
            })?;
        Ok(Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            http,
        })
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl CloudClient for HttpCloudClient {
    async fn check_health(&self) -> Result<(), SyncError> {
        let resp = self
            .http
            .post(self.health_url())
            .header("X-API-Key", &self.api_key)
            .timeout(Duration::from_secs(HEALTH_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| SyncError::HealthCheckFailed {
                message: e.to_string(),
            })?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(SyncError::HealthCheckFailed {
                message: format!("HTTP {}", resp.status().as_u16()),
            })
        }
    }

    async fn push(&self, payload: &SyncPayload) -> Result<PushAck, SyncError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .header("X-API-Key", &self.api_key)
            .timeout(Duration::from_secs(PUSH_TIMEOUT_SECS))
            .json(payload)
            .send()
            .await
            .map_err(|e| SyncError::PushTransport {
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body: String = resp
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(ERROR_BODY_SNIPPET)
                .collect();
            return Err(SyncError::PushRejected {
                status: status.as_u16(),
                body,
            });
        }
        resp.json().await.map_err(|e| SyncError::PushTransport {
            message: format!("invalid ack body: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyCloud {
        fail_first: usize,
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl CloudClient for FlakyCloud {
        async fn check_health(&self) -> Result<(), SyncError> {
            Ok(())
        }

        async fn push(&self, _payload: &SyncPayload) -> Result<PushAck, SyncError> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err(SyncError::PushTransport {
                    message: "connection reset".into(),
                })
            } else {
                Ok(PushAck {
                    status: "success".into(),
                    sales_count: 1,
                    purchase_count: 0,
                })
            }
        }
    }

    struct RejectingCloud {
        status: u16,
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl CloudClient for RejectingCloud {
        async fn check_health(&self) -> Result<(), SyncError> {
            Ok(())
        }

        async fn push(&self, _payload: &SyncPayload) -> Result<PushAck, SyncError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(SyncError::PushRejected {
                status: self.status,
                body: String::new(),
            })
        }
    }

    fn payload() -> SyncPayload {
        SyncPayload {
            from_date: "2025-03-01".parse().unwrap(),
            to_date: "2025-03-07".parse().unwrap(),
            connector_version: "0.1.0".into(),
            sync_started_at: None,
            sales_vouchers: vec![],
            purchase_vouchers: vec![],
            stock_items: vec![],
            ledger_entries: vec![],
            payment_entries: vec![],
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn transient_failures_are_retried_until_success() {
        let cloud = FlakyCloud {
            fail_first: 2,
            attempts: AtomicUsize::new(0),
        };
        let ack = push_with_retry(&cloud, &payload(), &fast_policy())
            .await
            .unwrap();
        assert_eq!(ack.sales_count, 1);
        assert_eq!(cloud.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn attempts_are_exhausted_after_the_cap() {
        let cloud = FlakyCloud {
            fail_first: 10,
            attempts: AtomicUsize::new(0),
        };
        let err = push_with_retry(&cloud, &payload(), &fast_policy())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::PushExhausted { attempts: 3, .. }));
        assert_eq!(cloud.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let cloud = RejectingCloud {
            status: 401,
            attempts: AtomicUsize::new(0),
        };
        let err = push_with_retry(&cloud, &payload(), &fast_policy())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::PushRejected { status: 401, .. }));
        assert_eq!(cloud.attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_doubles_from_the_base() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
        };
        assert_eq!(policy.delay_after(1), Duration::from_secs(5));
        assert_eq!(policy.delay_after(2), Duration::from_secs(10));
        assert_eq!(policy.delay_after(3), Duration::from_secs(20));
    }
}
