//! # Sync pipeline
//!
//! The local connector's run machinery:
//!
//! - [`state`] - durable resume boundary
//! - [`push`] - cloud client with bounded retries
//! - [`orchestrator`] - one sync cycle end to end
//! - [`error`] - run-level error taxonomy

pub mod error;
pub mod orchestrator;
pub mod push;
pub mod state;

pub use error::SyncError;
pub use orchestrator::{Orchestrator, RunOutcome, SyncConfig};
pub use push::{push_with_retry, CloudClient, HttpCloudClient, PushAck, RetryPolicy};
pub use state::SyncStateStore;
