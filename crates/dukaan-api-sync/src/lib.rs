//! # Ingestion API
//!
//! HTTP surface the local connector pushes to. `POST /sync` upserts a
//! full payload in one transaction keyed by the authenticated store;
//! `POST /sync/health` verifies credentials without writing anything.
//! Authentication is a hashed `X-API-Key` lookup; party-level data
//! never appears in the payload by construction.

pub mod auth;
pub mod error;
pub mod ingest;
pub mod router;

pub use error::ApiError;
pub use ingest::{ingest, IngestOutcome};
pub use router::sync_router;
