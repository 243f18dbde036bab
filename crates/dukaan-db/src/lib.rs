//! # Database layer
//!
//! Postgres models and SQL for the cloud side: store provisioning with
//! hashed API keys, voucher upserts with line-item replacement, natural
//! key upserts for stock/ledger/payment records, and the sync run log.

pub mod api_key;
pub mod error;
pub mod migrations;
pub mod models;
pub mod pool;

pub use error::DbError;
pub use migrations::run_migrations;
pub use pool::connect;
