//! Sync run log model.
//!
//! One row per ingestion attempt. Created in `started` state inside the
//! ingest transaction, mutated at most once more to a terminal state,
//! never deleted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use std::fmt;
use uuid::Uuid;

/// Longest error text a failed log row keeps.
pub const MAX_ERROR_LEN: usize = 500;

/// Lifecycle state of a sync run log row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncLogStatus {
    Started,
    Success,
    Partial,
    Failed,
}

impl SyncLogStatus {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Partial | Self::Failed)
    }
}

impl fmt::Display for SyncLogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => write!(f, "started"),
            Self::Success => write!(f, "success"),
            Self::Partial => write!(f, "partial"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for SyncLogStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "started" => Ok(Self::Started),
            "success" => Ok(Self::Success),
            "partial" => Ok(Self::Partial),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown sync log status: {s}")),
        }
    }
}

/// A sync run log record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SyncLog {
    pub id: i64,
    pub store_id: Uuid,
    pub sync_started_at: DateTime<Utc>,
    pub sync_ended_at: Option<DateTime<Utc>>,
    pub status: String,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub sales_count: i32,
    pub purchase_count: i32,
    pub error_message: Option<String>,
}

impl SyncLog {
    /// Typed view of the stored status string.
    #[must_use]
    pub fn status(&self) -> SyncLogStatus {
        self.status.parse().unwrap_or(SyncLogStatus::Started)
    }

    /// Inserts a `started` row inside the caller's transaction and
    /// returns its id. Visible to later statements in the transaction,
    /// committed only with it.
    pub async fn create_started(
        conn: &mut PgConnection,
        store_id: Uuid,
        started_at: DateTime<Utc>,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<i64, sqlx::Error> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO sync_logs (store_id, sync_started_at, status, from_date, to_date)
            VALUES ($1, $2, 'started', $3, $4)
            RETURNING id
            "#,
        )
        .bind(store_id)
        .bind(started_at)
        .bind(from_date)
        .bind(to_date)
        .fetch_one(conn)
        .await?;
        Ok(id)
    }

    /// Marks a run successful with its final counts.
    pub async fn mark_success(
        conn: &mut PgConnection,
        id: i64,
        sales_count: i32,
        purchase_count: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE sync_logs
            SET status = 'success', sync_ended_at = NOW(),
                sales_count = $2, purchase_count = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(sales_count)
        .bind(purchase_count)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Records a failed run on the pool, outside any caller
    /// transaction, so the row survives the ingest rollback. The error
    /// text is truncated to [`MAX_ERROR_LEN`].
    pub async fn record_failure(
        pool: &PgPool,
        store_id: Uuid,
        started_at: DateTime<Utc>,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
        error: &str,
    ) -> Result<(), sqlx::Error> {
        let truncated: String = error.chars().take(MAX_ERROR_LEN).collect();
        sqlx::query(
            r#"
            INSERT INTO sync_logs (
                store_id, sync_started_at, sync_ended_at, status,
                from_date, to_date, error_message
            )
            VALUES ($1, $2, NOW(), 'failed', $3, $4, $5)
            "#,
        )
        .bind(store_id)
        .bind(started_at)
        .bind(from_date)
        .bind(to_date)
        .bind(truncated)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Most recent runs for a store, newest first.
    pub async fn list_recent(
        pool: &PgPool,
        store_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM sync_logs
            WHERE store_id = $1
            ORDER BY sync_started_at DESC
            LIMIT $2
            "#,
        )
        .bind(store_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_and_classifies_terminal() {
        for (raw, terminal) in [
            ("started", false),
            ("success", true),
            ("partial", true),
            ("failed", true),
        ] {
            let status: SyncLogStatus = raw.parse().unwrap();
            assert_eq!(status.to_string(), raw);
            assert_eq!(status.is_terminal(), terminal);
        }
        assert!("bogus".parse::<SyncLogStatus>().is_err());
    }
}
