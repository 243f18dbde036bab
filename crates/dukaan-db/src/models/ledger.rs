//! Ledger group balance persistence.

use chrono::NaiveDate;
use dukaan_core::LedgerBalance;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LedgerEntryRow {
    pub id: i64,
    pub store_id: Uuid,
    pub ledger_group: String,
    pub closing_balance: f64,
    pub snapshot_date: NaiveDate,
}

/// Upserts one balance on `(store_id, ledger_group, snapshot_date)`.
/// The caller is responsible for allow-list filtering.
pub async fn upsert_ledger_entry(
    conn: &mut PgConnection,
    store_id: Uuid,
    balance: &LedgerBalance,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO ledger_entries (store_id, ledger_group, closing_balance, snapshot_date)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (store_id, ledger_group, snapshot_date) DO UPDATE SET
            closing_balance = EXCLUDED.closing_balance
        "#,
    )
    .bind(store_id)
    .bind(&balance.ledger_group)
    .bind(balance.closing_balance)
    .bind(balance.snapshot_date)
    .execute(conn)
    .await?;
    Ok(())
}
