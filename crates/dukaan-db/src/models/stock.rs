//! Stock snapshot persistence.

use chrono::NaiveDate;
use dukaan_core::StockSnapshot;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StockItemRow {
    pub id: i64,
    pub store_id: Uuid,
    pub item_name: String,
    pub item_group: String,
    pub unit: String,
    pub closing_qty: f64,
    pub closing_rate: f64,
    pub closing_value: f64,
    pub snapshot_date: NaiveDate,
}

/// Upserts one snapshot row on `(store_id, item_name, snapshot_date)`,
/// updating only the measurement fields.
pub async fn upsert_stock_item(
    conn: &mut PgConnection,
    store_id: Uuid,
    snapshot: &StockSnapshot,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO stock_items (
            store_id, item_name, item_group, unit,
            closing_qty, closing_rate, closing_value, snapshot_date
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (store_id, item_name, snapshot_date) DO UPDATE SET
            closing_qty = EXCLUDED.closing_qty,
            closing_rate = EXCLUDED.closing_rate,
            closing_value = EXCLUDED.closing_value
        "#,
    )
    .bind(store_id)
    .bind(&snapshot.item_name)
    .bind(&snapshot.item_group)
    .bind(&snapshot.unit)
    .bind(snapshot.closing_qty)
    .bind(snapshot.closing_rate)
    .bind(snapshot.closing_value)
    .bind(snapshot.snapshot_date)
    .execute(conn)
    .await?;
    Ok(())
}
