//! Sales and purchase voucher persistence.
//!
//! Headers are upserted on `(store_id, voucher_number)`; line items are
//! deleted and re-inserted on every write. Replace-not-merge is what
//! makes resyncs converge: a shorter or reordered item list can never
//! leave stale rows behind.

use chrono::{DateTime, NaiveDate, Utc};
use dukaan_core::Voucher;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

/// Persisted voucher header, same shape for sales and purchases.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VoucherRow {
    pub id: i64,
    pub store_id: Uuid,
    pub voucher_number: String,
    pub voucher_date: NaiveDate,
    pub total_amount: f64,
    pub cgst_amount: f64,
    pub sgst_amount: f64,
    pub igst_amount: f64,
    pub created_at: DateTime<Utc>,
}

/// Persisted line item.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VoucherItemRow {
    pub id: i64,
    pub voucher_id: i64,
    pub item_name: String,
    pub quantity: f64,
    pub unit: String,
    pub rate: f64,
    pub amount: f64,
}

/// Which voucher table pair an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoucherTable {
    Sales,
    Purchase,
}

impl VoucherTable {
    fn header_table(self) -> &'static str {
        match self {
            Self::Sales => "sales_vouchers",
            Self::Purchase => "purchase_vouchers",
        }
    }

    fn item_table(self) -> &'static str {
        match self {
            Self::Sales => "sales_voucher_items",
            Self::Purchase => "purchase_voucher_items",
        }
    }

    /// Only sales items carry a GST rate column.
    fn has_gst_rate(self) -> bool {
        matches!(self, Self::Sales)
    }
}

/// Upserts a voucher header and replaces its line items, inside the
/// caller's transaction. Returns the header row id.
pub async fn upsert_voucher(
    conn: &mut PgConnection,
    table: VoucherTable,
    store_id: Uuid,
    voucher: &Voucher,
) -> Result<i64, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO {header} (
            store_id, voucher_number, voucher_date,
            total_amount, cgst_amount, sgst_amount, igst_amount
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (store_id, voucher_number) DO UPDATE SET
            voucher_date = EXCLUDED.voucher_date,
            total_amount = EXCLUDED.total_amount,
            cgst_amount = EXCLUDED.cgst_amount,
            sgst_amount = EXCLUDED.sgst_amount,
            igst_amount = EXCLUDED.igst_amount
        RETURNING id
        "#,
        header = table.header_table(),
    );
    let (voucher_id,): (i64,) = sqlx::query_as(&sql)
        .bind(store_id)
        .bind(&voucher.voucher_number)
        .bind(voucher.voucher_date)
        .bind(voucher.total_amount)
        .bind(voucher.cgst_amount)
        .bind(voucher.sgst_amount)
        .bind(voucher.igst_amount)
        .fetch_one(&mut *conn)
        .await?;

    let delete = format!("DELETE FROM {} WHERE voucher_id = $1", table.item_table());
    sqlx::query(&delete)
        .bind(voucher_id)
        .execute(&mut *conn)
        .await?;

    for item in &voucher.items {
        if table.has_gst_rate() {
            let insert = format!(
                r#"
                INSERT INTO {items} (voucher_id, item_name, quantity, unit, rate, amount, gst_rate)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
                items = table.item_table(),
            );
            sqlx::query(&insert)
                .bind(voucher_id)
                .bind(&item.item_name)
                .bind(item.quantity)
                .bind(&item.unit)
                .bind(item.rate)
                .bind(item.amount)
                .bind(&item.gst_rate)
                .execute(&mut *conn)
                .await?;
        } else {
            let insert = format!(
                r#"
                INSERT INTO {items} (voucher_id, item_name, quantity, unit, rate, amount)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
                items = table.item_table(),
            );
            sqlx::query(&insert)
                .bind(voucher_id)
                .bind(&item.item_name)
                .bind(item.quantity)
                .bind(&item.unit)
                .bind(item.rate)
                .bind(item.amount)
                .execute(&mut *conn)
                .await?;
        }
    }
    Ok(voucher_id)
}
