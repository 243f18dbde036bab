//! Payment entry persistence.

use chrono::{DateTime, NaiveDate, Utc};
use dukaan_core::{PaymentEntry, PaymentKind};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentEntryRow {
    pub id: i64,
    pub store_id: Uuid,
    pub voucher_number: String,
    pub voucher_date: NaiveDate,
    pub payment_type: String,
    pub bank_or_cash: String,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
}

fn kind_str(kind: PaymentKind) -> &'static str {
    match kind {
        PaymentKind::Payment => "payment",
        PaymentKind::Receipt => "receipt",
    }
}

/// Upserts one movement on `(store_id, voucher_number)`.
pub async fn upsert_payment_entry(
    conn: &mut PgConnection,
    store_id: Uuid,
    entry: &PaymentEntry,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO payment_entries (
            store_id, voucher_number, voucher_date, payment_type, bank_or_cash, amount
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (store_id, voucher_number) DO UPDATE SET
            voucher_date = EXCLUDED.voucher_date,
            payment_type = EXCLUDED.payment_type,
            bank_or_cash = EXCLUDED.bank_or_cash,
            amount = EXCLUDED.amount
        "#,
    )
    .bind(store_id)
    .bind(&entry.voucher_number)
    .bind(entry.voucher_date)
    .bind(kind_str(entry.payment_type))
    .bind(&entry.bank_or_cash)
    .bind(entry.amount)
    .execute(conn)
    .await?;
    Ok(())
}
