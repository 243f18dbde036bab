//! Payload ingestion.
//!
//! One database transaction per payload: a `started` log row first, so
//! a mid-ingest crash is visible, then every upsert, then the success
//! mark. Any error rolls the whole transaction back and records a
//! `failed` log row outside it.

use chrono::Utc;
use dukaan_core::{SyncPayload, LEDGER_GROUPS};
use dukaan_db::models::{
    upsert_ledger_entry, upsert_payment_entry, upsert_stock_item, upsert_voucher, SyncLog,
    VoucherTable,
};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Counts reported back to the connector after a committed ingest.
#[derive(Debug, Clone, Copy)]
pub struct IngestOutcome {
    pub sales_count: i32,
    pub purchase_count: i32,
}

/// Ingests one payload for a store. All-or-nothing: either every record
/// lands and the run log says `success`, or nothing lands and a
/// `failed` row explains why.
pub async fn ingest(
    pool: &PgPool,
    store_id: Uuid,
    payload: &SyncPayload,
) -> Result<IngestOutcome, sqlx::Error> {
    let started_at = payload.sync_started_at.unwrap_or_else(Utc::now);
    let mut tx = pool.begin().await?;

    let result = apply(&mut tx, store_id, payload, started_at).await;
    match result {
        Ok(outcome) => match tx.commit().await {
            Ok(()) => {
                tracing::info!(
                    %store_id,
                    sales = outcome.sales_count,
                    purchases = outcome.purchase_count,
                    "Ingested sync payload"
                );
                Ok(outcome)
            }
            Err(e) => {
                log_failure(pool, store_id, payload, started_at, &e).await;
                Err(e)
            }
        },
        Err(e) => {
            if let Err(rb) = tx.rollback().await {
                tracing::error!("Rollback after failed ingest also failed: {}", rb);
            }
            log_failure(pool, store_id, payload, started_at, &e).await;
            Err(e)
        }
    }
}

async fn apply(
    tx: &mut Transaction<'_, Postgres>,
    store_id: Uuid,
    payload: &SyncPayload,
    started_at: chrono::DateTime<Utc>,
) -> Result<IngestOutcome, sqlx::Error> {
    let log_id = SyncLog::create_started(
        tx,
        store_id,
        started_at,
        payload.from_date,
        payload.to_date,
    )
    .await?;

    for voucher in &payload.sales_vouchers {
        upsert_voucher(tx, VoucherTable::Sales, store_id, voucher).await?;
    }
    for voucher in &payload.purchase_vouchers {
        upsert_voucher(tx, VoucherTable::Purchase, store_id, voucher).await?;
    }
    for snapshot in &payload.stock_items {
        upsert_stock_item(tx, store_id, snapshot).await?;
    }
    for balance in &payload.ledger_entries {
        if !LEDGER_GROUPS.contains(&balance.ledger_group.as_str()) {
            tracing::warn!(
                %store_id,
                ledger_group = %balance.ledger_group,
                "Dropping ledger balance outside the tracked groups"
            );
            continue;
        }
        upsert_ledger_entry(tx, store_id, balance).await?;
    }
    for entry in &payload.payment_entries {
        upsert_payment_entry(tx, store_id, entry).await?;
    }

    let sales_count = payload.sales_vouchers.len() as i32;
    let purchase_count = payload.purchase_vouchers.len() as i32;
    SyncLog::mark_success(tx, log_id, sales_count, purchase_count).await?;

    Ok(IngestOutcome {
        sales_count,
        purchase_count,
    })
}

async fn log_failure(
    pool: &PgPool,
    store_id: Uuid,
    payload: &SyncPayload,
    started_at: chrono::DateTime<Utc>,
    error: &sqlx::Error,
) {
    tracing::error!(%store_id, "Ingest failed: {}", error);
    if let Err(log_err) = SyncLog::record_failure(
        pool,
        store_id,
        started_at,
        Some(payload.from_date),
        Some(payload.to_date),
        &error.to_string(),
    )
    .await
    {
        tracing::error!("Could not record failed sync run: {}", log_err);
    }
}
