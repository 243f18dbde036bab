//! Postgres-backed ingestion tests.
//!
//! These run only when `TEST_DATABASE_URL` points at a disposable
//! Postgres database; without it each test is a no-op. Every test
//! provisions its own store, so row assertions are isolated even on a
//! shared database.

use chrono::NaiveDate;
use dukaan_api_sync::ingest::ingest;
use dukaan_core::{LedgerBalance, PaymentEntry, PaymentKind, StockSnapshot, SyncPayload, Voucher, VoucherItem};
use dukaan_db::models::Store;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("failed to connect to TEST_DATABASE_URL");
    dukaan_db::run_migrations(&pool)
        .await
        .expect("failed to run migrations");
    Some(pool)
}

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn item(name: &str, quantity: f64, rate: f64) -> VoucherItem {
    VoucherItem {
        item_name: name.to_string(),
        quantity,
        unit: "Bag".to_string(),
        rate,
        amount: quantity * rate,
        gst_rate: "18%".to_string(),
    }
}

fn voucher(number: &str, items: Vec<VoucherItem>) -> Voucher {
    let total: f64 = items.iter().map(|i| i.amount).sum();
    Voucher {
        voucher_number: number.to_string(),
        voucher_date: date("2025-03-02"),
        total_amount: total + 180.0,
        cgst_amount: 90.0,
        sgst_amount: 90.0,
        igst_amount: 0.0,
        items,
    }
}

fn payload(sales: Vec<Voucher>) -> SyncPayload {
    SyncPayload {
        from_date: date("2025-03-01"),
        to_date: date("2025-03-07"),
        connector_version: "0.1.0".to_string(),
        sync_started_at: None,
        sales_vouchers: sales,
        purchase_vouchers: vec![],
        stock_items: vec![],
        ledger_entries: vec![],
        payment_entries: vec![],
    }
}

async fn count(pool: &PgPool, sql: &str, store_id: Uuid) -> i64 {
    let (n,): (i64,) = sqlx::query_as(sql)
        .bind(store_id)
        .fetch_one(pool)
        .await
        .unwrap();
    n
}

#[tokio::test]
async fn double_ingest_leaves_identical_state() {
    let Some(pool) = test_pool().await else { return };
    let (store, _) = Store::create(&pool, "Idempotence Store").await.unwrap();

    let mut p = payload(vec![voucher("SV-101", vec![item("Rice 5kg", 2.0, 500.0)])]);
    p.stock_items = vec![StockSnapshot {
        item_name: "Rice 5kg".to_string(),
        item_group: "Grocery".to_string(),
        unit: "Bag".to_string(),
        closing_qty: 30.0,
        closing_rate: 500.0,
        closing_value: 15000.0,
        snapshot_date: date("2025-03-07"),
    }];
    p.ledger_entries = vec![
        LedgerBalance {
            ledger_group: "Cash-in-Hand".to_string(),
            closing_balance: 25000.0,
            snapshot_date: date("2025-03-07"),
        },
        // Outside the tracked groups; must be dropped, not stored.
        LedgerBalance {
            ledger_group: "Capital Account".to_string(),
            closing_balance: 90000.0,
            snapshot_date: date("2025-03-07"),
        },
    ];
    p.payment_entries = vec![PaymentEntry {
        voucher_number: "PMT-7".to_string(),
        voucher_date: date("2025-03-03"),
        payment_type: PaymentKind::Payment,
        bank_or_cash: "Cash".to_string(),
        amount: 2000.0,
    }];

    let first = ingest(&pool, store.store_id, &p).await.unwrap();
    let second = ingest(&pool, store.store_id, &p).await.unwrap();
    assert_eq!(first.sales_count, 1);
    assert_eq!(second.sales_count, 1);

    let headers = count(
        &pool,
        "SELECT COUNT(*) FROM sales_vouchers WHERE store_id = $1",
        store.store_id,
    )
    .await;
    assert_eq!(headers, 1);
    let items = count(
        &pool,
        "SELECT COUNT(*) FROM sales_voucher_items i \
         JOIN sales_vouchers v ON v.id = i.voucher_id WHERE v.store_id = $1",
        store.store_id,
    )
    .await;
    assert_eq!(items, 1);
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM stock_items WHERE store_id = $1", store.store_id).await,
        1
    );
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM ledger_entries WHERE store_id = $1", store.store_id)
            .await,
        1
    );
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM payment_entries WHERE store_id = $1", store.store_id)
            .await,
        1
    );

    let (total, cgst): (f64, f64) = sqlx::query_as(
        "SELECT total_amount, cgst_amount FROM sales_vouchers WHERE store_id = $1",
    )
    .bind(store.store_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(total, 1180.0);
    assert_eq!(cgst, 90.0);

    let (successes,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM sync_logs WHERE store_id = $1 AND status = 'success'",
    )
    .bind(store.store_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(successes, 2);
}

#[tokio::test]
async fn resync_with_fewer_items_replaces_line_items() {
    let Some(pool) = test_pool().await else { return };
    let (store, _) = Store::create(&pool, "Replace Store").await.unwrap();

    let long = payload(vec![voucher(
        "SV-200",
        vec![item("Rice 5kg", 2.0, 500.0), item("Sugar 1kg", 5.0, 45.0)],
    )]);
    ingest(&pool, store.store_id, &long).await.unwrap();

    let short = payload(vec![voucher("SV-200", vec![item("Rice 5kg", 1.0, 500.0)])]);
    ingest(&pool, store.store_id, &short).await.unwrap();

    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM sales_vouchers WHERE store_id = $1", store.store_id)
            .await,
        1
    );
    let rows: Vec<(String, f64)> = sqlx::query_as(
        "SELECT i.item_name, i.quantity FROM sales_voucher_items i \
         JOIN sales_vouchers v ON v.id = i.voucher_id WHERE v.store_id = $1",
    )
    .bind(store.store_id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(rows, vec![("Rice 5kg".to_string(), 1.0)]);
}

#[tokio::test]
async fn mid_batch_failure_rolls_back_and_records_failed_log() {
    let Some(pool) = test_pool().await else { return };
    let (store, _) = Store::create(&pool, "Rollback Store").await.unwrap();

    // Second voucher's item name exceeds the column width, so the
    // transaction fails after the first voucher has been written.
    let p = payload(vec![
        voucher("SV-300", vec![item("Rice 5kg", 2.0, 500.0)]),
        voucher("SV-301", vec![item(&"X".repeat(300), 1.0, 10.0)]),
    ]);
    let result = ingest(&pool, store.store_id, &p).await;
    assert!(result.is_err());

    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM sales_vouchers WHERE store_id = $1", store.store_id)
            .await,
        0
    );
    let logs: Vec<(String, Option<String>)> = sqlx::query_as(
        "SELECT status, error_message FROM sync_logs WHERE store_id = $1",
    )
    .bind(store.store_id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].0, "failed");
    assert!(logs[0].1.is_some());
}

#[tokio::test]
async fn stock_resync_updates_measurements_only() {
    let Some(pool) = test_pool().await else { return };
    let (store, _) = Store::create(&pool, "Stock Store").await.unwrap();

    let snapshot = |group: &str, unit: &str, qty: f64, rate: f64| StockSnapshot {
        item_name: "Atta 10kg".to_string(),
        item_group: group.to_string(),
        unit: unit.to_string(),
        closing_qty: qty,
        closing_rate: rate,
        closing_value: qty * rate,
        snapshot_date: date("2025-03-07"),
    };

    let mut p = payload(vec![]);
    p.stock_items = vec![snapshot("Grocery", "Bag", 10.0, 500.0)];
    ingest(&pool, store.store_id, &p).await.unwrap();

    p.stock_items = vec![snapshot("Changed", "Kg", 8.0, 450.0)];
    ingest(&pool, store.store_id, &p).await.unwrap();

    let (group, unit, qty, rate, value): (String, String, f64, f64, f64) = sqlx::query_as(
        "SELECT item_group, unit, closing_qty, closing_rate, closing_value \
         FROM stock_items WHERE store_id = $1",
    )
    .bind(store.store_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(qty, 8.0);
    assert_eq!(rate, 450.0);
    assert_eq!(value, 3600.0);
    assert_eq!(group, "Grocery");
    assert_eq!(unit, "Bag");
}
