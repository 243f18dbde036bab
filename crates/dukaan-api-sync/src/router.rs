//! Sync endpoint routing.

use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use dukaan_core::SyncPayload;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::authenticate;
use crate::error::ApiError;
use crate::ingest::ingest;

/// Shared state for the sync endpoints.
#[derive(Clone)]
pub struct SyncState {
    pub pool: PgPool,
}

/// Response body for an accepted payload.
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub status: String,
    pub sales_count: i32,
    pub purchase_count: i32,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub store_id: Uuid,
}

/// Builds the `/sync` router. Both endpoints require a valid API key.
pub fn sync_router(pool: PgPool) -> Router {
    Router::new()
        .route("/sync", post(receive_sync))
        .route("/sync/health", post(sync_health))
        .with_state(SyncState { pool })
}

/// `POST /sync`: authenticate, ingest the payload transactionally,
/// report the stored counts.
async fn receive_sync(
    State(state): State<SyncState>,
    headers: HeaderMap,
    Json(payload): Json<SyncPayload>,
) -> Result<Json<SyncResponse>, ApiError> {
    let store = authenticate(&state.pool, &headers).await?;
    tracing::info!(
        store_id = %store.store_id,
        records = payload.record_count(),
        from = %payload.from_date,
        to = %payload.to_date,
        "Received sync payload"
    );
    let outcome = ingest(&state.pool, store.store_id, &payload)
        .await
        .map_err(|e| ApiError::Database(e.to_string()))?;
    Ok(Json(SyncResponse {
        status: "success".to_string(),
        sales_count: outcome.sales_count,
        purchase_count: outcome.purchase_count,
    }))
}

/// `POST /sync/health`: credential probe used by the connector before
/// it starts exporting. Succeeds only for an active store.
async fn sync_health(
    State(state): State<SyncState>,
    headers: HeaderMap,
) -> Result<Json<HealthResponse>, ApiError> {
    let store = authenticate(&state.pool, &headers).await?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        store_id: store.store_id,
    }))
}
