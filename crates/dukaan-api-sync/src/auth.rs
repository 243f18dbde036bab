//! API key authentication for connector endpoints.

use axum::http::HeaderMap;
use dukaan_db::models::Store;
use sqlx::PgPool;

use crate::error::ApiError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Resolves the `X-API-Key` header to an active store. The key is
/// hashed and compared server-side; plaintext keys are never stored or
/// logged.
pub async fn authenticate(pool: &PgPool, headers: &HeaderMap) -> Result<Store, ApiError> {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing X-API-Key header".to_string()))?;

    Store::find_by_api_key(pool, api_key)
        .await
        .map_err(|e| ApiError::Database(e.to_string()))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid or inactive API key".to_string()))
}
