//! Store (tenant) model and provisioning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::api_key::{generate_api_key, hash_api_key};

/// A provisioned store. The API key itself is never stored, only its
/// SHA-256 hash.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Store {
    pub store_id: Uuid,
    pub store_name: String,
    #[serde(skip_serializing)]
    pub api_key_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Store {
    /// Provisions a store and returns it together with the plaintext
    /// API key. The key is shown once and cannot be recovered later.
    pub async fn create(pool: &PgPool, store_name: &str) -> Result<(Self, String), sqlx::Error> {
        let api_key = generate_api_key();
        let store = sqlx::query_as(
            r#"
            INSERT INTO stores (store_name, api_key_hash)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(store_name)
        .bind(hash_api_key(&api_key))
        .fetch_one(pool)
        .await?;
        Ok((store, api_key))
    }

    /// Resolves an inbound plaintext key to its active store, if any.
    pub async fn find_by_api_key(pool: &PgPool, api_key: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM stores
            WHERE api_key_hash = $1 AND is_active = TRUE
            "#,
        )
        .bind(hash_api_key(api_key))
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, store_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM stores WHERE store_id = $1")
            .bind(store_id)
            .fetch_optional(pool)
            .await
    }

    /// Disables a store; its key stops authenticating.
    pub async fn deactivate(pool: &PgPool, store_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE stores SET is_active = FALSE WHERE store_id = $1")
            .bind(store_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
