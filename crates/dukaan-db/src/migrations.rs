//! Database migration management.

use sqlx::PgPool;

use crate::error::DbError;

/// Runs all pending migrations. Migrations are embedded at compile
/// time from the `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Running database migrations");
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(DbError::MigrationFailed)?;
    tracing::info!("Migrations completed");
    Ok(())
}
