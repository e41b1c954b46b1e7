use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    config::DatabaseConfig,
    error::{AppError, Result},
};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connects and brings the schema up to date before any handler runs.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&config.url)
        .await?;

    run_migrations(&pool).await?;

    tracing::info!(
        max_connections = config.max_connections,
        "Catalog database ready"
    );

    Ok(pool)
}

async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!()
        .run(pool)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to run migrations: {}", e)))
}

pub async fn check_health(pool: &PgPool) -> Result<()> {
    let alive: i32 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;

    if alive == 1 {
        Ok(())
    } else {
        Err(AppError::InternalError("Unexpected health check result".to_string()))
    }
}
