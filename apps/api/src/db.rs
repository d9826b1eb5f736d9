use std::time::Duration;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

/// Tables this service reads or writes. Their schema is managed elsewhere.
const REQUIRED_TABLES: &[&str] = &["jobs", "documents", "job_bookmarks", "job_applications"];

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    warn_missing_tables(&pool).await?;
    Ok(pool)
}

/// Logs tables the service expects but cannot find. Requests touching them
/// will fail with a database error until the schema is applied.
async fn warn_missing_tables(pool: &PgPool) -> Result<()> {
    let present: Vec<String> = sqlx::query_scalar(
        "SELECT table_name::text FROM information_schema.tables WHERE table_name = ANY($1)",
    )
    .bind(REQUIRED_TABLES)
    .fetch_all(pool)
    .await?;

    for table in REQUIRED_TABLES {
        if !present.iter().any(|p| p == table) {
            warn!("Table '{table}' not found; apply the schema before serving traffic");
        }
    }
    Ok(())
}
