use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::{Config, StoreBackend};
use crate::versioning::{MemoryVersionStore, PgVersionStore, VersionStore};

/// Creates a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Opens the configured version store, creating tables when it is Postgres.
pub async fn open_version_store(config: &Config) -> Result<Arc<dyn VersionStore>> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres version store")?;
            let store = PgVersionStore::new(create_pool(url).await?);
            store
                .ensure_schema()
                .await
                .context("Failed to create version tables")?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory version store; history is lost on restart");
            Ok(Arc::new(MemoryVersionStore::new()))
        }
    }
}
