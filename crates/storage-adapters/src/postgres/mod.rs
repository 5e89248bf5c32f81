//! # PostgreSQL store
//!
//! This module implements the data mapping between the PostgreSQL relational
//! model and the `domains` models. One `PgStore` implements all three
//! repository ports over a shared pool.

mod reviews;
mod tools;
mod users;

use std::time::Duration;

use domains::{DomainError, DomainResult};
use sqlx::postgres::{PgPool, PgPoolOptions};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> DomainResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await
            .map_err(db_err)?;
        Ok(Self { pool })
    }

    /// Applies the embedded migrations in `migrations/`.
    pub async fn migrate(&self) -> DomainResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "migration failed");
                DomainError::storage(e.to_string())
            })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Logs and converts a driver error. Nothing is retried here.
pub(crate) fn db_err(e: sqlx::Error) -> DomainError {
    tracing::error!(error = %e, "database error");
    DomainError::storage(e.to_string())
}
