//! Database operations for the ops `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `orders` - Transactional orders (read-only from this service)
//! - `abandoned_carts` - Carts left behind without checkout (read + cleanup)
//! - `products` - Catalog rows (read; featured flag written by curation job)
//! - `metric_snapshots` - Append-only computed metric records
//!
//! Row structs mirror the tables and are converted into validated domain
//! types at this boundary; malformed stored data (unknown status strings,
//! bad item blobs) surfaces as [`RepositoryError::DataCorruption`] instead
//! of leaking into job logic.
//!
//! # Migrations
//!
//! Migrations live in `crates/ops/migrations/` and run via `sqlx migrate`.

pub mod carts;
pub mod orders;
pub mod products;
pub mod snapshots;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Parse a JSONB item blob into validated line items.
///
/// Shared by the orders and carts repositories; both tables store their
/// line items as a JSON array of `{product_id, quantity, unit_price}`.
pub(crate) fn parse_items(
    value: serde_json::Value,
    table: &str,
    row_id: i64,
) -> Result<Vec<tidewater_core::LineItem>, RepositoryError> {
    serde_json::from_value(value).map_err(|e| {
        RepositoryError::DataCorruption(format!("{table} row {row_id} has malformed items: {e}"))
    })
}
