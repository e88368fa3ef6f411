//! Abandoned cart storage: reads for recovery/metrics, hard delete for
//! retention cleanup.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tidewater_core::{CartId, CartStatus, DateWindow, Email, LineItem, UserId, items_total};

use super::{RepositoryError, parse_items};

/// A validated abandoned cart.
#[derive(Debug, Clone)]
pub struct AbandonedCart {
    /// Unique cart ID.
    pub id: CartId,
    /// Account reference, if the customer was logged in.
    pub user_id: Option<UserId>,
    /// Customer email, when known.
    pub email: Option<Email>,
    /// Items left in the cart.
    pub items: Vec<LineItem>,
    /// Lifecycle status.
    pub status: CartStatus,
    /// When the cart was created.
    pub created_at: DateTime<Utc>,
    /// When the cart was last touched.
    pub updated_at: DateTime<Utc>,
}

impl AbandonedCart {
    /// Value of the items left behind.
    #[must_use]
    pub fn cart_total(&self) -> Decimal {
        items_total(&self.items)
    }
}

/// Raw row as stored.
#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: i64,
    user_id: Option<i64>,
    customer_email: Option<String>,
    items: serde_json::Value,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartRow> for AbandonedCart {
    type Error = RepositoryError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(|e: String| {
            RepositoryError::DataCorruption(format!("abandoned_carts row {}: {e}", row.id))
        })?;
        let email = row
            .customer_email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("abandoned_carts row {}: {e}", row.id))
            })?;
        let items = parse_items(row.items, "abandoned_carts", row.id)?;

        Ok(Self {
            id: CartId::new(row.id),
            user_id: row.user_id.map(UserId::new),
            email,
            items,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = "id, user_id, customer_email, items, status, created_at, updated_at";

fn collect(rows: Vec<CartRow>) -> Result<Vec<AbandonedCart>, RepositoryError> {
    rows.into_iter().map(AbandonedCart::try_from).collect()
}

/// All carts created inside the window, oldest first.
///
/// # Errors
///
/// Returns error if the query fails or a row fails validation.
pub async fn created_in_window(
    pool: &PgPool,
    window: &DateWindow,
) -> Result<Vec<AbandonedCart>, RepositoryError> {
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM abandoned_carts \
         WHERE ($1::timestamptz IS NULL OR created_at >= $1) \
           AND ($2::timestamptz IS NULL OR created_at <= $2) \
         ORDER BY created_at"
    );
    let rows: Vec<CartRow> = sqlx::query_as(&sql)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(pool)
        .await?;
    collect(rows)
}

/// Abandoned carts whose creation and last update are both older than the
/// cutoff and that still contain items, oldest first, capped.
///
/// Oldest-first ordering keeps recovery reminders fair: a cart that has
/// waited longest is contacted first when a batch fills up.
///
/// # Errors
///
/// Returns error if the query fails or a row fails validation.
pub async fn stale_abandoned(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<AbandonedCart>, RepositoryError> {
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM abandoned_carts \
         WHERE status = 'abandoned' \
           AND created_at < $1 \
           AND updated_at < $1 \
           AND jsonb_array_length(items) > 0 \
         ORDER BY updated_at \
         LIMIT $2"
    );
    let rows: Vec<CartRow> = sqlx::query_as(&sql)
        .bind(cutoff)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    collect(rows)
}

/// Hard-delete carts whose last update is older than the cutoff. Returns
/// the number of rows removed. Irreversible.
///
/// # Errors
///
/// Returns error if the delete fails.
pub async fn delete_stale(pool: &PgPool, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
    let result = sqlx::query("DELETE FROM abandoned_carts WHERE updated_at < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
