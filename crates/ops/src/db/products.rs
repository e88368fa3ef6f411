//! Catalog reads and the featured-flag writes performed by curation.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tidewater_core::ProductId;

use super::RepositoryError;

/// A catalog product, as far as the ops service cares.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Whether the product is sellable.
    pub active: bool,
    /// Units currently in stock.
    pub stock: i32,
    /// Restock threshold configured by merchandising.
    pub min_stock: i32,
    /// Whether the product is currently featured on the storefront.
    pub featured: bool,
    /// Current list price.
    pub price: Decimal,
}

impl Product {
    /// Whether this product should appear in a low-stock alert.
    /// `stock == 0` is covered as the extreme case of the comparison.
    #[must_use]
    pub const fn needs_restock(&self) -> bool {
        self.active && self.stock <= self.min_stock
    }
}

/// Active products at or below their restock threshold, most depleted
/// first, capped to keep the scan bounded on large catalogs.
///
/// # Errors
///
/// Returns error if the query fails.
pub async fn low_stock_active(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<Product>, RepositoryError> {
    let products = sqlx::query_as(
        "SELECT id, name, active, stock, min_stock, featured, price \
         FROM products \
         WHERE active AND stock <= min_stock \
         ORDER BY stock, id \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(products)
}

/// Number of active products.
///
/// # Errors
///
/// Returns error if the query fails.
pub async fn active_count(pool: &PgPool) -> Result<i64, RepositoryError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE active")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// IDs of all currently featured products.
///
/// # Errors
///
/// Returns error if the query fails.
pub async fn featured_ids(pool: &PgPool) -> Result<Vec<ProductId>, RepositoryError> {
    let rows: Vec<(i64,)> = sqlx::query_as("SELECT id FROM products WHERE featured ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|(id,)| ProductId::new(id)).collect())
}

/// Names for a set of products, in the order given (missing IDs skipped).
///
/// # Errors
///
/// Returns error if the query fails.
pub async fn names_for(
    pool: &PgPool,
    ids: &[ProductId],
) -> Result<Vec<(ProductId, String)>, RepositoryError> {
    let raw: Vec<i64> = ids.iter().map(|id| id.as_i64()).collect();
    let rows: Vec<(i64, String)> = sqlx::query_as(
        "SELECT id, name FROM products WHERE id = ANY($1) ORDER BY array_position($1, id)",
    )
    .bind(&raw)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(id, name)| (ProductId::new(id), name))
        .collect())
}

/// Apply a featured-flag diff in one transaction: unset products that left
/// the curated set, set products that entered it. Computing the diff first
/// and applying it atomically closes the lost-update window a separate
/// clear-all-then-set sequence would leave open.
///
/// # Errors
///
/// Returns error if either update or the commit fails.
pub async fn apply_featured_diff(
    pool: &PgPool,
    to_clear: &[ProductId],
    to_set: &[ProductId],
) -> Result<(), RepositoryError> {
    let clear_raw: Vec<i64> = to_clear.iter().map(|id| id.as_i64()).collect();
    let set_raw: Vec<i64> = to_set.iter().map(|id| id.as_i64()).collect();

    let mut tx = pool.begin().await?;

    if !clear_raw.is_empty() {
        sqlx::query("UPDATE products SET featured = FALSE WHERE id = ANY($1)")
            .bind(&clear_raw)
            .execute(&mut *tx)
            .await?;
    }
    if !set_raw.is_empty() {
        sqlx::query("UPDATE products SET featured = TRUE WHERE id = ANY($1)")
            .bind(&set_raw)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i32, min_stock: i32, active: bool) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Enamel Mug".to_string(),
            active,
            stock,
            min_stock,
            featured: false,
            price: Decimal::new(1800, 2),
        }
    }

    #[test]
    fn test_needs_restock() {
        // out of stock is the extreme case of stock <= min_stock
        assert!(product(0, 5, true).needs_restock());
        assert!(product(3, 5, true).needs_restock());
        assert!(product(5, 5, true).needs_restock());
        assert!(!product(10, 5, true).needs_restock());
    }

    #[test]
    fn test_inactive_products_never_flagged() {
        assert!(!product(0, 5, false).needs_restock());
    }
}
