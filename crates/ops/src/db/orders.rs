//! Read access to transactional orders.
//!
//! Orders are immutable from this service's point of view: status
//! transitions happen in the order-management flow, we only aggregate.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tidewater_core::{
    CustomerKey, DateWindow, Email, FulfillmentStatus, LineItem, OrderId, PaymentStatus, UserId,
};

use super::{RepositoryError, parse_items};

/// A validated order.
#[derive(Debug, Clone)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Account reference, if the customer was logged in.
    pub user_id: Option<UserId>,
    /// Customer email (always present for guest checkout).
    pub email: Option<Email>,
    /// Line items.
    pub items: Vec<LineItem>,
    /// Order total.
    pub total: Decimal,
    /// Shipping cost.
    pub shipping_cost: Decimal,
    /// Discount amount applied.
    pub discount_amount: Decimal,
    /// Payment status.
    pub payment_status: PaymentStatus,
    /// Fulfillment status.
    pub fulfillment_status: FulfillmentStatus,
    /// Payment method label (e.g. "card", "paypal").
    pub payment_method: Option<String>,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Grouping key for customer-level aggregation (account preferred,
    /// email fallback).
    #[must_use]
    pub fn customer_key(&self) -> Option<CustomerKey> {
        CustomerKey::from_parts(self.user_id, self.email.as_ref())
    }

    /// Whether this order counts toward revenue: paid, and fulfillment has
    /// progressed past pending without being cancelled.
    #[must_use]
    pub const fn counts_toward_revenue(&self) -> bool {
        matches!(self.payment_status, PaymentStatus::Paid)
            && self.fulfillment_status.qualifies_for_revenue()
    }
}

/// Raw row as stored.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: Option<i64>,
    customer_email: Option<String>,
    items: serde_json::Value,
    total: Decimal,
    shipping_cost: Decimal,
    discount_amount: Decimal,
    payment_status: String,
    fulfillment_status: String,
    payment_method: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let payment_status = row.payment_status.parse().map_err(|e: String| {
            RepositoryError::DataCorruption(format!("orders row {}: {e}", row.id))
        })?;
        let fulfillment_status = row.fulfillment_status.parse().map_err(|e: String| {
            RepositoryError::DataCorruption(format!("orders row {}: {e}", row.id))
        })?;
        let email = row
            .customer_email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("orders row {}: {e}", row.id))
            })?;
        let items = parse_items(row.items, "orders", row.id)?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: row.user_id.map(UserId::new),
            email,
            items,
            total: row.total,
            shipping_cost: row.shipping_cost,
            discount_amount: row.discount_amount,
            payment_status,
            fulfillment_status,
            payment_method: row.payment_method,
            created_at: row.created_at,
        })
    }
}

const SELECT_COLUMNS: &str = "id, user_id, customer_email, items, total, shipping_cost, \
     discount_amount, payment_status, fulfillment_status, payment_method, created_at";

fn collect(rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
    rows.into_iter().map(Order::try_from).collect()
}

/// All orders created inside the window, oldest first.
///
/// # Errors
///
/// Returns error if the query fails or a row fails validation.
pub async fn created_in_window(
    pool: &PgPool,
    window: &DateWindow,
) -> Result<Vec<Order>, RepositoryError> {
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM orders \
         WHERE ($1::timestamptz IS NULL OR created_at >= $1) \
           AND ($2::timestamptz IS NULL OR created_at <= $2) \
         ORDER BY created_at"
    );
    let rows: Vec<OrderRow> = sqlx::query_as(&sql)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(pool)
        .await?;
    collect(rows)
}

/// Paid orders with a qualifying fulfillment status inside the window,
/// oldest first.
///
/// # Errors
///
/// Returns error if the query fails or a row fails validation.
pub async fn paid_fulfilled_in_window(
    pool: &PgPool,
    window: &DateWindow,
) -> Result<Vec<Order>, RepositoryError> {
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM orders \
         WHERE payment_status = 'paid' \
           AND fulfillment_status IN ('processing', 'shipped', 'delivered') \
           AND ($1::timestamptz IS NULL OR created_at >= $1) \
           AND ($2::timestamptz IS NULL OR created_at <= $2) \
         ORDER BY created_at"
    );
    let rows: Vec<OrderRow> = sqlx::query_as(&sql)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(pool)
        .await?;
    collect(rows)
}

/// Most recent paid + fulfilled orders inside the window, capped.
///
/// Used by scans that must bound their batch size.
///
/// # Errors
///
/// Returns error if the query fails or a row fails validation.
pub async fn recent_paid_fulfilled(
    pool: &PgPool,
    window: &DateWindow,
    limit: i64,
) -> Result<Vec<Order>, RepositoryError> {
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM orders \
         WHERE payment_status = 'paid' \
           AND fulfillment_status IN ('processing', 'shipped', 'delivered') \
           AND ($1::timestamptz IS NULL OR created_at >= $1) \
           AND ($2::timestamptz IS NULL OR created_at <= $2) \
         ORDER BY created_at DESC \
         LIMIT $3"
    );
    let rows: Vec<OrderRow> = sqlx::query_as(&sql)
        .bind(window.start)
        .bind(window.end)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    collect(rows)
}

/// Count of customers whose first qualifying order ever falls inside the
/// window.
///
/// # Errors
///
/// Returns error if the query fails.
pub async fn new_customer_count(
    pool: &PgPool,
    window: &DateWindow,
) -> Result<i64, RepositoryError> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM ( \
             SELECT COALESCE(user_id::text, lower(customer_email)) AS customer, \
                    MIN(created_at) AS first_order \
             FROM orders \
             WHERE payment_status = 'paid' \
               AND fulfillment_status IN ('processing', 'shipped', 'delivered') \
               AND (user_id IS NOT NULL OR customer_email IS NOT NULL) \
             GROUP BY 1 \
         ) firsts \
         WHERE ($1::timestamptz IS NULL OR first_order >= $1) \
           AND ($2::timestamptz IS NULL OR first_order <= $2)",
    )
    .bind(window.start)
    .bind(window.end)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(payment: &str, fulfillment: &str) -> OrderRow {
        OrderRow {
            id: 1,
            user_id: Some(10),
            customer_email: Some("Customer@Example.com".to_string()),
            items: json!([{"product_id": 5, "quantity": 1, "unit_price": "20.00"}]),
            total: Decimal::new(2000, 2),
            shipping_cost: Decimal::new(500, 2),
            discount_amount: Decimal::ZERO,
            payment_status: payment.to_string(),
            fulfillment_status: fulfillment.to_string(),
            payment_method: Some("card".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_conversion() {
        let order = Order::try_from(row("paid", "shipped")).expect("valid row");
        assert_eq!(order.id, OrderId::new(1));
        assert_eq!(order.user_id, Some(UserId::new(10)));
        // emails are normalized at the boundary
        assert_eq!(
            order.email.as_ref().map(Email::as_str),
            Some("customer@example.com")
        );
        assert_eq!(order.items.len(), 1);
        assert!(order.counts_toward_revenue());
    }

    #[test]
    fn test_row_conversion_rejects_unknown_status() {
        let err = Order::try_from(row("refunded", "shipped")).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));

        let err = Order::try_from(row("paid", "teleported")).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }

    #[test]
    fn test_row_conversion_rejects_malformed_items() {
        let mut bad = row("paid", "shipped");
        bad.items = json!("not-a-list");
        let err = Order::try_from(bad).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }

    #[test]
    fn test_customer_key_prefers_account() {
        let order = Order::try_from(row("paid", "shipped")).expect("valid row");
        assert_eq!(
            order.customer_key(),
            Some(CustomerKey::Account(UserId::new(10)))
        );

        let mut guest = row("paid", "shipped");
        guest.user_id = None;
        let order = Order::try_from(guest).expect("valid row");
        assert!(matches!(order.customer_key(), Some(CustomerKey::Guest(_))));
    }

    #[test]
    fn test_counts_toward_revenue() {
        assert!(!Order::try_from(row("unpaid", "shipped"))
            .expect("valid row")
            .counts_toward_revenue());
        assert!(!Order::try_from(row("paid", "pending"))
            .expect("valid row")
            .counts_toward_revenue());
        assert!(!Order::try_from(row("paid", "cancelled"))
            .expect("valid row")
            .counts_toward_revenue());
    }
}
