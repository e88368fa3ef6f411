//! Customer lifetime value aggregation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tidewater_core::CustomerKey;

use crate::db::orders::Order;

/// How many top customers a report carries when no single customer is
/// requested.
pub const TOP_CUSTOMERS: usize = 10;

/// Lifetime value of a single customer.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerValue {
    /// Grouping key (account or guest email).
    pub customer: CustomerKey,
    /// Total spent across qualifying orders.
    pub total_spent: Decimal,
    /// Number of qualifying orders.
    pub order_count: u64,
    /// Mean order value for this customer.
    pub average_order_value: Decimal,
    /// First qualifying purchase.
    pub first_purchase: DateTime<Utc>,
    /// Most recent qualifying purchase.
    pub last_purchase: DateTime<Utc>,
    /// Whole days between first and last purchase (0 for a single order).
    pub lifetime_days: i64,
}

/// Aggregated lifetime-value report.
#[derive(Debug, Clone, Serialize)]
pub struct ClvReport {
    /// Mean lifetime value across all customers (0 when there are none).
    pub average_clv: Decimal,
    /// Number of distinct customers with qualifying orders.
    pub total_customers: u64,
    /// Revenue summed over all qualifying orders.
    pub total_revenue: Decimal,
    /// Mean of per-customer average order values.
    pub average_order_value: Decimal,
    /// The single requested customer, or the top customers by value.
    pub customers: Vec<CustomerValue>,
}

/// Aggregate lifetime value over a set of orders.
///
/// Only paid orders in a qualifying fulfillment status participate. Orders
/// are grouped by [`CustomerKey`]: the account reference when present,
/// otherwise the customer email. An account order and a guest order with
/// the same email stay two distinct customers; orders with neither
/// identity are skipped.
///
/// When `customer` is given, `customers` holds just that customer's record
/// (empty if they have no qualifying orders); the summary figures still
/// cover everyone.
#[must_use]
pub fn aggregate(orders: &[Order], customer: Option<&CustomerKey>) -> ClvReport {
    let mut groups: HashMap<CustomerKey, Vec<&Order>> = HashMap::new();
    for order in orders.iter().filter(|o| o.counts_toward_revenue()) {
        if let Some(key) = order.customer_key() {
            groups.entry(key).or_default().push(order);
        }
    }

    let mut values: Vec<CustomerValue> = groups
        .into_iter()
        .map(|(key, orders)| customer_value(key, &orders))
        .collect();

    let total_customers = values.len() as u64;
    let total_revenue: Decimal = values.iter().map(|v| v.total_spent).sum();
    let customer_count = Decimal::from(total_customers);

    let average_clv = if total_customers == 0 {
        Decimal::ZERO
    } else {
        total_revenue / customer_count
    };
    let average_order_value = if total_customers == 0 {
        Decimal::ZERO
    } else {
        values.iter().map(|v| v.average_order_value).sum::<Decimal>() / customer_count
    };

    // Highest value first; ties broken by key so output is stable.
    values.sort_by(|a, b| {
        b.total_spent
            .cmp(&a.total_spent)
            .then_with(|| a.customer.to_string().cmp(&b.customer.to_string()))
    });

    let customers = match customer {
        Some(key) => values.into_iter().filter(|v| &v.customer == key).collect(),
        None => {
            values.truncate(TOP_CUSTOMERS);
            values
        }
    };

    ClvReport {
        average_clv,
        total_customers,
        total_revenue,
        average_order_value,
        customers,
    }
}

fn customer_value(customer: CustomerKey, orders: &[&Order]) -> CustomerValue {
    let total_spent: Decimal = orders.iter().map(|o| o.total).sum();
    let order_count = orders.len() as u64;
    let first_purchase = orders
        .iter()
        .map(|o| o.created_at)
        .min()
        .unwrap_or_default();
    let last_purchase = orders
        .iter()
        .map(|o| o.created_at)
        .max()
        .unwrap_or_default();

    CustomerValue {
        customer,
        total_spent,
        average_order_value: total_spent / Decimal::from(order_count.max(1)),
        order_count,
        first_purchase,
        last_purchase,
        lifetime_days: (last_purchase - first_purchase).num_days(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use tidewater_core::{
        Email, FulfillmentStatus, OrderId, PaymentStatus, UserId,
    };

    use super::*;

    fn order(
        id: i64,
        user_id: Option<i64>,
        email: Option<&str>,
        total: i64,
        day: u32,
    ) -> Order {
        Order {
            id: OrderId::new(id),
            user_id: user_id.map(UserId::new),
            email: email.map(|e| Email::parse(e).expect("valid email")),
            items: vec![],
            total: Decimal::from(total),
            shipping_cost: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            payment_status: PaymentStatus::Paid,
            fulfillment_status: FulfillmentStatus::Delivered,
            payment_method: Some("card".to_string()),
            created_at: Utc.with_ymd_and_hms(2025, 6, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_single_customer_clv() {
        let orders = vec![
            order(1, Some(7), None, 1000, 1),
            order(2, Some(7), None, 2000, 11),
        ];
        let report = aggregate(&orders, None);

        assert_eq!(report.total_customers, 1);
        assert_eq!(report.total_revenue, Decimal::from(3000));
        assert_eq!(report.average_clv, Decimal::from(3000));

        let customer = &report.customers[0];
        assert_eq!(customer.total_spent, Decimal::from(3000));
        assert_eq!(customer.order_count, 2);
        assert_eq!(customer.average_order_value, Decimal::from(1500));
        assert_eq!(customer.lifetime_days, 10);
    }

    #[test]
    fn test_single_order_lifetime_is_zero_days() {
        let orders = vec![order(1, Some(7), None, 500, 5)];
        let report = aggregate(&orders, None);
        assert_eq!(report.customers[0].lifetime_days, 0);
    }

    #[test]
    fn test_account_and_guest_not_unified() {
        // Same email, one order with an account and one without: two
        // customers. Known limitation carried over deliberately.
        let orders = vec![
            order(1, Some(7), Some("same@example.com"), 100, 1),
            order(2, None, Some("same@example.com"), 200, 2),
        ];
        let report = aggregate(&orders, None);
        assert_eq!(report.total_customers, 2);
    }

    #[test]
    fn test_unqualified_orders_excluded() {
        let mut unpaid = order(1, Some(7), None, 999, 1);
        unpaid.payment_status = PaymentStatus::Unpaid;
        let mut pending = order(2, Some(8), None, 999, 1);
        pending.fulfillment_status = FulfillmentStatus::Pending;

        let report = aggregate(&[unpaid, pending], None);
        assert_eq!(report.total_customers, 0);
        assert_eq!(report.average_clv, Decimal::ZERO);
        assert_eq!(report.total_revenue, Decimal::ZERO);
    }

    #[test]
    fn test_orders_without_identity_skipped() {
        let report = aggregate(&[order(1, None, None, 500, 1)], None);
        assert_eq!(report.total_customers, 0);
    }

    #[test]
    fn test_top_customers_sorted_and_capped() {
        let orders: Vec<Order> = (1..=12)
            .map(|i| order(i, Some(i), None, i * 100, 1))
            .collect();
        let report = aggregate(&orders, None);

        assert_eq!(report.total_customers, 12);
        assert_eq!(report.customers.len(), TOP_CUSTOMERS);
        // descending by value
        assert_eq!(report.customers[0].total_spent, Decimal::from(1200));
        assert_eq!(report.customers[9].total_spent, Decimal::from(300));
    }

    #[test]
    fn test_customer_filter_returns_single_record() {
        let orders = vec![
            order(1, Some(7), None, 1000, 1),
            order(2, Some(8), None, 5000, 1),
        ];
        let key = CustomerKey::Account(UserId::new(7));
        let report = aggregate(&orders, Some(&key));

        assert_eq!(report.customers.len(), 1);
        assert_eq!(report.customers[0].customer, key);
        // summary still covers everyone
        assert_eq!(report.total_customers, 2);
        assert_eq!(report.total_revenue, Decimal::from(6000));
    }

    #[test]
    fn test_customer_filter_unknown_customer() {
        let orders = vec![order(1, Some(7), None, 1000, 1)];
        let key = CustomerKey::Account(UserId::new(99));
        let report = aggregate(&orders, Some(&key));
        assert!(report.customers.is_empty());
    }

    #[test]
    fn test_average_order_value_is_mean_of_customer_averages() {
        // customer 1: aov 150; customer 2: aov 50 -> mean 100
        let orders = vec![
            order(1, Some(1), None, 100, 1),
            order(2, Some(1), None, 200, 2),
            order(3, Some(2), None, 50, 1),
        ];
        let report = aggregate(&orders, None);
        assert_eq!(report.average_order_value, Decimal::from(100));
    }
}
