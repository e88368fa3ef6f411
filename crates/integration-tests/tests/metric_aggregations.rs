//! Integration tests for the metric aggregations, exercised over
//! hand-built order and cart rows.

use chrono::{FixedOffset, TimeZone, Utc};
use rust_decimal::Decimal;
use tidewater_core::{
    CartId, CartStatus, CustomerKey, Email, FulfillmentStatus, LineItem, OrderId, PaymentStatus,
    ProductId, UserId,
};
use tidewater_ops::db::carts::AbandonedCart;
use tidewater_ops::db::orders::Order;
use tidewater_ops::metrics::{clv, conversion, funnel, revenue};

fn order(id: i64, user: Option<i64>, email: Option<&str>, total: i64, day: u32) -> Order {
    Order {
        id: OrderId::new(id),
        user_id: user.map(UserId::new),
        email: email.map(|e| Email::parse(e).expect("valid email")),
        items: vec![LineItem::new(ProductId::new(1), 1, Decimal::from(total))],
        total: Decimal::from(total),
        shipping_cost: Decimal::from(5),
        discount_amount: Decimal::from(1),
        payment_status: PaymentStatus::Paid,
        fulfillment_status: FulfillmentStatus::Delivered,
        payment_method: Some("card".to_string()),
        created_at: Utc.with_ymd_and_hms(2025, 6, day, 9, 0, 0).unwrap(),
    }
}

fn cart(id: i64, email: Option<&str>, status: CartStatus) -> AbandonedCart {
    AbandonedCart {
        id: CartId::new(id),
        user_id: None,
        email: email.map(|e| Email::parse(e).expect("valid email")),
        items: vec![],
        status,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn test_clv_for_two_orders() {
    // two qualifying orders of 1000 and 2000 for the same account
    let orders = vec![
        order(1, Some(42), None, 1000, 1),
        order(2, Some(42), None, 2000, 15),
    ];
    let report = clv::aggregate(&orders, None);

    assert_eq!(report.total_customers, 1);
    assert_eq!(report.average_clv, Decimal::from(3000));

    let customer = &report.customers[0];
    assert_eq!(customer.customer, CustomerKey::Account(UserId::new(42)));
    assert_eq!(customer.total_spent, Decimal::from(3000));
    assert_eq!(customer.order_count, 2);
    assert_eq!(customer.average_order_value, Decimal::from(1500));
    assert_eq!(customer.lifetime_days, 14);
}

#[test]
fn test_conversion_rate_zero_visitors_is_zero_not_nan() {
    let report = conversion::aggregate(&[], &[]);
    assert_eq!(report.total_visitors, 0);
    assert!(report.conversion_rate.is_finite());
    assert!((report.conversion_rate - 0.0).abs() < f64::EPSILON);
}

#[test]
fn test_revenue_total_matches_qualifying_orders() {
    let mut unpaid = order(3, None, Some("u@example.com"), 700, 3);
    unpaid.payment_status = PaymentStatus::Unpaid;

    let orders = vec![
        order(1, Some(1), None, 100, 1),
        order(2, Some(2), None, 250, 2),
        unpaid,
    ];
    let report = revenue::aggregate(
        &orders,
        revenue::RevenueGrouping::Day,
        FixedOffset::east_opt(0).expect("valid offset"),
    );

    // exactly the paid + fulfilled orders sum in
    assert_eq!(report.total_revenue, Decimal::from(350));
    assert_eq!(report.total_orders, 2);
    assert_eq!(report.net_revenue, Decimal::from(348));
}

#[test]
fn test_funnel_counts_never_increase() {
    let mut unpaid = order(4, None, None, 10, 4);
    unpaid.payment_status = PaymentStatus::Unpaid;
    unpaid.fulfillment_status = FulfillmentStatus::Pending;
    let mut shipped = order(5, None, None, 10, 5);
    shipped.fulfillment_status = FulfillmentStatus::Shipped;

    let orders = vec![order(1, Some(1), None, 10, 1), unpaid, shipped];
    let carts = vec![
        cart(1, Some("a@example.com"), CartStatus::Abandoned),
        cart(2, None, CartStatus::Recovered),
    ];
    let report = funnel::build(&orders, &carts);

    assert_eq!(report.stages.len(), 5);
    let counts: Vec<u64> = report.stages.iter().map(|s| s.count).collect();
    for pair in counts.windows(2) {
        assert!(pair[1] <= pair[0], "funnel stages must not grow: {counts:?}");
    }
    // visitors = 2 carts + 3 orders
    assert_eq!(counts[0], 5);
    // delivered = 1
    assert_eq!(counts[4], 1);
}

#[test]
fn test_clv_and_conversion_respect_customer_email_normalization() {
    // same address, different spellings: one visitor, one guest customer
    let orders = vec![order(1, None, Some("Shopper@Example.com"), 100, 1)];
    let carts = vec![cart(1, Some("shopper@example.com"), CartStatus::Abandoned)];

    let conversion = conversion::aggregate(&orders, &carts);
    assert_eq!(conversion.total_visitors, 1);

    let clv = clv::aggregate(&orders, None);
    assert_eq!(clv.total_customers, 1);
}
