//! Sales funnel construction.
//!
//! On-demand report; unlike the other aggregations it never writes a
//! snapshot.

use serde::Serialize;
use tidewater_core::{FulfillmentStatus, PaymentStatus};

use crate::db::carts::AbandonedCart;
use crate::db::orders::Order;

use super::conversion::percentage;

/// One stage of the funnel.
#[derive(Debug, Clone, Serialize)]
pub struct FunnelStage {
    /// Stage label.
    pub name: &'static str,
    /// Entities that reached this stage.
    pub count: u64,
    /// Share of the previous stage that reached this one (100 for the
    /// first stage, 0 when the previous stage was empty).
    pub percentage: f64,
    /// How many were lost between the previous stage and this one.
    pub drop_off: u64,
}

/// Five-stage funnel over one window.
#[derive(Debug, Clone, Serialize)]
pub struct FunnelReport {
    /// Stages in order: visitors, added to cart, initiated checkout,
    /// completed order, delivered.
    pub stages: Vec<FunnelStage>,
    /// `delivered / visitors * 100`.
    pub overall_conversion: f64,
    /// Stage with the largest drop-off (first on ties), if any loss
    /// occurred.
    pub biggest_drop_off: Option<&'static str>,
}

/// Build the funnel from orders and carts created in the window.
///
/// The visitor estimate is carts-created plus orders-created; "added to
/// cart" equals it by construction (every visitor we can see put
/// something in a cart or ordered), which keeps the stage counts
/// monotonically non-increasing.
#[must_use]
pub fn build(orders: &[Order], carts: &[AbandonedCart]) -> FunnelReport {
    let visitors = (carts.len() + orders.len()) as u64;
    let initiated = orders.len() as u64;
    let completed = orders
        .iter()
        .filter(|o| o.payment_status == PaymentStatus::Paid)
        .count() as u64;
    let delivered = orders
        .iter()
        .filter(|o| o.fulfillment_status == FulfillmentStatus::Delivered)
        .count() as u64;

    let counts = [
        ("Visitors", visitors),
        ("Added to cart", visitors),
        ("Initiated checkout", initiated),
        ("Completed order", completed),
        ("Delivered", delivered),
    ];

    let mut stages = Vec::with_capacity(counts.len());
    let mut previous: Option<u64> = None;
    for (name, count) in counts {
        let (pct, drop_off) = match previous {
            None => (100.0, 0),
            Some(prev) => (percentage(count, prev), prev.saturating_sub(count)),
        };
        stages.push(FunnelStage {
            name,
            count,
            percentage: pct,
            drop_off,
        });
        previous = Some(count);
    }

    let biggest_drop_off = stages
        .iter()
        .skip(1)
        .fold(None::<&FunnelStage>, |best, stage| match best {
            Some(b) if b.drop_off >= stage.drop_off => Some(b),
            _ => Some(stage),
        })
        .filter(|s| s.drop_off > 0)
        .map(|s| s.name);

    FunnelReport {
        stages,
        overall_conversion: percentage(delivered, visitors),
        biggest_drop_off,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use tidewater_core::{CartId, CartStatus, OrderId};

    use super::*;

    fn order(id: i64, payment: PaymentStatus, fulfillment: FulfillmentStatus) -> Order {
        Order {
            id: OrderId::new(id),
            user_id: None,
            email: None,
            items: vec![],
            total: Decimal::from(10),
            shipping_cost: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            payment_status: payment,
            fulfillment_status: fulfillment,
            payment_method: None,
            created_at: Utc::now(),
        }
    }

    fn cart(id: i64) -> AbandonedCart {
        AbandonedCart {
            id: CartId::new(id),
            user_id: None,
            email: None,
            items: vec![],
            status: CartStatus::Abandoned,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_stage_counts_monotonic() {
        let orders = vec![
            order(1, PaymentStatus::Paid, FulfillmentStatus::Delivered),
            order(2, PaymentStatus::Paid, FulfillmentStatus::Shipped),
            order(3, PaymentStatus::Unpaid, FulfillmentStatus::Pending),
        ];
        let carts = vec![cart(1), cart(2)];
        let report = build(&orders, &carts);

        let counts: Vec<u64> = report.stages.iter().map(|s| s.count).collect();
        assert_eq!(counts, vec![5, 5, 3, 2, 1]);
        for pair in counts.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn test_percentages_and_drop_off() {
        let orders = vec![
            order(1, PaymentStatus::Paid, FulfillmentStatus::Delivered),
            order(2, PaymentStatus::Unpaid, FulfillmentStatus::Pending),
        ];
        let carts = vec![cart(1), cart(2)];
        let report = build(&orders, &carts);

        // visitors = 4, initiated = 2, completed = 1, delivered = 1
        assert!((report.stages[0].percentage - 100.0).abs() < f64::EPSILON);
        assert_eq!(report.stages[0].drop_off, 0);
        assert!((report.stages[2].percentage - 50.0).abs() < f64::EPSILON);
        assert_eq!(report.stages[2].drop_off, 2);
        assert!((report.stages[3].percentage - 50.0).abs() < f64::EPSILON);
        assert!((report.overall_conversion - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_window() {
        let report = build(&[], &[]);
        assert!(report.stages.iter().all(|s| s.count == 0));
        // zero previous-stage counts never divide
        assert!(
            report
                .stages
                .iter()
                .skip(1)
                .all(|s| s.percentage.abs() < f64::EPSILON)
        );
        assert!((report.overall_conversion - 0.0).abs() < f64::EPSILON);
        assert_eq!(report.biggest_drop_off, None);
    }

    #[test]
    fn test_biggest_drop_off_first_on_tie() {
        // initiated loses 2 (4 -> 2), delivered loses 2 (2 -> 0): tie, the
        // earlier stage wins.
        let orders = vec![
            order(1, PaymentStatus::Paid, FulfillmentStatus::Shipped),
            order(2, PaymentStatus::Paid, FulfillmentStatus::Shipped),
        ];
        let carts = vec![cart(1), cart(2)];
        let report = build(&orders, &carts);

        assert_eq!(report.stages[2].drop_off, 2);
        assert_eq!(report.stages[4].drop_off, 2);
        assert_eq!(report.biggest_drop_off, Some("Initiated checkout"));
    }
}
