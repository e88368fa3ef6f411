//! Revenue totals with period bucketing and payment-method breakdown.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use tidewater_core::PeriodType;

use crate::db::orders::Order;

/// Label used when an order carries no payment method.
pub const UNKNOWN_PAYMENT_METHOD: &str = "Unknown";

/// How revenue is bucketed over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueGrouping {
    Day,
    Week,
    Month,
}

impl RevenueGrouping {
    /// Period granularity stamped on the resulting snapshot.
    #[must_use]
    pub const fn period_type(self) -> PeriodType {
        match self {
            Self::Day => PeriodType::Daily,
            Self::Week => PeriodType::Weekly,
            Self::Month => PeriodType::Monthly,
        }
    }

    /// Bucket key for a calendar date: the date itself, the Sunday on or
    /// before it, or `YYYY-MM`.
    #[must_use]
    pub fn period_key(self, date: NaiveDate) -> String {
        match self {
            Self::Day => date.format("%Y-%m-%d").to_string(),
            Self::Week => sunday_on_or_before(date).format("%Y-%m-%d").to_string(),
            Self::Month => date.format("%Y-%m").to_string(),
        }
    }
}

impl std::str::FromStr for RevenueGrouping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(format!("invalid revenue grouping: {s}")),
        }
    }
}

/// The Sunday on or before the given date.
#[must_use]
pub fn sunday_on_or_before(date: NaiveDate) -> NaiveDate {
    let back = date.weekday().num_days_from_sunday();
    date.checked_sub_days(Days::new(u64::from(back))).unwrap_or(date)
}

/// Revenue accumulated in one period bucket.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodRevenue {
    /// Bucket key (date, week-start date, or `YYYY-MM`).
    pub period: String,
    /// Revenue in the bucket.
    pub revenue: Decimal,
    /// Orders in the bucket.
    pub order_count: u64,
    /// Mean order value in the bucket.
    pub average_order_value: Decimal,
}

/// Revenue attributed to one payment method.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentMethodRevenue {
    /// Payment method label.
    pub method: String,
    /// Revenue taken through the method.
    pub revenue: Decimal,
}

/// Aggregated revenue report.
#[derive(Debug, Clone, Serialize)]
pub struct RevenueReport {
    /// Sum of order totals.
    pub total_revenue: Decimal,
    /// Sum of shipping costs.
    pub total_shipping: Decimal,
    /// Sum of discount amounts.
    pub total_discounts: Decimal,
    /// `total_revenue - total_discounts`.
    pub net_revenue: Decimal,
    /// Qualifying order count.
    pub total_orders: u64,
    /// Chronological period buckets.
    pub periods: Vec<PeriodRevenue>,
    /// Per-payment-method breakdown, alphabetical.
    pub by_payment_method: Vec<PaymentMethodRevenue>,
}

/// Aggregate revenue over paid, fulfillment-qualifying orders.
///
/// Orders are bucketed by the calendar date of their creation in the
/// reporting timezone.
#[must_use]
pub fn aggregate(orders: &[Order], grouping: RevenueGrouping, offset: FixedOffset) -> RevenueReport {
    let qualifying: Vec<&Order> = orders
        .iter()
        .filter(|o| o.counts_toward_revenue())
        .collect();

    let total_revenue: Decimal = qualifying.iter().map(|o| o.total).sum();
    let total_shipping: Decimal = qualifying.iter().map(|o| o.shipping_cost).sum();
    let total_discounts: Decimal = qualifying.iter().map(|o| o.discount_amount).sum();
    let total_orders = qualifying.len() as u64;

    let mut buckets: BTreeMap<String, (Decimal, u64)> = BTreeMap::new();
    let mut methods: BTreeMap<String, Decimal> = BTreeMap::new();

    for order in &qualifying {
        let local_date = order.created_at.with_timezone(&offset).date_naive();
        let key = grouping.period_key(local_date);
        let bucket = buckets.entry(key).or_insert((Decimal::ZERO, 0));
        bucket.0 += order.total;
        bucket.1 += 1;

        let method = order
            .payment_method
            .clone()
            .unwrap_or_else(|| UNKNOWN_PAYMENT_METHOD.to_string());
        *methods.entry(method).or_insert(Decimal::ZERO) += order.total;
    }

    // ISO-formatted keys sort chronologically
    let periods = buckets
        .into_iter()
        .map(|(period, (revenue, order_count))| PeriodRevenue {
            period,
            revenue,
            order_count,
            average_order_value: revenue / Decimal::from(order_count.max(1)),
        })
        .collect();

    let by_payment_method = methods
        .into_iter()
        .map(|(method, revenue)| PaymentMethodRevenue { method, revenue })
        .collect();

    RevenueReport {
        total_revenue,
        total_shipping,
        total_discounts,
        net_revenue: total_revenue - total_discounts,
        total_orders,
        periods,
        by_payment_method,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tidewater_core::{FulfillmentStatus, OrderId, PaymentStatus};

    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).expect("valid offset")
    }

    fn order(id: i64, total: i64, method: Option<&str>, (m, d): (u32, u32)) -> Order {
        Order {
            id: OrderId::new(id),
            user_id: None,
            email: None,
            items: vec![],
            total: Decimal::from(total),
            shipping_cost: Decimal::from(5),
            discount_amount: Decimal::from(2),
            payment_status: PaymentStatus::Paid,
            fulfillment_status: FulfillmentStatus::Shipped,
            payment_method: method.map(String::from),
            created_at: Utc.with_ymd_and_hms(2025, m, d, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_totals() {
        let orders = vec![
            order(1, 100, Some("card"), (6, 1)),
            order(2, 200, Some("paypal"), (6, 2)),
        ];
        let report = aggregate(&orders, RevenueGrouping::Day, utc());

        assert_eq!(report.total_revenue, Decimal::from(300));
        assert_eq!(report.total_shipping, Decimal::from(10));
        assert_eq!(report.total_discounts, Decimal::from(4));
        assert_eq!(report.net_revenue, Decimal::from(296));
        assert_eq!(report.total_orders, 2);
    }

    #[test]
    fn test_only_paid_fulfilled_counted() {
        let mut unpaid = order(1, 999, None, (6, 1));
        unpaid.payment_status = PaymentStatus::Unpaid;
        let mut cancelled = order(2, 999, None, (6, 1));
        cancelled.fulfillment_status = FulfillmentStatus::Cancelled;
        let good = order(3, 50, None, (6, 1));

        let report = aggregate(&[unpaid, cancelled, good], RevenueGrouping::Day, utc());
        assert_eq!(report.total_revenue, Decimal::from(50));
        assert_eq!(report.total_orders, 1);
    }

    #[test]
    fn test_day_buckets() {
        let orders = vec![
            order(1, 100, None, (6, 1)),
            order(2, 300, None, (6, 1)),
            order(3, 50, None, (6, 2)),
        ];
        let report = aggregate(&orders, RevenueGrouping::Day, utc());

        assert_eq!(report.periods.len(), 2);
        assert_eq!(report.periods[0].period, "2025-06-01");
        assert_eq!(report.periods[0].revenue, Decimal::from(400));
        assert_eq!(report.periods[0].order_count, 2);
        assert_eq!(report.periods[0].average_order_value, Decimal::from(200));
        assert_eq!(report.periods[1].period, "2025-06-02");
    }

    #[test]
    fn test_week_key_is_sunday_on_or_before() {
        // 2025-06-04 is a Wednesday; the preceding Sunday is 2025-06-01.
        let wednesday = NaiveDate::from_ymd_opt(2025, 6, 4).unwrap();
        assert_eq!(
            sunday_on_or_before(wednesday),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
        );
        // A Sunday maps to itself.
        let sunday = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(sunday_on_or_before(sunday), sunday);

        assert_eq!(
            RevenueGrouping::Week.period_key(wednesday),
            "2025-06-01"
        );
    }

    #[test]
    fn test_month_key() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert_eq!(RevenueGrouping::Month.period_key(date), "2025-06");
    }

    #[test]
    fn test_week_buckets_span_days() {
        // Sun Jun 1 and Wed Jun 4 share a week; Sun Jun 8 starts the next.
        let orders = vec![
            order(1, 100, None, (6, 1)),
            order(2, 100, None, (6, 4)),
            order(3, 100, None, (6, 8)),
        ];
        let report = aggregate(&orders, RevenueGrouping::Week, utc());
        assert_eq!(report.periods.len(), 2);
        assert_eq!(report.periods[0].period, "2025-06-01");
        assert_eq!(report.periods[0].order_count, 2);
        assert_eq!(report.periods[1].period, "2025-06-08");
    }

    #[test]
    fn test_payment_method_breakdown_with_unknown() {
        let orders = vec![
            order(1, 100, Some("card"), (6, 1)),
            order(2, 200, Some("card"), (6, 1)),
            order(3, 50, None, (6, 1)),
        ];
        let report = aggregate(&orders, RevenueGrouping::Day, utc());

        assert_eq!(report.by_payment_method.len(), 2);
        // alphabetical: "Unknown" before "card"
        assert_eq!(report.by_payment_method[0].method, UNKNOWN_PAYMENT_METHOD);
        assert_eq!(report.by_payment_method[0].revenue, Decimal::from(50));
        assert_eq!(report.by_payment_method[1].method, "card");
        assert_eq!(report.by_payment_method[1].revenue, Decimal::from(300));
    }

    #[test]
    fn test_offset_shifts_bucket_date() {
        // 01:00 UTC on Jun 2 is still Jun 1 in UTC-05:00.
        let order = order(1, 100, None, (6, 2));
        let order = Order {
            created_at: Utc.with_ymd_and_hms(2025, 6, 2, 1, 0, 0).unwrap(),
            ..order
        };
        let eastern = FixedOffset::west_opt(5 * 3600).expect("valid offset");
        let report = aggregate(&[order], RevenueGrouping::Day, eastern);
        assert_eq!(report.periods[0].period, "2025-06-01");
    }

    #[test]
    fn test_empty_input() {
        let report = aggregate(&[], RevenueGrouping::Month, utc());
        assert_eq!(report.total_revenue, Decimal::ZERO);
        assert!(report.periods.is_empty());
        assert!(report.by_payment_method.is_empty());
    }
}
