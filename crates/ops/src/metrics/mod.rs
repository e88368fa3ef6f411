//! Business metrics engine.
//!
//! Aggregations are pure functions over rows fetched from the store; the
//! [`MetricsEngine`] fetches, computes, and appends one snapshot per
//! computation (the sales funnel is an on-demand report and writes
//! nothing).

pub mod clv;
pub mod conversion;
pub mod funnel;
pub mod revenue;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;
use tidewater_core::{CustomerKey, DateWindow, MetricType, PeriodType};
use tracing::instrument;

use crate::db::snapshots::{self, MetricSnapshot, NewSnapshot, SnapshotQuery};
use crate::db::{RepositoryError, carts, orders};

pub use clv::ClvReport;
pub use conversion::ConversionReport;
pub use funnel::FunnelReport;
pub use revenue::{RevenueGrouping, RevenueReport};

/// Unit stamped on percentage snapshots.
const PERCENT_UNIT: &str = "%";

/// Computes business metrics and appends snapshots.
#[derive(Clone)]
pub struct MetricsEngine {
    pool: PgPool,
    offset: FixedOffset,
    currency: String,
}

impl MetricsEngine {
    /// Create an engine over the given pool, reporting in the given
    /// timezone offset and currency.
    #[must_use]
    pub const fn new(pool: PgPool, offset: FixedOffset, currency: String) -> Self {
        Self {
            pool,
            offset,
            currency,
        }
    }

    /// Customer lifetime value over the window, optionally narrowed to one
    /// customer. Appends one `clv` snapshot.
    ///
    /// # Errors
    ///
    /// Returns error if a query or the snapshot write fails.
    #[instrument(skip(self))]
    pub async fn compute_clv(
        &self,
        window: &DateWindow,
        customer: Option<&CustomerKey>,
    ) -> Result<ClvReport, RepositoryError> {
        let orders = orders::paid_fulfilled_in_window(&self.pool, window).await?;
        let report = clv::aggregate(&orders, customer);

        snapshots::insert_snapshot(
            &self.pool,
            NewSnapshot {
                metric_type: MetricType::Clv,
                value: report.average_clv,
                unit: self.currency.clone(),
                date: self.snapshot_date(window),
                period_type: PeriodType::Daily,
                metadata: json!({
                    "total_customers": report.total_customers,
                    "total_revenue": report.total_revenue,
                    "average_order_value": report.average_order_value,
                }),
            },
        )
        .await?;

        Ok(report)
    }

    /// Conversion and cart-recovery rates over the window. Appends one
    /// `conversion_rate` snapshot.
    ///
    /// # Errors
    ///
    /// Returns error if a query or the snapshot write fails.
    #[instrument(skip(self))]
    pub async fn compute_conversion_rate(
        &self,
        window: &DateWindow,
    ) -> Result<ConversionReport, RepositoryError> {
        let orders = orders::created_in_window(&self.pool, window).await?;
        let carts = carts::created_in_window(&self.pool, window).await?;
        let report = conversion::aggregate(&orders, &carts);

        snapshots::insert_snapshot(
            &self.pool,
            NewSnapshot {
                metric_type: MetricType::ConversionRate,
                value: Decimal::from_f64_retain(report.conversion_rate)
                    .unwrap_or(Decimal::ZERO),
                unit: PERCENT_UNIT.to_string(),
                date: self.snapshot_date(window),
                period_type: PeriodType::Daily,
                metadata: json!({
                    "total_orders": report.total_orders,
                    "total_visitors": report.total_visitors,
                    "cart_recovery_rate": report.cart_recovery_rate,
                    "abandoned_carts": report.abandoned_carts,
                    "recovered_carts": report.recovered_carts,
                }),
            },
        )
        .await?;

        Ok(report)
    }

    /// Revenue totals and period buckets over the window. Appends one
    /// `revenue` snapshot tagged with the grouping's period type.
    ///
    /// # Errors
    ///
    /// Returns error if a query or the snapshot write fails.
    #[instrument(skip(self))]
    pub async fn compute_revenue(
        &self,
        window: &DateWindow,
        grouping: RevenueGrouping,
    ) -> Result<RevenueReport, RepositoryError> {
        let orders = orders::paid_fulfilled_in_window(&self.pool, window).await?;
        let report = revenue::aggregate(&orders, grouping, self.offset);

        snapshots::insert_snapshot(
            &self.pool,
            NewSnapshot {
                metric_type: MetricType::Revenue,
                value: report.total_revenue,
                unit: self.currency.clone(),
                date: self.snapshot_date(window),
                period_type: grouping.period_type(),
                metadata: json!({
                    "net_revenue": report.net_revenue,
                    "total_shipping": report.total_shipping,
                    "total_discounts": report.total_discounts,
                    "total_orders": report.total_orders,
                }),
            },
        )
        .await?;

        Ok(report)
    }

    /// Five-stage sales funnel over the window. On-demand report; writes
    /// no snapshot.
    ///
    /// # Errors
    ///
    /// Returns error if a query fails.
    #[instrument(skip(self))]
    pub async fn sales_funnel(&self, window: &DateWindow) -> Result<FunnelReport, RepositoryError> {
        let orders = orders::created_in_window(&self.pool, window).await?;
        let carts = carts::created_in_window(&self.pool, window).await?;
        Ok(funnel::build(&orders, &carts))
    }

    /// Snapshot history for one metric, most recent first.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    #[instrument(skip(self))]
    pub async fn historical_metrics(
        &self,
        query: &SnapshotQuery,
    ) -> Result<Vec<MetricSnapshot>, RepositoryError> {
        snapshots::query_snapshots(&self.pool, query).await
    }

    /// Today's reporting window: local midnight through `23:59:59.999`.
    #[must_use]
    pub fn today_window(&self) -> DateWindow {
        local_day_window(self.local_today(), self.offset)
    }

    /// Trailing window ending now.
    #[must_use]
    pub fn trailing_days(&self, days: i64) -> DateWindow {
        let end = Utc::now();
        DateWindow::between(end - Duration::days(days), end)
    }

    /// Today's date in the reporting timezone.
    #[must_use]
    pub fn local_today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }

    /// The date a snapshot of this window represents: the window's end in
    /// reporting-local time, or today when unbounded.
    fn snapshot_date(&self, window: &DateWindow) -> NaiveDate {
        window
            .end
            .map_or_else(|| self.local_today(), |end| {
                end.with_timezone(&self.offset).date_naive()
            })
    }
}

/// The reporting window covering one local calendar day: midnight through
/// `23:59:59.999`, expressed in UTC.
#[must_use]
pub fn local_day_window(date: NaiveDate, offset: FixedOffset) -> DateWindow {
    let offset_secs = i64::from(offset.local_minus_utc());
    let start: DateTime<Utc> =
        date.and_time(NaiveTime::MIN).and_utc() - Duration::seconds(offset_secs);
    let end = start + Duration::days(1) - Duration::milliseconds(1);
    DateWindow::between(start, end)
}
