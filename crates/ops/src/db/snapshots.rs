//! Append-only metric snapshot storage.
//!
//! Snapshots are immutable history: this module exposes insert and
//! filtered reads only. Running the same snapshot job twice for the same
//! day intentionally produces two rows; nothing here deduplicates.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use tidewater_core::{MetricType, PeriodType};
use uuid::Uuid;

use super::RepositoryError;

/// One immutable computed-metric record.
#[derive(Debug, Clone, Serialize)]
pub struct MetricSnapshot {
    /// Unique snapshot ID.
    pub id: Uuid,
    /// Which metric this records.
    pub metric_type: MetricType,
    /// The computed value.
    pub value: Decimal,
    /// Unit of the value (currency code or "%").
    pub unit: String,
    /// The date the value represents.
    pub date: NaiveDate,
    /// Granularity of the covered period.
    pub period_type: PeriodType,
    /// Free-form context captured at computation time.
    pub metadata: serde_json::Value,
    /// When the snapshot was written.
    pub created_at: DateTime<Utc>,
}

/// Input for writing a snapshot.
#[derive(Debug, Clone)]
pub struct NewSnapshot {
    /// Which metric this records.
    pub metric_type: MetricType,
    /// The computed value.
    pub value: Decimal,
    /// Unit of the value (currency code or "%").
    pub unit: String,
    /// The date the value represents.
    pub date: NaiveDate,
    /// Granularity of the covered period.
    pub period_type: PeriodType,
    /// Free-form context captured at computation time.
    pub metadata: serde_json::Value,
}

/// Filter for reading snapshot history.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotQuery {
    /// Which metric to read.
    pub metric_type: MetricType,
    /// Inclusive lower bound on the snapshot date.
    pub start: Option<NaiveDate>,
    /// Inclusive upper bound on the snapshot date.
    pub end: Option<NaiveDate>,
    /// Maximum rows returned.
    pub limit: i64,
}

impl SnapshotQuery {
    /// Default history depth when the caller does not specify one.
    pub const DEFAULT_LIMIT: i64 = 30;

    /// Query the most recent snapshots of one metric.
    #[must_use]
    pub const fn recent(metric_type: MetricType) -> Self {
        Self {
            metric_type,
            start: None,
            end: None,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// Raw row as stored.
#[derive(Debug, sqlx::FromRow)]
struct SnapshotRow {
    id: Uuid,
    metric_type: String,
    value: Decimal,
    unit: String,
    date: NaiveDate,
    period_type: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<SnapshotRow> for MetricSnapshot {
    type Error = RepositoryError;

    fn try_from(row: SnapshotRow) -> Result<Self, Self::Error> {
        let metric_type = row.metric_type.parse().map_err(|e: String| {
            RepositoryError::DataCorruption(format!("metric_snapshots row {}: {e}", row.id))
        })?;
        let period_type = row.period_type.parse().map_err(|e: String| {
            RepositoryError::DataCorruption(format!("metric_snapshots row {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            metric_type,
            value: row.value,
            unit: row.unit,
            date: row.date,
            period_type,
            metadata: row.metadata,
            created_at: row.created_at,
        })
    }
}

/// Append one snapshot.
///
/// # Errors
///
/// Returns error if the insert fails.
pub async fn insert_snapshot(
    pool: &PgPool,
    snapshot: NewSnapshot,
) -> Result<MetricSnapshot, RepositoryError> {
    let row: SnapshotRow = sqlx::query_as(
        "INSERT INTO metric_snapshots (id, metric_type, value, unit, date, period_type, metadata) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id, metric_type, value, unit, date, period_type, metadata, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(snapshot.metric_type.as_str())
    .bind(snapshot.value)
    .bind(&snapshot.unit)
    .bind(snapshot.date)
    .bind(snapshot.period_type.as_str())
    .bind(&snapshot.metadata)
    .fetch_one(pool)
    .await?;
    row.try_into()
}

/// Read snapshots matching the filter, most recent date first.
///
/// # Errors
///
/// Returns error if the query fails or a row fails validation.
pub async fn query_snapshots(
    pool: &PgPool,
    query: &SnapshotQuery,
) -> Result<Vec<MetricSnapshot>, RepositoryError> {
    let rows: Vec<SnapshotRow> = sqlx::query_as(
        "SELECT id, metric_type, value, unit, date, period_type, metadata, created_at \
         FROM metric_snapshots \
         WHERE metric_type = $1 \
           AND ($2::date IS NULL OR date >= $2) \
           AND ($3::date IS NULL OR date <= $3) \
         ORDER BY date DESC, created_at DESC \
         LIMIT $4",
    )
    .bind(query.metric_type.as_str())
    .bind(query.start)
    .bind(query.end)
    .bind(query.limit)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(MetricSnapshot::try_from).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row() -> SnapshotRow {
        SnapshotRow {
            id: Uuid::new_v4(),
            metric_type: "clv".to_string(),
            value: Decimal::new(150_000, 2),
            unit: "USD".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 7, 1).expect("valid date"),
            period_type: "daily".to_string(),
            metadata: json!({"total_customers": 12}),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_conversion() {
        let snapshot = MetricSnapshot::try_from(row()).expect("valid row");
        assert_eq!(snapshot.metric_type, MetricType::Clv);
        assert_eq!(snapshot.period_type, PeriodType::Daily);
        assert_eq!(snapshot.unit, "USD");
    }

    #[test]
    fn test_row_conversion_rejects_unknown_metric() {
        let mut bad = row();
        bad.metric_type = "npv".to_string();
        assert!(matches!(
            MetricSnapshot::try_from(bad),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_query_defaults() {
        let query = SnapshotQuery::recent(MetricType::Revenue);
        assert_eq!(query.limit, SnapshotQuery::DEFAULT_LIMIT);
        assert!(query.start.is_none());
        assert!(query.end.is_none());
    }
}
