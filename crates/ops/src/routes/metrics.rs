//! Snapshot history handler.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tidewater_core::MetricType;
use tracing::instrument;

use crate::db::snapshots::{MetricSnapshot, SnapshotQuery};
use crate::error::AppError;
use crate::state::AppState;

/// Query parameters for snapshot history.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    /// Inclusive lower bound on the snapshot date.
    pub start: Option<NaiveDate>,
    /// Inclusive upper bound on the snapshot date.
    pub end: Option<NaiveDate>,
    /// Maximum rows (default 30).
    pub limit: Option<i64>,
}

/// `GET /metrics/{metric_type}/history` - snapshots of one metric, most
/// recent first.
///
/// # Errors
///
/// 400 for an unknown metric type, 500 if the store is unreachable.
#[instrument(skip(state))]
pub async fn history(
    State(state): State<AppState>,
    Path(metric_type): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<MetricSnapshot>>, AppError> {
    let metric_type: MetricType = metric_type.parse().map_err(AppError::BadRequest)?;

    let query = SnapshotQuery {
        metric_type,
        start: params.start,
        end: params.end,
        limit: params.limit.unwrap_or(SnapshotQuery::DEFAULT_LIMIT),
    };
    let snapshots = state.engine().historical_metrics(&query).await?;
    Ok(Json(snapshots))
}
