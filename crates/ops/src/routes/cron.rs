//! Job trigger handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use crate::error::AppError;
use crate::jobs::{JobDescriptor, JobOutcome, JobRunRecord};
use crate::state::AppState;

/// One job's catalogue entry plus its current run record.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatusView {
    #[serde(flatten)]
    descriptor: JobDescriptor,
    trigger_path: String,
    #[serde(flatten)]
    record: JobRunRecord,
}

/// Aggregate result of a bulk run.
#[derive(Debug, Serialize)]
pub struct RunAllResponse {
    results: Vec<JobOutcome>,
}

/// `GET /cron` - the catalogue with each job's last-known state.
#[instrument(skip(state))]
pub async fn status(State(state): State<AppState>) -> Json<Vec<JobStatusView>> {
    let runner = state.runner();
    let views = runner
        .registry()
        .descriptors()
        .into_iter()
        .map(|descriptor| JobStatusView {
            trigger_path: descriptor.trigger_path(),
            record: runner.run_record(descriptor.id),
            descriptor,
        })
        .collect();
    Json(views)
}

/// `POST /cron/{job_id}` - run one job and return its outcome.
///
/// # Errors
///
/// 404 for an unknown job id, 409 when the job is already running. A
/// failure inside the job body is a 200 with an `error` outcome - the run
/// happened, it just failed.
#[instrument(skip(state))]
pub async fn trigger(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobOutcome>, AppError> {
    let outcome = state.runner().trigger(&job_id).await?;
    Ok(Json(outcome))
}

/// `POST /cron/run-all` - run every enabled job, one outcome per job in
/// catalogue order.
#[instrument(skip(state))]
pub async fn run_all(State(state): State<AppState>) -> Json<RunAllResponse> {
    let results = state.runner().run_all().await;
    Json(RunAllResponse { results })
}
