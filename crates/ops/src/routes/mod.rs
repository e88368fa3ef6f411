//! HTTP trigger surface.
//!
//! # Route Structure
//!
//! ```text
//! GET  /cron                           - Job catalogue with run records
//! POST /cron/run-all                   - Run every enabled job, report each outcome
//! POST /cron/{job_id}                  - Run one job, report its outcome
//! GET  /metrics/{metric_type}/history  - Snapshot history, most recent first
//! ```
//!
//! Periodic scheduling itself is external: a scheduler POSTs to these
//! endpoints on whatever cadence operations configured.

pub mod cron;
pub mod metrics;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Assemble the service router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cron", get(cron::status))
        .route("/cron/run-all", post(cron::run_all))
        .route("/cron/{job_id}", post(cron::trigger))
        .route("/metrics/{metric_type}/history", get(metrics::history))
}
