//! Scheduled operations: the job catalogue, the runner, and the six job
//! bodies.
//!
//! Jobs are triggered externally (a scheduler hitting `/cron/<id>`, or an
//! operator's manual "run now"); nothing in this module parses cron
//! expressions. Partial failure is the default mode of every batch loop: a
//! failed recipient, cart, or sub-metric is logged and counted, never
//! escalated into failing the run.

pub mod cart_cleanup;
pub mod cart_recovery;
pub mod daily_snapshot;
pub mod featured;
pub mod low_stock;
pub mod registry;
pub mod runner;
pub mod weekly_report;

use std::sync::Arc;

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tidewater_core::Email;

use crate::db::RepositoryError;
use crate::metrics::MetricsEngine;
use crate::notify::Notifier;

pub use registry::{JobDescriptor, JobRegistry};
pub use runner::{JobOutcome, JobRunRecord, JobRunner, RunStatus, TriggerError};

/// Read-only settings a job body may need.
#[derive(Debug, Clone)]
pub struct JobSettings {
    /// Admin recipients for alerts and reports.
    pub recipients: Vec<Email>,
    /// Public storefront base URL (cart-recovery links).
    pub base_url: String,
    /// Currency code for money figures in messages.
    pub currency: String,
}

/// Everything a job body gets to work with.
#[derive(Clone)]
pub struct JobContext {
    /// Shared connection pool.
    pub pool: PgPool,
    /// Metrics engine (snapshot jobs).
    pub engine: MetricsEngine,
    /// Notification dispatcher.
    pub notifier: Arc<dyn Notifier>,
    /// Read-only settings.
    pub settings: JobSettings,
}

impl JobContext {
    /// Assemble a context.
    #[must_use]
    pub fn new(
        pool: PgPool,
        engine: MetricsEngine,
        notifier: Arc<dyn Notifier>,
        settings: JobSettings,
    ) -> Self {
        Self {
            pool,
            engine,
            notifier,
            settings,
        }
    }
}

/// Errors that terminate a single job run.
///
/// Notification failures never appear here: they are counted per recipient
/// inside the job and the run still succeeds.
#[derive(Debug, Error)]
pub enum JobError {
    /// The underlying store was unreachable or a query failed. The run is
    /// recorded as `error` and the job stays retryable on the next trigger.
    #[error("data access failed: {0}")]
    Repository(#[from] RepositoryError),

    /// A message template failed to render.
    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),
}

/// What a successful run reports back.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    /// One-line human summary.
    pub summary: String,
    /// Structured counters (sent/failed/skipped, snapshot outcomes).
    pub details: serde_json::Value,
}

impl JobReport {
    /// Build a report.
    pub fn new(summary: impl Into<String>, details: serde_json::Value) -> Self {
        Self {
            summary: summary.into(),
            details,
        }
    }
}

/// One schedulable unit of work.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    /// Stable job identifier, matching its registry descriptor.
    fn id(&self) -> &'static str;

    /// Execute one run.
    async fn run(&self, ctx: &JobContext) -> Result<JobReport, JobError>;
}

/// Fan one message out to every admin recipient, isolating per-recipient
/// failures. Returns `(sent, failed)`.
async fn send_to_admins(
    ctx: &JobContext,
    message: &crate::notify::RenderedEmail,
) -> (u64, u64) {
    let mut sent = 0;
    let mut failed = 0;
    for recipient in &ctx.settings.recipients {
        match ctx.notifier.send(recipient, message).await {
            Ok(()) => sent += 1,
            Err(err) => {
                failed += 1;
                tracing::warn!(
                    recipient = %recipient,
                    error = %err,
                    "Failed to send admin notification"
                );
            }
        }
    }
    (sent, failed)
}
