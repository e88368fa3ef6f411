//! Job execution: single triggers, bulk "run all", and per-job run
//! records.
//!
//! Each job id moves through idle -> running -> success|error and is then
//! ready for the next trigger. A per-job run-lock rejects a concurrent
//! trigger of the same job instead of letting a manual run overlap a
//! scheduled one.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::{JobContext, JobRegistry, JobReport};

/// Last-known execution state of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Never run, or reset after a finished run was observed.
    Idle,
    /// A run is in flight.
    Running,
    /// Last run finished cleanly.
    Success,
    /// Last run failed.
    Error,
}

/// Run record kept per job id. Overwritten on every run, not historized.
#[derive(Debug, Clone, Serialize)]
pub struct JobRunRecord {
    /// Current state.
    pub status: RunStatus,
    /// When the last run finished (success or error).
    pub last_run: Option<DateTime<Utc>>,
    /// Failure detail of the last run, if it errored.
    pub last_error: Option<String>,
}

impl Default for JobRunRecord {
    fn default() -> Self {
        Self {
            status: RunStatus::Idle,
            last_run: None,
            last_error: None,
        }
    }
}

/// Errors surfaced before a run starts; the job never transitions to
/// `running` for these.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TriggerError {
    /// No job registered under this id.
    #[error("unknown job: {0}")]
    UnknownJob(String),

    /// The job is currently running; concurrent triggers are rejected.
    #[error("job {0} is already running")]
    AlreadyRunning(String),
}

/// Outcome of one finished run, as returned to the trigger surface.
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    /// Which job ran.
    pub job_id: String,
    /// `success` or `error`.
    pub status: RunStatus,
    /// Report of a successful run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<JobReport>,
    /// Failure detail of an errored run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobOutcome {
    fn success(job_id: &str, report: JobReport) -> Self {
        Self {
            job_id: job_id.to_string(),
            status: RunStatus::Success,
            report: Some(report),
            error: None,
        }
    }

    fn error(job_id: &str, error: String) -> Self {
        Self {
            job_id: job_id.to_string(),
            status: RunStatus::Error,
            report: None,
            error: Some(error),
        }
    }
}

/// Per-job run records plus the run-lock.
#[derive(Default)]
struct RunState {
    records: Mutex<HashMap<String, JobRunRecord>>,
}

impl RunState {
    /// Transition a job to `running`, rejecting a concurrent trigger.
    fn try_begin(&self, job_id: &str) -> Result<(), TriggerError> {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let record = records.entry(job_id.to_string()).or_default();
        if record.status == RunStatus::Running {
            return Err(TriggerError::AlreadyRunning(job_id.to_string()));
        }
        record.status = RunStatus::Running;
        Ok(())
    }

    /// Record the end of a run, stamping `last_run` with the transition
    /// time.
    fn finish(&self, job_id: &str, error: Option<String>) {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let record = records.entry(job_id.to_string()).or_default();
        record.status = if error.is_some() {
            RunStatus::Error
        } else {
            RunStatus::Success
        };
        record.last_run = Some(Utc::now());
        record.last_error = error;
    }

    fn snapshot(&self, job_id: &str) -> JobRunRecord {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(job_id)
            .cloned()
            .unwrap_or_default()
    }
}

/// Executes registered jobs and tracks their run records.
pub struct JobRunner {
    registry: JobRegistry,
    state: RunState,
    ctx: JobContext,
}

impl JobRunner {
    /// Build a runner over a registry and context.
    #[must_use]
    pub fn new(registry: JobRegistry, ctx: JobContext) -> Self {
        Self {
            registry,
            state: RunState::default(),
            ctx,
        }
    }

    /// The registry this runner executes.
    #[must_use]
    pub const fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Run one job by id and return its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError`] for an unknown id or a concurrent trigger;
    /// in both cases the job never transitions to `running`. A failure
    /// inside the job body is NOT an `Err`: it comes back as an outcome
    /// with status `error`, recorded on the run record.
    pub async fn trigger(&self, job_id: &str) -> Result<JobOutcome, TriggerError> {
        let entry = self
            .registry
            .get(job_id)
            .ok_or_else(|| TriggerError::UnknownJob(job_id.to_string()))?;

        self.state.try_begin(job_id)?;
        tracing::info!(job = %job_id, "Job run started");

        let outcome = match entry.job().run(&self.ctx).await {
            Ok(report) => {
                self.state.finish(job_id, None);
                tracing::info!(job = %job_id, summary = %report.summary, "Job run succeeded");
                JobOutcome::success(job_id, report)
            }
            Err(err) => {
                let detail = err.to_string();
                self.state.finish(job_id, Some(detail.clone()));
                tracing::error!(job = %job_id, error = %detail, "Job run failed");
                JobOutcome::error(job_id, detail)
            }
        };

        Ok(outcome)
    }

    /// Run every enabled job concurrently and return one outcome per job
    /// in registry order.
    ///
    /// Failure isolation: a job that errors (or is locked by a concurrent
    /// run) still yields its own entry and never suppresses another job's.
    pub async fn run_all(&self) -> Vec<JobOutcome> {
        let runs = self
            .registry
            .iter()
            .filter(|entry| entry.descriptor.enabled)
            .map(|entry| {
                let job_id = entry.descriptor.id;
                async move {
                    match self.trigger(job_id).await {
                        Ok(outcome) => outcome,
                        // Unknown ids cannot happen here; a held run-lock
                        // becomes this job's error outcome.
                        Err(err) => JobOutcome::error(job_id, err.to_string()),
                    }
                }
            });

        futures::future::join_all(runs).await
    }

    /// Current run record of one job.
    #[must_use]
    pub fn run_record(&self, job_id: &str) -> JobRunRecord {
        self.state.snapshot(job_id)
    }
}
