//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::OpsConfig;
use crate::jobs::{JobContext, JobRegistry, JobRunner, JobSettings};
use crate::metrics::MetricsEngine;
use crate::notify::{Notifier, SmtpNotifier};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: OpsConfig,
    pool: PgPool,
    engine: MetricsEngine,
    runner: JobRunner,
}

impl AppState {
    /// Build state with the SMTP notifier.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP transport cannot be configured.
    pub fn new(
        config: OpsConfig,
        pool: PgPool,
    ) -> Result<Self, lettre::transport::smtp::Error> {
        let notifier: Arc<dyn Notifier> = Arc::new(SmtpNotifier::new(&config.email)?);
        Ok(Self::with_notifier(config, pool, notifier))
    }

    /// Build state with an explicit notifier (tests inject a recorder).
    #[must_use]
    pub fn with_notifier(config: OpsConfig, pool: PgPool, notifier: Arc<dyn Notifier>) -> Self {
        let engine = MetricsEngine::new(
            pool.clone(),
            config.report_offset,
            config.currency.clone(),
        );
        let settings = JobSettings {
            recipients: config.alert_recipients.clone(),
            base_url: config.base_url.clone(),
            currency: config.currency.clone(),
        };
        let ctx = JobContext::new(pool.clone(), engine.clone(), notifier, settings);
        let runner = JobRunner::new(JobRegistry::standard(), ctx);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                engine,
                runner,
            }),
        }
    }

    /// Application configuration.
    #[must_use]
    pub fn config(&self) -> &OpsConfig {
        &self.inner.config
    }

    /// Shared connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Metrics engine.
    #[must_use]
    pub fn engine(&self) -> &MetricsEngine {
        &self.inner.engine
    }

    /// Job runner.
    #[must_use]
    pub fn runner(&self) -> &JobRunner {
        &self.inner.runner
    }
}
