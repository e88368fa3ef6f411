//! Shared helpers for Tidewater integration tests.
//!
//! Tests here exercise public APIs across crate boundaries without
//! external services: the connection pool is built lazily and never
//! touched by the scripted jobs, and notifications go through the
//! in-memory recorder.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use chrono::FixedOffset;
use tidewater_core::Email;
use tidewater_ops::jobs::{JobContext, JobSettings};
use tidewater_ops::metrics::MetricsEngine;
use tidewater_ops::notify::RecordingNotifier;

/// Build a job context over a lazy (never-connected) pool and a recording
/// notifier.
///
/// # Panics
///
/// Panics if the pool options or a recipient address are malformed, which
/// only happens if the helper itself is broken.
#[must_use]
pub fn test_context(recipients: &[&str]) -> (JobContext, Arc<RecordingNotifier>) {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy("postgres://localhost/tidewater_test")
        .expect("lazy pool");
    let engine = MetricsEngine::new(
        pool.clone(),
        FixedOffset::east_opt(0).expect("valid offset"),
        "USD".to_string(),
    );
    let notifier = Arc::new(RecordingNotifier::new());
    let ctx = JobContext::new(
        pool,
        engine,
        notifier.clone(),
        JobSettings {
            recipients: recipients
                .iter()
                .map(|r| Email::parse(r).expect("valid email"))
                .collect(),
            base_url: "https://shop.example.com".to_string(),
            currency: "USD".to_string(),
        },
    );
    (ctx, notifier)
}
