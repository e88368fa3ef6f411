//! Daily metric snapshotting.

use serde_json::json;

use crate::metrics::RevenueGrouping;

use super::{Job, JobContext, JobError, JobReport};

/// Snapshots CLV, conversion rate, and revenue for the current local
/// calendar day. Each sub-computation fails on its own; the run reports
/// which of the three landed.
///
/// Snapshots append: running this twice on the same day writes a second
/// row per metric rather than overwriting the first.
pub struct DailyMetricsSnapshot;

impl DailyMetricsSnapshot {
    /// Registry id.
    pub const ID: &'static str = "daily-metrics-snapshot";
}

#[async_trait::async_trait]
impl Job for DailyMetricsSnapshot {
    fn id(&self) -> &'static str {
        Self::ID
    }

    async fn run(&self, ctx: &JobContext) -> Result<JobReport, JobError> {
        let window = ctx.engine.today_window();

        let mut succeeded: Vec<&'static str> = Vec::new();
        let mut failed: Vec<serde_json::Value> = Vec::new();
        let mut note = |metric: &'static str, result: Result<(), String>| match result {
            Ok(()) => succeeded.push(metric),
            Err(error) => {
                tracing::error!(metric, error = %error, "Daily snapshot sub-computation failed");
                failed.push(json!({"metric": metric, "error": error}));
            }
        };

        note(
            "clv",
            ctx.engine
                .compute_clv(&window, None)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string()),
        );
        note(
            "conversion_rate",
            ctx.engine
                .compute_conversion_rate(&window)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string()),
        );
        note(
            "revenue",
            ctx.engine
                .compute_revenue(&window, RevenueGrouping::Day)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string()),
        );

        let summary = format!("snapshotted {}/3 daily metrics", succeeded.len());
        Ok(JobReport::new(
            summary,
            json!({"succeeded": succeeded, "failed": failed}),
        ))
    }
}
