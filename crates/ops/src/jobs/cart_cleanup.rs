//! Cart retention cleanup.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use crate::db::carts;

use super::{Job, JobContext, JobError, JobReport};

/// Hard-deletes carts untouched for the retention period. Irreversible;
/// there is no soft-delete.
pub struct CartCleanup;

impl CartCleanup {
    /// Registry id.
    pub const ID: &'static str = "cart-cleanup";

    /// Carts untouched this long are removed.
    pub const RETENTION_DAYS: i64 = 30;

    /// The instant before which a cart's `updated_at` makes it eligible
    /// for deletion.
    #[must_use]
    pub fn retention_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(Self::RETENTION_DAYS)
    }
}

#[async_trait::async_trait]
impl Job for CartCleanup {
    fn id(&self) -> &'static str {
        Self::ID
    }

    async fn run(&self, ctx: &JobContext) -> Result<JobReport, JobError> {
        let cutoff = Self::retention_cutoff(Utc::now());
        let deleted = carts::delete_stale(&ctx.pool, cutoff).await?;

        if deleted > 0 {
            tracing::info!(deleted, "Removed stale carts");
        }

        Ok(JobReport::new(
            format!("deleted {deleted} stale cart(s)"),
            json!({"deleted": deleted}),
        ))
    }
}
