//! The static job catalogue.
//!
//! One entry per job, in a fixed order; the registry is owned by process
//! state and handed to the runner. Scheduling text is informational only -
//! the actual cadence lives in the external scheduler that calls the
//! trigger endpoints.

use std::sync::Arc;

use serde::Serialize;

use super::{
    Job, cart_cleanup::CartCleanup, cart_recovery::CartRecovery,
    daily_snapshot::DailyMetricsSnapshot, featured::FeaturedProductsRefresh,
    low_stock::LowStockAlert, weekly_report::WeeklyReport,
};

/// Static description of one job.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct JobDescriptor {
    /// Stable identifier, also the trigger path segment.
    pub id: &'static str,
    /// Human name.
    pub name: &'static str,
    /// What the job does.
    pub description: &'static str,
    /// Informational schedule text (actual triggering is external).
    pub schedule: &'static str,
    /// Whether "run all" includes this job.
    pub enabled: bool,
}

impl JobDescriptor {
    /// Path the external scheduler POSTs to.
    #[must_use]
    pub fn trigger_path(&self) -> String {
        format!("/cron/{}", self.id)
    }
}

/// A descriptor paired with its runnable body.
pub struct RegisteredJob {
    /// The static description.
    pub descriptor: JobDescriptor,
    job: Arc<dyn Job>,
}

impl RegisteredJob {
    /// The runnable body.
    #[must_use]
    pub fn job(&self) -> &Arc<dyn Job> {
        &self.job
    }
}

/// Ordered, fixed catalogue of jobs.
pub struct JobRegistry {
    entries: Vec<RegisteredJob>,
}

impl JobRegistry {
    /// The production catalogue.
    #[must_use]
    pub fn standard() -> Self {
        Self::from_entries(vec![
            (
                JobDescriptor {
                    id: LowStockAlert::ID,
                    name: "Low stock alert",
                    description: "Scan active products at or below their restock threshold \
                                  and alert every admin recipient",
                    schedule: "Every hour",
                    enabled: true,
                },
                Arc::new(LowStockAlert) as Arc<dyn Job>,
            ),
            (
                JobDescriptor {
                    id: CartRecovery::ID,
                    name: "Abandoned cart recovery",
                    description: "Send recovery reminders for carts idle for two hours, \
                                  oldest first, capped per run",
                    schedule: "Every 2 hours",
                    enabled: true,
                },
                Arc::new(CartRecovery) as Arc<dyn Job>,
            ),
            (
                JobDescriptor {
                    id: DailyMetricsSnapshot::ID,
                    name: "Daily metrics snapshot",
                    description: "Snapshot CLV, conversion rate and revenue for the current \
                                  local day",
                    schedule: "Daily at 23:55",
                    enabled: true,
                },
                Arc::new(DailyMetricsSnapshot) as Arc<dyn Job>,
            ),
            (
                JobDescriptor {
                    id: CartCleanup::ID,
                    name: "Cart cleanup",
                    description: "Hard-delete carts untouched for thirty days",
                    schedule: "Daily at 03:00",
                    enabled: true,
                },
                Arc::new(CartCleanup) as Arc<dyn Job>,
            ),
            (
                JobDescriptor {
                    id: FeaturedProductsRefresh::ID,
                    name: "Featured products refresh",
                    description: "Re-curate the featured set from the trailing month's \
                                  best sellers",
                    schedule: "Daily at 04:00",
                    enabled: true,
                },
                Arc::new(FeaturedProductsRefresh) as Arc<dyn Job>,
            ),
            (
                JobDescriptor {
                    id: WeeklyReport::ID,
                    name: "Weekly report",
                    description: "Mail trailing-week figures to every admin recipient",
                    schedule: "Mondays at 08:00",
                    enabled: true,
                },
                Arc::new(WeeklyReport) as Arc<dyn Job>,
            ),
        ])
    }

    /// Build a registry from explicit entries (tests compose small ones).
    #[must_use]
    pub fn from_entries(entries: Vec<(JobDescriptor, Arc<dyn Job>)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(descriptor, job)| RegisteredJob { descriptor, job })
                .collect(),
        }
    }

    /// Look up one job by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&RegisteredJob> {
        self.entries.iter().find(|e| e.descriptor.id == id)
    }

    /// All entries in catalogue order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredJob> {
        self.entries.iter()
    }

    /// All descriptors in catalogue order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<JobDescriptor> {
        self.entries.iter().map(|e| e.descriptor).collect()
    }

    /// Number of registered jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
