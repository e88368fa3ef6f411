//! Abandoned-cart recovery reminders.

use chrono::{Duration, Utc};
use serde_json::json;
use tidewater_core::CartId;

use crate::db::carts;
use crate::notify::messages::{self, format_money};

use super::{Job, JobContext, JobError, JobReport};

/// Sends a recovery reminder for carts idle past the threshold, oldest
/// first, capped per run. Carts without a resolvable email are skipped
/// silently; a failed send is counted and the loop moves on.
pub struct CartRecovery;

impl CartRecovery {
    /// Registry id.
    pub const ID: &'static str = "abandoned-cart-recovery";

    /// A cart must be idle this long (created and last touched) before a
    /// reminder goes out.
    pub const IDLE_HOURS: i64 = 2;

    /// Carts contacted per run.
    pub const BATCH_CAP: i64 = 50;
}

/// Recovery link for one cart.
#[must_use]
pub fn recovery_url(base_url: &str, cart_id: CartId) -> String {
    format!("{}/cart/recover/{cart_id}", base_url.trim_end_matches('/'))
}

#[async_trait::async_trait]
impl Job for CartRecovery {
    fn id(&self) -> &'static str {
        Self::ID
    }

    async fn run(&self, ctx: &JobContext) -> Result<JobReport, JobError> {
        let cutoff = Utc::now() - Duration::hours(Self::IDLE_HOURS);
        let carts = carts::stale_abandoned(&ctx.pool, cutoff, Self::BATCH_CAP).await?;

        let mut sent: u64 = 0;
        let mut skipped: u64 = 0;
        let mut failed: u64 = 0;

        for cart in &carts {
            let Some(email) = &cart.email else {
                skipped += 1;
                continue;
            };

            let total = format_money(cart.cart_total(), &ctx.settings.currency);
            let message = messages::cart_recovery(
                cart.items.len(),
                &total,
                &recovery_url(&ctx.settings.base_url, cart.id),
            )?;

            match ctx.notifier.send(email, &message).await {
                Ok(()) => sent += 1,
                Err(err) => {
                    failed += 1;
                    tracing::warn!(
                        cart_id = %cart.id,
                        recipient = %email,
                        error = %err,
                        "Failed to send cart recovery reminder"
                    );
                }
            }
        }

        Ok(JobReport::new(
            format!(
                "{} cart(s) eligible; {sent} reminded, {skipped} skipped, {failed} failed",
                carts.len()
            ),
            json!({
                "eligible": carts.len(),
                "sent": sent,
                "skipped": skipped,
                "failed": failed,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_url() {
        assert_eq!(
            recovery_url("https://shop.example.com", CartId::new(42)),
            "https://shop.example.com/cart/recover/42"
        );
        // trailing slash tolerated
        assert_eq!(
            recovery_url("https://shop.example.com/", CartId::new(42)),
            "https://shop.example.com/cart/recover/42"
        );
    }
}
