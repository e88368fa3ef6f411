//! Low-stock alerting.

use serde_json::json;

use crate::db::products;
use crate::notify::messages::{self, LowStockLine, stock_label};

use super::{Job, JobContext, JobError, JobReport, send_to_admins};

/// Scans active products at or below their restock threshold and sends
/// one alert listing all of them to every admin recipient.
pub struct LowStockAlert;

impl LowStockAlert {
    /// Registry id.
    pub const ID: &'static str = "low-stock-alert";

    /// Upper bound on one scan; large catalogs page through over
    /// successive runs rather than scanning unbounded.
    pub const SCAN_CAP: i64 = 500;
}

#[async_trait::async_trait]
impl Job for LowStockAlert {
    fn id(&self) -> &'static str {
        Self::ID
    }

    async fn run(&self, ctx: &JobContext) -> Result<JobReport, JobError> {
        let products = products::low_stock_active(&ctx.pool, Self::SCAN_CAP).await?;

        if products.is_empty() {
            return Ok(JobReport::new(
                "no products below restock threshold",
                json!({"flagged": 0, "sent": 0, "failed": 0}),
            ));
        }

        let lines: Vec<LowStockLine> = products
            .iter()
            .map(|p| LowStockLine {
                name: p.name.clone(),
                product_id: p.id.as_i64(),
                stock: p.stock,
                min_stock: p.min_stock,
                label: stock_label(p.stock),
            })
            .collect();

        let message = messages::low_stock_alert(&lines)?;
        let (sent, failed) = send_to_admins(ctx, &message).await;

        Ok(JobReport::new(
            format!(
                "{} product(s) flagged; alerted {sent} recipient(s), {failed} failed",
                lines.len()
            ),
            json!({"flagged": lines.len(), "sent": sent, "failed": failed}),
        ))
    }
}
