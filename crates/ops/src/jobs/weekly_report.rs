//! Weekly business report.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use tidewater_core::DateWindow;

use crate::db::{orders, products};
use crate::notify::messages::{self, WeeklyFigures, format_money};

use super::{Job, JobContext, JobError, JobReport, featured::top_sellers, send_to_admins};

/// Mails trailing-week figures (orders, revenue, new customers, catalog
/// size, top seller) to every admin recipient, with per-recipient failure
/// isolation.
pub struct WeeklyReport;

impl WeeklyReport {
    /// Registry id.
    pub const ID: &'static str = "weekly-report";

    /// Length of the trailing window.
    pub const WINDOW_DAYS: i64 = 7;
}

#[async_trait::async_trait]
impl Job for WeeklyReport {
    fn id(&self) -> &'static str {
        Self::ID
    }

    async fn run(&self, ctx: &JobContext) -> Result<JobReport, JobError> {
        let end = Utc::now();
        let start = end - Duration::days(Self::WINDOW_DAYS);
        let window = DateWindow::between(start, end);

        let placed = orders::created_in_window(&ctx.pool, &window).await?;
        let paid = orders::paid_fulfilled_in_window(&ctx.pool, &window).await?;
        let revenue: Decimal = paid.iter().map(|o| o.total).sum();
        let new_customers = orders::new_customer_count(&ctx.pool, &window).await?;
        let active_products = products::active_count(&ctx.pool).await?;

        let top_product = match top_sellers(&paid, 1).first() {
            Some(&(id, units)) => {
                let names = products::names_for(&ctx.pool, &[id]).await?;
                names.first().map_or_else(
                    || format!("product #{id} ({units} units)"),
                    |(_, name)| format!("{name} ({units} units)"),
                )
            }
            None => "n/a".to_string(),
        };

        let figures = WeeklyFigures {
            week_start: start.date_naive().to_string(),
            week_end: end.date_naive().to_string(),
            order_count: placed.len() as u64,
            revenue: format_money(revenue, &ctx.settings.currency),
            new_customers,
            active_products,
            top_product: top_product.clone(),
        };

        let message = messages::weekly_report(&figures)?;
        let (sent, failed) = send_to_admins(ctx, &message).await;

        Ok(JobReport::new(
            format!(
                "weekly report sent to {sent} recipient(s), {failed} failed ({} orders, {})",
                figures.order_count, figures.revenue
            ),
            json!({
                "order_count": figures.order_count,
                "revenue": revenue,
                "new_customers": new_customers,
                "active_products": active_products,
                "top_product": top_product,
                "sent": sent,
                "failed": failed,
            }),
        ))
    }
}
