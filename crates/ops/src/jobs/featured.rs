//! Featured-product curation.

use std::collections::{BTreeMap, HashSet};

use serde_json::json;
use tidewater_core::ProductId;

use crate::db::orders::{self, Order};
use crate::db::products;

use super::{Job, JobContext, JobError, JobReport};

/// Re-curates the storefront's featured set: the top sellers of the
/// trailing month replace whatever is featured now. The target set is
/// computed first and applied as one transactional diff, so a concurrent
/// product write cannot land between a clear and a set step.
pub struct FeaturedProductsRefresh;

impl FeaturedProductsRefresh {
    /// Registry id.
    pub const ID: &'static str = "featured-products-refresh";

    /// Size of the curated set.
    pub const TOP_N: usize = 10;

    /// Sales lookback window.
    pub const WINDOW_DAYS: i64 = 30;

    /// Upper bound on orders scanned per run.
    pub const ORDER_SCAN_CAP: i64 = 5_000;
}

/// Units sold per product over revenue-qualifying orders, best sellers
/// first. Equal quantities break ties by product id ascending, so the
/// curated set is deterministic run to run.
#[must_use]
pub fn top_sellers(orders: &[Order], n: usize) -> Vec<(ProductId, u64)> {
    let mut units: BTreeMap<ProductId, u64> = BTreeMap::new();
    for order in orders.iter().filter(|o| o.counts_toward_revenue()) {
        for item in &order.items {
            *units.entry(item.product_id).or_insert(0) += u64::from(item.quantity);
        }
    }

    let mut ranked: Vec<(ProductId, u64)> = units.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}

/// Difference between the current featured set and the target: products
/// to unset (left the set) and to set (entered it).
#[must_use]
pub fn featured_diff(
    current: &[ProductId],
    target: &[ProductId],
) -> (Vec<ProductId>, Vec<ProductId>) {
    let current_set: HashSet<ProductId> = current.iter().copied().collect();
    let target_set: HashSet<ProductId> = target.iter().copied().collect();

    let to_clear = current
        .iter()
        .copied()
        .filter(|id| !target_set.contains(id))
        .collect();
    let to_set = target
        .iter()
        .copied()
        .filter(|id| !current_set.contains(id))
        .collect();
    (to_clear, to_set)
}

#[async_trait::async_trait]
impl Job for FeaturedProductsRefresh {
    fn id(&self) -> &'static str {
        Self::ID
    }

    async fn run(&self, ctx: &JobContext) -> Result<JobReport, JobError> {
        let window = ctx.engine.trailing_days(Self::WINDOW_DAYS);
        let orders =
            orders::recent_paid_fulfilled(&ctx.pool, &window, Self::ORDER_SCAN_CAP).await?;

        let ranked = top_sellers(&orders, Self::TOP_N);
        let target: Vec<ProductId> = ranked.iter().map(|(id, _)| *id).collect();

        let current = products::featured_ids(&ctx.pool).await?;
        let (to_clear, to_set) = featured_diff(&current, &target);
        products::apply_featured_diff(&ctx.pool, &to_clear, &to_set).await?;

        tracing::info!(
            featured = target.len(),
            cleared = to_clear.len(),
            newly_set = to_set.len(),
            "Featured set refreshed"
        );

        Ok(JobReport::new(
            format!(
                "featured {} product(s): {} newly set, {} cleared",
                target.len(),
                to_set.len(),
                to_clear.len()
            ),
            json!({
                "considered_orders": orders.len(),
                "featured": target,
                "newly_set": to_set.len(),
                "cleared": to_clear.len(),
            }),
        ))
    }
}
