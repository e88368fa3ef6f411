//! Visitor-to-order conversion and cart recovery rates.

use std::collections::HashSet;

use serde::Serialize;
use tidewater_core::{CartStatus, Email};

use crate::db::carts::AbandonedCart;
use crate::db::orders::Order;

/// Conversion metrics over one window.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    /// Orders in a qualifying fulfillment status.
    pub total_orders: u64,
    /// Estimated unique visitors (distinct emails across qualifying orders
    /// and carts).
    pub total_visitors: u64,
    /// `total_orders / total_visitors * 100`; exactly 0 when there are no
    /// visitors.
    pub conversion_rate: f64,
    /// Carts still abandoned in the window.
    pub abandoned_carts: u64,
    /// Carts recovered in the window.
    pub recovered_carts: u64,
    /// `recovered / (abandoned + recovered) * 100`; 0 on a zero
    /// denominator.
    pub cart_recovery_rate: f64,
}

/// Aggregate conversion metrics from orders and carts in one window.
///
/// Unique visitors are estimated as the union of distinct customer emails
/// across qualifying orders and all carts; carts and orders without an
/// email contribute nothing to the estimate.
#[must_use]
pub fn aggregate(orders: &[Order], carts: &[AbandonedCart]) -> ConversionReport {
    let qualifying: Vec<&Order> = orders
        .iter()
        .filter(|o| o.fulfillment_status.qualifies_for_revenue())
        .collect();
    let total_orders = qualifying.len() as u64;

    let mut visitors: HashSet<&Email> = qualifying.iter().filter_map(|o| o.email.as_ref()).collect();
    visitors.extend(carts.iter().filter_map(|c| c.email.as_ref()));
    let total_visitors = visitors.len() as u64;

    let abandoned_carts = carts
        .iter()
        .filter(|c| c.status == CartStatus::Abandoned)
        .count() as u64;
    let recovered_carts = carts
        .iter()
        .filter(|c| c.status == CartStatus::Recovered)
        .count() as u64;

    ConversionReport {
        total_orders,
        total_visitors,
        conversion_rate: percentage(total_orders, total_visitors),
        abandoned_carts,
        recovered_carts,
        cart_recovery_rate: percentage(recovered_carts, abandoned_carts + recovered_carts),
    }
}

/// `part / whole * 100`, guarded against a zero denominator.
#[allow(clippy::cast_precision_loss)] // counts stay far below f64's 2^52
pub(crate) fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
