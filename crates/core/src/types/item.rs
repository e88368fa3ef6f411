//! Line items carried by orders and carts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// One line of an order or cart: a product reference, a quantity, and the
/// unit price at the time the line was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product this line refers to.
    pub product_id: ProductId,
    /// Number of units.
    pub quantity: u32,
    /// Price per unit at capture time.
    pub unit_price: Decimal,
}

impl LineItem {
    /// Create a new line item.
    #[must_use]
    pub const fn new(product_id: ProductId, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            product_id,
            quantity,
            unit_price,
        }
    }

    /// Total value of this line (`quantity * unit_price`).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Sum of line totals over a slice of items.
#[must_use]
pub fn items_total(items: &[LineItem]) -> Decimal {
    items.iter().map(LineItem::line_total).sum()
}
