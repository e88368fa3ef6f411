//! Rendered notification content.
//!
//! Each notification type has an Askama HTML + plain-text template pair;
//! builders render both once so a job can fan the same content out to
//! many recipients.

use askama::Template;
use rust_decimal::Decimal;

/// A fully rendered message, ready for any [`super::Notifier`].
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub text: String,
    /// HTML body.
    pub html: String,
}

/// Severity label for a low-stock line.
#[must_use]
pub const fn stock_label(stock: i32) -> &'static str {
    if stock == 0 { "OUT OF STOCK" } else { "LOW" }
}

/// Format an amount for display in a message body.
#[must_use]
pub fn format_money(amount: Decimal, currency: &str) -> String {
    format!("{currency} {amount:.2}")
}

/// One product row in a low-stock alert.
#[derive(Debug, Clone)]
pub struct LowStockLine {
    /// Product display name.
    pub name: String,
    /// Product ID, for the back office.
    pub product_id: i64,
    /// Units left.
    pub stock: i32,
    /// Configured restock threshold.
    pub min_stock: i32,
    /// "OUT OF STOCK" or "LOW".
    pub label: &'static str,
}

#[derive(Template)]
#[template(path = "email/low_stock.html")]
struct LowStockHtml<'a> {
    lines: &'a [LowStockLine],
}

#[derive(Template)]
#[template(path = "email/low_stock.txt")]
struct LowStockText<'a> {
    lines: &'a [LowStockLine],
}

/// Render the low-stock alert listing every flagged product.
///
/// # Errors
///
/// Returns error if a template fails to render.
pub fn low_stock_alert(lines: &[LowStockLine]) -> Result<RenderedEmail, askama::Error> {
    Ok(RenderedEmail {
        subject: format!("Low stock alert: {} product(s) need attention", lines.len()),
        text: LowStockText { lines }.render()?,
        html: LowStockHtml { lines }.render()?,
    })
}

#[derive(Template)]
#[template(path = "email/cart_recovery.html")]
struct CartRecoveryHtml<'a> {
    item_count: usize,
    total: &'a str,
    recovery_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/cart_recovery.txt")]
struct CartRecoveryText<'a> {
    item_count: usize,
    total: &'a str,
    recovery_url: &'a str,
}

/// Render the reminder for one abandoned cart.
///
/// # Errors
///
/// Returns error if a template fails to render.
pub fn cart_recovery(
    item_count: usize,
    total: &str,
    recovery_url: &str,
) -> Result<RenderedEmail, askama::Error> {
    Ok(RenderedEmail {
        subject: "You left something in your cart".to_string(),
        text: CartRecoveryText {
            item_count,
            total,
            recovery_url,
        }
        .render()?,
        html: CartRecoveryHtml {
            item_count,
            total,
            recovery_url,
        }
        .render()?,
    })
}

/// Figures carried by the weekly report.
#[derive(Debug, Clone)]
pub struct WeeklyFigures {
    /// First day covered (display form).
    pub week_start: String,
    /// Last day covered (display form).
    pub week_end: String,
    /// Orders placed.
    pub order_count: u64,
    /// Revenue over paid + fulfilled orders (display form).
    pub revenue: String,
    /// Customers whose first order fell in the week.
    pub new_customers: i64,
    /// Active catalog size.
    pub active_products: i64,
    /// Top seller description (display form, e.g. "Enamel Mug (42 units)").
    pub top_product: String,
}

#[derive(Template)]
#[template(path = "email/weekly_report.html")]
struct WeeklyReportHtml<'a> {
    figures: &'a WeeklyFigures,
}

#[derive(Template)]
#[template(path = "email/weekly_report.txt")]
struct WeeklyReportText<'a> {
    figures: &'a WeeklyFigures,
}

/// Render the weekly report.
///
/// # Errors
///
/// Returns error if a template fails to render.
pub fn weekly_report(figures: &WeeklyFigures) -> Result<RenderedEmail, askama::Error> {
    Ok(RenderedEmail {
        subject: format!(
            "Weekly report: {} to {}",
            figures.week_start, figures.week_end
        ),
        text: WeeklyReportText { figures }.render()?,
        html: WeeklyReportHtml { figures }.render()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_label() {
        assert_eq!(stock_label(0), "OUT OF STOCK");
        assert_eq!(stock_label(3), "LOW");
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Decimal::new(123_450, 2), "USD"), "USD 1234.50");
        assert_eq!(format_money(Decimal::from(7), "EUR"), "EUR 7.00");
    }

    #[test]
    fn test_low_stock_alert_renders_every_line() {
        let lines = vec![
            LowStockLine {
                name: "Enamel Mug".to_string(),
                product_id: 1,
                stock: 0,
                min_stock: 5,
                label: stock_label(0),
            },
            LowStockLine {
                name: "Wool Blanket".to_string(),
                product_id: 2,
                stock: 3,
                min_stock: 5,
                label: stock_label(3),
            },
        ];
        let email = low_stock_alert(&lines).expect("render");

        assert!(email.subject.contains('2'));
        assert!(email.text.contains("Enamel Mug"));
        assert!(email.text.contains("OUT OF STOCK"));
        assert!(email.text.contains("Wool Blanket"));
        assert!(email.text.contains("LOW"));
        assert!(email.html.contains("Enamel Mug"));
    }

    #[test]
    fn test_cart_recovery_renders_link() {
        let email =
            cart_recovery(3, "USD 42.00", "https://shop.example.com/cart/recover/9").expect("render");
        assert!(email.text.contains("https://shop.example.com/cart/recover/9"));
        assert!(email.text.contains("USD 42.00"));
        assert!(email.html.contains("https://shop.example.com/cart/recover/9"));
    }

    #[test]
    fn test_weekly_report_renders_figures() {
        let figures = WeeklyFigures {
            week_start: "2025-06-01".to_string(),
            week_end: "2025-06-07".to_string(),
            order_count: 18,
            revenue: "USD 2400.00".to_string(),
            new_customers: 4,
            active_products: 120,
            top_product: "Enamel Mug (42 units)".to_string(),
        };
        let email = weekly_report(&figures).expect("render");

        assert!(email.subject.contains("2025-06-01"));
        assert!(email.text.contains("18"));
        assert!(email.text.contains("USD 2400.00"));
        assert!(email.text.contains("Enamel Mug (42 units)"));
        assert!(email.html.contains("120"));
    }
}
