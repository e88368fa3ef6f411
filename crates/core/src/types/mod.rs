//! Core types for Tidewater.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod customer;
pub mod email;
pub mod id;
pub mod item;
pub mod metric;
pub mod status;

pub use customer::CustomerKey;
pub use email::{Email, EmailError};
pub use id::*;
pub use item::{LineItem, items_total};
pub use metric::{DateWindow, MetricType, PeriodType};
pub use status::{CartStatus, FulfillmentStatus, PaymentStatus};
