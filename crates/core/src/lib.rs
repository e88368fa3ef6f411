//! Tidewater Core - Shared types library.
//!
//! This crate provides common types used across all Tidewater components:
//! - `ops` - Back-office operations service (metrics, scheduled jobs)
//! - future storefront/admin services
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, statuses, line
//!   items, and metric descriptors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
