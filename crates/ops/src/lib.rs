//! Tidewater Ops library.
//!
//! The back-office operations service: recurring business jobs (stock
//! alerts, abandoned-cart recovery, metric snapshots, retention cleanup,
//! featured-product curation, weekly reporting), the metrics engine they
//! feed, and the HTTP trigger surface an external scheduler calls.
//!
//! Exposed as a library so the service can be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod notify;
pub mod routes;
pub mod state;
