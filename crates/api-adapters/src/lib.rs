//! # api-adapters
//!
//! The HTTP routing layer for the scoring core. The axum adapter is behind
//! the `web-axum` feature; metrics are always compiled.

pub mod metrics;

#[cfg(feature = "web-axum")]
pub mod web;

pub use metrics::Metrics;
