//! breaktool/crates/domains/src/lib.rs
//!
//! Entities, scoring rules, error taxonomy and port traits for the
//! Breaktool scoring core. No I/O happens in this crate.

pub mod errors;
pub mod models;
pub mod ports;
pub mod rules;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use ports::*;
pub use rules::*;
