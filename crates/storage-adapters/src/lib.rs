//! # storage-adapters
//!
//! Implementations of the `domains` ports: PostgreSQL (feature
//! `db-postgres`), an in-memory store, and a broadcast event sink.

pub mod memory;
pub mod notify;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::MemoryStore;
pub use notify::BroadcastEvents;

#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;
