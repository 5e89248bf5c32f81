//! # Domain Models
//!
//! These structs represent the core entities of the scoring core.
//! Tools, reviews and votes use UUID v4; users keep the opaque subject id
//! issued by the identity provider.

pub mod events;
pub mod review;
pub mod tool;
pub mod trust;
pub mod user;

pub use events::*;
pub use review::*;
pub use tool::*;
pub use trust::*;
pub use user::*;
