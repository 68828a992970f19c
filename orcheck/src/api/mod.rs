//! Report surface of the checker.
//!
//! - [`types`]: serializable report DTOs (primitives only)
//! - [`conversions`]: conversions from internal results into those DTOs

pub mod conversions;
pub mod types;

pub use types::*;
