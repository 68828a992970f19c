//! orcheck: compiler/validator for weekly Observing Request (OR) lists.
//!
//! Stages, in dependency order:
//!
//! 1. [`parsing`]: OR list text into a [`models::Catalog`]
//! 2. [`services::chains`]: preceding-reference chains
//! 3. [`services::pitch`] and [`services::zones`]: pitch samples and zones
//! 4. [`services::validation`]: per-observation constraint checks
//! 5. [`services::aggregation`]: time budgets by priority and pitch zone
//! 6. [`services::approval`]: approval ledger cross-reference
//!
//! [`pipeline::Pipeline`] runs them all and produces an
//! [`api::ValidationReport`].

pub mod api;
pub mod error;
pub mod models;
pub mod parsing;
pub mod pipeline;
pub mod services;

pub use error::{CheckError, CheckResult, StructuralError};
pub use pipeline::{CheckConfig, Pipeline};
