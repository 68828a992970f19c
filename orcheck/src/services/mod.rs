//! Checking stages that run over a loaded [`crate::models::Catalog`].
//!
//! Each stage is usable on its own:
//!
//! - [`chains`]: preceding-reference chains
//! - [`geometry`], [`pitch`], [`zones`]: pitch samples and their zones
//! - [`validation`]: per-observation constraint checks
//! - [`aggregation`]: time budgets by priority and zone
//! - [`approval`]: approval ledger cross-reference

pub mod aggregation;
pub mod approval;
pub mod chains;
pub mod geometry;
pub mod pitch;
pub mod validation;
pub mod zones;

pub use aggregation::{TimeAggregator, TimeBudget};
pub use approval::{ApprovalSummary, ApprovalTracker};
pub use chains::{ChainBuilder, ChainSet};
pub use geometry::{ApproximateSunGeometry, PitchGeometry};
pub use pitch::{PitchRollComputer, PitchSample, ReferenceRoll};
pub use validation::{ConstraintValidator, Placements, ValidationIssue, ValidationStatus};
pub use zones::PitchZone;
