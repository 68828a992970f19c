//! Serializable report DTOs.
//!
//! Report types hold primitives only: quantities become `f64`, identifiers
//! become `u32`. Collections are ordered so that the same input always
//! serializes to the same bytes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::services::validation::{ValidationIssue, ValidationStatus};
use crate::services::zones::PitchZone;

/// Complete output of one checker run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// SHA-256 of the OR list text and result-affecting configuration.
    pub checksum: String,
    pub reference_days: Vec<f64>,
    pub summary: ReportSummary,
    /// One entry per observation, ascending obsid.
    pub observations: Vec<ObservationEntry>,
    pub chains: Vec<ChainReport>,
    pub time_budget: TimeBudgetReport,
    pub approval: ApprovalReport,
    /// Week-level notices not tied to one observation.
    pub notices: Vec<String>,
    /// Comment text per key (`GENERAL` or obsid), passed through verbatim.
    pub comments: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub observations: usize,
    pub valid: usize,
    pub warnings: usize,
    pub errors: usize,
    pub chains: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationEntry {
    pub obsid: u32,
    pub target: String,
    pub ra: f64,
    pub dec: f64,
    pub line: usize,
    pub priority: Option<i32>,
    pub budget_seconds: Option<f64>,
    pub instrument: Option<String>,
    pub grating: Option<String>,
    pub roll: Option<RollReport>,
    pub preceding: Option<String>,
    pub chain: Option<ChainPositionReport>,
    pub approval: String,
    pub samples: Vec<PitchSampleReport>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub roll_window: Vec<RollDayReport>,
    /// Unrecognized record fields, verbatim.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub extra: BTreeMap<String, String>,
    pub issues: Vec<ValidationIssue>,
    pub status: ValidationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RollReport {
    Fixed {
        angle: f64,
    },
    Preference {
        center: f64,
        tolerance: f64,
        flip: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainPositionReport {
    pub chain: usize,
    pub position: usize,
    pub length: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchSampleReport {
    pub day: f64,
    pub pitch: f64,
    pub roll: f64,
    pub zone: PitchZone,
}

/// Roll window scan result on one reference day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollDayReport {
    pub day: f64,
    pub center_pitch: f64,
    pub center_zone: PitchZone,
    pub acceptable_roll: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReport {
    pub index: usize,
    pub start: String,
    pub reference: Option<String>,
    pub members: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBudgetReport {
    pub aggregation_day: f64,
    pub reference_roll: String,
    pub total_seconds: f64,
    pub included: usize,
    pub by_priority: Vec<PriorityShare>,
    pub by_zone: Vec<ZoneShare>,
    pub excluded: Vec<ExclusionReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorityShare {
    pub priority: i32,
    pub seconds: f64,
    pub percent: f64,
    pub observations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneShare {
    pub zone: PitchZone,
    pub seconds: f64,
    pub percent: f64,
    pub observations: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionReport {
    pub obsid: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalReport {
    pub approved_for_flight: Vec<u32>,
    pub split_only: Vec<u32>,
    pub unlisted: Vec<u32>,
    pub invalid: Vec<ExclusionReport>,
    pub stale_entries: Vec<u32>,
}

impl ValidationReport {
    /// Entry for one obsid.
    pub fn observation(&self, obsid: u32) -> Option<&ObservationEntry> {
        self.observations
            .binary_search_by_key(&obsid, |e| e.obsid)
            .ok()
            .map(|i| &self.observations[i])
    }

    /// Pretty JSON rendering.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
