//! Checker configuration file support.
//!
//! Every key is optional. Parse errors name the offending key path, e.g.
//! `roll.acceptable_zones[1]: unknown variant 'tepid'`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CheckError, CheckResult};
use crate::models::{DayOfYear, ObsId};
use crate::services::chains::DEFAULT_ANCHOR_OBSID_FLOOR;
use crate::services::pitch::{ReferenceRoll, DEFAULT_SEARCH_STEP_DEG, MIN_SEARCH_STEP_DEG};
use crate::services::validation::{Placements, DEFAULT_SEGMENT_TOLERANCE_SECONDS};
use crate::services::zones::PitchZone;

/// Checker configuration from file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckConfig {
    #[serde(default)]
    pub week: WeekSettings,
    #[serde(default)]
    pub roll: RollSettings,
    #[serde(default)]
    pub tolerances: ToleranceSettings,
    #[serde(default)]
    pub chains: ChainSettings,
    #[serde(default)]
    pub run: RunSettings,
    #[serde(default, rename = "placement")]
    pub placements: Vec<PlacementSetting>,
}

/// Days at which geometry is evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeekSettings {
    /// Calendar date of the first day of the week.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default = "default_length_days")]
    pub length_days: f64,
    /// Explicit reference days; overrides `start_date`.
    #[serde(default)]
    pub reference_days: Vec<f64>,
    /// Day used for zone attribution; defaults to the midpoint of the first
    /// and last reference day.
    #[serde(default)]
    pub aggregation_day: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RollSettings {
    #[serde(default = "default_search_step")]
    pub search_step_deg: f64,
    #[serde(default)]
    pub reference_roll: ReferenceRoll,
    #[serde(default = "PitchZone::default_acceptable")]
    pub acceptable_zones: Vec<PitchZone>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToleranceSettings {
    #[serde(default = "default_segment_seconds")]
    pub segment_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainSettings {
    #[serde(default = "default_anchor_floor")]
    pub anchor_obsid_floor: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSettings {
    /// Evaluate observations on scoped worker threads.
    #[serde(default)]
    pub parallel: bool,
    /// Worker count; defaults to the available parallelism.
    #[serde(default)]
    pub workers: Option<usize>,
}

/// Proposed start of one observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlacementSetting {
    pub obsid: ObsId,
    pub start_day: f64,
}

fn default_length_days() -> f64 {
    7.0
}

fn default_search_step() -> f64 {
    DEFAULT_SEARCH_STEP_DEG
}

fn default_segment_seconds() -> f64 {
    DEFAULT_SEGMENT_TOLERANCE_SECONDS
}

fn default_anchor_floor() -> u32 {
    DEFAULT_ANCHOR_OBSID_FLOOR
}

impl Default for WeekSettings {
    fn default() -> Self {
        Self {
            start_date: None,
            length_days: default_length_days(),
            reference_days: Vec::new(),
            aggregation_day: None,
        }
    }
}

impl Default for RollSettings {
    fn default() -> Self {
        Self {
            search_step_deg: default_search_step(),
            reference_roll: ReferenceRoll::default(),
            acceptable_zones: PitchZone::default_acceptable(),
        }
    }
}

impl Default for ToleranceSettings {
    fn default() -> Self {
        Self {
            segment_seconds: default_segment_seconds(),
        }
    }
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            anchor_obsid_floor: default_anchor_floor(),
        }
    }
}

impl CheckConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> CheckResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| CheckError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> CheckResult<Self> {
        let deserializer = toml::Deserializer::new(content);
        let config: CheckConfig = serde_path_to_error::deserialize(deserializer).map_err(|e| {
            CheckError::Configuration(format!("{}: {}", e.path(), e.inner().message()))
        })?;
        config.check()?;
        Ok(config)
    }

    /// Load `orcheck.toml` from the current directory or its parent, falling
    /// back to defaults when neither exists.
    pub fn load_default() -> CheckResult<Self> {
        let search_paths = [
            PathBuf::from("orcheck.toml"),
            PathBuf::from("../orcheck.toml"),
        ];
        for path in &search_paths {
            if path.exists() {
                log::info!("using configuration {}", path.display());
                return Self::from_file(path);
            }
        }
        Ok(Self::default())
    }

    fn check(&self) -> CheckResult<()> {
        if !(self.roll.search_step_deg.is_finite()
            && self.roll.search_step_deg >= MIN_SEARCH_STEP_DEG)
        {
            return Err(CheckError::Configuration(format!(
                "roll.search_step_deg: must be at least {}, found {}",
                MIN_SEARCH_STEP_DEG, self.roll.search_step_deg
            )));
        }
        if self.tolerances.segment_seconds < 0.0 {
            return Err(CheckError::Configuration(format!(
                "tolerances.segment_seconds: must not be negative, found {}",
                self.tolerances.segment_seconds
            )));
        }
        if self.week.length_days < 1.0 {
            return Err(CheckError::Configuration(format!(
                "week.length_days: must be at least 1, found {}",
                self.week.length_days
            )));
        }
        if self.run.workers == Some(0) {
            return Err(CheckError::Configuration(
                "run.workers: must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Reference days, in ascending order.
    ///
    /// Explicit `week.reference_days` win; otherwise the first and last day of
    /// the week starting at `week.start_date`.
    pub fn reference_days(&self) -> CheckResult<Vec<DayOfYear>> {
        if !self.week.reference_days.is_empty() {
            let mut days: Vec<f64> = self.week.reference_days.clone();
            days.sort_by(|a, b| a.total_cmp(b));
            days.dedup();
            return Ok(days.into_iter().map(DayOfYear::new).collect());
        }
        match self.week.start_date {
            Some(date) => {
                let first = DayOfYear::from_date(date);
                Ok(vec![first, first.plus_days(self.week.length_days - 1.0)])
            }
            None => Err(CheckError::Configuration(
                "week: set reference_days or start_date".to_string(),
            )),
        }
    }

    /// Day used to attribute observations to pitch zones.
    pub fn aggregation_day(&self) -> CheckResult<DayOfYear> {
        if let Some(day) = self.week.aggregation_day {
            return Ok(DayOfYear::new(day));
        }
        let days = self.reference_days()?;
        match (days.first(), days.last()) {
            (Some(first), Some(last)) => Ok(first.midpoint(*last)),
            _ => Err(CheckError::Configuration(
                "week: no reference days".to_string(),
            )),
        }
    }

    pub fn placements(&self) -> Placements {
        self.placements
            .iter()
            .map(|p| (p.obsid, DayOfYear::new(p.start_day)))
            .collect()
    }

    pub fn worker_count(&self) -> usize {
        self.run
            .workers
            .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(1)
    }
}
