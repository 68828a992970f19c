use super::observation::{ObsId, RollWindow};
use super::time::DayRange;

/// Body whose proximity causes a low-visibility window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityKind {
    Sun,
    Moon,
}

impl VisibilityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisibilityKind::Sun => "sun",
            VisibilityKind::Moon => "moon",
        }
    }
}

impl std::str::FromStr for VisibilityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUN" => Ok(VisibilityKind::Sun),
            "MOON" => Ok(VisibilityKind::Moon),
            other => Err(format!("unknown visibility kind '{}'", other)),
        }
    }
}

/// Offset window, in days, relative to a reference observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetRange {
    pub min_days: f64,
    pub max_days: f64,
}

impl OffsetRange {
    pub fn contains(&self, days: f64) -> bool {
        days >= self.min_days && days <= self.max_days
    }
}

/// Comment-derived constraint attached to a single observation.
///
/// Constraints never change the candidate list; they only feed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    RollPreference(RollWindow),
    Blackout {
        window: DayRange,
        kind: VisibilityKind,
    },
    MonitoringOffset {
        reference: ObsId,
        offset: OffsetRange,
    },
    Stability {
        note: Option<String>,
    },
}
