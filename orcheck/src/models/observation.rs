//! Observation entity as declared by one OR list record.

use std::collections::BTreeMap;

use qtty::{Degrees, Seconds};

use super::constraints::Constraint;
use super::target::Target;

crate::define_id_type!(u32, ObsId);

/// Declared exposure time of an observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DurationSpec {
    /// A single total duration.
    Total(Seconds),
    /// Split budget used when the observation may be cut at chain boundaries.
    Split {
        min: Seconds,
        nominal: Seconds,
        max: Seconds,
    },
}

impl DurationSpec {
    /// Seconds charged to time budgets: the total, or the nominal of a split.
    pub fn budget(&self) -> Seconds {
        match self {
            DurationSpec::Total(total) => *total,
            DurationSpec::Split { nominal, .. } => *nominal,
        }
    }
}

/// One `SEGMENT=(index,duration)` entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub index: u32,
    pub duration: Seconds,
}

/// Whether the attitude flipped by 180 degrees of roll is usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlipPolicy {
    #[default]
    Unspecified,
    /// "+180 ok": the flipped window is an alternative.
    Allowed,
    /// "+180 not ok": `center + 180` is an excluded angle.
    Forbidden,
}

/// Roll preference window: `center ± tolerance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollWindow {
    pub center: Degrees,
    pub tolerance: Degrees,
    pub flip: FlipPolicy,
}

impl RollWindow {
    pub fn new(center: Degrees, tolerance: Degrees) -> Self {
        Self {
            center,
            tolerance,
            flip: FlipPolicy::Unspecified,
        }
    }

    pub fn with_flip(mut self, flip: FlipPolicy) -> Self {
        self.flip = flip;
        self
    }

    /// Roll angle excluded from the window, if any.
    pub fn excluded_angle(&self) -> Option<Degrees> {
        match self.flip {
            FlipPolicy::Forbidden => Some(normalize_roll(self.center.value() + 180.0)),
            _ => None,
        }
    }
}

/// Roll either commanded to a fixed value or constrained to a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RollSpec {
    Fixed(Degrees),
    Preference(RollWindow),
}

/// Wraps a roll angle into `[0, 360)`.
pub fn normalize_roll(deg: f64) -> Degrees {
    Degrees::new(deg.rem_euclid(360.0))
}

/// Raw `PRECEDING` reference, before chain resolution.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Preceding {
    Obsid(ObsId),
    /// Non-numeric token such as a chain anchor name.
    Token(String),
}

impl std::fmt::Display for Preceding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Preceding::Obsid(id) => write!(f, "{}", id),
            Preceding::Token(token) => write!(f, "{}", token),
        }
    }
}

/// Y/Z pointing offset in arcminutes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TargetOffset {
    pub y_arcmin: f64,
    pub z_arcmin: f64,
}

impl TargetOffset {
    pub fn is_zero(&self) -> bool {
        self.y_arcmin == 0.0 && self.z_arcmin == 0.0
    }
}

/// Dither settings: `(ON|OFF, y_ampl, y_rate, y_phase, z_ampl, z_rate, z_phase)`.
///
/// Amplitudes and phases are in degrees; rates are degrees of phase per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dither {
    pub enabled: bool,
    pub y_amplitude: f64,
    pub y_rate: f64,
    pub y_phase: f64,
    pub z_amplitude: f64,
    pub z_rate: f64,
    pub z_phase: f64,
}

impl Dither {
    pub fn y_amplitude_arcsec(&self) -> f64 {
        self.y_amplitude * 3600.0
    }

    pub fn z_amplitude_arcsec(&self) -> f64 {
        self.z_amplitude * 3600.0
    }

    /// Dither period in seconds, `None` for a zero rate.
    pub fn y_period(&self) -> Option<f64> {
        period_from_rate(self.y_rate)
    }

    pub fn z_period(&self) -> Option<f64> {
        period_from_rate(self.z_rate)
    }
}

fn period_from_rate(rate: f64) -> Option<f64> {
    if rate.abs() < f64::EPSILON {
        None
    } else {
        Some(360.0 / rate.abs())
    }
}

/// Flight approval of an observation, taken from the approval ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApprovalStatus {
    Approved,
    NotApproved {
        split_of: Option<ObsId>,
    },
    /// No ledger entry; treated as approved.
    #[default]
    Unlisted,
}

/// One observation of the weekly list.
#[derive(Debug, Clone)]
pub struct Observation {
    pub obsid: ObsId,
    pub target: Target,
    pub duration: Option<DurationSpec>,
    pub segments: Vec<Segment>,
    pub priority: Option<i32>,
    pub instrument: Option<String>,
    pub grating: Option<String>,
    pub si_mode: Option<String>,
    pub aca_mode: Option<String>,
    pub offset: TargetOffset,
    pub sim_offset: Option<f64>,
    pub dither: Option<Dither>,
    pub preceding: Option<Preceding>,
    pub min_acq: Option<u32>,
    pub min_guide: Option<u32>,
    pub roll: Option<RollSpec>,
    pub approval: ApprovalStatus,
    pub constraints: Vec<Constraint>,
    /// Unrecognized fields, kept verbatim.
    pub extra: BTreeMap<String, String>,
    /// Soft anomalies found while loading.
    pub warnings: Vec<String>,
    /// 1-based line of the record in the source text.
    pub line: usize,
}

impl Observation {
    /// Minimal observation; every optional field empty.
    pub fn new(obsid: ObsId, target: Target) -> Self {
        Self {
            obsid,
            target,
            duration: None,
            segments: Vec::new(),
            priority: None,
            instrument: None,
            grating: None,
            si_mode: None,
            aca_mode: None,
            offset: TargetOffset::default(),
            sim_offset: None,
            dither: None,
            preceding: None,
            min_acq: None,
            min_guide: None,
            roll: None,
            approval: ApprovalStatus::default(),
            constraints: Vec::new(),
            extra: BTreeMap::new(),
            warnings: Vec::new(),
            line: 0,
        }
    }

    /// Seconds charged to time budgets, if a duration was declared.
    pub fn budget_seconds(&self) -> Option<f64> {
        self.duration.map(|d| d.budget().value())
    }

    /// Fixed roll angle, if commanded.
    pub fn fixed_roll(&self) -> Option<Degrees> {
        match self.roll {
            Some(RollSpec::Fixed(roll)) => Some(roll),
            _ => None,
        }
    }

    /// Roll preference window, if declared.
    pub fn roll_window(&self) -> Option<RollWindow> {
        match self.roll {
            Some(RollSpec::Preference(window)) => Some(window),
            _ => None,
        }
    }

    /// Sum of declared segment durations, `None` when there are no segments.
    pub fn segment_total(&self) -> Option<f64> {
        if self.segments.is_empty() {
            None
        } else {
            Some(self.segments.iter().map(|s| s.duration.value()).sum())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_budget_uses_nominal() {
        let split = DurationSpec::Split {
            min: Seconds::new(2000.0),
            nominal: Seconds::new(5000.0),
            max: Seconds::new(23000.0),
        };
        assert_eq!(split.budget().value(), 5000.0);
        assert_eq!(DurationSpec::Total(Seconds::new(25000.0)).budget().value(), 25000.0);
    }

    #[test]
    fn test_excluded_angle_only_when_flip_forbidden() {
        let window = RollWindow::new(Degrees::new(270.0), Degrees::new(10.0));
        assert!(window.excluded_angle().is_none());
        let forbidden = window.with_flip(FlipPolicy::Forbidden);
        assert_eq!(forbidden.excluded_angle().unwrap().value(), 90.0);
    }

    #[test]
    fn test_dither_periods() {
        let dither = Dither {
            enabled: true,
            y_amplitude: 0.002222,
            y_rate: 0.36,
            y_phase: 0.0,
            z_amplitude: 0.002222,
            z_rate: 0.5091,
            z_phase: 0.0,
        };
        assert!((dither.y_period().unwrap() - 1000.0).abs() < 1e-9);
        assert!((dither.z_period().unwrap() - 707.13).abs() < 0.01);
        assert!((dither.y_amplitude_arcsec() - 8.0).abs() < 0.01);
    }

    #[test]
    fn test_obsid_parses_from_text() {
        let id: ObsId = " 13458 ".parse().unwrap();
        assert_eq!(id, ObsId(13458));
        assert!("ANCHOR".parse::<ObsId>().is_err());
    }
}
