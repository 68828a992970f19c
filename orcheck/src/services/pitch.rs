//! Pitch/roll computation for observations.
//!
//! [`PitchRollComputer`] turns an observation, a roll and a day into a pitch
//! sample through an injected [`PitchGeometry`], and scans roll preference
//! windows for a roll that keeps the pitch in an acceptable zone.

use qtty::Degrees;
use serde::{Deserialize, Serialize};

use super::geometry::PitchGeometry;
use super::zones::PitchZone;
use crate::models::{normalize_roll, DayOfYear, FlipPolicy, ObsId, Observation, RollWindow};

/// Default roll scan step, degrees.
pub const DEFAULT_SEARCH_STEP_DEG: f64 = 1.0;

/// Finest roll scan step accepted, degrees.
pub const MIN_SEARCH_STEP_DEG: f64 = 0.01;

/// Roll used when an observation must be placed in a single zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceRoll {
    /// Fixed roll, else the preference window center.
    #[default]
    PreferenceCenter,
    /// Fixed roll only; observations with a preference window are ambiguous.
    FixedOnly,
}

impl ReferenceRoll {
    pub fn roll_for(&self, obs: &Observation) -> Option<Degrees> {
        if let Some(fixed) = obs.fixed_roll() {
            return Some(fixed);
        }
        match self {
            ReferenceRoll::PreferenceCenter => obs.roll_window().map(|w| w.center),
            ReferenceRoll::FixedOnly => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceRoll::PreferenceCenter => "preference_center",
            ReferenceRoll::FixedOnly => "fixed_only",
        }
    }
}

/// Pitch of one observation at one roll and day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchSample {
    pub obsid: ObsId,
    pub day: DayOfYear,
    pub pitch: Degrees,
    pub roll: Degrees,
    pub zone: PitchZone,
}

/// Roll window scan on one reference day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayWindowResult {
    pub day: DayOfYear,
    /// Sample at the window center.
    pub center: PitchSample,
    /// First roll found in an acceptable zone, nearest the center first.
    pub acceptable_roll: Option<Degrees>,
}

impl DayWindowResult {
    pub fn is_satisfied(&self) -> bool {
        self.acceptable_roll.is_some()
    }
}

/// Roll window scan over all reference days.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowEvaluation {
    pub window: RollWindow,
    pub days: Vec<DayWindowResult>,
}

impl WindowEvaluation {
    pub fn satisfied_days(&self) -> usize {
        self.days.iter().filter(|d| d.is_satisfied()).count()
    }

    pub fn all_satisfied(&self) -> bool {
        self.satisfied_days() == self.days.len()
    }

    pub fn none_satisfied(&self) -> bool {
        self.satisfied_days() == 0
    }
}

/// Computes pitch samples through an injected geometry.
#[derive(Clone)]
pub struct PitchRollComputer<'g> {
    geometry: &'g dyn PitchGeometry,
    search_step_deg: f64,
    acceptable_zones: Vec<PitchZone>,
}

impl<'g> PitchRollComputer<'g> {
    pub fn new(geometry: &'g dyn PitchGeometry) -> Self {
        Self {
            geometry,
            search_step_deg: DEFAULT_SEARCH_STEP_DEG,
            acceptable_zones: PitchZone::default_acceptable(),
        }
    }

    /// Roll scan step; non-positive or non-finite values fall back to 1 degree
    /// and finer steps are raised to [`MIN_SEARCH_STEP_DEG`].
    pub fn with_search_step(mut self, step_deg: f64) -> Self {
        self.search_step_deg = if step_deg.is_finite() && step_deg > 0.0 {
            step_deg.max(MIN_SEARCH_STEP_DEG)
        } else {
            DEFAULT_SEARCH_STEP_DEG
        };
        self
    }

    pub fn with_acceptable_zones(mut self, zones: Vec<PitchZone>) -> Self {
        self.acceptable_zones = zones;
        self
    }

    pub fn is_acceptable(&self, zone: PitchZone) -> bool {
        self.acceptable_zones.contains(&zone)
    }

    /// Boresight `(ra, dec)` once the target offset is applied at `roll`.
    ///
    /// Small-angle approximation: the Y/Z offset is rotated by roll into
    /// east/north components on the tangent plane.
    pub fn boresight(&self, obs: &Observation, roll: Degrees) -> (Degrees, Degrees) {
        let ra = obs.target.ra.value();
        let dec = obs.target.dec.value();
        if obs.offset.is_zero() {
            return (Degrees::new(ra), Degrees::new(dec));
        }

        let (sin_r, cos_r) = roll.value().to_radians().sin_cos();
        let y = obs.offset.y_arcmin / 60.0;
        let z = obs.offset.z_arcmin / 60.0;
        let east = y * cos_r - z * sin_r;
        let north = y * sin_r + z * cos_r;

        let cos_dec = dec.to_radians().cos().abs().max(1e-6);
        let bore_ra = (ra - east / cos_dec).rem_euclid(360.0);
        let bore_dec = (dec - north).clamp(-90.0, 90.0);
        (Degrees::new(bore_ra), Degrees::new(bore_dec))
    }

    pub fn pitch(&self, obs: &Observation, roll: Degrees, day: DayOfYear) -> Degrees {
        let (ra, dec) = self.boresight(obs, roll);
        self.geometry.pitch(ra, dec, roll, day)
    }

    pub fn sample(&self, obs: &Observation, roll: Degrees, day: DayOfYear) -> PitchSample {
        let pitch = self.pitch(obs, roll, day);
        PitchSample {
            obsid: obs.obsid,
            day,
            pitch,
            roll,
            zone: PitchZone::classify(pitch.value()),
        }
    }

    pub fn samples(&self, obs: &Observation, roll: Degrees, days: &[DayOfYear]) -> Vec<PitchSample> {
        days.iter().map(|day| self.sample(obs, roll, *day)).collect()
    }

    /// Candidate rolls of a window, nearest the center first.
    ///
    /// Both endpoints are included. With `+180 ok` the flipped window follows
    /// the primary one; with `+180 not ok` the flipped center is skipped.
    pub fn candidate_rolls(&self, window: &RollWindow) -> Vec<Degrees> {
        let tol = window.tolerance.value().abs();
        let step = self.search_step_deg;

        let mut offsets = vec![0.0];
        let mut k = 1.0;
        while k * step < tol {
            offsets.push(k * step);
            offsets.push(-k * step);
            k += 1.0;
        }
        if tol > 0.0 {
            offsets.push(tol);
            offsets.push(-tol);
        }

        let mut bases = vec![window.center.value()];
        if window.flip == FlipPolicy::Allowed {
            bases.push(window.center.value() + 180.0);
        }
        let excluded = window.excluded_angle().map(|a| a.value());

        let mut rolls = Vec::with_capacity(bases.len() * offsets.len());
        for base in bases {
            for offset in &offsets {
                let roll = normalize_roll(base + offset);
                let is_excluded = excluded
                    .map(|ex| circular_distance(ex, roll.value()) < 1e-6)
                    .unwrap_or(false);
                if !is_excluded {
                    rolls.push(roll);
                }
            }
        }
        rolls
    }

    /// Scan `window` on every day in `days`.
    pub fn evaluate_window(
        &self,
        obs: &Observation,
        window: &RollWindow,
        days: &[DayOfYear],
    ) -> WindowEvaluation {
        let candidates = self.candidate_rolls(window);
        let days = days
            .iter()
            .map(|day| {
                let center = self.sample(obs, normalize_roll(window.center.value()), *day);
                let acceptable_roll = candidates
                    .iter()
                    .copied()
                    .find(|roll| self.is_acceptable(self.sample(obs, *roll, *day).zone));
                DayWindowResult {
                    day: *day,
                    center,
                    acceptable_roll,
                }
            })
            .collect();

        WindowEvaluation {
            window: *window,
            days,
        }
    }
}

fn circular_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Target, TargetOffset};

    fn observation() -> Observation {
        Observation::new(
            ObsId(13458),
            Target::new("Orion", Degrees::new(83.8221), Degrees::new(-5.3911)),
        )
    }

    /// Pitch equal to the roll angle folded into [0, 180].
    fn roll_as_pitch(_ra: Degrees, _dec: Degrees, roll: Degrees, _day: DayOfYear) -> Degrees {
        let r = roll.value().rem_euclid(360.0);
        Degrees::new(if r > 180.0 { 360.0 - r } else { r })
    }

    #[test]
    fn test_reference_roll_rules() {
        let mut obs = observation();
        obs.roll = Some(crate::models::RollSpec::Preference(RollWindow::new(
            Degrees::new(120.0),
            Degrees::new(10.0),
        )));
        assert_eq!(
            ReferenceRoll::PreferenceCenter.roll_for(&obs).map(|r| r.value()),
            Some(120.0)
        );
        assert!(ReferenceRoll::FixedOnly.roll_for(&obs).is_none());

        obs.roll = Some(crate::models::RollSpec::Fixed(Degrees::new(36.0)));
        assert_eq!(
            ReferenceRoll::FixedOnly.roll_for(&obs).map(|r| r.value()),
            Some(36.0)
        );
    }

    #[test]
    fn test_candidate_rolls_include_endpoints() {
        let geometry = roll_as_pitch;
        let computer = PitchRollComputer::new(&geometry).with_search_step(2.0);
        let window = RollWindow::new(Degrees::new(10.0), Degrees::new(3.0));
        let rolls: Vec<f64> = computer
            .candidate_rolls(&window)
            .iter()
            .map(|r| r.value())
            .collect();
        assert_eq!(rolls, vec![10.0, 12.0, 8.0, 13.0, 7.0]);
    }

    #[test]
    fn test_tiny_step_is_raised_to_minimum() {
        let geometry = roll_as_pitch;
        let computer = PitchRollComputer::new(&geometry).with_search_step(1e-9);
        let window = RollWindow::new(Degrees::new(90.0), Degrees::new(25.0));
        // 0.01 deg over +/-25 deg: about 5001 candidates
        let count = computer.candidate_rolls(&window).len();
        assert!((5001..=5003).contains(&count), "{}", count);
    }

    #[test]
    fn test_candidate_rolls_wrap_and_flip() {
        let geometry = roll_as_pitch;
        let computer = PitchRollComputer::new(&geometry);
        let window = RollWindow::new(Degrees::new(0.0), Degrees::new(1.0)).with_flip(FlipPolicy::Allowed);
        let rolls: Vec<f64> = computer
            .candidate_rolls(&window)
            .iter()
            .map(|r| r.value())
            .collect();
        assert_eq!(rolls, vec![0.0, 1.0, 359.0, 180.0, 181.0, 179.0]);
    }

    #[test]
    fn test_flip_forbidden_skips_excluded_angle() {
        let geometry = roll_as_pitch;
        let computer = PitchRollComputer::new(&geometry);
        let window = RollWindow::new(Degrees::new(90.0), Degrees::new(180.0)).with_flip(FlipPolicy::Forbidden);
        let rolls = computer.candidate_rolls(&window);
        assert!(rolls.iter().all(|r| (r.value() - 270.0).abs() > 1e-6));
    }

    #[test]
    fn test_window_partially_satisfied() {
        // Pitch is bad (70..127) at the center on day 310 and good on day 316.
        let geometry = |_ra: Degrees, _dec: Degrees, roll: Degrees, day: DayOfYear| {
            let base = if day.value() < 313.0 { 100.0 } else { 130.0 };
            Degrees::new(base + (roll.value() - 120.0).abs() * 0.1)
        };
        let computer = PitchRollComputer::new(&geometry);
        let window = RollWindow::new(Degrees::new(120.0), Degrees::new(5.0));
        let eval = computer.evaluate_window(
            &observation(),
            &window,
            &[DayOfYear::new(310.0), DayOfYear::new(316.0)],
        );
        assert_eq!(eval.satisfied_days(), 1);
        assert!(!eval.all_satisfied());
        assert!(!eval.none_satisfied());
        assert_eq!(eval.days[0].center.zone, PitchZone::Bad);
        assert_eq!(eval.days[1].acceptable_roll.map(|r| r.value()), Some(120.0));
    }

    #[test]
    fn test_window_satisfied_away_from_center() {
        let geometry = roll_as_pitch;
        let computer = PitchRollComputer::new(&geometry);
        // center 100 is bad; 130 is good-high
        let window = RollWindow::new(Degrees::new(100.0), Degrees::new(30.0));
        let eval = computer.evaluate_window(&observation(), &window, &[DayOfYear::new(310.0)]);
        assert!(eval.all_satisfied());
        assert_eq!(eval.days[0].center.zone, PitchZone::Bad);
        assert_eq!(eval.days[0].acceptable_roll.map(|r| r.value()), Some(127.0));
    }

    #[test]
    fn test_offset_moves_boresight() {
        let geometry = roll_as_pitch;
        let computer = PitchRollComputer::new(&geometry);
        let mut obs = observation();
        let (ra, dec) = computer.boresight(&obs, Degrees::new(0.0));
        assert_eq!((ra.value(), dec.value()), (83.8221, -5.3911));

        obs.offset = TargetOffset {
            y_arcmin: 0.0,
            z_arcmin: 6.0,
        };
        let (ra0, dec0) = computer.boresight(&obs, Degrees::new(0.0));
        assert!((dec0.value() - (-5.3911 - 0.1)).abs() < 1e-9);
        assert!((ra0.value() - 83.8221).abs() < 1e-9);

        let (ra90, dec90) = computer.boresight(&obs, Degrees::new(90.0));
        assert!((dec90.value() - -5.3911).abs() < 1e-9);
        assert!(ra90.value() > 83.8221);
    }
}
