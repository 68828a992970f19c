//! Pointing geometry: pitch angle of a boresight on a given day.
//!
//! The checker never models the orbit itself. It calls a [`PitchGeometry`]
//! that must be deterministic, total and return values in `[0, 180]`.
//! [`ApproximateSunGeometry`] is the built-in low-precision implementation;
//! any closure with the right signature works as well.

use qtty::Degrees;

use crate::models::DayOfYear;

/// Pitch of a boresight `(ra, dec)` at roll `roll` on day `day`.
///
/// Implementations must be pure; they are shared across worker threads.
pub trait PitchGeometry: Sync {
    fn pitch(&self, ra: Degrees, dec: Degrees, roll: Degrees, day: DayOfYear) -> Degrees;
}

impl<F> PitchGeometry for F
where
    F: Fn(Degrees, Degrees, Degrees, DayOfYear) -> Degrees + Sync,
{
    fn pitch(&self, ra: Degrees, dec: Degrees, roll: Degrees, day: DayOfYear) -> Degrees {
        self(ra, dec, roll, day)
    }
}

/// Sun-line pitch from a low-precision solar ephemeris (about 0.01 degree).
///
/// Pitch is the angular separation between the boresight and the sun. It does
/// not depend on roll.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateSunGeometry;

/// Obliquity of the ecliptic, degrees.
const OBLIQUITY: f64 = 23.439;

impl ApproximateSunGeometry {
    /// Apparent sun position `(ra, dec)` in degrees for a day-of-year.
    pub fn sun_position(day: DayOfYear) -> (f64, f64) {
        // days from the J2000-like epoch of the current year, noon Jan 1st
        let d = day.value() - 1.5;
        let mean_longitude = 280.460 + 0.985_647_4 * d;
        let mean_anomaly = (357.528 + 0.985_600_3 * d).to_radians();
        let lambda = (mean_longitude
            + 1.915 * mean_anomaly.sin()
            + 0.020 * (2.0 * mean_anomaly).sin())
        .to_radians();
        let epsilon = OBLIQUITY.to_radians();

        let ra = (epsilon.cos() * lambda.sin())
            .atan2(lambda.cos())
            .to_degrees()
            .rem_euclid(360.0);
        let dec = (epsilon.sin() * lambda.sin()).asin().to_degrees();
        (ra, dec)
    }
}

/// Great-circle separation of two equatorial positions, degrees.
pub fn angular_separation(ra1: f64, dec1: f64, ra2: f64, dec2: f64) -> f64 {
    let (ra1, dec1, ra2, dec2) = (
        ra1.to_radians(),
        dec1.to_radians(),
        ra2.to_radians(),
        dec2.to_radians(),
    );
    let cos_sep = dec1.sin() * dec2.sin() + dec1.cos() * dec2.cos() * (ra1 - ra2).cos();
    cos_sep.clamp(-1.0, 1.0).acos().to_degrees()
}

impl PitchGeometry for ApproximateSunGeometry {
    fn pitch(&self, ra: Degrees, dec: Degrees, _roll: Degrees, day: DayOfYear) -> Degrees {
        let (sun_ra, sun_dec) = Self::sun_position(day);
        let sep = angular_separation(ra.value(), dec.value(), sun_ra, sun_dec);
        Degrees::new(sep.clamp(0.0, 180.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sun_near_equinoxes_and_solstice() {
        // March equinox, around day 79-80
        let (ra, dec) = ApproximateSunGeometry::sun_position(DayOfYear::new(80.0));
        assert!(dec.abs() < 1.0, "dec = {}", dec);
        assert!(ra < 2.0 || ra > 358.0, "ra = {}", ra);

        // June solstice, around day 172
        let (ra, dec) = ApproximateSunGeometry::sun_position(DayOfYear::new(172.0));
        assert!((dec - 23.44).abs() < 0.5, "dec = {}", dec);
        assert!((ra - 90.0).abs() < 2.0, "ra = {}", ra);
    }

    #[test]
    fn test_pitch_of_sun_and_antisun() {
        let day = DayOfYear::new(172.0);
        let (ra, dec) = ApproximateSunGeometry::sun_position(day);
        let geometry = ApproximateSunGeometry;
        let roll = Degrees::new(0.0);

        let at_sun = geometry.pitch(Degrees::new(ra), Degrees::new(dec), roll, day);
        assert!(at_sun.value() < 1e-5);

        let anti = geometry.pitch(
            Degrees::new((ra + 180.0) % 360.0),
            Degrees::new(-dec),
            roll,
            day,
        );
        assert!((anti.value() - 180.0).abs() < 1e-5);
    }

    #[test]
    fn test_closure_geometry() {
        let fixed = |_ra: Degrees, _dec: Degrees, _roll: Degrees, day: DayOfYear| {
            Degrees::new(if day.value() < 313.0 { 108.0 } else { 109.0 })
        };
        let geometry: &dyn PitchGeometry = &fixed;
        let p = geometry.pitch(
            Degrees::new(0.0),
            Degrees::new(0.0),
            Degrees::new(36.0),
            DayOfYear::new(310.0),
        );
        assert_eq!(p.value(), 108.0);
    }

    #[test]
    fn test_separation_symmetry() {
        let a = angular_separation(10.0, 20.0, 50.0, -30.0);
        let b = angular_separation(50.0, -30.0, 10.0, 20.0);
        assert!((a - b).abs() < 1e-12);
        assert!((angular_separation(0.0, 0.0, 90.0, 0.0) - 90.0).abs() < 1e-9);
    }
}
