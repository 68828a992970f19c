//! Thermal/safety zones of the pitch angle.
//!
//! Pitch is the angle between the boresight and the sun line. The bands are
//! fixed; each lower bound is inclusive and each upper bound exclusive, except
//! that 180 belongs to the forbidden zone.

use serde::{Deserialize, Serialize};

/// Pitch zone, ordered by increasing lower bound of its main band.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PitchZone {
    /// `[0, 46)` and `[170, 180]`
    Forbidden,
    /// `[46, 56)`
    Psmc,
    /// `[56, 70)`
    GoodLow,
    /// `[70, 127)`
    Bad,
    /// `[127, 145)`
    GoodHigh,
    /// `[145, 156)`
    Cold,
    /// `[156, 170)`
    PLine,
}

impl PitchZone {
    pub const ALL: [PitchZone; 7] = [
        PitchZone::Forbidden,
        PitchZone::Psmc,
        PitchZone::GoodLow,
        PitchZone::Bad,
        PitchZone::GoodHigh,
        PitchZone::Cold,
        PitchZone::PLine,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PitchZone::Forbidden => "forbidden",
            PitchZone::Psmc => "psmc",
            PitchZone::GoodLow => "good_low",
            PitchZone::Bad => "bad",
            PitchZone::GoodHigh => "good_high",
            PitchZone::Cold => "cold",
            PitchZone::PLine => "p_line",
        }
    }

    /// Zone of a pitch angle in degrees. NaN and values outside `[0, 180]`
    /// are forbidden.
    pub fn classify(pitch_deg: f64) -> PitchZone {
        if !(0.0..=180.0).contains(&pitch_deg) {
            return PitchZone::Forbidden;
        }
        match pitch_deg {
            p if p < 46.0 => PitchZone::Forbidden,
            p if p < 56.0 => PitchZone::Psmc,
            p if p < 70.0 => PitchZone::GoodLow,
            p if p < 127.0 => PitchZone::Bad,
            p if p < 145.0 => PitchZone::GoodHigh,
            p if p < 156.0 => PitchZone::Cold,
            p if p < 170.0 => PitchZone::PLine,
            _ => PitchZone::Forbidden,
        }
    }

    /// Zones acceptable for science when the caller configures none.
    pub fn default_acceptable() -> Vec<PitchZone> {
        Self::ALL
            .iter()
            .copied()
            .filter(|z| !matches!(z, PitchZone::Forbidden | PitchZone::Bad))
            .collect()
    }
}

impl std::fmt::Display for PitchZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PitchZone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        PitchZone::ALL
            .iter()
            .copied()
            .find(|z| z.as_str() == wanted)
            .ok_or_else(|| format!("unknown pitch zone '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_edges() {
        assert_eq!(PitchZone::classify(0.0), PitchZone::Forbidden);
        assert_eq!(PitchZone::classify(45.999), PitchZone::Forbidden);
        assert_eq!(PitchZone::classify(46.0), PitchZone::Psmc);
        assert_eq!(PitchZone::classify(56.0), PitchZone::GoodLow);
        assert_eq!(PitchZone::classify(70.0), PitchZone::Bad);
        assert_eq!(PitchZone::classify(108.0), PitchZone::Bad);
        assert_eq!(PitchZone::classify(127.0), PitchZone::GoodHigh);
        assert_eq!(PitchZone::classify(145.0), PitchZone::Cold);
        assert_eq!(PitchZone::classify(156.0), PitchZone::PLine);
        assert_eq!(PitchZone::classify(170.0), PitchZone::Forbidden);
        assert_eq!(PitchZone::classify(180.0), PitchZone::Forbidden);
    }

    #[test]
    fn test_out_of_range_is_forbidden() {
        assert_eq!(PitchZone::classify(f64::NAN), PitchZone::Forbidden);
        assert_eq!(PitchZone::classify(-0.5), PitchZone::Forbidden);
        assert_eq!(PitchZone::classify(180.5), PitchZone::Forbidden);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("good-high".parse::<PitchZone>(), Ok(PitchZone::GoodHigh));
        assert_eq!("P_LINE".parse::<PitchZone>(), Ok(PitchZone::PLine));
        assert!("tepid".parse::<PitchZone>().is_err());
    }

    #[test]
    fn test_default_acceptable_excludes_forbidden_and_bad() {
        let zones = PitchZone::default_acceptable();
        assert_eq!(zones.len(), 5);
        assert!(!zones.contains(&PitchZone::Bad));
        assert!(!zones.contains(&PitchZone::Forbidden));
    }
}
