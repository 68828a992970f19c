use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Fractional day-of-year (1.0 is 00:00 on January 1st).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayOfYear(f64);

impl DayOfYear {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// Raw day value as f64.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Day-of-year of a calendar date at 00:00.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.ordinal() as f64)
    }

    /// The day halfway between `self` and `other`.
    pub fn midpoint(self, other: DayOfYear) -> Self {
        Self((self.0 + other.0) / 2.0)
    }

    /// Shift by a duration in seconds.
    pub fn plus_seconds(self, seconds: f64) -> Self {
        Self(self.0 + seconds / 86_400.0)
    }

    pub fn plus_days(self, days: f64) -> Self {
        Self(self.0 + days)
    }
}

impl From<f64> for DayOfYear {
    fn from(v: f64) -> Self {
        DayOfYear::new(v)
    }
}

impl std::fmt::Display for DayOfYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Closed day-of-year interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayRange {
    pub start: DayOfYear,
    pub end: DayOfYear,
}

impl DayRange {
    /// Creates a range, returning `None` when `end` precedes `start`.
    pub fn new(start: DayOfYear, end: DayOfYear) -> Option<Self> {
        if end.value() < start.value() {
            None
        } else {
            Some(Self { start, end })
        }
    }

    pub fn contains(&self, day: DayOfYear) -> bool {
        day.value() >= self.start.value() && day.value() <= self.end.value()
    }

    /// True when the two closed intervals share at least one instant.
    pub fn overlaps(&self, other: &DayRange) -> bool {
        self.start.value() <= other.end.value() && other.start.value() <= self.end.value()
    }
}

impl std::fmt::Display for DayRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_date_uses_ordinal() {
        let date = NaiveDate::from_ymd_opt(2013, 11, 6).unwrap();
        assert_eq!(DayOfYear::from_date(date).value(), 310.0);
    }

    #[test]
    fn test_range_rejects_reversed_bounds() {
        assert!(DayRange::new(DayOfYear::new(5.0), DayOfYear::new(4.0)).is_none());
    }

    #[test]
    fn test_overlap_is_inclusive_at_edges() {
        let a = DayRange::new(DayOfYear::new(310.0), DayOfYear::new(312.0)).unwrap();
        let b = DayRange::new(DayOfYear::new(312.0), DayOfYear::new(314.0)).unwrap();
        let c = DayRange::new(DayOfYear::new(312.5), DayOfYear::new(314.0)).unwrap();
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_plus_seconds() {
        let day = DayOfYear::new(310.0).plus_seconds(43_200.0);
        assert_eq!(day.value(), 310.5);
    }
}
