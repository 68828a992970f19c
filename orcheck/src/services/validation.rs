//! Per-observation constraint validation.
//!
//! Every check is independent and non-fatal. A check reports zero or more
//! [`ValidationIssue`]s; the observation's [`ValidationStatus`] is the worst
//! severity among them.
//!
//! Checks:
//! - Roll preference satisfiable on each reference day
//! - Low-visibility windows versus a proposed placement
//! - Segment totals versus the declared duration
//! - Approval legality (split of an approved parent)
//! - Pitch safety at the reference samples
//! - Monitoring offsets, stability requirements
//! - Dither against the standard sets
//! - Star-catalog minimums

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::approval::{ApprovalAssessment, ApprovalTracker};
use super::pitch::{PitchRollComputer, PitchSample, WindowEvaluation};
use super::zones::PitchZone;
use crate::models::{
    Catalog, Constraint, DayOfYear, DayRange, Dither, DurationSpec, ObsId, Observation,
};

/// Proposed start day per observation, supplied by the caller.
pub type Placements = BTreeMap<ObsId, DayOfYear>;

/// Default tolerance, in seconds, between segment totals and durations.
pub const DEFAULT_SEGMENT_TOLERANCE_SECONDS: f64 = 10.0;

const DITHER_RTOL: f64 = 0.001;
const LARGE_DITHER_ARCSEC: f64 = 30.0;
const STAR_COUNT_RANGE: std::ops::RangeInclusive<u32> = 1..=8;

/// Severity of a single issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// Overall outcome for one observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Valid,
    Warning,
    Error,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Valid => "valid",
            ValidationStatus::Warning => "warning",
            ValidationStatus::Error => "error",
        }
    }

    pub fn from_issues(issues: &[ValidationIssue]) -> Self {
        match issues.iter().map(|i| i.severity).max() {
            Some(Severity::Error) => ValidationStatus::Error,
            Some(Severity::Warning) => ValidationStatus::Warning,
            _ => ValidationStatus::Valid,
        }
    }
}

/// Issue category for grouping validation problems
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Load,
    Chain,
    RollPreference,
    Visibility,
    Duration,
    Approval,
    Pitch,
    Monitoring,
    Stability,
    Dither,
    StarCatalog,
}

impl IssueCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCategory::Load => "load",
            IssueCategory::Chain => "chain",
            IssueCategory::RollPreference => "roll_preference",
            IssueCategory::Visibility => "visibility",
            IssueCategory::Duration => "duration",
            IssueCategory::Approval => "approval",
            IssueCategory::Pitch => "pitch",
            IssueCategory::Monitoring => "monitoring",
            IssueCategory::Stability => "stability",
            IssueCategory::Dither => "dither",
            IssueCategory::StarCatalog => "star_catalog",
        }
    }
}

/// A single finding against one observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub category: IssueCategory,
    pub issue_type: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<String>,
}

impl ValidationIssue {
    fn new(
        severity: Severity,
        category: IssueCategory,
        issue_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            issue_type: issue_type.into(),
            description: description.into(),
            field_name: None,
            current_value: None,
            expected_value: None,
        }
    }

    pub fn info(
        category: IssueCategory,
        issue_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Info, category, issue_type, description)
    }

    pub fn warning(
        category: IssueCategory,
        issue_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Warning, category, issue_type, description)
    }

    pub fn error(
        category: IssueCategory,
        issue_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Error, category, issue_type, description)
    }

    /// Attach the offending field with its current and expected values.
    pub fn with_field(
        mut self,
        field_name: &str,
        current_value: impl Into<String>,
        expected_value: impl Into<String>,
    ) -> Self {
        self.field_name = Some(field_name.to_string());
        self.current_value = Some(current_value.into());
        self.expected_value = Some(expected_value.into());
        self
    }
}

/// Validation output for one observation.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationCheck {
    pub obsid: ObsId,
    /// Samples at the reference roll, one per reference day.
    pub samples: Vec<PitchSample>,
    pub window: Option<WindowEvaluation>,
    pub issues: Vec<ValidationIssue>,
}

impl ObservationCheck {
    pub fn status(&self) -> ValidationStatus {
        ValidationStatus::from_issues(&self.issues)
    }
}

/// Runs the per-observation checks over one catalog snapshot.
pub struct ConstraintValidator<'a> {
    computer: &'a PitchRollComputer<'a>,
    catalog: &'a Catalog,
    placements: &'a Placements,
    reference_days: &'a [DayOfYear],
    segment_tolerance: f64,
}

impl<'a> ConstraintValidator<'a> {
    pub fn new(
        computer: &'a PitchRollComputer<'a>,
        catalog: &'a Catalog,
        placements: &'a Placements,
        reference_days: &'a [DayOfYear],
    ) -> Self {
        Self {
            computer,
            catalog,
            placements,
            reference_days,
            segment_tolerance: DEFAULT_SEGMENT_TOLERANCE_SECONDS,
        }
    }

    pub fn with_segment_tolerance(mut self, seconds: f64) -> Self {
        self.segment_tolerance = seconds.abs();
        self
    }

    /// Run every check on `obs`.
    pub fn validate(&self, obs: &Observation) -> ObservationCheck {
        let mut issues: Vec<ValidationIssue> = obs
            .warnings
            .iter()
            .map(|w| ValidationIssue::warning(IssueCategory::Load, "Record anomaly", w.clone()))
            .collect();

        let roll = obs.fixed_roll().or_else(|| obs.roll_window().map(|w| w.center));
        let samples = match roll {
            Some(roll) => self.computer.samples(obs, roll, self.reference_days),
            None => {
                issues.push(ValidationIssue::info(
                    IssueCategory::Pitch,
                    "Pitch not evaluated",
                    "No ROLL and no roll preference; pitch samples were not computed",
                ));
                Vec::new()
            }
        };

        let window = obs
            .roll_window()
            .map(|w| self.computer.evaluate_window(obs, &w, self.reference_days));

        if let Some(eval) = &window {
            issues.extend(check_roll_preference(eval));
        }
        issues.extend(self.check_blackouts(obs));
        issues.extend(self.check_segments(obs));
        issues.extend(self.check_approval(obs));
        match &window {
            Some(eval) => issues.extend(check_pitch_safety(&unreachable_samples(&samples, eval))),
            None => issues.extend(check_pitch_safety(&samples)),
        }
        issues.extend(self.check_monitoring(obs));
        issues.extend(check_stability(obs));
        if let Some(dither) = &obs.dither {
            issues.extend(check_dither(dither));
        }
        issues.extend(check_star_counts(obs));

        ObservationCheck {
            obsid: obs.obsid,
            samples,
            window,
            issues,
        }
    }

    fn check_blackouts(&self, obs: &Observation) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let placement = self.placements.get(&obs.obsid).copied();

        for constraint in &obs.constraints {
            let Constraint::Blackout { window, kind } = constraint else {
                continue;
            };
            match placement {
                None => issues.push(ValidationIssue::info(
                    IssueCategory::Visibility,
                    "Visibility window not evaluated",
                    format!(
                        "Low {} visibility on days {}; no placement supplied",
                        kind.as_str(),
                        window
                    ),
                )),
                Some(start) => {
                    let end = start.plus_seconds(obs.budget_seconds().unwrap_or(0.0));
                    let placed = DayRange { start, end };
                    if placed.overlaps(window) {
                        issues.push(
                            ValidationIssue::error(
                                IssueCategory::Visibility,
                                "Placement overlaps low-visibility window",
                                format!(
                                    "Placed on days {} which overlaps low {} visibility on days {}",
                                    placed,
                                    kind.as_str(),
                                    window
                                ),
                            )
                            .with_field("placement", placed.to_string(), format!("outside {}", window)),
                        );
                    }
                }
            }
        }
        issues
    }

    fn check_segments(&self, obs: &Observation) -> Vec<ValidationIssue> {
        check_duration_consistency(obs, self.segment_tolerance)
    }

    fn check_approval(&self, obs: &Observation) -> Option<ValidationIssue> {
        match ApprovalTracker::assess(obs, self.catalog) {
            ApprovalAssessment::Invalid { reason } => Some(ValidationIssue::error(
                IssueCategory::Approval,
                "Not approved for flight",
                reason,
            )),
            ApprovalAssessment::Unlisted if !self.catalog.ledger.is_empty() => {
                Some(ValidationIssue::warning(
                    IssueCategory::Approval,
                    "Missing ledger entry",
                    "No approval ledger entry; treated as approved",
                ))
            }
            ApprovalAssessment::Unlisted => Some(ValidationIssue::warning(
                IssueCategory::Approval,
                "Missing ledger entry",
                "No approval table in this list; treated as approved",
            )),
            _ => None,
        }
    }

    fn check_monitoring(&self, obs: &Observation) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for constraint in &obs.constraints {
            let Constraint::MonitoringOffset { reference, offset } = constraint else {
                continue;
            };
            if !self.catalog.contains(*reference) {
                issues.push(ValidationIssue::info(
                    IssueCategory::Monitoring,
                    "Monitoring reference outside list",
                    format!(
                        "Reference {} is not in this list; offset {}-{} days not checked",
                        reference, offset.min_days, offset.max_days
                    ),
                ));
                continue;
            }
            let placed = (
                self.placements.get(&obs.obsid),
                self.placements.get(reference),
            );
            let (Some(this), Some(other)) = placed else {
                issues.push(ValidationIssue::info(
                    IssueCategory::Monitoring,
                    "Monitoring offset not evaluated",
                    format!(
                        "Requested {}-{} days after {}; both observations need a placement",
                        offset.min_days, offset.max_days, reference
                    ),
                ));
                continue;
            };
            let days = this.value() - other.value();
            if !offset.contains(days) {
                issues.push(
                    ValidationIssue::warning(
                        IssueCategory::Monitoring,
                        "Monitoring offset out of range",
                        format!(
                            "Placed {:.2} days after {}; requested {}-{} days",
                            days, reference, offset.min_days, offset.max_days
                        ),
                    )
                    .with_field(
                        "offset_days",
                        format!("{:.2}", days),
                        format!("{}-{}", offset.min_days, offset.max_days),
                    ),
                );
            }
        }
        issues
    }
}

fn check_roll_preference(eval: &WindowEvaluation) -> Option<ValidationIssue> {
    if eval.days.is_empty() || eval.all_satisfied() {
        return None;
    }
    let failed: Vec<String> = eval
        .days
        .iter()
        .filter(|d| !d.is_satisfied())
        .map(|d| d.day.to_string())
        .collect();
    let window = format!(
        "{}+/-{}",
        eval.window.center.value(),
        eval.window.tolerance.value()
    );

    let issue = if eval.none_satisfied() {
        ValidationIssue::error(
            IssueCategory::RollPreference,
            "Roll preference unsatisfiable",
            format!("No roll in {} reaches an acceptable pitch zone on any reference day", window),
        )
    } else {
        ValidationIssue::warning(
            IssueCategory::RollPreference,
            "Roll preference partially satisfiable",
            format!(
                "No roll in {} reaches an acceptable pitch zone on days {}",
                window,
                failed.join(", ")
            ),
        )
    };
    Some(issue.with_field(
        "ROLL",
        window,
        format!("satisfiable on {} reference days", eval.days.len()),
    ))
}

/// Segment totals against a total duration or a split triple.
pub fn check_duration_consistency(obs: &Observation, tolerance: f64) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let Some(duration) = obs.duration else {
        return issues;
    };
    let segments = obs.segment_total();

    match duration {
        DurationSpec::Total(total) => {
            if let Some(sum) = segments {
                if (sum - total.value()).abs() > tolerance {
                    issues.push(
                        ValidationIssue::warning(
                            IssueCategory::Duration,
                            "Segment total mismatch",
                            format!(
                                "Segments sum to {} s but DURATION is {} s",
                                sum,
                                total.value()
                            ),
                        )
                        .with_field("SEGMENT", sum.to_string(), total.value().to_string()),
                    );
                }
            }
        }
        DurationSpec::Split { min, nominal, max } => {
            let (min, nominal, max) = (min.value(), nominal.value(), max.value());
            if !(min <= nominal && nominal <= max) {
                issues.push(
                    ValidationIssue::warning(
                        IssueCategory::Duration,
                        "Split duration out of order",
                        format!("Expected min <= nominal <= max, found ({}, {}, {})", min, nominal, max),
                    )
                    .with_field(
                        "DURATION",
                        format!("({}, {}, {})", min, nominal, max),
                        "min <= nominal <= max",
                    ),
                );
            }
            if let Some(sum) = segments {
                if sum > min + max + tolerance || sum < nominal - tolerance {
                    issues.push(
                        ValidationIssue::warning(
                            IssueCategory::Duration,
                            "Segment total mismatch",
                            format!(
                                "Segments sum to {} s; split ({}, {}, {}) allows {} to {} s",
                                sum,
                                min,
                                nominal,
                                max,
                                nominal,
                                min + max
                            ),
                        )
                        .with_field(
                            "SEGMENT",
                            sum.to_string(),
                            format!("{}-{}", nominal, min + max),
                        ),
                    );
                }
            }
        }
    }
    issues
}

/// Center samples on days where no roll in the preference window is
/// acceptable. On the other days the roll is free to move off the center.
fn unreachable_samples(samples: &[PitchSample], eval: &WindowEvaluation) -> Vec<PitchSample> {
    samples
        .iter()
        .filter(|sample| {
            !eval
                .days
                .iter()
                .any(|d| d.day == sample.day && d.is_satisfied())
        })
        .copied()
        .collect()
}

fn check_pitch_safety(samples: &[PitchSample]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let forbidden: Vec<&PitchSample> = samples
        .iter()
        .filter(|s| s.zone == PitchZone::Forbidden)
        .collect();
    if !forbidden.is_empty() {
        let detail: Vec<String> = forbidden
            .iter()
            .map(|s| format!("{:.1} deg on day {}", s.pitch.value(), s.day))
            .collect();
        issues.push(ValidationIssue::error(
            IssueCategory::Pitch,
            "Forbidden pitch",
            format!("Pitch in the forbidden zone: {}", detail.join(", ")),
        ));
    }

    let bad: Vec<String> = samples
        .iter()
        .filter(|s| s.zone == PitchZone::Bad)
        .map(|s| format!("{:.1} deg on day {}", s.pitch.value(), s.day))
        .collect();
    if !bad.is_empty() {
        issues.push(ValidationIssue::info(
            IssueCategory::Pitch,
            "Bad pitch",
            format!("Pitch in the bad zone: {}", bad.join(", ")),
        ));
    }
    issues
}

fn check_stability(obs: &Observation) -> Vec<ValidationIssue> {
    obs.constraints
        .iter()
        .filter_map(|c| match c {
            Constraint::Stability { note } => Some(ValidationIssue::info(
                IssueCategory::Stability,
                "Stability required",
                match note {
                    Some(note) => format!("Stability required: {}", note),
                    None => "Stability required".to_string(),
                },
            )),
            _ => None,
        })
        .collect()
}

/// Standard dither pattern: amplitude (arcsec), Y and Z periods (seconds).
#[derive(Debug, Clone, Copy)]
struct StandardDither {
    name: &'static str,
    amplitude_arcsec: f64,
    y_period: f64,
    z_period: f64,
}

const STANDARD_DITHERS: [StandardDither; 2] = [
    StandardDither {
        name: "ACIS",
        amplitude_arcsec: 8.0,
        y_period: 1000.0,
        z_period: 707.1,
    },
    StandardDither {
        name: "HRC",
        amplitude_arcsec: 20.0,
        y_period: 1087.0,
        z_period: 768.6,
    },
];

fn is_close(value: f64, expected: f64) -> bool {
    (value - expected).abs() <= DITHER_RTOL * expected.abs()
}

impl StandardDither {
    fn matches(&self, dither: &Dither) -> bool {
        is_close(dither.y_amplitude_arcsec(), self.amplitude_arcsec)
            && is_close(dither.z_amplitude_arcsec(), self.amplitude_arcsec)
            && dither.y_period().is_some_and(|p| is_close(p, self.y_period))
            && dither.z_period().is_some_and(|p| is_close(p, self.z_period))
    }
}

fn check_dither(dither: &Dither) -> Option<ValidationIssue> {
    if !dither.enabled {
        return Some(ValidationIssue::info(
            IssueCategory::Dither,
            "Dither disabled",
            "Dither is OFF",
        ));
    }

    let y_amp = dither.y_amplitude_arcsec();
    let z_amp = dither.z_amplitude_arcsec();
    if y_amp > LARGE_DITHER_ARCSEC || z_amp > LARGE_DITHER_ARCSEC {
        return Some(ValidationIssue::info(
            IssueCategory::Dither,
            "Large dither",
            format!("Dither amplitude y={:.1}\" z={:.1}\" exceeds {}\"", y_amp, z_amp, LARGE_DITHER_ARCSEC),
        ));
    }

    if STANDARD_DITHERS.iter().any(|s| s.matches(dither)) {
        return None;
    }
    let expected: Vec<String> = STANDARD_DITHERS
        .iter()
        .map(|s| {
            format!(
                "{} {}\"/{}s/{}s",
                s.name, s.amplitude_arcsec, s.y_period, s.z_period
            )
        })
        .collect();
    let period = |p: Option<f64>| p.map(|p| format!("{:.1}s", p)).unwrap_or_else(|| "none".to_string());
    let current = format!(
        "y {:.2}\"/{} z {:.2}\"/{}",
        y_amp,
        period(dither.y_period()),
        z_amp,
        period(dither.z_period())
    );
    Some(
        ValidationIssue::warning(
            IssueCategory::Dither,
            "Non-standard dither",
            format!("Dither {} matches no standard pattern", current),
        )
        .with_field("DITHER", current, expected.join(" or ")),
    )
}

fn check_star_counts(obs: &Observation) -> Vec<ValidationIssue> {
    [("MIN_ACQ", obs.min_acq), ("MIN_GUIDE", obs.min_guide)]
        .into_iter()
        .filter_map(|(field, value)| {
            let value = value?;
            if STAR_COUNT_RANGE.contains(&value) {
                return None;
            }
            Some(
                ValidationIssue::warning(
                    IssueCategory::StarCatalog,
                    "Star count out of range",
                    format!("{}={} is outside 1-8", field, value),
                )
                .with_field(field, value.to_string(), "1-8"),
            )
        })
        .collect()
}
