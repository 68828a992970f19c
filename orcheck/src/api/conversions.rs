//! Conversions from checker results into report DTOs.
//!
//! - qtty quantities become `f64` through `value()`
//! - `ObsId` becomes `u32`
//! - maps keep their key order

use crate::api::types as api;
use crate::models::{ApprovalStatus, DayOfYear, FlipPolicy, ObsId, Observation, RollSpec};
use crate::services::aggregation::{Exclusion, TimeBudget};
use crate::services::approval::ApprovalSummary;
use crate::services::chains::{Chain, ChainPosition};
use crate::services::pitch::{DayWindowResult, PitchSample, ReferenceRoll};
use crate::services::validation::ObservationCheck;

impl From<&PitchSample> for api::PitchSampleReport {
    fn from(sample: &PitchSample) -> Self {
        api::PitchSampleReport {
            day: sample.day.value(),
            pitch: sample.pitch.value(),
            roll: sample.roll.value(),
            zone: sample.zone,
        }
    }
}

impl From<&DayWindowResult> for api::RollDayReport {
    fn from(result: &DayWindowResult) -> Self {
        api::RollDayReport {
            day: result.day.value(),
            center_pitch: result.center.pitch.value(),
            center_zone: result.center.zone,
            acceptable_roll: result.acceptable_roll.map(|r| r.value()),
        }
    }
}

impl From<&RollSpec> for api::RollReport {
    fn from(roll: &RollSpec) -> Self {
        match roll {
            RollSpec::Fixed(angle) => api::RollReport::Fixed {
                angle: angle.value(),
            },
            RollSpec::Preference(window) => api::RollReport::Preference {
                center: window.center.value(),
                tolerance: window.tolerance.value(),
                flip: match window.flip {
                    FlipPolicy::Unspecified => "unspecified",
                    FlipPolicy::Allowed => "allowed",
                    FlipPolicy::Forbidden => "forbidden",
                }
                .to_string(),
            },
        }
    }
}

impl From<ChainPosition> for api::ChainPositionReport {
    fn from(position: ChainPosition) -> Self {
        api::ChainPositionReport {
            chain: position.chain,
            position: position.position,
            length: position.length,
        }
    }
}

impl From<&Chain> for api::ChainReport {
    fn from(chain: &Chain) -> Self {
        api::ChainReport {
            index: chain.index,
            start: chain.start.as_str().to_string(),
            reference: chain.start.reference(),
            members: chain.members.iter().map(|id| id.value()).collect(),
        }
    }
}

impl From<&Exclusion> for api::ExclusionReport {
    fn from(exclusion: &Exclusion) -> Self {
        api::ExclusionReport {
            obsid: exclusion.obsid.value(),
            reason: exclusion.reason.clone(),
        }
    }
}

impl From<&ApprovalSummary> for api::ApprovalReport {
    fn from(summary: &ApprovalSummary) -> Self {
        api::ApprovalReport {
            approved_for_flight: ids(&summary.approved_for_flight),
            split_only: ids(&summary.split_only),
            unlisted: ids(&summary.unlisted),
            invalid: summary
                .invalid
                .iter()
                .map(|(obsid, reason)| api::ExclusionReport {
                    obsid: obsid.value(),
                    reason: reason.clone(),
                })
                .collect(),
            stale_entries: ids(&summary.stale_entries),
        }
    }
}

fn ids(ids: &[ObsId]) -> Vec<u32> {
    ids.iter().map(|id| id.value()).collect()
}

impl api::TimeBudgetReport {
    pub fn from_budget(budget: &TimeBudget, day: DayOfYear, rule: ReferenceRoll) -> Self {
        api::TimeBudgetReport {
            aggregation_day: day.value(),
            reference_roll: rule.as_str().to_string(),
            total_seconds: budget.total_seconds,
            included: budget.included,
            by_priority: budget
                .by_priority
                .iter()
                .map(|(priority, share)| api::PriorityShare {
                    priority: *priority,
                    seconds: share.seconds,
                    percent: share.percent,
                    observations: share.observations,
                })
                .collect(),
            by_zone: budget
                .by_zone
                .iter()
                .map(|(zone, share)| api::ZoneShare {
                    zone: *zone,
                    seconds: share.seconds,
                    percent: share.percent,
                    observations: share.observations,
                })
                .collect(),
            excluded: budget.excluded.iter().map(Into::into).collect(),
        }
    }
}

fn approval_label(status: ApprovalStatus) -> String {
    match status {
        ApprovalStatus::Approved => "approved".to_string(),
        ApprovalStatus::NotApproved { split_of: Some(parent) } => {
            format!("not_approved (split of {})", parent)
        }
        ApprovalStatus::NotApproved { split_of: None } => "not_approved".to_string(),
        ApprovalStatus::Unlisted => "unlisted".to_string(),
    }
}

impl api::ObservationEntry {
    /// Report entry for one observation and its check results.
    pub fn from_check(
        obs: &Observation,
        check: ObservationCheck,
        position: Option<ChainPosition>,
    ) -> Self {
        let status = check.status();
        api::ObservationEntry {
            obsid: obs.obsid.value(),
            target: obs.target.name.clone(),
            ra: obs.target.ra.value(),
            dec: obs.target.dec.value(),
            line: obs.line,
            priority: obs.priority,
            budget_seconds: obs.budget_seconds(),
            instrument: obs.instrument.clone(),
            grating: obs.grating.clone(),
            roll: obs.roll.as_ref().map(Into::into),
            preceding: obs.preceding.as_ref().map(|p| p.to_string()),
            chain: position.map(Into::into),
            approval: approval_label(obs.approval),
            samples: check.samples.iter().map(Into::into).collect(),
            roll_window: check
                .window
                .as_ref()
                .map(|w| w.days.iter().map(Into::into).collect())
                .unwrap_or_default(),
            extra: obs.extra.clone(),
            issues: check.issues,
            status,
        }
    }
}
