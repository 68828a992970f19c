//! Time budgets by priority tier and by pitch zone.
//!
//! Both groupings cover the same included set: an observation without a
//! priority, a duration or a reference roll is excluded from both and listed
//! with the reason.

use std::collections::BTreeMap;

use super::pitch::{PitchRollComputer, ReferenceRoll};
use super::zones::PitchZone;
use crate::models::{DayOfYear, ObsId, Observation};

/// One included observation, ready for reduction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetEntry {
    pub obsid: ObsId,
    pub priority: i32,
    pub zone: PitchZone,
    pub seconds: f64,
}

/// Observation left out of both groupings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub obsid: ObsId,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BudgetShare {
    pub seconds: f64,
    /// Percentage of the grand total of included observations.
    pub percent: f64,
    pub observations: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeBudget {
    pub total_seconds: f64,
    pub included: usize,
    pub by_priority: BTreeMap<i32, BudgetShare>,
    pub by_zone: BTreeMap<PitchZone, BudgetShare>,
    pub excluded: Vec<Exclusion>,
}

impl TimeBudget {
    /// Reduce entries into both groupings.
    pub fn from_entries(
        entries: impl IntoIterator<Item = BudgetEntry>,
        excluded: Vec<Exclusion>,
    ) -> Self {
        let mut budget = TimeBudget {
            excluded,
            ..TimeBudget::default()
        };

        for entry in entries {
            budget.total_seconds += entry.seconds;
            budget.included += 1;

            let tier = budget.by_priority.entry(entry.priority).or_default();
            tier.seconds += entry.seconds;
            tier.observations += 1;

            let zone = budget.by_zone.entry(entry.zone).or_default();
            zone.seconds += entry.seconds;
            zone.observations += 1;
        }

        let total = budget.total_seconds;
        let percent = |seconds: f64| {
            if total > 0.0 {
                seconds / total * 100.0
            } else {
                0.0
            }
        };
        for share in budget.by_priority.values_mut() {
            share.percent = percent(share.seconds);
        }
        for share in budget.by_zone.values_mut() {
            share.percent = percent(share.seconds);
        }
        budget
    }

    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }
}

/// Attributes each observation to a zone at one day and reference roll.
pub struct TimeAggregator<'a> {
    computer: &'a PitchRollComputer<'a>,
    day: DayOfYear,
    reference_roll: ReferenceRoll,
}

impl<'a> TimeAggregator<'a> {
    pub fn new(computer: &'a PitchRollComputer<'a>, day: DayOfYear) -> Self {
        Self {
            computer,
            day,
            reference_roll: ReferenceRoll::default(),
        }
    }

    pub fn with_reference_roll(mut self, rule: ReferenceRoll) -> Self {
        self.reference_roll = rule;
        self
    }

    /// Budget entry for one observation, or why it is excluded.
    pub fn entry(&self, obs: &Observation) -> Result<BudgetEntry, Exclusion> {
        let exclude = |reason: &str| Exclusion {
            obsid: obs.obsid,
            reason: reason.to_string(),
        };
        let priority = obs.priority.ok_or_else(|| exclude("no priority"))?;
        let seconds = obs.budget_seconds().ok_or_else(|| exclude("no duration"))?;
        let roll = self.reference_roll.roll_for(obs).ok_or_else(|| {
            exclude(match self.reference_roll {
                ReferenceRoll::FixedOnly => "no fixed roll",
                ReferenceRoll::PreferenceCenter => "no roll",
            })
        })?;

        let zone = self.computer.sample(obs, roll, self.day).zone;
        Ok(BudgetEntry {
            obsid: obs.obsid,
            priority,
            zone,
            seconds,
        })
    }

}
