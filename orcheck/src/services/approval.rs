//! Cross-reference of observations against the approval ledger.

use std::collections::BTreeSet;

use crate::models::{ApprovalStatus, Catalog, ObsId, Observation};

/// Flight approval of one observation after checking split legality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalAssessment {
    /// Approved in the ledger.
    Approved,
    /// No ledger entry; flown as if approved.
    Unlisted,
    /// Not approved on its own, legal as a split of an approved parent.
    SplitOnly { parent: ObsId },
    /// Not approved and not a valid split.
    Invalid { reason: String },
}

/// Week-level approval partition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApprovalSummary {
    /// Approved outright, including observations with no ledger entry.
    pub approved_for_flight: Vec<ObsId>,
    pub split_only: Vec<ObsId>,
    /// Subset of `approved_for_flight` that has no ledger entry.
    pub unlisted: Vec<ObsId>,
    pub invalid: Vec<(ObsId, String)>,
    /// Ledger rows for obsids absent from the list.
    pub stale_entries: Vec<ObsId>,
}

pub struct ApprovalTracker;

impl ApprovalTracker {
    /// Assess one observation against the rest of the list.
    pub fn assess(obs: &Observation, catalog: &Catalog) -> ApprovalAssessment {
        match obs.approval {
            ApprovalStatus::Approved => ApprovalAssessment::Approved,
            ApprovalStatus::Unlisted => ApprovalAssessment::Unlisted,
            ApprovalStatus::NotApproved { split_of: None } => ApprovalAssessment::Invalid {
                reason: "not approved and not declared as a split".to_string(),
            },
            ApprovalStatus::NotApproved {
                split_of: Some(parent),
            } => {
                if parent == obs.obsid {
                    return ApprovalAssessment::Invalid {
                        reason: format!("declared as a split of itself ({})", parent),
                    };
                }
                match catalog.get(parent) {
                    None => ApprovalAssessment::Invalid {
                        reason: format!("split parent {} is not in this list", parent),
                    },
                    Some(p) => match p.approval {
                        ApprovalStatus::Approved | ApprovalStatus::Unlisted => {
                            ApprovalAssessment::SplitOnly { parent }
                        }
                        ApprovalStatus::NotApproved { .. } => ApprovalAssessment::Invalid {
                            reason: format!("split parent {} is not approved", parent),
                        },
                    },
                }
            }
        }
    }

    /// Partition the whole list.
    pub fn summarize(catalog: &Catalog) -> ApprovalSummary {
        let mut summary = ApprovalSummary::default();

        for (obsid, obs) in &catalog.observations {
            match Self::assess(obs, catalog) {
                ApprovalAssessment::Approved => summary.approved_for_flight.push(*obsid),
                ApprovalAssessment::Unlisted => {
                    summary.approved_for_flight.push(*obsid);
                    summary.unlisted.push(*obsid);
                }
                ApprovalAssessment::SplitOnly { .. } => summary.split_only.push(*obsid),
                ApprovalAssessment::Invalid { reason } => summary.invalid.push((*obsid, reason)),
            }
        }

        let listed: BTreeSet<ObsId> = catalog.observations.keys().copied().collect();
        summary.stale_entries = catalog
            .ledger
            .entries
            .keys()
            .filter(|id| !listed.contains(id))
            .copied()
            .collect();

        for stale in &summary.stale_entries {
            log::warn!("approval ledger names obsid {} which is not in this list", stale);
        }
        log::info!(
            "approval: {} for flight, {} split-only, {} invalid",
            summary.approved_for_flight.len(),
            summary.split_only.len(),
            summary.invalid.len()
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LedgerEntry, Target};
    use qtty::Degrees;

    fn catalog(entries: &[(u32, Option<LedgerEntry>)]) -> Catalog {
        let mut catalog = Catalog::default();
        for (id, entry) in entries {
            let mut obs = Observation::new(
                ObsId(*id),
                Target::new("t", Degrees::new(1.0), Degrees::new(1.0)),
            );
            if let Some(entry) = entry {
                catalog.ledger.insert(ObsId(*id), *entry);
                obs.approval = entry.status();
            }
            catalog.observations.insert(ObsId(*id), obs);
        }
        catalog
    }

    #[test]
    fn test_split_of_approved_parent() {
        let cat = catalog(&[
            (13458, Some(LedgerEntry::Approved)),
            (
                15578,
                Some(LedgerEntry::NotApproved {
                    split_of: Some(ObsId(13458)),
                }),
            ),
        ]);
        let obs = cat.get(ObsId(15578)).unwrap();
        assert_eq!(
            ApprovalTracker::assess(obs, &cat),
            ApprovalAssessment::SplitOnly {
                parent: ObsId(13458)
            }
        );
        let summary = ApprovalTracker::summarize(&cat);
        assert_eq!(summary.approved_for_flight, vec![ObsId(13458)]);
        assert_eq!(summary.split_only, vec![ObsId(15578)]);
        assert!(summary.invalid.is_empty());
    }

    #[test]
    fn test_not_approved_without_split_is_invalid() {
        let cat = catalog(&[
            (13458, Some(LedgerEntry::Approved)),
            (15578, Some(LedgerEntry::NotApproved { split_of: None })),
        ]);
        let summary = ApprovalTracker::summarize(&cat);
        assert_eq!(summary.invalid.len(), 1);
        assert_eq!(summary.invalid[0].0, ObsId(15578));
    }

    #[test]
    fn test_parent_absent_or_unapproved() {
        let cat = catalog(&[
            (1, Some(LedgerEntry::NotApproved { split_of: None })),
            (
                2,
                Some(LedgerEntry::NotApproved {
                    split_of: Some(ObsId(1)),
                }),
            ),
            (
                3,
                Some(LedgerEntry::NotApproved {
                    split_of: Some(ObsId(99)),
                }),
            ),
        ]);
        let summary = ApprovalTracker::summarize(&cat);
        let invalid: Vec<ObsId> = summary.invalid.iter().map(|(id, _)| *id).collect();
        assert_eq!(invalid, vec![ObsId(1), ObsId(2), ObsId(3)]);
        assert!(summary.invalid[1].1.contains("not approved"));
        assert!(summary.invalid[2].1.contains("not in this list"));
    }

    #[test]
    fn test_unlisted_and_stale() {
        let mut cat = catalog(&[(5, None)]);
        cat.ledger.insert(ObsId(6), LedgerEntry::Approved);
        let summary = ApprovalTracker::summarize(&cat);
        assert_eq!(summary.approved_for_flight, vec![ObsId(5)]);
        assert_eq!(summary.unlisted, vec![ObsId(5)]);
        assert_eq!(summary.stale_entries, vec![ObsId(6)]);
    }
}
