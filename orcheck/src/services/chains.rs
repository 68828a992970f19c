//! Observation chains built from `PRECEDING` references.
//!
//! B immediately follows A when B's preceding reference is A's obsid. Chains
//! are held as obsid lists; positions are derived through an obsid index.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::StructuralError;
use crate::models::{Catalog, ObsId, Preceding};

/// Numeric references at or above this value name engineering requests.
pub const DEFAULT_ANCHOR_OBSID_FLOOR: u32 = 40_000;

/// How a chain begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainStart {
    /// No preceding reference.
    Head,
    /// Preceded by a synthetic anchor rather than an observation.
    Anchor(String),
    /// Preceding obsid missing from the list; the link was dropped.
    DroppedReference(ObsId),
    /// Shares its predecessor with a lower obsid that continues that chain.
    Branch(ObsId),
}

impl ChainStart {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainStart::Head => "head",
            ChainStart::Anchor(_) => "anchor",
            ChainStart::DroppedReference(_) => "dropped_reference",
            ChainStart::Branch(_) => "branch",
        }
    }

    /// Anchor token, dropped obsid or branch parent, if any.
    pub fn reference(&self) -> Option<String> {
        match self {
            ChainStart::Head => None,
            ChainStart::Anchor(token) => Some(token.clone()),
            ChainStart::DroppedReference(id) | ChainStart::Branch(id) => Some(id.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub index: usize,
    pub start: ChainStart,
    /// Members from head to tail.
    pub members: Vec<ObsId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainPosition {
    pub chain: usize,
    /// 0-based position within the chain.
    pub position: usize,
    pub length: usize,
}

/// A chain finding attached to one observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainNotice {
    pub obsid: ObsId,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainSet {
    pub chains: Vec<Chain>,
    pub positions: BTreeMap<ObsId, ChainPosition>,
    pub warnings: Vec<ChainNotice>,
    pub info: Vec<ChainNotice>,
}

impl ChainSet {
    pub fn position(&self, obsid: ObsId) -> Option<ChainPosition> {
        self.positions.get(&obsid).copied()
    }
}

/// Builds [`ChainSet`]s from a catalog.
#[derive(Debug, Clone)]
pub struct ChainBuilder {
    anchor_obsid_floor: u32,
}

impl Default for ChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainBuilder {
    pub fn new() -> Self {
        Self {
            anchor_obsid_floor: DEFAULT_ANCHOR_OBSID_FLOOR,
        }
    }

    pub fn with_anchor_floor(mut self, floor: u32) -> Self {
        self.anchor_obsid_floor = floor;
        self
    }

    /// Link every observation of `catalog` into chains.
    ///
    /// # Errors
    ///
    /// [`StructuralError::ChainCycle`] when following predecessors revisits an
    /// observation; the error names every obsid on the cycle.
    pub fn build(&self, catalog: &Catalog) -> Result<ChainSet, StructuralError> {
        let mut set = ChainSet::default();
        let mut predecessor: BTreeMap<ObsId, ObsId> = BTreeMap::new();
        let mut starts: BTreeMap<ObsId, ChainStart> = BTreeMap::new();

        for (obsid, obs) in &catalog.observations {
            match &obs.preceding {
                None => {
                    starts.insert(*obsid, ChainStart::Head);
                }
                Some(Preceding::Token(token)) => {
                    set.info.push(ChainNotice {
                        obsid: *obsid,
                        message: format!("chain starts at anchor {}", token),
                    });
                    starts.insert(*obsid, ChainStart::Anchor(token.clone()));
                }
                Some(Preceding::Obsid(pred)) if catalog.contains(*pred) => {
                    predecessor.insert(*obsid, *pred);
                }
                Some(Preceding::Obsid(pred)) if pred.value() >= self.anchor_obsid_floor => {
                    set.info.push(ChainNotice {
                        obsid: *obsid,
                        message: format!("chain starts at engineering request {}", pred),
                    });
                    starts.insert(*obsid, ChainStart::Anchor(pred.to_string()));
                }
                Some(Preceding::Obsid(pred)) => {
                    set.warnings.push(ChainNotice {
                        obsid: *obsid,
                        message: format!(
                            "PRECEDING={} is not in this list; reference dropped",
                            pred
                        ),
                    });
                    starts.insert(*obsid, ChainStart::DroppedReference(*pred));
                }
            }
        }

        detect_cycle(&predecessor)?;

        let mut successors: BTreeMap<ObsId, Vec<ObsId>> = BTreeMap::new();
        for (obsid, pred) in &predecessor {
            successors.entry(*pred).or_default().push(*obsid);
        }
        for (pred, succ) in &successors {
            for branch in succ.iter().skip(1) {
                set.warnings.push(ChainNotice {
                    obsid: *branch,
                    message: format!(
                        "{} also follows {}, which continues with {}; started a branch chain",
                        branch, pred, succ[0]
                    ),
                });
                starts.insert(*branch, ChainStart::Branch(*pred));
            }
        }

        for (head, start) in starts {
            let index = set.chains.len();
            let mut members = vec![head];
            let mut current = head;
            while let Some(next) = successors.get(&current).and_then(|s| s.first()) {
                members.push(*next);
                current = *next;
            }
            let length = members.len();
            for (position, obsid) in members.iter().enumerate() {
                set.positions.insert(
                    *obsid,
                    ChainPosition {
                        chain: index,
                        position,
                        length,
                    },
                );
            }
            set.chains.push(Chain {
                index,
                start,
                members,
            });
        }

        log::info!(
            "built {} chains over {} observations ({} warnings)",
            set.chains.len(),
            set.positions.len(),
            set.warnings.len()
        );
        Ok(set)
    }
}

/// Walk predecessor links from every observation; a node seen twice on the
/// current path closes a cycle.
fn detect_cycle(predecessor: &BTreeMap<ObsId, ObsId>) -> Result<(), StructuralError> {
    let mut cleared: BTreeSet<ObsId> = BTreeSet::new();

    for start in predecessor.keys() {
        let mut path: Vec<ObsId> = Vec::new();
        let mut on_path: BTreeSet<ObsId> = BTreeSet::new();
        let mut current = Some(*start);

        while let Some(node) = current {
            if cleared.contains(&node) {
                break;
            }
            if !on_path.insert(node) {
                let from = path.iter().position(|id| *id == node).unwrap_or(0);
                let mut cycle: Vec<ObsId> = path[from..].iter().rev().copied().collect();
                if let Some(min_at) = cycle
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, id)| **id)
                    .map(|(i, _)| i)
                {
                    cycle.rotate_left(min_at);
                }
                return Err(StructuralError::ChainCycle(cycle));
            }
            path.push(node);
            current = predecessor.get(&node).copied();
        }

        cleared.extend(path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Observation, Target};
    use qtty::Degrees;

    fn catalog(links: &[(u32, Option<Preceding>)]) -> Catalog {
        let mut catalog = Catalog::default();
        for (id, preceding) in links {
            let mut obs = Observation::new(
                ObsId(*id),
                Target::new("t", Degrees::new(10.0), Degrees::new(10.0)),
            );
            obs.preceding = preceding.clone();
            catalog.observations.insert(ObsId(*id), obs);
        }
        catalog
    }

    fn after(id: u32) -> Option<Preceding> {
        Some(Preceding::Obsid(ObsId(id)))
    }

    #[test]
    fn test_single_chain() {
        let cat = catalog(&[
            (300, after(200)),
            (100, Some(Preceding::Token("ANCHOR_A".into()))),
            (200, after(100)),
        ]);
        let set = ChainBuilder::new().build(&cat).unwrap();
        assert_eq!(set.chains.len(), 1);
        assert_eq!(set.chains[0].members, vec![ObsId(100), ObsId(200), ObsId(300)]);
        assert_eq!(set.chains[0].start, ChainStart::Anchor("ANCHOR_A".into()));
        assert_eq!(set.position(ObsId(300)).unwrap().position, 2);
        assert!(set.warnings.is_empty());
        assert_eq!(set.info.len(), 1);
    }

    #[test]
    fn test_dangling_reference_becomes_head() {
        let cat = catalog(&[(13458, None), (15578, after(13962))]);
        let set = ChainBuilder::new().build(&cat).unwrap();
        assert_eq!(set.chains.len(), 2);
        assert_eq!(set.warnings.len(), 1);
        assert_eq!(set.warnings[0].obsid, ObsId(15578));
        assert!(set.warnings[0].message.contains("13962"));
        let chain = &set.chains[set.position(ObsId(15578)).unwrap().chain];
        assert_eq!(chain.start, ChainStart::DroppedReference(ObsId(13962)));
        assert_eq!(chain.members.first(), Some(&ObsId(15578)));
    }

    #[test]
    fn test_engineering_request_is_anchor() {
        let cat = catalog(&[(100, after(52001))]);
        let set = ChainBuilder::new().build(&cat).unwrap();
        assert!(set.warnings.is_empty());
        assert_eq!(set.chains[0].start, ChainStart::Anchor("52001".into()));

        let lowered = ChainBuilder::new().with_anchor_floor(60_000).build(&cat).unwrap();
        assert_eq!(lowered.warnings.len(), 1);
    }

    #[test]
    fn test_two_node_cycle() {
        let cat = catalog(&[(100, after(200)), (200, after(100))]);
        let err = ChainBuilder::new().build(&cat).unwrap_err();
        assert_eq!(err, StructuralError::ChainCycle(vec![ObsId(100), ObsId(200)]));
    }

    #[test]
    fn test_cycle_behind_a_tail() {
        let cat = catalog(&[
            (1, after(4)),
            (2, after(1)),
            (3, after(2)),
            (4, after(3)),
            (9, after(2)),
        ]);
        let err = ChainBuilder::new().build(&cat).unwrap_err();
        assert_eq!(err.obsids(), vec![ObsId(1), ObsId(2), ObsId(3), ObsId(4)]);
    }

    #[test]
    fn test_self_reference_is_cycle() {
        let cat = catalog(&[(7, after(7))]);
        let err = ChainBuilder::new().build(&cat).unwrap_err();
        assert_eq!(err, StructuralError::ChainCycle(vec![ObsId(7)]));
    }

    #[test]
    fn test_branch_starts_new_chain() {
        let cat = catalog(&[(100, None), (300, after(100)), (200, after(100))]);
        let set = ChainBuilder::new().build(&cat).unwrap();
        assert_eq!(set.chains.len(), 2);
        assert_eq!(set.chains[0].members, vec![ObsId(100), ObsId(200)]);
        assert_eq!(set.chains[1].members, vec![ObsId(300)]);
        assert_eq!(set.chains[1].start, ChainStart::Branch(ObsId(100)));
        assert_eq!(set.warnings.len(), 1);
        assert_eq!(set.warnings[0].obsid, ObsId(300));
    }

    #[test]
    fn test_every_observation_positioned_once() {
        let cat = catalog(&[
            (1, None),
            (2, after(1)),
            (3, after(1)),
            (4, after(3)),
            (5, after(99)),
            (6, Some(Preceding::Token("X".into()))),
        ]);
        let set = ChainBuilder::new().build(&cat).unwrap();
        assert_eq!(set.positions.len(), 6);
        let members: usize = set.chains.iter().map(|c| c.members.len()).sum();
        assert_eq!(members, 6);
    }
}
