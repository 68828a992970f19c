use std::collections::BTreeMap;

use super::comments::{CommentBlock, CommentKey};
use super::ledger::ApprovalLedger;
use super::observation::{ObsId, Observation};

/// One weekly OR list after loading: an immutable snapshot for one run.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub observations: BTreeMap<ObsId, Observation>,
    /// Comment blocks in file order.
    pub comments: Vec<CommentBlock>,
    pub ledger: ApprovalLedger,
    /// Week-level anomalies not attributable to a single observation.
    pub notices: Vec<String>,
}

impl Catalog {
    pub fn get(&self, obsid: ObsId) -> Option<&Observation> {
        self.observations.get(&obsid)
    }

    pub fn contains(&self, obsid: ObsId) -> bool {
        self.observations.contains_key(&obsid)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Ordered comment text per key; blocks sharing a key are concatenated.
    pub fn comment_text(&self) -> BTreeMap<CommentKey, Vec<String>> {
        let mut text: BTreeMap<CommentKey, Vec<String>> = BTreeMap::new();
        for block in &self.comments {
            text.entry(block.key())
                .or_default()
                .extend(block.lines().iter().cloned());
        }
        text
    }
}
