use std::collections::BTreeMap;

use super::observation::{ApprovalStatus, ObsId};

/// One row of the approval table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerEntry {
    Approved,
    NotApproved { split_of: Option<ObsId> },
}

impl LedgerEntry {
    pub fn status(&self) -> ApprovalStatus {
        match *self {
            LedgerEntry::Approved => ApprovalStatus::Approved,
            LedgerEntry::NotApproved { split_of } => ApprovalStatus::NotApproved { split_of },
        }
    }
}

/// Approval ledger: obsid to flight approval.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApprovalLedger {
    pub entries: BTreeMap<ObsId, LedgerEntry>,
}

impl ApprovalLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, obsid: ObsId, entry: LedgerEntry) -> Option<LedgerEntry> {
        self.entries.insert(obsid, entry)
    }

    pub fn get(&self, obsid: ObsId) -> Option<&LedgerEntry> {
        self.entries.get(&obsid)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
