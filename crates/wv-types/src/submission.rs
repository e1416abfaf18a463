use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::cid::Cid;
use crate::temporal::Timestamp;

/// Sequential identifier the ledger assigns to each submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub u64);

impl SubmissionId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for SubmissionId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionStatus {
    Pending,
    Approved,
}

/// A proof-of-work record as stored on the ledger.
///
/// Every field except the approval triple (`mentor`, `approved`,
/// `approved_at`) is fixed at creation; the approval triple changes exactly
/// once, from (sentinel, false, 0) to (approver, true, t > 0).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub student: Address,
    pub title: String,
    pub cid: Cid,
    pub mentor: Address,
    pub approved: bool,
    pub submitted_at: Timestamp,
    pub approved_at: Timestamp,
}

impl Submission {
    /// The approving mentor, `None` while unapproved.
    pub fn mentor(&self) -> Option<Address> {
        self.mentor.non_zero()
    }

    pub fn status(&self) -> SubmissionStatus {
        if self.approved {
            SubmissionStatus::Approved
        } else {
            SubmissionStatus::Pending
        }
    }

    /// `approved` holds exactly when a mentor and an approval time are recorded.
    pub fn is_consistent(&self) -> bool {
        let recorded = !self.mentor.is_zero() && self.approved_at.is_set();
        let unrecorded = self.mentor.is_zero() && !self.approved_at.is_set();
        if self.approved {
            recorded
        } else {
            unrecorded
        }
    }
}
