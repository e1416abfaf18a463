use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use serde::Serialize;
use wv_ledger::TxReceipt;
use wv_types::{Cid, SubmissionId, TxHash};

/// Progress of a submission made from this client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalStatus {
    Uploading,
    Submitting,
    Pending,
    Approved,
}

/// Client-side placeholder for a submission; never authoritative.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LocalSubmission {
    pub local_id: u64,
    pub title: String,
    pub cid: Option<Cid>,
    pub tx_hash: Option<TxHash>,
    pub submission_id: Option<SubmissionId>,
    pub status: LocalStatus,
}

/// Placeholders for in-flight and recent submissions, newest first.
#[derive(Default)]
pub struct SubmissionTracker {
    next_id: AtomicU64,
    entries: RwLock<Vec<LocalSubmission>>,
}

impl SubmissionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, title: &str) -> u64 {
        let local_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            0,
            LocalSubmission {
                local_id,
                title: title.to_string(),
                cid: None,
                tx_hash: None,
                submission_id: None,
                status: LocalStatus::Uploading,
            },
        );
        local_id
    }

    pub fn mark_uploaded(&self, local_id: u64, cid: &Cid) {
        self.update(local_id, |entry| {
            entry.cid = Some(cid.clone());
            entry.status = LocalStatus::Submitting;
        });
    }

    pub fn confirm(&self, local_id: u64, receipt: &TxReceipt) {
        self.update(local_id, |entry| {
            entry.tx_hash = Some(receipt.tx_hash);
            entry.submission_id = Some(receipt.submission_id);
            entry.status = LocalStatus::Pending;
        });
    }

    /// Flag the placeholder for `id`, if this client submitted it.
    pub fn mark_approved(&self, id: SubmissionId) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for entry in entries.iter_mut().filter(|e| e.submission_id == Some(id)) {
            entry.status = LocalStatus::Approved;
        }
    }

    pub fn discard(&self, local_id: u64) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|e| e.local_id != local_id);
    }

    pub fn list(&self) -> Vec<LocalSubmission> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update(&self, local_id: u64, apply: impl FnOnce(&mut LocalSubmission)) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.iter_mut().find(|e| e.local_id == local_id) {
            apply(entry);
        }
    }
}
