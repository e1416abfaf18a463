use async_trait::async_trait;
use wv_types::{Address, Cid, Submission, SubmissionId};

use crate::error::LedgerResult;
use crate::records::TxReceipt;

/// Read boundary for the submission registry.
///
/// Reads need no signing identity. Ids are dense and 0-based, so every id
/// below `submission_count()` resolves.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Returns `Err(NotFound)` or a store-level error for ids past the end.
    async fn get_submission(&self, id: SubmissionId) -> LedgerResult<Submission>;

    async fn submission_count(&self) -> LedgerResult<u64>;
}

/// Write boundary for the submission registry.
///
/// Both writes resolve only once the change is final; a failed write leaves
/// the registry untouched.
#[async_trait]
pub trait LedgerWriter: Send + Sync {
    /// The identity that signs writes.
    async fn signer(&self) -> LedgerResult<Address>;

    /// Record a new submission owned by the signer.
    async fn submit_work(&self, title: &str, cid: &Cid) -> LedgerResult<TxReceipt>;

    /// Approve an existing submission with the signer as mentor.
    async fn approve_work(&self, id: SubmissionId) -> LedgerResult<TxReceipt>;
}
