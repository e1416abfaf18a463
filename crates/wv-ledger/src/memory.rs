use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::debug;
use wv_types::{Address, Cid, Submission, SubmissionId, Timestamp, TxHash};

use crate::abi;
use crate::error::{LedgerError, LedgerResult};
use crate::records::{LedgerEvent, TxReceipt};
use crate::traits::{LedgerReader, LedgerWriter};

/// In-process submission registry for tests, local demos, and embedding.
///
/// Mirrors the contract: ids are sequential from 0, every write mines its own
/// block, and block timestamps strictly increase so an approval always lands
/// after the submission it approves.
pub struct InMemoryLedger {
    inner: RwLock<LedgerState>,
}

#[derive(Default)]
struct LedgerState {
    submissions: Vec<Submission>,
    events: Vec<LedgerEvent>,
    block_number: u64,
    block_time: u64,
}

impl LedgerState {
    fn mine(&mut self, calldata: &[u8]) -> (u64, Timestamp, TxHash) {
        self.block_number += 1;
        self.block_time = Timestamp::now().as_secs().max(self.block_time + 1);

        let mut preimage = self.block_number.to_be_bytes().to_vec();
        preimage.extend_from_slice(calldata);
        let hash = TxHash::from_raw(abi::keccak256(&preimage));
        (self.block_number, Timestamp(self.block_time), hash)
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LedgerState::default()),
        }
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// A writer that signs as `signer`; `None` models a missing identity.
    pub fn writer(self: &Arc<Self>, signer: Option<Address>) -> InMemoryWriter {
        InMemoryWriter {
            ledger: Arc::clone(self),
            signer,
        }
    }

    /// Every event emitted so far, oldest first.
    pub fn events(&self) -> LedgerResult<Vec<LedgerEvent>> {
        Ok(self.read()?.events.clone())
    }

    pub fn submit_as(&self, student: Address, title: &str, cid: &Cid) -> LedgerResult<TxReceipt> {
        if student.is_zero() {
            return Err(LedgerError::Unauthenticated);
        }
        let calldata = abi::encode_submit_work(title, cid);
        let mut state = self.write()?;
        let id = SubmissionId(state.submissions.len() as u64);
        let (block_number, submitted_at, tx_hash) = state.mine(&calldata);

        state.submissions.push(Submission {
            id,
            student,
            title: title.to_string(),
            cid: cid.clone(),
            mentor: Address::ZERO,
            approved: false,
            submitted_at,
            approved_at: Timestamp::UNSET,
        });
        state.events.push(LedgerEvent::WorkSubmitted {
            id,
            student,
            title: title.to_string(),
            cid: cid.as_str().to_string(),
        });
        debug!(%id, student = %student.short(), "work submitted");

        Ok(TxReceipt {
            tx_hash,
            submission_id: id,
            block_number,
        })
    }

    pub fn approve_as(&self, mentor: Address, id: SubmissionId) -> LedgerResult<TxReceipt> {
        if mentor.is_zero() {
            return Err(LedgerError::Unauthenticated);
        }
        let calldata = abi::encode_approve_work(id);
        let mut state = self.write()?;
        let index = usize::try_from(id.value())
            .ok()
            .filter(|i| *i < state.submissions.len())
            .ok_or(LedgerError::NotFound(id))?;
        if state.submissions[index].approved {
            return Err(LedgerError::Reverted("already approved".into()));
        }

        let (block_number, approved_at, tx_hash) = state.mine(&calldata);
        let record = &mut state.submissions[index];
        record.mentor = mentor;
        record.approved = true;
        record.approved_at = approved_at;
        state.events.push(LedgerEvent::WorkApproved { id, mentor });
        debug!(%id, mentor = %mentor.short(), "work approved");

        Ok(TxReceipt {
            tx_hash,
            submission_id: id,
            block_number,
        })
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, LedgerState>> {
        self.inner.read().map_err(|_| LedgerError::LockPoisoned)
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, LedgerState>> {
        self.inner.write().map_err(|_| LedgerError::LockPoisoned)
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerReader for InMemoryLedger {
    async fn get_submission(&self, id: SubmissionId) -> LedgerResult<Submission> {
        let state = self.read()?;
        usize::try_from(id.value())
            .ok()
            .and_then(|i| state.submissions.get(i))
            .cloned()
            .ok_or(LedgerError::NotFound(id))
    }

    async fn submission_count(&self) -> LedgerResult<u64> {
        Ok(self.read()?.submissions.len() as u64)
    }
}

/// [`LedgerWriter`] over a shared [`InMemoryLedger`] with a fixed signer.
#[derive(Clone)]
pub struct InMemoryWriter {
    ledger: Arc<InMemoryLedger>,
    signer: Option<Address>,
}

impl InMemoryWriter {
    pub fn ledger(&self) -> &Arc<InMemoryLedger> {
        &self.ledger
    }

    fn require_signer(&self) -> LedgerResult<Address> {
        self.signer
            .and_then(Address::non_zero)
            .ok_or(LedgerError::Unauthenticated)
    }
}

#[async_trait]
impl LedgerWriter for InMemoryWriter {
    async fn signer(&self) -> LedgerResult<Address> {
        self.require_signer()
    }

    async fn submit_work(&self, title: &str, cid: &Cid) -> LedgerResult<TxReceipt> {
        let student = self.require_signer()?;
        self.ledger.submit_as(student, title, cid)
    }

    async fn approve_work(&self, id: SubmissionId) -> LedgerResult<TxReceipt> {
        let mentor = self.require_signer()?;
        self.ledger.approve_as(mentor, id)
    }
}
