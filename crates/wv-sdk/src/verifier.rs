use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use wv_ledger::{LedgerReader, LedgerWriter, RpcLedger, TxReceipt, WalletWriter};
use wv_types::{Cid, Submission, SubmissionId, TxHash};
use wv_upload::{ContentUploader, FileUpload, ProxyUploader};
use wv_wallet::WalletProvider;

use crate::config::ClientConfig;
use crate::error::{SdkError, SdkResult};
use crate::links::LinkBuilder;
use crate::tracker::{LocalSubmission, SubmissionTracker};

/// Result of a completed submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    pub cid: Cid,
    pub receipt: TxReceipt,
}

/// A record as shown to a verifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub submission: Submission,
    pub content_url: String,
}

/// High-level Work Verifier API.
pub struct WorkVerifier {
    reader: Arc<dyn LedgerReader>,
    writer: Option<Arc<dyn LedgerWriter>>,
    uploader: Arc<dyn ContentUploader>,
    links: LinkBuilder,
    tracker: SubmissionTracker,
}

impl WorkVerifier {
    /// A read-only verifier; writes fail with `Authentication` until a writer
    /// is attached.
    pub fn new(reader: Arc<dyn LedgerReader>, uploader: Arc<dyn ContentUploader>) -> Self {
        Self {
            reader,
            writer: None,
            uploader,
            links: LinkBuilder::default(),
            tracker: SubmissionTracker::new(),
        }
    }

    pub fn with_writer(mut self, writer: Arc<dyn LedgerWriter>) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn with_links(mut self, links: LinkBuilder) -> Self {
        self.links = links;
        self
    }

    /// Wire the deployed contract, the upload proxy and, when given, a wallet.
    pub fn from_config(
        config: &ClientConfig,
        wallet: Option<Arc<dyn WalletProvider>>,
    ) -> SdkResult<Self> {
        let contract = config.require_contract()?;
        let ledger = RpcLedger::connect(&config.rpc_url, contract)
            .map_err(|e| SdkError::Config(e.to_string()))?;
        let uploader = ProxyUploader::new(&config.upload_url)?;

        let mut verifier = Self::new(Arc::new(ledger.clone()), Arc::new(uploader))
            .with_links(config.links());
        if let Some(wallet) = wallet {
            let writer = WalletWriter::new(ledger, wallet).with_polling(config.polling);
            verifier = verifier.with_writer(Arc::new(writer));
        }
        debug!(contract = %contract, rpc = %config.rpc_url, "verifier configured");
        Ok(verifier)
    }

    // ---- Write operations ----

    /// Upload `file`, then record it on the ledger under `title`.
    ///
    /// The signer is checked before anything is uploaded, and nothing is
    /// written if the upload fails. The local placeholder is dropped on any
    /// failure.
    pub async fn submit(&self, title: &str, file: FileUpload) -> SdkResult<SubmitOutcome> {
        let title = validate_title(title)?;
        if file.is_empty() {
            return Err(SdkError::Validation(format!(
                "file {} is empty",
                file.file_name
            )));
        }
        let writer = self.require_writer()?;
        writer.signer().await?;

        let local_id = self.tracker.begin(title);
        match self.upload_and_record(writer, local_id, title, file).await {
            Ok(outcome) => {
                self.tracker.confirm(local_id, &outcome.receipt);
                info!(id = %outcome.receipt.submission_id, cid = %outcome.cid, "work submitted");
                Ok(outcome)
            }
            Err(err) => {
                self.tracker.discard(local_id);
                warn!(error = %err, "submission failed");
                Err(err)
            }
        }
    }

    async fn upload_and_record(
        &self,
        writer: &Arc<dyn LedgerWriter>,
        local_id: u64,
        title: &str,
        file: FileUpload,
    ) -> SdkResult<SubmitOutcome> {
        let cid = self.uploader.upload(file).await?;
        self.tracker.mark_uploaded(local_id, &cid);
        let receipt = writer.submit_work(title, &cid).await?;
        Ok(SubmitOutcome { cid, receipt })
    }

    /// Record an already pinned `cid` under `title`.
    pub async fn submit_cid(&self, title: &str, cid: &str) -> SdkResult<TxReceipt> {
        let title = validate_title(title)?;
        let cid = Cid::new(cid)?;
        let writer = self.require_writer()?;
        Ok(writer.submit_work(title, &cid).await?)
    }

    /// Approve submission `id`; the ledger enforces existence and that it is
    /// still pending.
    pub async fn approve(&self, id: SubmissionId) -> SdkResult<TxReceipt> {
        let writer = self.require_writer()?;
        let receipt = writer.approve_work(id).await?;
        self.tracker.mark_approved(id);
        info!(%id, tx = %receipt.tx_hash.short(), "work approved");
        Ok(receipt)
    }

    // ---- Read operations ----

    pub async fn fetch_one(&self, id: SubmissionId) -> SdkResult<Submission> {
        Ok(self.reader.get_submission(id).await?)
    }

    pub async fn fetch_count(&self) -> SdkResult<u64> {
        Ok(self.reader.submission_count().await?)
    }

    /// Every record in id order, read one at a time.
    pub async fn fetch_all(&self) -> SdkResult<Vec<Submission>> {
        let count = self.fetch_count().await?;
        let mut all = Vec::new();
        for id in 0..count {
            all.push(self.fetch_one(SubmissionId(id)).await?);
        }
        Ok(all)
    }

    pub async fn verify(&self, id: SubmissionId) -> SdkResult<Verification> {
        let submission = self.fetch_one(id).await?;
        let content_url = self.links.cid_url(&submission.cid);
        Ok(Verification {
            submission,
            content_url,
        })
    }

    // ---- Links and local state ----

    pub fn content_url(&self, cid: &Cid) -> String {
        self.links.cid_url(cid)
    }

    pub fn receipt_url(&self, tx: &TxHash) -> String {
        self.links.tx_url(tx)
    }

    pub fn links(&self) -> &LinkBuilder {
        &self.links
    }

    pub fn local_submissions(&self) -> Vec<LocalSubmission> {
        self.tracker.list()
    }

    fn require_writer(&self) -> SdkResult<&Arc<dyn LedgerWriter>> {
        self.writer
            .as_ref()
            .ok_or_else(|| SdkError::Authentication("no wallet connected".into()))
    }
}

/// Blank titles are rejected; anything else is recorded exactly as given.
fn validate_title(title: &str) -> SdkResult<&str> {
    if title.trim().is_empty() {
        return Err(SdkError::Validation("title must not be empty".into()));
    }
    Ok(title)
}
