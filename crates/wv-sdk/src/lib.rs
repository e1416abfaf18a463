//! High-level SDK for the Work Verifier.
//!
//! [`WorkVerifier`] is the entry point for applications: students submit a
//! file and a title, mentors approve records, and anyone can verify a record
//! by id. Reads go to the public ledger endpoint and need no wallet.

pub mod config;
pub mod error;
pub mod links;
pub mod tracker;
pub mod verifier;

pub use config::ClientConfig;
pub use error::{SdkError, SdkResult};
pub use links::{build_content_url, build_receipt_url, LinkBuilder};
pub use tracker::{LocalStatus, LocalSubmission, SubmissionTracker};
pub use verifier::{SubmitOutcome, Verification, WorkVerifier};

// Re-export key types
pub use wv_ledger::{InMemoryLedger, LedgerReader, LedgerWriter, ReceiptPolling, TxReceipt};
pub use wv_types::{
    Address, ChainId, Cid, Submission, SubmissionId, SubmissionStatus, Timestamp, TxHash,
};
pub use wv_upload::{ContentUploader, FileUpload, ProxyUploader};
pub use wv_wallet::{ChainParams, JsonRpcWallet, WalletProvider, WalletSession};
