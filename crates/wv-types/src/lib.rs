//! Foundation types for the Work Verifier.
//!
//! Every other crate in the workspace depends on `wv-types`.
//!
//! # Key Types
//!
//! - [`Address`]: 20-byte ledger account; [`Address::ZERO`] is the "no identity" sentinel
//! - [`TxHash`]: transaction reference used to build receipt links
//! - [`ChainId`]: numeric network identifier
//! - [`Cid`]: content identifier returned by the pinning service
//! - [`Timestamp`]: ledger time in seconds
//! - [`Submission`]: the on-chain proof-of-work record

pub mod address;
pub mod chain;
pub mod cid;
pub mod error;
pub mod hash;
pub mod submission;
pub mod temporal;

pub use address::Address;
pub use chain::ChainId;
pub use cid::Cid;
pub use error::TypeError;
pub use hash::TxHash;
pub use submission::{Submission, SubmissionId, SubmissionStatus};
pub use temporal::Timestamp;
