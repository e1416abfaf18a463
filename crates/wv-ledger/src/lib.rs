//! Ledger access for the Work Verifier.
//!
//! The submission registry lives in an EVM contract. This crate encodes calls
//! to it ([`abi`]), splits access into a read and a write boundary
//! ([`LedgerReader`], [`LedgerWriter`]) and provides two backends:
//!
//! - [`RpcLedger`] / [`WalletWriter`]: the deployed contract, read through
//!   `eth_call` and written through an injected wallet.
//! - [`InMemoryLedger`]: the same semantics in-process, for tests and demos.

pub mod abi;
pub mod error;
pub mod memory;
pub mod records;
pub mod rpc;
pub mod traits;

pub use error::{LedgerError, LedgerResult};
pub use memory::{InMemoryLedger, InMemoryWriter};
pub use records::{LedgerEvent, LogEntry, RawReceipt, TxReceipt};
pub use rpc::{ReceiptPolling, RpcLedger, WalletWriter};
pub use traits::{LedgerReader, LedgerWriter};
