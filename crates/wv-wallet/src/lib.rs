//! Wallet session for the Work Verifier.
//!
//! The wallet is an injected capability ([`WalletProvider`]) rather than an
//! ambient global. [`WalletSession`] tracks the authorized identity and the
//! active network on top of it and follows the wallet's change events through
//! an explicit subscribe/unsubscribe pair.

pub mod chain;
pub mod error;
pub mod events;
pub mod memory;
pub mod provider;
pub mod rpc_wallet;
pub mod session;

pub use chain::{ChainParams, NativeCurrency};
pub use error::{codes, WalletError, WalletResult};
pub use events::{ListenerId, ListenerRegistry, WalletEvent, WalletListener};
pub use memory::MemoryWallet;
pub use provider::{TransactionRequest, WalletProvider};
pub use rpc_wallet::JsonRpcWallet;
pub use session::{SessionState, WalletSession, NO_PROVIDER_MESSAGE};
