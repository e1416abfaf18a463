use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use wv_rpc::codec::encode_data;
use wv_types::{Address, ChainId, TxHash};

use crate::chain::ChainParams;
use crate::error::WalletResult;
use crate::events::{ListenerId, WalletListener};

/// A contract call the wallet should sign and broadcast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub data: Vec<u8>,
}

impl TransactionRequest {
    /// Parameter object for `eth_sendTransaction`.
    pub fn to_json(&self) -> Value {
        json!({
            "from": self.from.to_hex(),
            "to": self.to.to_hex(),
            "data": encode_data(&self.data),
        })
    }
}

/// Capabilities of an injected wallet (EIP-1193 style).
///
/// The wallet owns the signing keys and may change accounts or network at
/// any time; those changes arrive through [`WalletProvider::subscribe`].
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Accounts already authorized for this client; never prompts.
    async fn accounts(&self) -> WalletResult<Vec<Address>>;

    /// Ask the wallet (and possibly its user) to authorize accounts.
    async fn request_accounts(&self) -> WalletResult<Vec<Address>>;

    async fn chain_id(&self) -> WalletResult<ChainId>;

    async fn switch_chain(&self, chain: ChainId) -> WalletResult<()>;

    async fn add_chain(&self, params: &ChainParams) -> WalletResult<()>;

    async fn send_transaction(&self, tx: &TransactionRequest) -> WalletResult<TxHash>;

    fn subscribe(&self, listener: Arc<dyn WalletListener>) -> ListenerId;

    /// Returns `true` if the listener was registered.
    fn unsubscribe(&self, id: ListenerId) -> bool;
}
