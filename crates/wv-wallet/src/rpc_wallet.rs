use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;
use wv_rpc::codec::expect_str;
use wv_rpc::{HttpTransport, RpcTransport};
use wv_types::{Address, ChainId, TxHash};

use crate::chain::ChainParams;
use crate::error::{codes, WalletError, WalletResult};
use crate::events::{ListenerId, ListenerRegistry, WalletEvent, WalletListener};
use crate::provider::{TransactionRequest, WalletProvider};

/// Wallet backed by a JSON-RPC endpoint that holds the signing accounts
/// (a development node, a signing proxy, or a remote wallet bridge).
///
/// Such endpoints push no notifications; call [`JsonRpcWallet::refresh`] to
/// poll for account or network changes and broadcast them.
pub struct JsonRpcWallet<T = HttpTransport> {
    transport: T,
    listeners: ListenerRegistry,
    last_seen: RwLock<Observed>,
}

#[derive(Default)]
struct Observed {
    accounts: Option<Vec<Address>>,
    chain: Option<ChainId>,
}

impl JsonRpcWallet<HttpTransport> {
    pub fn connect(url: impl Into<String>) -> WalletResult<Self> {
        Ok(Self::new(HttpTransport::new(url)?))
    }
}

impl<T: RpcTransport> JsonRpcWallet<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            listeners: ListenerRegistry::new(),
            last_seen: RwLock::new(Observed::default()),
        }
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Re-read accounts and network, notifying listeners of any difference
    /// from the previous observation.
    pub async fn refresh(&self) -> WalletResult<()> {
        let accounts = self.accounts().await?;
        let chain = self.chain_id().await?;

        let mut events = Vec::new();
        {
            let mut seen = self.last_seen.write().unwrap_or_else(PoisonError::into_inner);
            if seen.accounts.as_ref() != Some(&accounts) {
                if seen.accounts.is_some() {
                    events.push(WalletEvent::AccountsChanged(accounts.clone()));
                }
                seen.accounts = Some(accounts);
            }
            if seen.chain != Some(chain) {
                if seen.chain.is_some() {
                    events.push(WalletEvent::ChainChanged(chain));
                }
                seen.chain = Some(chain);
            }
        }
        for event in &events {
            self.listeners.notify(event);
        }
        Ok(())
    }

    async fn address_list(&self, method: &str) -> WalletResult<Vec<Address>> {
        let value = self.transport.request(method, json!([])).await?;
        parse_addresses(&value)
    }
}

fn parse_addresses(value: &Value) -> WalletResult<Vec<Address>> {
    let items = value
        .as_array()
        .ok_or_else(|| WalletError::Malformed(format!("expected account list, got {value}")))?;
    items
        .iter()
        .map(|item| -> WalletResult<Address> {
            Ok(Address::from_hex(expect_str(item, "account")?)?)
        })
        .collect()
}

#[async_trait]
impl<T: RpcTransport> WalletProvider for JsonRpcWallet<T> {
    async fn accounts(&self) -> WalletResult<Vec<Address>> {
        self.address_list("eth_accounts").await
    }

    async fn request_accounts(&self) -> WalletResult<Vec<Address>> {
        match self.address_list("eth_requestAccounts").await {
            Err(err) if err.code() == Some(codes::METHOD_NOT_FOUND) => {
                debug!("endpoint lacks eth_requestAccounts; using eth_accounts");
                self.address_list("eth_accounts").await
            }
            other => other,
        }
    }

    async fn chain_id(&self) -> WalletResult<ChainId> {
        let value = self.transport.request("eth_chainId", json!([])).await?;
        Ok(ChainId::parse(expect_str(&value, "chain id")?)?)
    }

    async fn switch_chain(&self, chain: ChainId) -> WalletResult<()> {
        self.transport
            .request(
                "wallet_switchEthereumChain",
                json!([{ "chainId": chain.to_hex() }]),
            )
            .await?;
        Ok(())
    }

    async fn add_chain(&self, params: &ChainParams) -> WalletResult<()> {
        self.transport
            .request("wallet_addEthereumChain", json!([params.to_wallet_params()]))
            .await?;
        Ok(())
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> WalletResult<TxHash> {
        let value = self
            .transport
            .request("eth_sendTransaction", json!([tx.to_json()]))
            .await?;
        Ok(TxHash::from_hex(expect_str(&value, "transaction hash")?)?)
    }

    fn subscribe(&self, listener: Arc<dyn WalletListener>) -> ListenerId {
        self.listeners.register(listener)
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.unregister(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use wv_rpc::{RpcError, RpcResult};

    /// Canned replies keyed by method; records every call.
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<HashMap<String, RpcResult<Value>>>,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl ScriptedTransport {
        fn reply(&self, method: &str, result: RpcResult<Value>) {
            self.replies.lock().unwrap().insert(method.into(), result);
        }
    }

    #[async_trait]
    impl RpcTransport for ScriptedTransport {
        async fn request(&self, method: &str, params: Value) -> RpcResult<Value> {
            self.calls.lock().unwrap().push((method.into(), params));
            self.replies
                .lock()
                .unwrap()
                .get(method)
                .cloned()
                .unwrap_or(Err(RpcError::Remote {
                    code: codes::METHOD_NOT_FOUND,
                    message: "method not found".into(),
                    data: None,
                }))
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<WalletEvent>>);

    impl WalletListener for Recorder {
        fn on_event(&self, event: &WalletEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    const ALICE: &str = "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1";

    #[tokio::test]
    async fn request_accounts_falls_back_to_eth_accounts() {
        let transport = ScriptedTransport::default();
        transport.reply("eth_accounts", Ok(json!([ALICE])));
        let wallet = JsonRpcWallet::new(transport);

        let accounts = wallet.request_accounts().await.unwrap();
        assert_eq!(accounts, vec![Address::from_hex(ALICE).unwrap()]);
    }

    #[tokio::test]
    async fn unrecognized_chain_code_is_preserved() {
        let transport = ScriptedTransport::default();
        transport.reply(
            "wallet_switchEthereumChain",
            Err(RpcError::Remote {
                code: codes::UNRECOGNIZED_CHAIN,
                message: "Unrecognized chain ID".into(),
                data: None,
            }),
        );
        let wallet = JsonRpcWallet::new(transport);
        let err = wallet.switch_chain(ChainId::POLYGON_AMOY).await.unwrap_err();
        assert!(err.is_unrecognized_chain());
    }

    #[tokio::test]
    async fn send_transaction_returns_hash() {
        let transport = ScriptedTransport::default();
        let hash = format!("0x{}", "ab".repeat(32));
        transport.reply("eth_sendTransaction", Ok(json!(hash)));
        let wallet = JsonRpcWallet::new(transport);

        let tx = TransactionRequest {
            from: Address::from_hex(ALICE).unwrap(),
            to: Address::from_raw([2; 20]),
            data: vec![0x01],
        };
        let sent = wallet.send_transaction(&tx).await.unwrap();
        assert_eq!(sent, TxHash::from_raw([0xab; 32]));

        let calls = wallet.transport.calls.lock().unwrap();
        assert_eq!(calls[0].1, json!([tx.to_json()]));
    }

    #[tokio::test]
    async fn refresh_broadcasts_differences_only() {
        let transport = ScriptedTransport::default();
        transport.reply("eth_accounts", Ok(json!([ALICE])));
        transport.reply("eth_chainId", Ok(json!("0x1")));
        let wallet = JsonRpcWallet::new(transport);
        let recorder = Arc::new(Recorder::default());
        wallet.subscribe(recorder.clone());

        wallet.refresh().await.unwrap();
        wallet.refresh().await.unwrap();
        assert!(recorder.0.lock().unwrap().is_empty());

        wallet.transport.reply("eth_chainId", Ok(json!("0x13882")));
        wallet.refresh().await.unwrap();
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec![WalletEvent::ChainChanged(ChainId::POLYGON_AMOY)]
        );
    }

    #[test]
    fn malformed_account_list() {
        assert!(matches!(
            parse_addresses(&json!("nope")),
            Err(WalletError::Malformed(_))
        ));
        assert!(parse_addresses(&json!(["0x12"])).is_err());
    }
}
