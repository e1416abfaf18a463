use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::debug;
use wv_types::{Address, ChainId, TxHash};

use crate::chain::ChainParams;
use crate::error::{codes, WalletError, WalletResult};
use crate::events::{ListenerId, ListenerRegistry, WalletEvent, WalletListener};
use crate::provider::{TransactionRequest, WalletProvider};

/// Scripted in-process wallet for tests, local demos, and embedding.
///
/// Behaves like a browser wallet: authorization exposes the grantable
/// accounts, switching to an unknown chain fails with code 4902, adding a
/// chain also switches to it, and account/chain changes are broadcast.
pub struct MemoryWallet {
    state: RwLock<MemoryWalletState>,
    listeners: ListenerRegistry,
}

struct MemoryWalletState {
    grantable: Vec<Address>,
    authorized: Vec<Address>,
    chain: ChainId,
    known_chains: Vec<ChainId>,
    rejection: Option<String>,
    reject_registration: bool,
    reads_fail: bool,
    authorization_requests: usize,
    sent: Vec<TransactionRequest>,
}

impl MemoryWallet {
    /// A wallet sitting on `chain`, knowing no other network and no accounts.
    pub fn new(chain: ChainId) -> Self {
        Self {
            state: RwLock::new(MemoryWalletState {
                grantable: Vec::new(),
                authorized: Vec::new(),
                chain,
                known_chains: vec![chain],
                rejection: None,
                reject_registration: false,
                reads_fail: false,
                authorization_requests: 0,
                sent: Vec::new(),
            }),
            listeners: ListenerRegistry::new(),
        }
    }

    /// Accounts the user would grant when asked.
    pub fn with_accounts(self, accounts: Vec<Address>) -> Self {
        self.write().grantable = accounts;
        self
    }

    pub fn with_known_chain(self, chain: ChainId) -> Self {
        {
            let mut state = self.write();
            if !state.known_chains.contains(&chain) {
                state.known_chains.push(chain);
            }
        }
        self
    }

    /// Expose the grantable accounts without a prompt, as after an earlier visit.
    pub fn pre_authorized(self) -> Self {
        {
            let mut state = self.write();
            state.authorized = state.grantable.clone();
        }
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Make every following authorization request fail as a user rejection.
    pub fn reject_authorization(&self, message: impl Into<String>) {
        self.write().rejection = Some(message.into());
    }

    pub fn reject_chain_registration(&self) {
        self.write().reject_registration = true;
    }

    /// Make the prompt-free queries (`accounts`, `chain_id`) fail.
    pub fn fail_reads(&self) {
        self.write().reads_fail = true;
    }

    /// Simulate the user switching accounts inside the wallet.
    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.write().authorized = accounts.clone();
        self.listeners.notify(&WalletEvent::AccountsChanged(accounts));
    }

    /// Simulate the user switching networks inside the wallet.
    pub fn set_chain(&self, chain: ChainId) {
        {
            let mut state = self.write();
            state.chain = chain;
            if !state.known_chains.contains(&chain) {
                state.known_chains.push(chain);
            }
        }
        self.listeners.notify(&WalletEvent::ChainChanged(chain));
    }

    pub fn current_chain(&self) -> ChainId {
        self.read().chain
    }

    pub fn known_chains(&self) -> Vec<ChainId> {
        self.read().known_chains.clone()
    }

    pub fn sent_transactions(&self) -> Vec<TransactionRequest> {
        self.read().sent.clone()
    }

    pub fn authorization_requests(&self) -> usize {
        self.read().authorization_requests
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, MemoryWalletState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryWalletState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl WalletProvider for MemoryWallet {
    async fn accounts(&self) -> WalletResult<Vec<Address>> {
        let state = self.read();
        if state.reads_fail {
            return Err(WalletError::Transport("wallet unreachable".into()));
        }
        Ok(state.authorized.clone())
    }

    async fn request_accounts(&self) -> WalletResult<Vec<Address>> {
        let granted = {
            let mut state = self.write();
            state.authorization_requests += 1;
            if let Some(message) = &state.rejection {
                return Err(WalletError::provider(codes::USER_REJECTED, message.clone()));
            }
            state.authorized = state.grantable.clone();
            state.authorized.clone()
        };
        debug!(count = granted.len(), "memory wallet granted accounts");
        self.listeners
            .notify(&WalletEvent::AccountsChanged(granted.clone()));
        Ok(granted)
    }

    async fn chain_id(&self) -> WalletResult<ChainId> {
        let state = self.read();
        if state.reads_fail {
            return Err(WalletError::Transport("wallet unreachable".into()));
        }
        Ok(state.chain)
    }

    async fn switch_chain(&self, chain: ChainId) -> WalletResult<()> {
        {
            let mut state = self.write();
            if !state.known_chains.contains(&chain) {
                return Err(WalletError::provider(
                    codes::UNRECOGNIZED_CHAIN,
                    format!("Unrecognized chain ID \"{}\"", chain.to_hex()),
                ));
            }
            if state.chain == chain {
                return Ok(());
            }
            state.chain = chain;
        }
        self.listeners.notify(&WalletEvent::ChainChanged(chain));
        Ok(())
    }

    async fn add_chain(&self, params: &ChainParams) -> WalletResult<()> {
        {
            let mut state = self.write();
            if state.reject_registration {
                return Err(WalletError::provider(
                    codes::USER_REJECTED,
                    "User rejected the request.",
                ));
            }
            if !state.known_chains.contains(&params.chain_id) {
                state.known_chains.push(params.chain_id);
            }
            state.chain = params.chain_id;
        }
        self.listeners
            .notify(&WalletEvent::ChainChanged(params.chain_id));
        Ok(())
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> WalletResult<TxHash> {
        let mut state = self.write();
        if !state.authorized.contains(&tx.from) {
            return Err(WalletError::provider(
                codes::UNAUTHORIZED,
                format!("account {} is not authorized", tx.from),
            ));
        }
        state.sent.push(tx.clone());
        let mut hash = [0u8; 32];
        hash[0] = 0xfe;
        hash[24..].copy_from_slice(&(state.sent.len() as u64).to_be_bytes());
        Ok(TxHash::from_raw(hash))
    }

    fn subscribe(&self, listener: Arc<dyn WalletListener>) -> ListenerId {
        self.listeners.register(listener)
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.unregister(id)
    }
}
