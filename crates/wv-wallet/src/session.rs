use std::sync::{Arc, PoisonError, RwLock, Weak};

use tracing::{debug, info, warn};
use wv_types::{Address, ChainId};

use crate::chain::ChainParams;
use crate::error::{WalletError, WalletResult};
use crate::events::{ListenerId, WalletEvent, WalletListener};
use crate::provider::WalletProvider;

/// Reported through `last_error` when there is no wallet to talk to.
pub const NO_PROVIDER_MESSAGE: &str =
    "No wallet provider found. Install MetaMask (or another injected wallet) to continue.";

/// Observable session fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub identity: Option<Address>,
    pub network: Option<ChainId>,
    pub connecting: bool,
    pub last_error: Option<String>,
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        self.identity.is_some()
    }
}

/// Applies wallet events to a session that may already be gone.
struct SessionListener {
    state: Weak<RwLock<SessionState>>,
}

impl WalletListener for SessionListener {
    fn on_event(&self, event: &WalletEvent) {
        let Some(shared) = self.state.upgrade() else {
            return;
        };
        let mut state = shared.write().unwrap_or_else(PoisonError::into_inner);
        match event {
            WalletEvent::AccountsChanged(accounts) => {
                debug!(count = accounts.len(), "wallet accounts changed");
                state.identity = accounts.first().copied();
            }
            WalletEvent::ChainChanged(chain) => {
                debug!(%chain, "wallet network changed");
                state.network = Some(*chain);
            }
        }
    }
}

/// Tracks which signing identity is authorized and on which network.
///
/// The wallet is injected at construction and may be absent. While the
/// session lives it is subscribed to the wallet's account and network
/// changes; dropping the session unsubscribes.
pub struct WalletSession {
    provider: Option<Arc<dyn WalletProvider>>,
    expected_chain: ChainParams,
    state: Arc<RwLock<SessionState>>,
    subscription: Option<ListenerId>,
}

impl WalletSession {
    /// Subscribe to the wallet and pick up an existing authorization.
    ///
    /// Failures while reading the existing authorization are swallowed: the
    /// session simply starts disconnected.
    pub async fn start(
        provider: Option<Arc<dyn WalletProvider>>,
        expected_chain: ChainParams,
    ) -> Self {
        let state = Arc::new(RwLock::new(SessionState::default()));
        let subscription = provider.as_ref().map(|p| {
            p.subscribe(Arc::new(SessionListener {
                state: Arc::downgrade(&state),
            }))
        });
        let session = Self {
            provider,
            expected_chain,
            state,
            subscription,
        };
        session.restore().await;
        session
    }

    pub fn provider(&self) -> Option<Arc<dyn WalletProvider>> {
        self.provider.clone()
    }

    pub fn expected_chain(&self) -> &ChainParams {
        &self.expected_chain
    }

    pub fn state(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn identity(&self) -> Option<Address> {
        self.state().identity
    }

    pub fn network(&self) -> Option<ChainId> {
        self.state().network
    }

    pub fn is_connecting(&self) -> bool {
        self.state().connecting
    }

    pub fn last_error(&self) -> Option<String> {
        self.state().last_error
    }

    /// Whether the wallet currently sits on the expected network.
    pub fn on_expected_network(&self) -> bool {
        self.network() == Some(self.expected_chain.chain_id)
    }

    /// Ask the wallet for an identity, then steer it to the expected network.
    ///
    /// Never fails: problems land in `last_error`. Only the authorization
    /// step can fail the connect; network switching is best effort. A call
    /// made while another connect is in flight returns immediately.
    pub async fn connect(&self) {
        let Some(provider) = self.provider.clone() else {
            warn!("connect requested without a wallet provider");
            self.update(|s| s.last_error = Some(NO_PROVIDER_MESSAGE.into()));
            return;
        };

        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            if state.connecting {
                debug!("connect already in progress; ignoring");
                return;
            }
            state.connecting = true;
            state.last_error = None;
        }

        match self.authorize(provider.as_ref()).await {
            Ok(identity) => {
                info!(%identity, "wallet connected");
                self.ensure_network(provider.as_ref()).await;
            }
            Err(err) => {
                warn!(error = %err, "wallet authorization failed");
                self.update(|s| s.last_error = Some(err.to_string()));
            }
        }

        self.update(|s| s.connecting = false);
    }

    /// Forget the identity locally. The wallet keeps its authorization.
    pub fn disconnect(&self) {
        self.update(|s| {
            s.identity = None;
            s.network = None;
            s.last_error = None;
        });
        info!("wallet session cleared");
    }

    async fn restore(&self) {
        let Some(provider) = &self.provider else {
            debug!("no wallet provider; session starts empty");
            return;
        };
        match provider.accounts().await {
            Ok(accounts) => {
                if let Some(first) = accounts.first().copied() {
                    self.update(|s| s.identity = Some(first));
                }
            }
            Err(err) => debug!(error = %err, "could not read authorized accounts"),
        }
        match provider.chain_id().await {
            Ok(chain) => self.update(|s| s.network = Some(chain)),
            Err(err) => debug!(error = %err, "could not read active network"),
        }
    }

    async fn authorize(&self, provider: &dyn WalletProvider) -> WalletResult<Address> {
        let accounts = provider.request_accounts().await?;
        let identity = accounts.first().copied().ok_or(WalletError::NoAccounts)?;
        self.update(|s| s.identity = Some(identity));
        Ok(identity)
    }

    async fn ensure_network(&self, provider: &dyn WalletProvider) {
        let target = self.expected_chain.chain_id;
        if let Err(err) = provider.switch_chain(target).await {
            if err.is_unrecognized_chain() {
                info!(chain = %target, "registering network with wallet");
                if let Err(err) = provider.add_chain(&self.expected_chain).await {
                    warn!(chain = %target, error = %err, "network registration failed");
                }
            } else {
                warn!(chain = %target, error = %err, "network switch failed");
            }
        }
        match provider.chain_id().await {
            Ok(chain) => self.update(|s| s.network = Some(chain)),
            Err(err) => warn!(error = %err, "could not read active network"),
        }
    }

    fn update(&self, f: impl FnOnce(&mut SessionState)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
    }
}

impl Drop for WalletSession {
    fn drop(&mut self) {
        if let (Some(provider), Some(id)) = (&self.provider, self.subscription.take()) {
            provider.unsubscribe(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryWallet;
    use crate::provider::TransactionRequest;
    use async_trait::async_trait;
    use tokio::sync::Notify;
    use wv_types::TxHash;

    fn alice() -> Address {
        Address::from_raw([0xa1; 20])
    }

    fn bob() -> Address {
        Address::from_raw([0xb0; 20])
    }

    async fn session_over(wallet: &Arc<MemoryWallet>) -> WalletSession {
        let provider: Arc<dyn WalletProvider> = wallet.clone();
        WalletSession::start(Some(provider), ChainParams::polygon_amoy()).await
    }

    #[tokio::test]
    async fn connect_without_provider_sets_error() {
        let session = WalletSession::start(None, ChainParams::polygon_amoy()).await;
        session.connect().await;

        let state = session.state();
        assert_eq!(state.identity, None);
        assert!(!state.connecting);
        assert!(!state.last_error.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn start_picks_up_existing_authorization() {
        let wallet = MemoryWallet::new(ChainId::POLYGON_AMOY)
            .with_accounts(vec![alice()])
            .pre_authorized()
            .into_shared();
        let session = session_over(&wallet).await;
        assert_eq!(session.identity(), Some(alice()));
        assert_eq!(session.network(), Some(ChainId::POLYGON_AMOY));
        assert_eq!(wallet.authorization_requests(), 0);
    }

    #[tokio::test]
    async fn start_tolerates_unreadable_wallet() {
        let wallet = MemoryWallet::new(ChainId(1)).into_shared();
        wallet.fail_reads();
        let session = session_over(&wallet).await;
        assert_eq!(session.state(), SessionState::default());
    }

    #[tokio::test]
    async fn connect_registers_unknown_network() {
        let wallet = MemoryWallet::new(ChainId(1))
            .with_accounts(vec![alice(), bob()])
            .into_shared();
        let session = session_over(&wallet).await;
        session.connect().await;

        let state = session.state();
        assert_eq!(state.identity, Some(alice()));
        assert_eq!(state.network, Some(ChainId::POLYGON_AMOY));
        assert!(!state.connecting);
        assert_eq!(state.last_error, None);
        assert!(wallet.known_chains().contains(&ChainId::POLYGON_AMOY));
        assert!(session.on_expected_network());
    }

    #[tokio::test]
    async fn network_failure_is_not_fatal() {
        let wallet = MemoryWallet::new(ChainId(1))
            .with_accounts(vec![alice()])
            .into_shared();
        wallet.reject_chain_registration();
        let session = session_over(&wallet).await;
        session.connect().await;

        let state = session.state();
        assert_eq!(state.identity, Some(alice()));
        assert_eq!(state.network, Some(ChainId(1)));
        assert_eq!(state.last_error, None);
    }

    #[tokio::test]
    async fn rejected_authorization_leaves_identity_empty() {
        let wallet = MemoryWallet::new(ChainId::POLYGON_AMOY)
            .with_accounts(vec![alice()])
            .into_shared();
        wallet.reject_authorization("User rejected the request.");
        let session = session_over(&wallet).await;
        session.connect().await;

        let state = session.state();
        assert_eq!(state.identity, None);
        assert_eq!(state.last_error.as_deref(), Some("User rejected the request."));
        assert!(!state.connecting);
    }

    #[tokio::test]
    async fn empty_grant_is_an_error() {
        let wallet = MemoryWallet::new(ChainId::POLYGON_AMOY).into_shared();
        let session = session_over(&wallet).await;
        session.connect().await;
        assert_eq!(session.identity(), None);
        assert_eq!(
            session.last_error(),
            Some(WalletError::NoAccounts.to_string())
        );
    }

    #[tokio::test]
    async fn events_track_wallet_changes() {
        let wallet = MemoryWallet::new(ChainId::POLYGON_AMOY)
            .with_accounts(vec![alice()])
            .into_shared();
        let session = session_over(&wallet).await;
        session.connect().await;

        wallet.set_accounts(vec![bob()]);
        assert_eq!(session.identity(), Some(bob()));
        wallet.set_chain(ChainId(137));
        assert_eq!(session.network(), Some(ChainId(137)));
        assert!(!session.on_expected_network());
        wallet.set_accounts(vec![]);
        assert_eq!(session.identity(), None);
    }

    #[tokio::test]
    async fn disconnect_is_local() {
        let wallet = MemoryWallet::new(ChainId::POLYGON_AMOY)
            .with_accounts(vec![alice()])
            .into_shared();
        let session = session_over(&wallet).await;
        session.connect().await;
        session.disconnect();

        assert_eq!(session.state(), SessionState::default());
        assert_eq!(wallet.accounts().await.unwrap(), vec![alice()]);
    }

    #[tokio::test]
    async fn drop_unsubscribes() {
        let wallet = MemoryWallet::new(ChainId::POLYGON_AMOY).into_shared();
        let session = session_over(&wallet).await;
        assert_eq!(wallet.listener_count(), 1);
        drop(session);
        assert_eq!(wallet.listener_count(), 0);
        wallet.set_accounts(vec![alice()]);
    }

    /// Holds every authorization request until released.
    struct GatedWallet {
        inner: Arc<MemoryWallet>,
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl WalletProvider for GatedWallet {
        async fn accounts(&self) -> WalletResult<Vec<Address>> {
            self.inner.accounts().await
        }

        async fn request_accounts(&self) -> WalletResult<Vec<Address>> {
            self.gate.notified().await;
            self.inner.request_accounts().await
        }

        async fn chain_id(&self) -> WalletResult<ChainId> {
            self.inner.chain_id().await
        }

        async fn switch_chain(&self, chain: ChainId) -> WalletResult<()> {
            self.inner.switch_chain(chain).await
        }

        async fn add_chain(&self, params: &ChainParams) -> WalletResult<()> {
            self.inner.add_chain(params).await
        }

        async fn send_transaction(&self, tx: &TransactionRequest) -> WalletResult<TxHash> {
            self.inner.send_transaction(tx).await
        }

        fn subscribe(&self, listener: Arc<dyn WalletListener>) -> ListenerId {
            self.inner.subscribe(listener)
        }

        fn unsubscribe(&self, id: ListenerId) -> bool {
            self.inner.unsubscribe(id)
        }
    }

    #[tokio::test]
    async fn concurrent_connect_is_ignored() {
        let inner = MemoryWallet::new(ChainId::POLYGON_AMOY)
            .with_accounts(vec![alice()])
            .into_shared();
        let gate = Arc::new(Notify::new());
        let provider: Arc<dyn WalletProvider> = Arc::new(GatedWallet {
            inner: inner.clone(),
            gate: gate.clone(),
        });
        let session =
            Arc::new(WalletSession::start(Some(provider), ChainParams::polygon_amoy()).await);

        let background = session.clone();
        let first = tokio::spawn(async move { background.connect().await });
        while !session.is_connecting() {
            tokio::task::yield_now().await;
        }

        session.connect().await;
        assert!(session.is_connecting());

        gate.notify_one();
        first.await.unwrap();

        assert!(!session.is_connecting());
        assert_eq!(session.identity(), Some(alice()));
        assert_eq!(inner.authorization_requests(), 1);
    }
}
