use crate::error::{LottoError, Result};
use crate::rpc::EthProvider;
use crate::sync::{
    ChainStateSynchronizer, FocusState, PayoutWatcher, SnapshotObserver, DEFAULT_LOG_POLL_INTERVAL,
};
use crate::types::Address;
use crate::wallet::{ClientContext, ConnectionStatus, LottoConfig};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Notifications coming from the wallet or from our own transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
    /// The lottery emitted a `Payout` log; the pot and ending block are stale.
    PayoutCompleted,
    Disconnected,
}

struct ActiveSession {
    context: Arc<ClientContext>,
    synchronizer: Option<Arc<ChainStateSynchronizer>>,
    tasks: Vec<JoinHandle<()>>,
}

impl ActiveSession {
    fn stop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

/// Owns the wallet connection and the synchronizer bound to it.
///
/// Any account or chain change tears the session down and builds a new one,
/// so a synchronizer never outlives the context it reads through.
pub struct SessionManager {
    config: LottoConfig,
    provider: Arc<EthProvider>,
    focus: Arc<dyn FocusState>,
    observer: Arc<dyn SnapshotObserver>,
    session: RwLock<Option<ActiveSession>>,
}

impl SessionManager {
    pub fn new(
        config: LottoConfig,
        focus: Arc<dyn FocusState>,
        observer: Arc<dyn SnapshotObserver>,
    ) -> Result<Self> {
        config.validate()?;
        let provider = Arc::new(EthProvider::new(
            config.provider_url.clone(),
            config.request_timeout,
        )?);
        Ok(Self::with_provider(config, provider, focus, observer))
    }

    pub fn with_provider(
        config: LottoConfig,
        provider: Arc<EthProvider>,
        focus: Arc<dyn FocusState>,
        observer: Arc<dyn SnapshotObserver>,
    ) -> Self {
        Self {
            config,
            provider,
            focus,
            observer,
            session: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &LottoConfig {
        &self.config
    }

    /// Requests account access and moves the wallet to the lottery's chain.
    ///
    /// A refused chain switch is not an error: the session comes up on the
    /// wallet's chain and reports `WrongNetwork`.
    pub async fn connect(&self) -> Result<Arc<ClientContext>> {
        let accounts = self.provider.request_accounts().await?;
        let account = accounts
            .first()
            .copied()
            .ok_or_else(|| LottoError::not_connected("wallet returned no accounts"))?;

        let mut chain_id = self.provider.chain_id().await?;
        if chain_id != self.config.chain.chain_id {
            match self.provider.switch_chain(&self.config.chain).await {
                Ok(()) => chain_id = self.provider.chain_id().await?,
                Err(e) => {
                    tracing::warn!(error = %e, expected = self.config.chain.chain_id, actual = chain_id, "Network switch refused")
                }
            }
        }

        Ok(self.install(Some(account), chain_id))
    }

    /// Picks up an existing authorization without prompting.
    pub async fn attach(&self) -> Result<Arc<ClientContext>> {
        let (accounts, chain_id) =
            tokio::try_join!(self.provider.accounts(), self.provider.chain_id())?;
        Ok(self.install(accounts.first().copied(), chain_id))
    }

    fn install(&self, account: Option<Address>, chain_id: u64) -> Arc<ClientContext> {
        let context = Arc::new(ClientContext::new(
            self.config.clone(),
            self.provider.clone(),
            account,
            chain_id,
        ));

        let synchronizer = context.is_expected_chain().then(|| {
            Arc::new(ChainStateSynchronizer::new(
                context.sync_context(),
                self.config.sync_config(),
                self.focus.clone(),
                self.observer.clone(),
            ))
        });
        let mut tasks = Vec::new();
        if let Some(sync) = &synchronizer {
            tasks.push(sync.spawn());

            let watcher = Arc::new(PayoutWatcher::new(
                self.provider.clone(),
                self.config.lottery_address,
                DEFAULT_LOG_POLL_INTERVAL,
                self.focus.clone(),
                sync.clone(),
            ));
            tasks.push(watcher.spawn());
        }

        let previous = self.session.write().replace(ActiveSession {
            context: context.clone(),
            synchronizer,
            tasks,
        });
        if let Some(mut previous) = previous {
            previous.stop();
        }

        tracing::info!(
            account = ?account.map(|a| a.to_string()),
            chain_id,
            status = %context.connection_status(),
            "Session started"
        );
        context
    }

    pub async fn handle_event(&self, event: WalletEvent) -> Result<()> {
        tracing::debug!(?event, "Wallet event");

        match event {
            WalletEvent::AccountsChanged(accounts) => {
                let chain_id = match self.context() {
                    Some(context) => context.chain_id(),
                    None => self.provider.chain_id().await?,
                };
                self.install(accounts.first().copied(), chain_id);
            }
            WalletEvent::ChainChanged(chain_id) => {
                let account = self.context().and_then(|c| c.account());
                self.install(account, chain_id);
            }
            WalletEvent::PayoutCompleted => {
                if let Some(sync) = self.synchronizer() {
                    sync.refresh_now();
                }
            }
            WalletEvent::Disconnected => self.shutdown(),
        }
        Ok(())
    }

    /// Re-reads accounts and chain from the wallet and applies whatever changed.
    pub async fn refresh_wallet(&self) -> Result<Vec<WalletEvent>> {
        let (accounts, chain_id) =
            tokio::try_join!(self.provider.accounts(), self.provider.chain_id())?;

        let mut events = Vec::new();
        match self.context() {
            Some(context) => {
                if accounts.first().copied() != context.account() {
                    events.push(WalletEvent::AccountsChanged(accounts));
                }
                if chain_id != context.chain_id() {
                    events.push(WalletEvent::ChainChanged(chain_id));
                }
            }
            None => {
                if !accounts.is_empty() {
                    events.push(WalletEvent::AccountsChanged(accounts));
                }
            }
        }

        for event in &events {
            self.handle_event(event.clone()).await?;
        }
        Ok(events)
    }

    pub fn context(&self) -> Option<Arc<ClientContext>> {
        self.session.read().as_ref().map(|s| s.context.clone())
    }

    pub fn synchronizer(&self) -> Option<Arc<ChainStateSynchronizer>> {
        self.session
            .read()
            .as_ref()
            .and_then(|s| s.synchronizer.clone())
    }

    pub fn status(&self) -> ConnectionStatus {
        self.context()
            .map(|c| c.connection_status())
            .unwrap_or(ConnectionStatus::NotConnected)
    }

    pub fn shutdown(&self) {
        if let Some(mut session) = self.session.write().take() {
            session.stop();
            tracing::info!("Session closed");
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Some(session) = self.session.get_mut().as_mut() {
            session.stop();
        }
    }
}
