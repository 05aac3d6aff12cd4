use crate::contract::{ContractHandle, Erc20Token, LotteryContract, PriceFeed};
use crate::error::{LottoError, Result};
use crate::format::{format_units, parse_units};
use crate::rpc::{EthProvider, ReadOnlyChainAccessor};
use crate::sync::SyncContext;
use crate::types::{AccountStatus, Address, TransactionRequest, TxHash};
use crate::wallet::LottoConfig;
use alloy_primitives::{Bytes, U256};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// What the connect button would say.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionStatus {
    NotConnected,
    WrongNetwork { expected: u64, actual: u64 },
    Connected { account: Address },
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::NotConnected => write!(f, "Connect"),
            ConnectionStatus::WrongNetwork { .. } => write!(f, "Switch Network"),
            ConnectionStatus::Connected { .. } => write!(f, "Connected"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenBalance {
    pub symbol: String,
    pub raw: U256,
    pub decimals: u32,
    pub display: String,
}

/// Everything bound to one wallet connection: provider, account, chain and contracts.
///
/// Rebuilt from scratch whenever the account or chain changes.
pub struct ClientContext {
    config: LottoConfig,
    provider: Arc<EthProvider>,
    account: Option<Address>,
    chain_id: u64,
    lottery: LotteryContract,
    price_feed: PriceFeed,
}

impl fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientContext")
            .field("account", &self.account)
            .field("chain_id", &self.chain_id)
            .field("lottery", &self.lottery.address())
            .field("provider", &self.provider.url())
            .finish()
    }
}

impl ClientContext {
    pub fn new(
        config: LottoConfig,
        provider: Arc<EthProvider>,
        account: Option<Address>,
        chain_id: u64,
    ) -> Self {
        let lottery_handle = match account {
            Some(account) => {
                ContractHandle::with_signer(config.lottery_address, provider.clone(), account)
            }
            None => ContractHandle::new(config.lottery_address, provider.clone()),
        };
        let price_handle = ContractHandle::new(config.price_feed_address, provider.clone());

        Self {
            lottery: LotteryContract::new(lottery_handle),
            price_feed: PriceFeed::new(Arc::new(price_handle)),
            config,
            provider,
            account,
            chain_id,
        }
    }

    pub fn config(&self) -> &LottoConfig {
        &self.config
    }

    pub fn provider(&self) -> Arc<EthProvider> {
        self.provider.clone()
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn lottery(&self) -> &LotteryContract {
        &self.lottery
    }

    pub fn is_expected_chain(&self) -> bool {
        self.chain_id == self.config.chain.chain_id
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        match self.account {
            None => ConnectionStatus::NotConnected,
            Some(_) if !self.is_expected_chain() => ConnectionStatus::WrongNetwork {
                expected: self.config.chain.chain_id,
                actual: self.chain_id,
            },
            Some(account) => ConnectionStatus::Connected { account },
        }
    }

    pub fn require_account(&self) -> Result<Address> {
        self.account
            .ok_or_else(|| LottoError::not_connected("no wallet account available"))
    }

    /// Account present and on the lottery's chain.
    pub fn ensure_ready(&self) -> Result<Address> {
        let account = self.require_account()?;
        if !self.is_expected_chain() {
            return Err(LottoError::WrongNetwork {
                expected: self.config.chain.chain_id,
                actual: self.chain_id,
            });
        }
        Ok(account)
    }

    /// Read handles for the chain-state synchronizer.
    pub fn sync_context(&self) -> SyncContext {
        SyncContext {
            chain: self.provider.clone(),
            lottery: self.lottery.reader(),
            price_feed: self.price_feed.reader(),
        }
    }

    pub async fn price_rate(&self) -> Result<u128> {
        self.price_feed.latest_answer().await
    }

    pub async fn ether_balance(&self) -> Result<U256> {
        let account = self.require_account()?;
        self.provider.get_balance(account).await
    }

    /// Per-account lottery data shown next to the pot.
    pub async fn account_status(&self) -> Result<AccountStatus> {
        let account = self.ensure_ready()?;

        let (ether_balance, staking_enabled, available_rewards, accumulated, last_winner) = tokio::try_join!(
            self.provider.get_balance(account),
            self.lottery.is_staking(),
            self.lottery.available_eth(),
            self.lottery.accumulated_eth(account),
            self.lottery.last_winner(),
        )?;

        Ok(AccountStatus {
            account,
            ether_balance,
            staking_enabled,
            available_rewards,
            accumulated,
            last_winner,
        })
    }

    pub fn token(&self, symbol: &str) -> Result<Erc20Token> {
        let address = self.config.token_address(symbol)?;
        let handle = match self.account {
            Some(account) => ContractHandle::with_signer(address, self.provider.clone(), account),
            None => ContractHandle::new(address, self.provider.clone()),
        };
        Ok(Erc20Token::new(handle))
    }

    pub async fn token_balance(&self, symbol: &str) -> Result<TokenBalance> {
        let account = self.require_account()?;
        let token = self.token(symbol)?;

        let (raw, decimals) = tokio::try_join!(token.balance_of(account), token.decimals())?;
        Ok(TokenBalance {
            symbol: symbol.to_uppercase(),
            raw,
            decimals,
            display: format_units(raw, decimals)?,
        })
    }

    /// Balances of every configured token; each entry fails independently.
    pub async fn token_balances(&self) -> Vec<(String, Result<TokenBalance>)> {
        let symbols: Vec<String> = self.config.tokens.keys().cloned().collect();
        let balances =
            futures::future::join_all(symbols.iter().map(|symbol| self.token_balance(symbol)))
                .await;
        symbols.into_iter().zip(balances).collect()
    }

    /// Sends `amount` wei to `to`, optionally attaching a UTF-8 note as input data.
    pub async fn send_ether(
        &self,
        to: Address,
        amount: U256,
        message: Option<&str>,
    ) -> Result<TxHash> {
        let from = self.ensure_ready()?;
        let tx = TransactionRequest {
            from,
            to,
            value: Some(amount),
            data: message
                .filter(|m| !m.is_empty())
                .map(|m| Bytes::copy_from_slice(m.as_bytes())),
        };

        let hash = self.provider.send_transaction(&tx).await?;
        tracing::info!(to = %to, amount = %amount, tx = %hash, "Ether sent");
        Ok(hash)
    }

    /// Transfers a decimal `amount` of the token registered under `symbol`.
    pub async fn send_token(&self, symbol: &str, to: Address, amount: &str) -> Result<TxHash> {
        self.ensure_ready()?;
        let token = self.token(symbol)?;
        let decimals = token.decimals().await?;
        let amount = parse_units(amount, decimals)?;
        token.transfer(to, amount).await
    }

    pub async fn buy_tickets(&self, value: U256) -> Result<TxHash> {
        self.ensure_ready()?;
        self.lottery.buy_tickets(value).await
    }

    pub async fn start_staking(&self) -> Result<TxHash> {
        self.ensure_ready()?;
        self.lottery.start_staking().await
    }

    pub async fn payout_and_restart(&self) -> Result<TxHash> {
        self.ensure_ready()?;
        self.lottery.payout_and_restart().await
    }

    pub async fn withdraw_fees(&self) -> Result<TxHash> {
        self.ensure_ready()?;
        self.lottery.withdraw_fees().await
    }

    pub async fn add_time(&self) -> Result<TxHash> {
        self.ensure_ready()?;
        self.lottery.add_time().await
    }

    pub fn explorer_link(&self, tx: &TxHash) -> String {
        self.config.explorer_link(tx)
    }
}
