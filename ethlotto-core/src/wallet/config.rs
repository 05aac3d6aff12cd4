use crate::error::{LottoError, Result};
use crate::sync::{FormatPolicy, SyncConfig, DEFAULT_POLL_INTERVAL};
use crate::types::{Address, TxHash};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const GOERLI_LOTTERY: &str = "0x1F85e6C45B59217073e43E703EA4116f0c4f1320";
const GOERLI_ETH_USD_FEED: &str = "0xD4a33860578De61DBAbDc8BFdb98FD742fA7028e";

/// The chain the lottery is deployed on, as passed to `wallet_addEthereumChain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
}

impl ChainConfig {
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: 5,
            chain_name: "Goerli Test Network".to_string(),
            rpc_urls: vec!["https://goerli.infura.io/v3/".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LottoConfig {
    /// JSON-RPC endpoint of the wallet provider / node.
    pub provider_url: String,
    pub chain: ChainConfig,
    pub lottery_address: Address,
    pub price_feed_address: Address,
    /// ERC-20 tokens offered for balance and transfer, keyed by symbol.
    pub tokens: BTreeMap<String, Address>,
    /// Prefix a transaction hash is appended to for a block-explorer link.
    pub explorer_tx_url: String,
    pub poll_interval: Duration,
    pub average_block_time: Duration,
    pub request_timeout: Duration,
}

impl Default for LottoConfig {
    fn default() -> Self {
        Self {
            provider_url: "http://localhost:8545".to_string(),
            chain: ChainConfig::default(),
            lottery_address: parse_const(GOERLI_LOTTERY),
            price_feed_address: parse_const(GOERLI_ETH_USD_FEED),
            tokens: BTreeMap::new(),
            explorer_tx_url: "https://goerli.etherscan.io/tx/".to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            average_block_time: FormatPolicy::default().average_block_time,
            request_timeout: Duration::from_secs(10),
        }
    }
}

fn parse_const(addr: &str) -> Address {
    Address::from_str(addr).unwrap_or_default()
}

impl LottoConfig {
    /// Reads `path` if it exists, otherwise returns the defaults.
    pub async fn load(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path).await? {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: LottoConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.provider_url.is_empty() {
            return Err(LottoError::config("Provider URL cannot be empty"));
        }

        if !self.provider_url.starts_with("http://") && !self.provider_url.starts_with("https://") {
            return Err(LottoError::config(format!(
                "Provider URL must be http(s): {}",
                self.provider_url
            )));
        }

        if self.chain.chain_id == 0 {
            return Err(LottoError::config("Chain ID must be greater than 0"));
        }

        if self.lottery_address.is_zero() {
            return Err(LottoError::config("Lottery address cannot be the zero address"));
        }

        if self.poll_interval < Duration::from_secs(1) {
            return Err(LottoError::config("Poll interval must be at least 1 second"));
        }

        if self.average_block_time.is_zero() {
            return Err(LottoError::config("Average block time must be greater than 0"));
        }

        if self.request_timeout.is_zero() {
            return Err(LottoError::config("Request timeout must be greater than 0"));
        }

        Ok(())
    }

    pub fn token_address(&self, symbol: &str) -> Result<Address> {
        self.tokens
            .get(&symbol.to_uppercase())
            .copied()
            .ok_or_else(|| LottoError::UnknownToken {
                symbol: symbol.to_string(),
            })
    }

    pub fn explorer_link(&self, tx: &TxHash) -> String {
        format!("{}{}", self.explorer_tx_url, tx)
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            poll_interval: self.poll_interval,
            policy: FormatPolicy {
                average_block_time: self.average_block_time,
                ..FormatPolicy::default()
            },
        }
    }
}
