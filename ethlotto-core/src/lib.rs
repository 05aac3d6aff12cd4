//! ethlotto - client library for an on-chain Ether lottery
//!
//! Talks to an EIP-1193 style JSON-RPC wallet provider, wraps the lottery,
//! price-feed and ERC-20 contracts, and keeps a periodically refreshed,
//! display-ready view of the lottery's public state.

pub mod contract;
pub mod error;
pub mod format;
pub mod rpc;
pub mod sync;
pub mod types;
pub mod wallet;

pub use error::{LottoError, Result};
pub use rpc::{EthProvider, ReadOnlyChainAccessor};
pub use sync::{ChainSnapshot, ChainStateSynchronizer, DerivedView, SyncState};
pub use types::{parse_address, AccountStatus, Address, TxHash};
pub use wallet::{ClientContext, ConnectionStatus, LottoConfig, SessionManager, WalletEvent};

pub use alloy_primitives::U256;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{AlwaysFocused, ChannelObserver};
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_session_manager_from_saved_config() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        LottoConfig::default().save(&path).await.unwrap();

        let config = LottoConfig::load(&path).await.unwrap();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let manager =
            SessionManager::new(config, Arc::new(AlwaysFocused), Arc::new(ChannelObserver(tx)))
                .unwrap();

        assert_eq!(manager.status(), ConnectionStatus::NotConnected);
        assert!(manager.synchronizer().is_none());
    }
}
