pub mod config;
pub mod instance;
pub mod manager;

pub use config::{ChainConfig, LottoConfig};
pub use instance::{ClientContext, ConnectionStatus, TokenBalance};
pub use manager::{SessionManager, WalletEvent};
