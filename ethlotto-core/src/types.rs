use crate::error::{LottoError, Result};
use alloy_primitives::{Bytes, U256};
use serde::{Deserialize, Serialize};

pub use alloy_primitives::{Address, B256};

/// Hash returned by `eth_sendTransaction`.
pub type TxHash = B256;

/// Parses a user-supplied `0x` address.
pub fn parse_address(input: &str) -> Result<Address> {
    let trimmed = input.trim();
    if !trimmed.starts_with("0x") && !trimmed.starts_with("0X") {
        return Err(LottoError::InvalidAddress(format!("missing 0x prefix: {}", input)));
    }
    trimmed
        .parse()
        .map_err(|e| LottoError::InvalidAddress(format!("{}: {}", input, e)))
}

/// Result of the previous draw, as reported by `lastWinner()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastWinner {
    pub account: Address,
    pub pot: U256,
    pub ticket: U256,
}

/// Per-account lottery information, refreshed on connect and account change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountStatus {
    pub account: Address,
    pub ether_balance: U256,
    pub staking_enabled: bool,
    pub available_rewards: U256,
    pub accumulated: U256,
    pub last_winner: LastWinner,
}

/// A transaction the wallet provider signs and broadcasts for us.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
}
