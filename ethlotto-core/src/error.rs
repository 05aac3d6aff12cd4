use thiserror::Error;

pub type Result<T> = std::result::Result<T, LottoError>;

/// EIP-1193 "unauthorized": the provider has no account exposed to us.
pub const RPC_UNAUTHORIZED: i64 = 4100;
/// EIP-1193 "disconnected" from all chains.
pub const RPC_DISCONNECTED: i64 = 4900;
/// EIP-1193 "chain disconnected" from the requested chain.
pub const RPC_CHAIN_DISCONNECTED: i64 = 4901;
/// The wallet does not know the chain passed to `wallet_switchEthereumChain`.
pub const RPC_UNRECOGNIZED_CHAIN: i64 = 4902;

#[derive(Error, Debug)]
pub enum LottoError {
    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Remote rejected request: {message}")]
    RemoteRejected { code: Option<i64>, message: String },

    #[error("Not connected: {0}")]
    NotConnected(String),

    #[error("Wrong network: expected chain {expected}, provider is on {actual}")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Unknown token: {symbol}")]
    UnknownToken { symbol: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dialog error: {0}")]
    Dialog(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LottoError {
    pub fn remote_unavailable(msg: impl Into<String>) -> Self {
        Self::RemoteUnavailable(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::RemoteRejected {
            code: None,
            message: msg.into(),
        }
    }

    /// Classifies a JSON-RPC error object returned by the provider.
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            RPC_UNAUTHORIZED | RPC_DISCONNECTED | RPC_CHAIN_DISCONNECTED => {
                Self::NotConnected(format!("{} (code {})", message, code))
            }
            _ => Self::RemoteRejected {
                code: Some(code),
                message,
            },
        }
    }

    pub fn not_connected(msg: impl Into<String>) -> Self {
        Self::NotConnected(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn dialog(msg: impl Into<String>) -> Self {
        Self::Dialog(msg.into())
    }

    /// JSON-RPC error code, when the provider supplied one.
    pub fn rpc_code(&self) -> Option<i64> {
        match self {
            Self::RemoteRejected { code, .. } => *code,
            _ => None,
        }
    }

    /// Remote failures the synchronizer absorbs by keeping stale values.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::RemoteUnavailable(_) | Self::RemoteRejected { .. } | Self::NotConnected(_)
        )
    }
}

impl From<reqwest::Error> for LottoError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LottoError::rejected(format!("malformed response: {}", err))
        } else {
            LottoError::RemoteUnavailable(err.to_string())
        }
    }
}

// conversion from dialoguer::Error
impl From<dialoguer::Error> for LottoError {
    fn from(err: dialoguer::Error) -> Self {
        LottoError::Dialog(err.to_string())
    }
}
