//! JSON-RPC client for the node / wallet provider.
//!
//! The provider plays the role of the injected browser wallet: it answers chain
//! reads, exposes the user's accounts and signs `eth_sendTransaction` requests.

use crate::error::{LottoError, Result, RPC_UNRECOGNIZED_CHAIN};
use crate::types::{Address, TransactionRequest, TxHash, B256};
use crate::wallet::config::ChainConfig;
use alloy_primitives::{Bytes, U256};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Read-only chain access the synchronizer depends on.
#[async_trait]
pub trait ReadOnlyChainAccessor: Send + Sync {
    async fn get_balance(&self, address: Address) -> Result<U256>;

    async fn get_block_number(&self) -> Result<u64>;
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// A log entry as returned by `eth_getLogs`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<TxHash>,
}

pub struct EthProvider {
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl EthProvider {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LottoError::internal(format!("Failed to create http client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends one JSON-RPC call and deserializes its `result`.
    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        tracing::trace!(method, id, "rpc request");

        let response = self.client.post(&self.url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LottoError::remote_unavailable(format!(
                "{} returned HTTP {}",
                method, status
            )));
        }

        let response: RpcResponse = response.json().await?;
        if let Some(err) = response.error {
            return Err(LottoError::from_rpc(err.code, err.message));
        }

        let result = response.result.unwrap_or(Value::Null);
        serde_json::from_value(result)
            .map_err(|e| LottoError::rejected(format!("{} returned malformed result: {}", method, e)))
    }

    pub async fn chain_id(&self) -> Result<u64> {
        let raw: String = self.request("eth_chainId", json!([])).await?;
        parse_quantity_u64(&raw)
    }

    pub async fn block_number(&self) -> Result<u64> {
        let raw: String = self.request("eth_blockNumber", json!([])).await?;
        parse_quantity_u64(&raw)
    }

    pub async fn balance(&self, address: Address) -> Result<U256> {
        let raw: String = self
            .request("eth_getBalance", json!([address, "latest"]))
            .await?;
        parse_quantity(&raw)
    }

    /// `eth_call` against the latest block; returns the raw return data.
    pub async fn call(&self, to: Address, from: Option<Address>, data: Vec<u8>) -> Result<Bytes> {
        let mut tx = json!({
            "to": to,
            "data": Bytes::from(data),
        });
        if let Some(from) = from {
            tx["from"] = json!(from);
        }

        self.request("eth_call", json!([tx, "latest"])).await
    }

    /// Logs emitted by `address` with first topic `topic0` in the inclusive block range.
    pub async fn get_logs(
        &self,
        address: Address,
        topic0: B256,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>> {
        let filter = json!({
            "address": address,
            "topics": [topic0],
            "fromBlock": format!("0x{:x}", from_block),
            "toBlock": format!("0x{:x}", to_block),
        });
        self.request("eth_getLogs", json!([filter])).await
    }

    /// Accounts already exposed to us, without prompting.
    pub async fn accounts(&self) -> Result<Vec<Address>> {
        self.request("eth_accounts", json!([])).await
    }

    /// Asks the wallet to expose accounts; may prompt the user.
    pub async fn request_accounts(&self) -> Result<Vec<Address>> {
        self.request("eth_requestAccounts", json!([])).await
    }

    pub async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash> {
        self.request("eth_sendTransaction", json!([tx])).await
    }

    /// Switches the wallet to `chain`, registering it first when the wallet does not know it.
    pub async fn switch_chain(&self, chain: &ChainConfig) -> Result<()> {
        let params = json!([{ "chainId": chain.chain_id_hex() }]);

        match self
            .request::<Value>("wallet_switchEthereumChain", params.clone())
            .await
        {
            Ok(_) => return Ok(()),
            Err(e) if e.rpc_code() == Some(RPC_UNRECOGNIZED_CHAIN) => {
                tracing::info!(chain = %chain.chain_name, "Chain unknown to wallet, adding it");
                let add = json!([{
                    "chainId": chain.chain_id_hex(),
                    "chainName": chain.chain_name,
                    "rpcUrls": chain.rpc_urls,
                }]);
                if let Err(add_err) = self.request::<Value>("wallet_addEthereumChain", add).await {
                    tracing::warn!(error = %add_err, "wallet_addEthereumChain failed");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "wallet_switchEthereumChain failed");
            }
        }

        self.request::<Value>("wallet_switchEthereumChain", params)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl ReadOnlyChainAccessor for EthProvider {
    async fn get_balance(&self, address: Address) -> Result<U256> {
        self.balance(address).await
    }

    async fn get_block_number(&self) -> Result<u64> {
        self.block_number().await
    }
}

/// Parses a JSON-RPC hex quantity (`"0x1a"`).
pub fn parse_quantity(raw: &str) -> Result<U256> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| LottoError::rejected(format!("malformed quantity: {}", raw)))?;
    if digits.is_empty() || digits.len() > 64 {
        return Err(LottoError::rejected(format!("malformed quantity: {}", raw)));
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| LottoError::rejected(format!("malformed quantity {}: {:?}", raw, e)))
}

pub fn parse_quantity_u64(raw: &str) -> Result<u64> {
    u64::try_from(parse_quantity(raw)?)
        .map_err(|_| LottoError::rejected(format!("quantity {} exceeds u64", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn provider(server: &MockServer) -> EthProvider {
        EthProvider::new(server.url("/"), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x0").unwrap(), U256::ZERO);
        assert_eq!(parse_quantity_u64("0x1b4").unwrap(), 436);
        assert!(parse_quantity("12").is_err());
        assert!(parse_quantity("0x").is_err());
        assert!(parse_quantity_u64("0x10000000000000000").is_err());
    }

    #[tokio::test]
    async fn test_block_number_and_balance() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .json_body_partial(r#"{"method":"eth_blockNumber"}"#);
                then.status(200)
                    .json_body(json!({"jsonrpc":"2.0","id":1,"result":"0x10"}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .json_body_partial(r#"{"method":"eth_getBalance"}"#);
                then.status(200).json_body(
                    json!({"jsonrpc":"2.0","id":2,"result":"0x14d1120d7b160000"}),
                );
            })
            .await;

        let provider = provider(&server);
        assert_eq!(provider.get_block_number().await.unwrap(), 16);
        assert_eq!(
            provider.get_balance(Address::ZERO).await.unwrap(),
            U256::from(1_500_000_000_000_000_000u64)
        );
    }

    #[tokio::test]
    async fn test_rpc_error_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).json_body(json!({
                    "jsonrpc":"2.0","id":1,
                    "error":{"code":-32000,"message":"execution reverted"}
                }));
            })
            .await;

        let err = provider(&server)
            .call(Address::ZERO, None, vec![0u8; 4])
            .await
            .unwrap_err();
        assert_eq!(err.rpc_code(), Some(-32000));
    }

    #[tokio::test]
    async fn test_call_returns_raw_bytes() {
        let server = MockServer::start_async().await;
        let call = server
            .mock_async(|when, then| {
                when.method(POST)
                    .json_body_partial(r#"{"method":"eth_call","params":[{"data":"0x50d25bcd"}]}"#);
                then.status(200)
                    .json_body(json!({"jsonrpc":"2.0","id":1,"result":"0x0102"}));
            })
            .await;

        let data = provider(&server)
            .call(Address::ZERO, None, vec![0x50, 0xd2, 0x5b, 0xcd])
            .await
            .unwrap();
        assert_eq!(data.as_ref(), &[1u8, 2]);
        call.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_logs() {
        let server = MockServer::start_async().await;
        let topic = B256::repeat_byte(0x11);
        server
            .mock_async(|when, then| {
                when.method(POST).json_body_partial(
                    r#"{"method":"eth_getLogs","params":[{"fromBlock":"0x11","toBlock":"0x12"}]}"#,
                );
                then.status(200).json_body(json!({
                    "jsonrpc":"2.0","id":1,
                    "result":[{
                        "address":"0x00000000000000000000000000000000000000cc",
                        "topics":[topic],
                        "data":"0x",
                        "blockNumber":"0x12"
                    }]
                }));
            })
            .await;

        let logs = provider(&server)
            .get_logs(Address::repeat_byte(0xcc), topic, 0x11, 0x12)
            .await
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].topics, vec![topic]);
        assert!(logs[0].data.is_empty());
    }

    #[tokio::test]
    async fn test_http_failure_is_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(503);
            })
            .await;

        let err = provider(&server).block_number().await.unwrap_err();
        assert!(matches!(err, LottoError::RemoteUnavailable(_)));
    }

    #[tokio::test]
    async fn test_unauthorized_is_not_connected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).json_body(json!({
                    "jsonrpc":"2.0","id":1,
                    "error":{"code":4100,"message":"unauthorized"}
                }));
            })
            .await;

        let err = provider(&server).request_accounts().await.unwrap_err();
        assert!(matches!(err, LottoError::NotConnected(_)));
    }

    #[tokio::test]
    async fn test_switch_chain_adds_unknown_chain() {
        let server = MockServer::start_async().await;
        let switch = server
            .mock_async(|when, then| {
                when.method(POST)
                    .json_body_partial(r#"{"method":"wallet_switchEthereumChain"}"#);
                then.status(200).json_body(json!({
                    "jsonrpc":"2.0","id":1,
                    "error":{"code":4902,"message":"Unrecognized chain ID"}
                }));
            })
            .await;
        let add = server
            .mock_async(|when, then| {
                when.method(POST)
                    .json_body_partial(r#"{"method":"wallet_addEthereumChain"}"#);
                then.status(200)
                    .json_body(json!({"jsonrpc":"2.0","id":2,"result":null}));
            })
            .await;

        let result = provider(&server).switch_chain(&ChainConfig::default()).await;
        assert!(result.is_err());
        assert_eq!(switch.hits_async().await, 2);
        assert_eq!(add.hits_async().await, 1);
    }
}
