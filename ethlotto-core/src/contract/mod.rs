pub mod erc20;
pub mod lottery;
pub mod price_feed;

pub use erc20::Erc20Token;
pub use lottery::LotteryContract;
pub use price_feed::PriceFeed;

use crate::error::{LottoError, Result};
use crate::rpc::EthProvider;
use crate::types::{Address, TransactionRequest, TxHash};
use alloy_primitives::{Bytes, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use std::sync::Arc;

/// View-method access to a deployed contract.
#[async_trait]
pub trait ReadOnlyContract: Send + Sync {
    fn address(&self) -> Address;

    /// `eth_call` with ABI-encoded calldata; returns the raw return data.
    async fn call_raw(&self, calldata: Vec<u8>) -> Result<Bytes>;
}

/// Calls a view method and decodes its return values.
pub(crate) async fn view<C: SolCall>(contract: &dyn ReadOnlyContract, call: C) -> Result<C::Return> {
    let output = contract.call_raw(call.abi_encode()).await?;
    C::abi_decode_returns(&output, true).map_err(|e| {
        LottoError::rejected(format!("{} returned malformed data: {}", C::SIGNATURE, e))
    })
}

/// A contract bound to a provider and, once connected, to the sending account.
#[derive(Clone)]
pub struct ContractHandle {
    address: Address,
    provider: Arc<EthProvider>,
    from: Option<Address>,
}

impl ContractHandle {
    /// Read-only handle; calls are made anonymously.
    pub fn new(address: Address, provider: Arc<EthProvider>) -> Self {
        Self {
            address,
            provider,
            from: None,
        }
    }

    /// Read-write handle; views see `msg.sender == account` and writes are sent from it.
    pub fn with_signer(address: Address, provider: Arc<EthProvider>, account: Address) -> Self {
        Self {
            address,
            provider,
            from: Some(account),
        }
    }

    pub fn signer(&self) -> Option<Address> {
        self.from
    }

    /// Asks the wallet to sign and broadcast `call`.
    pub async fn send<C: SolCall>(&self, call: C, value: Option<U256>) -> Result<TxHash> {
        let from = self.from.ok_or_else(|| {
            LottoError::not_connected(format!("{} needs a connected account", C::SIGNATURE))
        })?;

        let tx = TransactionRequest {
            from,
            to: self.address,
            value,
            data: Some(call.abi_encode().into()),
        };

        let hash = self.provider.send_transaction(&tx).await?;
        tracing::info!(
            contract = %self.address,
            method = C::SIGNATURE,
            tx = %hash,
            "Transaction submitted"
        );
        Ok(hash)
    }
}

#[async_trait]
impl ReadOnlyContract for ContractHandle {
    fn address(&self) -> Address {
        self.address
    }

    async fn call_raw(&self, calldata: Vec<u8>) -> Result<Bytes> {
        self.provider.call(self.address, self.from, calldata).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory contract used by binding and synchronizer tests.

    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    type Selector = [u8; 4];

    #[derive(Default)]
    pub struct StubContract {
        pub address: Address,
        responses: Mutex<HashMap<Selector, Result<Vec<u8>>>>,
        pub calls: Mutex<Vec<Selector>>,
    }

    impl StubContract {
        /// Answers calls to `selector` with ABI-encoded `data`.
        pub fn respond(&self, selector: Selector, data: Vec<u8>) {
            self.responses.lock().insert(selector, Ok(data));
        }

        pub fn fail(&self, selector: Selector, err: LottoError) {
            self.responses.lock().insert(selector, Err(err));
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    fn replay(result: &Result<Vec<u8>>) -> Result<Bytes> {
        match result {
            Ok(data) => Ok(Bytes::from(data.clone())),
            Err(LottoError::RemoteUnavailable(m)) => Err(LottoError::RemoteUnavailable(m.clone())),
            Err(LottoError::NotConnected(m)) => Err(LottoError::NotConnected(m.clone())),
            Err(e) => Err(LottoError::rejected(e.to_string())),
        }
    }

    #[async_trait]
    impl ReadOnlyContract for StubContract {
        fn address(&self) -> Address {
            self.address
        }

        async fn call_raw(&self, calldata: Vec<u8>) -> Result<Bytes> {
            let mut selector = [0u8; 4];
            selector.copy_from_slice(&calldata[..4]);
            self.calls.lock().push(selector);

            match self.responses.lock().get(&selector) {
                Some(result) => replay(result),
                None => Err(LottoError::rejected(format!(
                    "no stub for 0x{}",
                    alloy_primitives::hex::encode(selector)
                ))),
            }
        }
    }
}
