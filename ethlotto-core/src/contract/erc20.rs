use super::{view, ContractHandle, ReadOnlyContract};
use crate::error::{LottoError, Result};
use crate::format::MAX_DECIMALS;
use crate::types::{Address, TxHash};
use alloy_primitives::U256;
use alloy_sol_types::sol;
use std::sync::Arc;

sol! {
    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

pub struct Erc20Token {
    reader: Arc<dyn ReadOnlyContract>,
    writer: Option<ContractHandle>,
}

impl Erc20Token {
    pub fn new(handle: ContractHandle) -> Self {
        Self {
            reader: Arc::new(handle.clone()),
            writer: Some(handle),
        }
    }

    pub fn read_only(reader: Arc<dyn ReadOnlyContract>) -> Self {
        Self {
            reader,
            writer: None,
        }
    }

    pub fn address(&self) -> Address {
        self.reader.address()
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256> {
        Ok(view(self.reader.as_ref(), IERC20::balanceOfCall { owner }).await?._0)
    }

    /// Token decimals; values that cannot be rendered are treated as malformed.
    pub async fn decimals(&self) -> Result<u32> {
        let decimals = u32::from(view(self.reader.as_ref(), IERC20::decimalsCall {}).await?._0);
        if decimals > MAX_DECIMALS {
            return Err(LottoError::rejected(format!(
                "token {} reports {} decimals, at most {} supported",
                self.address(),
                decimals,
                MAX_DECIMALS
            )));
        }
        Ok(decimals)
    }

    pub async fn symbol(&self) -> Result<String> {
        Ok(view(self.reader.as_ref(), IERC20::symbolCall {}).await?._0)
    }

    /// Transfers `amount` base units from the connected account.
    pub async fn transfer(&self, to: Address, amount: U256) -> Result<TxHash> {
        self.writer
            .as_ref()
            .ok_or_else(|| LottoError::not_connected("token contract is read-only"))?
            .send(IERC20::transferCall { to, amount }, None)
            .await
    }
}
