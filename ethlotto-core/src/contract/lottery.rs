use super::{view, ContractHandle, ReadOnlyContract};
use crate::error::{LottoError, Result};
use crate::types::{Address, LastWinner, TxHash};
use alloy_primitives::U256;
use alloy_sol_types::sol;
use std::sync::Arc;

sol! {
    interface ILotto {
        function accumulatedEth(address account) external view returns (uint256);
        function allTimeWinnings() external view returns (uint256);
        function isStaking() external view returns (bool);
        function endingBlock() external view returns (uint256);
        function availableEth() external view returns (uint256);
        function lastWinner() external view returns (address account, uint256 pot, uint256 ticket);

        function buyTickets() external payable;
        function startStaking() external;
        function payoutAndRestart() external;
        function withdrawFees() external;
        function addTime() external;

        event Payout(address account, uint256 winnings, uint256 ticket);
    }
}

/// Typed binding for the lottery contract.
///
/// Reads go through any [`ReadOnlyContract`]; writes need the concrete
/// [`ContractHandle`] with a signer.
pub struct LotteryContract {
    reader: Arc<dyn ReadOnlyContract>,
    writer: Option<ContractHandle>,
}

impl LotteryContract {
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

    pub fn reader(&self) -> Arc<dyn ReadOnlyContract> {
        self.reader.clone()
    }

    pub async fn accumulated_eth(&self, account: Address) -> Result<U256> {
        let ret = view(self.reader.as_ref(), ILotto::accumulatedEthCall { account }).await?;
        Ok(ret._0)
    }

    pub async fn all_time_winnings(&self) -> Result<U256> {
        Ok(view(self.reader.as_ref(), ILotto::allTimeWinningsCall {}).await?._0)
    }

    pub async fn is_staking(&self) -> Result<bool> {
        Ok(view(self.reader.as_ref(), ILotto::isStakingCall {}).await?._0)
    }

    pub async fn ending_block(&self) -> Result<u64> {
        let end = view(self.reader.as_ref(), ILotto::endingBlockCall {}).await?._0;
        u64::try_from(end)
            .map_err(|_| LottoError::rejected(format!("ending block {} exceeds u64", end)))
    }

    pub async fn available_eth(&self) -> Result<U256> {
        Ok(view(self.reader.as_ref(), ILotto::availableEthCall {}).await?._0)
    }

    pub async fn last_winner(&self) -> Result<LastWinner> {
        let ret = view(self.reader.as_ref(), ILotto::lastWinnerCall {}).await?;
        Ok(LastWinner {
            account: ret.account,
            pot: ret.pot,
            ticket: ret.ticket,
        })
    }

    fn writer(&self) -> Result<&ContractHandle> {
        self.writer
            .as_ref()
            .ok_or_else(|| LottoError::not_connected("lottery contract is read-only"))
    }

    /// Buys tickets worth `value` wei.
    pub async fn buy_tickets(&self, value: U256) -> Result<TxHash> {
        if value.is_zero() {
            return Err(LottoError::invalid_amount("ticket amount must be greater than 0"));
        }
        self.writer()?
            .send(ILotto::buyTicketsCall {}, Some(value))
            .await
    }

    pub async fn start_staking(&self) -> Result<TxHash> {
        self.writer()?.send(ILotto::startStakingCall {}, None).await
    }

    pub async fn payout_and_restart(&self) -> Result<TxHash> {
        self.writer()?.send(ILotto::payoutAndRestartCall {}, None).await
    }

    pub async fn withdraw_fees(&self) -> Result<TxHash> {
        self.writer()?.send(ILotto::withdrawFeesCall {}, None).await
    }

    pub async fn add_time(&self) -> Result<TxHash> {
        self.writer()?.send(ILotto::addTimeCall {}, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::testing::StubContract;
    use alloy_sol_types::{SolCall, SolValue};

    fn lottery(stub: Arc<StubContract>) -> LotteryContract {
        LotteryContract::read_only(stub)
    }

    #[test]
    fn test_lottery_signatures() {
        use alloy_sol_types::SolEvent;

        assert_eq!(ILotto::allTimeWinningsCall::SIGNATURE, "allTimeWinnings()");
        assert_eq!(ILotto::accumulatedEthCall::SIGNATURE, "accumulatedEth(address)");
        assert_eq!(ILotto::Payout::SIGNATURE, "Payout(address,uint256,uint256)");
        assert_eq!(
            ILotto::Payout::SIGNATURE_HASH,
            alloy_primitives::keccak256("Payout(address,uint256,uint256)")
        );
    }

    #[tokio::test]
    async fn test_last_winner_decodes_tuple() {
        let stub = Arc::new(StubContract::default());
        let winner: Address = "0x00000000000000000000000000000000000000bb".parse().unwrap();
        stub.respond(
            ILotto::lastWinnerCall::SELECTOR,
            (winner, U256::from(5u64), U256::from(9u64)).abi_encode_params(),
        );

        let last = lottery(stub).last_winner().await.unwrap();
        assert_eq!(last.account, winner);
        assert_eq!(last.pot, U256::from(5u64));
        assert_eq!(last.ticket, U256::from(9u64));
    }

    #[tokio::test]
    async fn test_ending_block_rejects_malformed_data() {
        let stub = Arc::new(StubContract::default());
        stub.respond(ILotto::endingBlockCall::SELECTOR, vec![0u8; 4]);

        let err = lottery(stub).ending_block().await.unwrap_err();
        assert!(matches!(err, LottoError::RemoteRejected { .. }));
    }

    #[tokio::test]
    async fn test_ending_block_rejects_oversized_value() {
        let stub = Arc::new(StubContract::default());
        stub.respond(ILotto::endingBlockCall::SELECTOR, U256::MAX.abi_encode());

        let err = lottery(stub).ending_block().await.unwrap_err();
        assert!(matches!(err, LottoError::RemoteRejected { .. }));
    }

    #[tokio::test]
    async fn test_writes_need_signer() {
        let stub = Arc::new(StubContract::default());
        let err = lottery(stub).start_staking().await.unwrap_err();
        assert!(matches!(err, LottoError::NotConnected(_)));
    }

    #[tokio::test]
    async fn test_buy_tickets_rejects_zero() {
        let stub = Arc::new(StubContract::default());
        let err = lottery(stub).buy_tickets(U256::ZERO).await.unwrap_err();
        assert!(matches!(err, LottoError::InvalidAmount(_)));
    }
}
