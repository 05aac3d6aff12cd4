use super::{view, ReadOnlyContract};
use crate::error::{LottoError, Result};
use alloy_sol_types::sol;
use std::sync::Arc;

sol! {
    interface IPriceFeed {
        function latestAnswer() external view returns (int256);
    }
}

/// Chainlink-style aggregator quoting ETH in USD with 8 decimals.
pub struct PriceFeed {
    reader: Arc<dyn ReadOnlyContract>,
}

impl PriceFeed {
    pub fn new(reader: Arc<dyn ReadOnlyContract>) -> Self {
        Self { reader }
    }

    pub fn reader(&self) -> Arc<dyn ReadOnlyContract> {
        self.reader.clone()
    }

    /// Latest rate numerator; a negative answer is treated as malformed.
    pub async fn latest_answer(&self) -> Result<u128> {
        latest_answer(self.reader.as_ref()).await
    }
}

pub(crate) async fn latest_answer(reader: &dyn ReadOnlyContract) -> Result<u128> {
    let answer = view(reader, IPriceFeed::latestAnswerCall {}).await?._0;
    if answer.is_negative() {
        return Err(LottoError::rejected(format!(
            "price feed returned negative answer {}",
            answer
        )));
    }
    u128::try_from(answer.into_raw())
        .map_err(|_| LottoError::rejected(format!("price feed answer {} exceeds u128", answer)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::testing::StubContract;
    use alloy_primitives::{I256, U256};
    use alloy_sol_types::{SolCall, SolValue};

    #[test]
    fn test_latest_answer_selector() {
        assert_eq!(IPriceFeed::latestAnswerCall::SELECTOR, [0x50, 0xd2, 0x5b, 0xcd]);
    }

    #[tokio::test]
    async fn test_negative_answer_is_rejected() {
        let stub = Arc::new(StubContract::default());
        stub.respond(
            IPriceFeed::latestAnswerCall::SELECTOR,
            I256::MINUS_ONE.abi_encode(),
        );

        let err = PriceFeed::new(stub).latest_answer().await.unwrap_err();
        assert!(matches!(err, LottoError::RemoteRejected { .. }));
    }

    #[tokio::test]
    async fn test_latest_answer() {
        let stub = Arc::new(StubContract::default());
        let answer = I256::from_raw(U256::from(150_000_000_000u64));
        stub.respond(IPriceFeed::latestAnswerCall::SELECTOR, answer.abi_encode());

        assert_eq!(
            PriceFeed::new(stub).latest_answer().await.unwrap(),
            150_000_000_000
        );
    }
}
