//! Watches the lottery for `Payout` logs.
//!
//! A payout resets the pot and moves the ending block, so every observed log
//! cuts the synchronizer's current wait short.

use super::{ChainStateSynchronizer, FocusState};
use crate::contract::lottery::ILotto;
use crate::error::Result;
use crate::rpc::{EthProvider, Log};
use crate::types::Address;
use alloy_primitives::U256;
use alloy_sol_types::SolEvent;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Log polling cadence, matching the usual wallet-library filter interval.
pub const DEFAULT_LOG_POLL_INTERVAL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payout {
    pub account: Address,
    pub winnings: U256,
    pub ticket: U256,
}

pub struct PayoutWatcher {
    provider: Arc<EthProvider>,
    lottery: Address,
    interval: Duration,
    focus: Arc<dyn FocusState>,
    synchronizer: Arc<ChainStateSynchronizer>,
    last_block: Mutex<Option<u64>>,
}

impl PayoutWatcher {
    pub fn new(
        provider: Arc<EthProvider>,
        lottery: Address,
        interval: Duration,
        focus: Arc<dyn FocusState>,
        synchronizer: Arc<ChainStateSynchronizer>,
    ) -> Self {
        Self {
            provider,
            lottery,
            interval,
            focus,
            synchronizer,
            last_block: Mutex::new(None),
        }
    }

    /// Fetches payouts mined since the previous check.
    ///
    /// The first check only records the current block, so payouts from before
    /// the session started are never reported.
    pub async fn check(&self) -> Result<Vec<Payout>> {
        let current = self.provider.block_number().await?;
        let last = *self.last_block.lock();

        let from = match last {
            None => {
                *self.last_block.lock() = Some(current);
                return Ok(Vec::new());
            }
            Some(last) if current <= last => return Ok(Vec::new()),
            Some(last) => last + 1,
        };

        let logs = self
            .provider
            .get_logs(self.lottery, ILotto::Payout::SIGNATURE_HASH, from, current)
            .await?;
        *self.last_block.lock() = Some(current);

        Ok(logs.iter().filter_map(decode_payout).collect())
    }

    /// One check; any payout triggers an immediate synchronizer cycle.
    pub async fn tick(&self) -> usize {
        match self.check().await {
            Ok(payouts) => {
                for payout in &payouts {
                    tracing::info!(
                        account = %payout.account,
                        winnings = %payout.winnings,
                        ticket = %payout.ticket,
                        "Payout observed"
                    );
                }
                if !payouts.is_empty() {
                    self.synchronizer.refresh_now();
                }
                payouts.len()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Payout log check failed");
                0
            }
        }
    }

    pub async fn run(self: Arc<Self>) {
        loop {
            if !self.focus.is_focused() {
                self.focus.focused().await;
            }
            self.tick().await;
            tokio::time::sleep(self.interval).await;
        }
    }

    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(this.run())
    }
}

fn decode_payout(log: &Log) -> Option<Payout> {
    match ILotto::Payout::decode_raw_log(log.topics.iter().copied(), &log.data, true) {
        Ok(event) => Some(Payout {
            account: event.account,
            winnings: event.winnings,
            ticket: event.ticket,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "Skipping malformed Payout log");
            None
        }
    }
}
