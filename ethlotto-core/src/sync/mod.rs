//! Client-side chain-state synchronization.
//!
//! A fixed-cadence loop reads the lottery's public state, merges it over the
//! last known snapshot and hands a freshly derived view to the presentation
//! layer. Reads that fail keep their previous value; nothing is retried until
//! the next scheduled cycle.

pub mod focus;
pub mod payout;
pub mod view;

pub use focus::{AlwaysFocused, Focus, FocusState};
pub use payout::{Payout, PayoutWatcher, DEFAULT_LOG_POLL_INTERVAL};
pub use view::{derive, ChainSnapshot, DerivedView, FormatPolicy, SuggestedAction, TIME_PASSED};

use crate::contract::price_feed::latest_answer;
use crate::contract::{LotteryContract, ReadOnlyContract};
use crate::error::{LottoError, Result};
use crate::rpc::ReadOnlyChainAccessor;
use chrono::Utc;
use futures::FutureExt;
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(12_570);

/// Receives a view after every completed poll cycle.
pub trait SnapshotObserver: Send + Sync {
    fn on_snapshot_updated(&self, view: &DerivedView);
}

impl<F> SnapshotObserver for F
where
    F: Fn(&DerivedView) + Send + Sync,
{
    fn on_snapshot_updated(&self, view: &DerivedView) {
        self(view)
    }
}

/// Forwards views into a channel; a closed receiver is ignored.
pub struct ChannelObserver(pub mpsc::UnboundedSender<DerivedView>);

impl SnapshotObserver for ChannelObserver {
    fn on_snapshot_updated(&self, view: &DerivedView) {
        if self.0.send(view.clone()).is_err() {
            tracing::debug!("View receiver dropped");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncState {
    /// A poll is in flight or scheduled.
    Syncing,
    /// Consumer is not focused; no cycle is scheduled.
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SnapshotField {
    PotBalance,
    AllTimeWinnings,
    EndingBlock,
    CurrentBlock,
    PriceRate,
}

impl fmt::Display for SnapshotField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SnapshotField::PotBalance => "pot balance",
            SnapshotField::AllTimeWinnings => "all-time winnings",
            SnapshotField::EndingBlock => "ending block",
            SnapshotField::CurrentBlock => "current block",
            SnapshotField::PriceRate => "price rate",
        };
        f.write_str(name)
    }
}

/// Outcome of one poll cycle.
#[derive(Debug, Clone)]
pub struct PollReport {
    pub snapshot: Arc<ChainSnapshot>,
    pub view: DerivedView,
    /// Fields whose read failed this cycle and kept their previous value.
    pub failed: Vec<SnapshotField>,
}

/// Remote handles the synchronizer reads from; built by the client context.
#[derive(Clone)]
pub struct SyncContext {
    pub chain: Arc<dyn ReadOnlyChainAccessor>,
    pub lottery: Arc<dyn ReadOnlyContract>,
    pub price_feed: Arc<dyn ReadOnlyContract>,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub poll_interval: Duration,
    pub policy: FormatPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            policy: FormatPolicy::default(),
        }
    }
}

pub struct ChainStateSynchronizer {
    chain: Arc<dyn ReadOnlyChainAccessor>,
    lottery: LotteryContract,
    price_feed: Arc<dyn ReadOnlyContract>,
    config: SyncConfig,
    focus: Arc<dyn FocusState>,
    observer: Arc<dyn SnapshotObserver>,
    snapshot: RwLock<Arc<ChainSnapshot>>,
    state: RwLock<SyncState>,
    wake: Notify,
}

impl ChainStateSynchronizer {
    pub fn new(
        context: SyncContext,
        config: SyncConfig,
        focus: Arc<dyn FocusState>,
        observer: Arc<dyn SnapshotObserver>,
    ) -> Self {
        let state = if focus.is_focused() {
            SyncState::Syncing
        } else {
            SyncState::Paused
        };

        Self {
            chain: context.chain,
            lottery: LotteryContract::read_only(context.lottery),
            price_feed: context.price_feed,
            config,
            focus,
            observer,
            snapshot: RwLock::new(Arc::new(ChainSnapshot::default())),
            state: RwLock::new(state),
            wake: Notify::new(),
        }
    }

    pub fn state(&self) -> SyncState {
        *self.state.read()
    }

    /// The latest merged snapshot.
    pub fn snapshot(&self) -> Arc<ChainSnapshot> {
        self.snapshot.read().clone()
    }

    /// View of the latest snapshot.
    pub fn view(&self) -> DerivedView {
        derive(&self.snapshot(), &self.config.policy)
    }

    /// Cuts the current wait short so the next cycle starts now.
    ///
    /// Ignored while paused; regaining focus already starts a cycle.
    pub fn refresh_now(&self) {
        if self.state() == SyncState::Syncing {
            self.wake.notify_one();
        }
    }

    fn set_state(&self, next: SyncState) {
        let mut state = self.state.write();
        if *state != next {
            tracing::info!(from = ?*state, to = ?next, "Synchronizer state changed");
            *state = next;
        }
    }

    /// Runs one cycle: five concurrent reads, merge, derive, emit.
    pub async fn poll(&self) -> PollReport {
        let lottery_address = self.lottery.address();

        let (pot, won, end, block, rate) = tokio::join!(
            self.chain.get_balance(lottery_address),
            self.lottery.all_time_winnings(),
            self.lottery.ending_block(),
            self.chain.get_block_number(),
            latest_answer(self.price_feed.as_ref()),
        );

        let previous = self.snapshot();
        let mut failed = Vec::new();

        let next = ChainSnapshot {
            pot_balance: keep(pot, previous.pot_balance, SnapshotField::PotBalance, &mut failed),
            all_time_winnings: keep(
                won,
                previous.all_time_winnings,
                SnapshotField::AllTimeWinnings,
                &mut failed,
            ),
            ending_block: keep(end, previous.ending_block, SnapshotField::EndingBlock, &mut failed),
            current_block: keep(
                block,
                previous.current_block,
                SnapshotField::CurrentBlock,
                &mut failed,
            ),
            price_rate_numerator: keep(
                rate,
                previous.price_rate_numerator,
                SnapshotField::PriceRate,
                &mut failed,
            ),
            fetched_at: Some(Utc::now()),
        };

        let next = Arc::new(next);
        *self.snapshot.write() = next.clone();

        let view = derive(&next, &self.config.policy);
        tracing::debug!(
            pot = ?view.pot_display,
            blocks_left = ?view.blocks_left,
            failed = failed.len(),
            "Poll cycle complete"
        );
        self.observer.on_snapshot_updated(&view);

        PollReport {
            snapshot: next,
            view,
            failed,
        }
    }

    /// Polls for the lifetime of the session, pausing whenever focus is lost.
    pub async fn run(self: Arc<Self>) {
        tracing::info!(
            interval_ms = self.config.poll_interval.as_millis() as u64,
            "Starting chain-state synchronizer"
        );

        loop {
            if !self.focus.is_focused() {
                self.set_state(SyncState::Paused);
                self.focus.focused().await;
                // drop a refresh requested just before the pause
                let _ = self.wake.notified().now_or_never();
            }
            self.set_state(SyncState::Syncing);

            self.poll().await;

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = self.wake.notified() => {
                    tracing::debug!("Immediate refresh requested");
                }
            }
        }
    }

    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(this.run())
    }
}

fn keep<T: Copy>(
    read: Result<T>,
    previous: Option<T>,
    field: SnapshotField,
    failed: &mut Vec<SnapshotField>,
) -> Option<T> {
    match read {
        Ok(value) => Some(value),
        Err(e) => {
            log_read_failure(field, &e);
            failed.push(field);
            previous
        }
    }
}

fn log_read_failure(field: SnapshotField, err: &LottoError) {
    tracing::warn!(field = %field, error = %err, "Read failed, keeping last known value");
}
