use crate::format::{format_ether, format_ether_rounded, format_usd, seconds_to_hms};
use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

pub const TIME_PASSED: &str = "time passed";

/// Last known chain values. A field is `None` until it has been fetched once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChainSnapshot {
    pub pot_balance: Option<U256>,
    pub all_time_winnings: Option<U256>,
    pub ending_block: Option<u64>,
    pub current_block: Option<u64>,
    pub price_rate_numerator: Option<u128>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl ChainSnapshot {
    /// `ending_block - current_block`, once both are known.
    pub fn blocks_left(&self) -> Option<i128> {
        match (self.ending_block, self.current_block) {
            (Some(end), Some(current)) => Some(end as i128 - current as i128),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.pot_balance.is_some()
            && self.all_time_winnings.is_some()
            && self.ending_block.is_some()
            && self.current_block.is_some()
            && self.price_rate_numerator.is_some()
    }
}

/// What the user can usefully do next, given the lottery's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SuggestedAction {
    BuyTickets,
    /// Round ended with a pot worth paying out.
    Payout,
    /// Round ended with (almost) nothing in the pot; extend it instead.
    AddTime,
}

/// Fixed formatting constants applied to every snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatPolicy {
    pub average_block_time: Duration,
    pub all_time_places: u32,
    /// Pots below this many wei are not worth a payout.
    pub payout_threshold_wei: u64,
}

impl Default for FormatPolicy {
    fn default() -> Self {
        Self {
            average_block_time: Duration::from_millis(12_060),
            all_time_places: 4,
            payout_threshold_wei: 1000,
        }
    }
}

impl FormatPolicy {
    /// Whole seconds for `blocks` blocks at the average block time.
    pub fn seconds_for_blocks(&self, blocks: u128) -> u64 {
        let millis = blocks.saturating_mul(self.average_block_time.as_millis());
        u64::try_from(millis / 1000).unwrap_or(u64::MAX)
    }
}

/// Human-readable values for the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DerivedView {
    pub pot_display: Option<String>,
    pub usd_pot_display: Option<String>,
    pub time_left_display: Option<String>,
    pub all_time_display: Option<String>,
    pub usd_all_time_display: Option<String>,
    pub blocks_left: Option<i64>,
    pub lottery_ended: Option<bool>,
    pub suggested_action: Option<SuggestedAction>,
}

/// Computes the view for `snapshot`. Pure: equal inputs give equal views.
pub fn derive(snapshot: &ChainSnapshot, policy: &FormatPolicy) -> DerivedView {
    let rate = snapshot.price_rate_numerator;
    let blocks_left = snapshot.blocks_left();
    let ended = blocks_left.map(|left| left <= 0);

    let time_left_display = blocks_left.map(|left| {
        if left <= 0 {
            TIME_PASSED.to_string()
        } else {
            seconds_to_hms(policy.seconds_for_blocks(left.unsigned_abs()))
        }
    });

    let suggested_action = match (ended, snapshot.pot_balance) {
        (Some(false), _) => Some(SuggestedAction::BuyTickets),
        (Some(true), Some(pot)) if pot < U256::from(policy.payout_threshold_wei) => {
            Some(SuggestedAction::AddTime)
        }
        (Some(true), Some(_)) => Some(SuggestedAction::Payout),
        _ => None,
    };

    DerivedView {
        pot_display: snapshot.pot_balance.map(format_ether),
        usd_pot_display: snapshot
            .pot_balance
            .zip(rate)
            .and_then(|(pot, rate)| format_usd(pot, rate).ok()),
        time_left_display,
        all_time_display: snapshot
            .all_time_winnings
            .and_then(|won| format_ether_rounded(won, policy.all_time_places).ok()),
        usd_all_time_display: snapshot
            .all_time_winnings
            .zip(rate)
            .and_then(|(won, rate)| format_usd(won, rate).ok()),
        blocks_left: blocks_left.map(|left| left.clamp(i64::MIN as i128, i64::MAX as i128) as i64),
        lottery_ended: ended,
        suggested_action,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(end: u64, current: u64) -> ChainSnapshot {
        ChainSnapshot {
            pot_balance: Some(U256::from(1_500_000_000_000_000_000u64)),
            all_time_winnings: Some(U256::from(123_456_789_000_000_000u64)),
            ending_block: Some(end),
            current_block: Some(current),
            price_rate_numerator: Some(150_000_000_000),
            fetched_at: None,
        }
    }

    #[test]
    fn test_derive_running_lottery() {
        let view = derive(&snapshot(1300, 1000), &FormatPolicy::default());

        assert_eq!(view.pot_display.as_deref(), Some("1.5"));
        assert_eq!(view.usd_pot_display.as_deref(), Some("$2250.00"));
        assert_eq!(view.all_time_display.as_deref(), Some("Ξ 0.1235"));
        assert_eq!(view.usd_all_time_display.as_deref(), Some("$185.19"));
        // 300 blocks * 12.06s = 3618s
        assert_eq!(
            view.time_left_display.as_deref(),
            Some("1 hour, 18 seconds")
        );
        assert_eq!(view.blocks_left, Some(300));
        assert_eq!(view.lottery_ended, Some(false));
        assert_eq!(view.suggested_action, Some(SuggestedAction::BuyTickets));
    }

    #[test]
    fn test_countdown_never_says_passed_before_end() {
        let policy = FormatPolicy::default();
        for (end, current) in [(1, 0), (101, 100), (u64::MAX, 0), (50_000, 1)] {
            let view = derive(&snapshot(end, current), &policy);
            let shown = view.time_left_display.unwrap();
            assert!(!shown.contains(TIME_PASSED), "{} vs {}: {}", end, current, shown);
            assert!(!shown.is_empty());
            assert_eq!(view.lottery_ended, Some(false));
        }
    }

    #[test]
    fn test_ended_lottery_signals_time_passed() {
        let policy = FormatPolicy::default();
        for (end, current) in [(100, 100), (100, 101), (0, 0), (0, u64::MAX)] {
            let view = derive(&snapshot(end, current), &policy);
            assert_eq!(view.time_left_display.as_deref(), Some(TIME_PASSED));
            assert_eq!(view.lottery_ended, Some(true));
        }
    }

    #[test]
    fn test_ended_lottery_suggestion_depends_on_pot() {
        let policy = FormatPolicy::default();
        let mut snap = snapshot(10, 20);
        assert_eq!(
            derive(&snap, &policy).suggested_action,
            Some(SuggestedAction::Payout)
        );

        snap.pot_balance = Some(U256::from(999u64));
        assert_eq!(
            derive(&snap, &policy).suggested_action,
            Some(SuggestedAction::AddTime)
        );
    }

    #[test]
    fn test_derive_is_pure() {
        let policy = FormatPolicy::default();
        let snap = snapshot(2000, 1000);
        assert_eq!(derive(&snap, &policy), derive(&snap, &policy));
    }

    #[test]
    fn test_unfetched_fields_stay_empty() {
        let snap = ChainSnapshot {
            pot_balance: Some(U256::from(10u64)),
            ..Default::default()
        };
        let view = derive(&snap, &FormatPolicy::default());

        assert!(view.pot_display.is_some());
        assert!(view.usd_pot_display.is_none());
        assert!(view.time_left_display.is_none());
        assert!(view.all_time_display.is_none());
        assert!(view.suggested_action.is_none());
        assert!(!snap.is_complete());
    }
}
