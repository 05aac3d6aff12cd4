pub mod balance;
pub mod config;
pub mod lottery;
pub mod transaction;
pub mod wallet;

pub use balance::{handle_balance_command, BalanceCommands};
pub use config::{handle_config_command, ConfigCommands};
pub use lottery::{handle_lottery_command, LotteryCommands};
pub use transaction::{handle_transaction_command, TransactionCommands};
pub use wallet::{handle_wallet_command, WalletCommands};

use dialoguer::Confirm;
use ethlotto_core::sync::DerivedView;
use ethlotto_core::{ClientContext, Result, SessionManager, TxHash};
use tokio::sync::mpsc::UnboundedReceiver;

/// A wallet session plus the stream of views its synchronizer produces.
pub struct Session {
    pub manager: SessionManager,
    pub views: UnboundedReceiver<DerivedView>,
    pub assume_yes: bool,
}

/// Asks before a state-changing transaction; `--yes` answers for the user.
pub(crate) fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

pub(crate) fn print_submitted(context: &ClientContext, hash: &TxHash) {
    println!("Transaction submitted: {}", hash);
    println!("  {}", context.explorer_link(hash));
}
