use super::{confirm, print_submitted, Session};
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use ethlotto_core::format::convert;
use ethlotto_core::sync::{DerivedView, SuggestedAction};
use ethlotto_core::{ClientContext, LottoError, Result, U256};

#[derive(Subcommand)]
pub enum LotteryCommands {
    /// Show pot, countdown and all-time winnings
    Status,
    /// Keep printing the lottery state after every refresh (Ctrl-C to stop)
    Watch,
    /// Buy tickets with the given amount of wei
    Buy {
        /// Amount in wei
        wei: String,
    },
    /// Enable staking for the connected account
    Stake,
    /// Pay out the ended round and start a new one
    Payout,
    /// Withdraw accumulated rewards
    Withdraw,
    /// Extend a round that ended with an empty pot
    AddTime,
    /// Convert a wei amount to ether and USD at the current feed price
    Convert {
        /// Amount in wei
        wei: String,
    },
}

pub async fn handle_lottery_command(cmd: LotteryCommands, mut session: Session) -> Result<()> {
    match cmd {
        LotteryCommands::Status => {
            let context = session.manager.attach().await?;
            require_synchronizer(&session, &context)?;

            let view = session
                .views
                .recv()
                .await
                .ok_or_else(|| LottoError::internal("synchronizer stopped before first cycle"))?;
            print_view(&view);
        }

        LotteryCommands::Watch => {
            let context = session.manager.attach().await?;
            require_synchronizer(&session, &context)?;
            println!("Watching lottery {} (Ctrl-C to stop)", context.lottery().address());

            loop {
                tokio::select! {
                    view = session.views.recv() => match view {
                        Some(view) => print_view(&view),
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => {
                        println!("Stopped.");
                        break;
                    }
                }
            }
        }

        LotteryCommands::Buy { wei } => {
            let value = parse_wei(&wei)?;
            let context = session.manager.connect().await?;

            let prompt = match context.price_rate().await.and_then(|rate| convert(value, rate)) {
                Ok(conversion) => format!(
                    "Buy tickets for {} ({})?",
                    conversion.ether, conversion.usd
                ),
                Err(e) => {
                    tracing::warn!(error = %e, "Price unavailable");
                    format!("Buy tickets for {} wei?", value)
                }
            };
            if !confirm(&prompt, session.assume_yes)? {
                println!("Cancelled.");
                return Ok(());
            }

            let hash = context.buy_tickets(value).await?;
            print_submitted(&context, &hash);
        }

        LotteryCommands::Stake => {
            let context = session.manager.connect().await?;
            if !confirm("Enable staking?", session.assume_yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            let hash = context.start_staking().await?;
            print_submitted(&context, &hash);
        }

        LotteryCommands::Payout => {
            let context = session.manager.connect().await?;
            if !confirm("Pay out and restart the lottery?", session.assume_yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            let hash = context.payout_and_restart().await?;
            print_submitted(&context, &hash);
        }

        LotteryCommands::Withdraw => {
            let context = session.manager.connect().await?;
            if !confirm("Withdraw available rewards?", session.assume_yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            let hash = context.withdraw_fees().await?;
            print_submitted(&context, &hash);
        }

        LotteryCommands::AddTime => {
            let context = session.manager.connect().await?;
            if !confirm("Add time to the lottery?", session.assume_yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            let hash = context.add_time().await?;
            print_submitted(&context, &hash);
        }

        LotteryCommands::Convert { wei } => {
            let value = parse_wei(&wei)?;
            let context = session.manager.attach().await?;
            let rate = context.price_rate().await?;
            let conversion = convert(value, rate)?;
            println!("{}", conversion.ether);
            println!("{}", conversion.usd);
        }
    }

    Ok(())
}

/// Lottery state is only read on the lottery's own chain.
fn require_synchronizer(session: &Session, context: &ClientContext) -> Result<()> {
    if session.manager.synchronizer().is_none() {
        return Err(LottoError::WrongNetwork {
            expected: context.config().chain.chain_id,
            actual: context.chain_id(),
        });
    }
    Ok(())
}

fn parse_wei(input: &str) -> Result<U256> {
    U256::from_str_radix(input.trim(), 10)
        .map_err(|e| LottoError::invalid_amount(format!("{}: {}", input, e)))
}

fn print_view(view: &DerivedView) {
    let missing = || "-".to_string();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["", "Ether", "USD"]);
    table.add_row(vec![
        "Pot".to_string(),
        view.pot_display
            .as_ref()
            .map(|pot| format!("Ξ {}", pot))
            .unwrap_or_else(missing),
        view.usd_pot_display.clone().unwrap_or_else(missing),
    ]);
    table.add_row(vec![
        "All-time winnings".to_string(),
        view.all_time_display.clone().unwrap_or_else(missing),
        view.usd_all_time_display.clone().unwrap_or_else(missing),
    ]);
    println!("{}", table);

    let time_left = view.time_left_display.clone().unwrap_or_else(missing);
    match view.blocks_left {
        Some(blocks) if blocks > 0 => println!("Time left: {} ({} blocks)", time_left, blocks),
        _ => println!("Time left: {}", time_left),
    }

    match view.suggested_action {
        Some(SuggestedAction::BuyTickets) => println!("Next: ethlotto lottery buy <WEI>"),
        Some(SuggestedAction::Payout) => println!("Next: ethlotto lottery payout"),
        Some(SuggestedAction::AddTime) => println!("Next: ethlotto lottery add-time"),
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wei() {
        assert_eq!(parse_wei("1000").unwrap(), U256::from(1000u64));
        assert_eq!(parse_wei(" 42 ").unwrap(), U256::from(42u64));
        assert!(matches!(parse_wei("1.5"), Err(LottoError::InvalidAmount(_))));
        assert!(parse_wei("ten").is_err());
    }
}
