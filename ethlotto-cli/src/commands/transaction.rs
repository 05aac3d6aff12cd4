use super::{confirm, print_submitted, Session};
use clap::Subcommand;
use ethlotto_core::format::{format_ether, parse_ether};
use ethlotto_core::{parse_address, Result};

#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Send ether, optionally with a text message as input data
    SendEther {
        /// Recipient address
        to: String,
        /// Amount in ether, e.g. 0.25
        amount: String,
        /// Message attached to the transaction
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Transfer a configured ERC-20 token
    SendToken {
        /// Token symbol
        symbol: String,
        /// Recipient address
        to: String,
        /// Amount in whole token units, e.g. 12.5
        amount: String,
    },
}

pub async fn handle_transaction_command(
    cmd: TransactionCommands,
    session: &Session,
) -> Result<()> {
    let context = session.manager.connect().await?;

    match cmd {
        TransactionCommands::SendEther {
            to,
            amount,
            message,
        } => {
            let to = parse_address(&to)?;
            let wei = parse_ether(&amount)?;

            let balance = context.ether_balance().await?;
            if balance < wei {
                println!(
                    "Warning: balance Ξ {} is below the amount sent",
                    format_ether(balance)
                );
            }

            let prompt = format!("Send Ξ {} to {}?", format_ether(wei), to);
            if !confirm(&prompt, session.assume_yes)? {
                println!("Cancelled.");
                return Ok(());
            }

            let hash = context.send_ether(to, wei, message.as_deref()).await?;
            print_submitted(&context, &hash);
        }

        TransactionCommands::SendToken { symbol, to, amount } => {
            let to = parse_address(&to)?;

            let prompt = format!("Send {} {} to {}?", amount, symbol.to_uppercase(), to);
            if !confirm(&prompt, session.assume_yes)? {
                println!("Cancelled.");
                return Ok(());
            }

            let hash = context.send_token(&symbol, to, &amount).await?;
            print_submitted(&context, &hash);
        }
    }

    Ok(())
}
