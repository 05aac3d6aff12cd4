use super::Session;
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use ethlotto_core::format::{commify, format_ether};
use ethlotto_core::Result;

#[derive(Subcommand)]
pub enum BalanceCommands {
    /// Show the connected account's ether balance
    Ether,
    /// Show ERC-20 balances (all configured tokens when no symbol is given)
    Token {
        /// Token symbol, e.g. DAI
        symbol: Option<String>,
    },
}

pub async fn handle_balance_command(cmd: BalanceCommands, session: &Session) -> Result<()> {
    let context = session.manager.connect().await?;

    match cmd {
        BalanceCommands::Ether => {
            let account = context.require_account()?;
            let balance = context.ether_balance().await?;
            println!("Balance for {}:", account);
            println!("  Ξ {} ({} wei)", format_ether(balance), balance);
        }

        BalanceCommands::Token { symbol: Some(symbol) } => {
            let balance = context.token_balance(&symbol).await?;
            println!("{} {}", commify(&balance.display), balance.symbol);
        }

        BalanceCommands::Token { symbol: None } => {
            let balances = context.token_balances().await;
            if balances.is_empty() {
                println!("No tokens configured.");
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Token", "Balance"]);

            for (symbol, result) in balances {
                match result {
                    Ok(balance) => table.add_row(vec![balance.symbol, commify(&balance.display)]),
                    Err(e) => table.add_row(vec![symbol, format!("error: {}", e)]),
                };
            }

            println!("{}", table);
        }
    }

    Ok(())
}
