use super::Session;
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use ethlotto_core::format::format_ether;
use ethlotto_core::{ClientContext, ConnectionStatus, Result};

#[derive(Subcommand)]
pub enum WalletCommands {
    /// Request account access and move the wallet to the lottery's network
    Connect,
    /// Show the current connection and account
    Status,
    /// Ask the wallet to switch to the lottery's network
    Switch,
}

pub async fn handle_wallet_command(cmd: WalletCommands, session: &Session) -> Result<()> {
    let manager = &session.manager;

    match cmd {
        WalletCommands::Connect => {
            println!("Connecting to {}...", manager.config().provider_url);
            let context = manager.connect().await?;
            print_connection(&context);
        }

        WalletCommands::Status => {
            let context = manager.attach().await?;
            print_connection(&context);

            if matches!(context.connection_status(), ConnectionStatus::Connected { .. }) {
                let status = context.account_status().await?;
                println!();
                println!("Account:");
                println!("  Balance: Ξ {}", format_ether(status.ether_balance));
                println!("  Staking: {}", if status.staking_enabled { "enabled" } else { "disabled" });
                println!("  Accumulated: Ξ {}", format_ether(status.accumulated));
                println!("  Available rewards: Ξ {}", format_ether(status.available_rewards));
                println!(
                    "  Last winner: {} (Ξ {}, ticket {})",
                    status.last_winner.account,
                    format_ether(status.last_winner.pot),
                    status.last_winner.ticket
                );
            }
        }

        WalletCommands::Switch => {
            let context = manager.attach().await?;
            if context.is_expected_chain() {
                println!("Already on {}", manager.config().chain.chain_name);
                return Ok(());
            }

            println!("Switching to {}...", manager.config().chain.chain_name);
            context.provider().switch_chain(&manager.config().chain).await?;
            manager.refresh_wallet().await?;

            if let Some(context) = manager.context() {
                print_connection(&context);
            }
        }
    }

    Ok(())
}

fn print_connection(context: &ClientContext) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Account", "Chain", "Status"]);

    let account = context
        .account()
        .map(|a| a.to_string())
        .unwrap_or_else(|| "-".to_string());
    let status = match context.connection_status() {
        ConnectionStatus::WrongNetwork { expected, .. } => {
            format!("Switch Network (expected chain {})", expected)
        }
        other => other.to_string(),
    };
    table.add_row(vec![account, context.chain_id().to_string(), status]);

    println!("{}", table);
}
