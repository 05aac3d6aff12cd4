mod commands;
mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::Session;
use config::CliConfig;
use ethlotto_core::sync::{AlwaysFocused, ChannelObserver};
use ethlotto_core::{LottoError, SessionManager};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ethlotto")]
#[command(about = "ethlotto - Ether lottery client")]
#[command(version)]
struct Cli {
    /// Data directory holding config.json
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// JSON-RPC endpoint of the wallet provider (overrides config)
    #[arg(short, long, global = true)]
    rpc_url: Option<String>,

    /// Skip confirmation prompts
    #[arg(short, long, global = true)]
    yes: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wallet connection commands
    #[command(subcommand)]
    Wallet(commands::WalletCommands),

    /// Ether and token balances
    #[command(subcommand)]
    Balance(commands::BalanceCommands),

    /// Ether and token transfers
    #[command(subcommand)]
    Transaction(commands::TransactionCommands),

    /// Lottery state and actions
    #[command(subcommand)]
    Lottery(commands::LotteryCommands),

    /// Configuration file commands
    #[command(subcommand)]
    Config(commands::ConfigCommands),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "ethlotto={}",
            log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli_config = CliConfig::resolve(cli.data_dir, cli.rpc_url, cli.yes);
    tokio::fs::create_dir_all(&cli_config.data_dir)
        .await
        .with_context(|| format!("creating {}", cli_config.data_dir.display()))?;

    let result = run(cli.command, &cli_config).await;

    if let Err(e) = result {
        match e {
            LottoError::NotConnected(reason) => {
                eprintln!("Error: Wallet not connected ({})", reason);
                eprintln!("Use 'ethlotto wallet connect' to authorize an account");
            }
            LottoError::WrongNetwork { expected, actual } => {
                eprintln!("Error: Wallet is on chain {}, lottery is on {}", actual, expected);
                eprintln!("Use 'ethlotto wallet switch' to change network");
            }
            LottoError::UnknownToken { symbol } => {
                eprintln!("Error: Token '{}' is not configured", symbol);
                eprintln!("Add it under \"tokens\" in {}", cli_config.config_path().display());
            }
            LottoError::InvalidAddress(addr) => {
                eprintln!("Error: Invalid address: {}", addr);
            }
            _ => {
                eprintln!("Error: {}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(command: Commands, cli_config: &CliConfig) -> ethlotto_core::Result<()> {
    match command {
        Commands::Config(cmd) => commands::handle_config_command(cmd, cli_config).await,
        Commands::Wallet(cmd) => {
            commands::handle_wallet_command(cmd, &open_session(cli_config).await?).await
        }
        Commands::Balance(cmd) => {
            commands::handle_balance_command(cmd, &open_session(cli_config).await?).await
        }
        Commands::Transaction(cmd) => {
            commands::handle_transaction_command(cmd, &open_session(cli_config).await?).await
        }
        Commands::Lottery(cmd) => {
            commands::handle_lottery_command(cmd, open_session(cli_config).await?).await
        }
    }
}

async fn open_session(cli_config: &CliConfig) -> ethlotto_core::Result<Session> {
    let config = cli_config.load_lotto_config().await?;

    let (tx, views) = tokio::sync::mpsc::unbounded_channel();
    let manager = SessionManager::new(
        config,
        Arc::new(AlwaysFocused),
        Arc::new(ChannelObserver(tx)),
    )?;

    Ok(Session {
        manager,
        views,
        assume_yes: cli_config.assume_yes,
    })
}
