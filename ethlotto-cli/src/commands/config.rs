use crate::config::CliConfig;
use clap::Subcommand;
use dialoguer::Confirm;
use ethlotto_core::{LottoConfig, Result};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Write the default configuration to the data directory
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn handle_config_command(cmd: ConfigCommands, cli_config: &CliConfig) -> Result<()> {
    let path = cli_config.config_path();

    match cmd {
        ConfigCommands::Show => {
            let config = cli_config.load_lotto_config().await?;
            println!("# {}", path.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }

        ConfigCommands::Init { force } => {
            if tokio::fs::try_exists(&path).await? && !force {
                let overwrite = cli_config.assume_yes
                    || Confirm::new()
                        .with_prompt(format!("{} exists. Overwrite?", path.display()))
                        .default(false)
                        .interact()?;
                if !overwrite {
                    println!("Left {} unchanged.", path.display());
                    return Ok(());
                }
            }

            let mut config = LottoConfig::default();
            if let Some(url) = &cli_config.rpc_url {
                config.provider_url = url.clone();
            }
            config.validate()?;
            config.save(&path).await?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}
