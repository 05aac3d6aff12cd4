use ethlotto_core::sync::{DerivedView, Focus};
use ethlotto_core::{LottoConfig, SessionManager};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let mut config = LottoConfig::default();
    if let Ok(url) = std::env::var("ETH_RPC_URL") {
        config.provider_url = url;
    }
    println!("Using provider {}", config.provider_url);

    let focus = Focus::default();
    let manager = SessionManager::new(
        config,
        Arc::new(focus.clone()),
        Arc::new(|view: &DerivedView| {
            println!(
                "pot: {} ({}), time left: {}",
                view.pot_display.as_deref().unwrap_or("-"),
                view.usd_pot_display.as_deref().unwrap_or("-"),
                view.time_left_display.as_deref().unwrap_or("-"),
            );
        }),
    )?;

    let context = manager.attach().await?;
    println!("Status: {}", context.connection_status());

    // Let a couple of cycles run, then go to the background for a while.
    tokio::time::sleep(Duration::from_secs(30)).await;
    println!("Losing focus");
    focus.set_focused(false);
    tokio::time::sleep(Duration::from_secs(30)).await;
    println!("Regaining focus");
    focus.set_focused(true);
    tokio::time::sleep(Duration::from_secs(15)).await;

    manager.shutdown();
    Ok(())
}
