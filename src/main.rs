//! Food Buddy command-line entry point.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use food_buddy::app::FoodBuddy;
use food_buddy::cli::{self, Cli};
use food_buddy::config::Config;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("food_buddy=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");

    let app = FoodBuddy::from_config(&config).await?;

    let result = cli::run(&app, cli.command).await;
    if let Err(e) = &result {
        error!("{:#}", e);
    }

    app.shutdown().await?;
    result
}
