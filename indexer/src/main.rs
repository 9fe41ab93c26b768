mod app;
mod decimal;
mod handlers;
mod ingest;
mod metadata;
mod model;
mod pipeline;
mod profit;
mod store;
mod watcher;

use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use std::process;
use swapledger_core::{telemetry, Config};
use tracing::{error, info};

#[derive(Parser)]
#[clap(name = "swapledger")]
#[clap(about = "Per-wallet swap profit ledger for Uniswap V3 style pools", version)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,

    /// Run continuous event ingestion
    Run {
        /// Override the event archive directory from config
        #[clap(long, env = "ARCHIVE_DIR")]
        archive_dir: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Fatal error");
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // Load configuration
    let mut config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // Initialize telemetry
    telemetry::init(&config.telemetry)?;

    let cli = Cli::parse();

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(std::time::Duration::from_secs(
            config.database.connect_timeout_secs,
        ))
        .idle_timeout(std::time::Duration::from_secs(
            config.database.idle_timeout_secs,
        ))
        .connect(&config.database.url)
        .await?;

    match cli.command {
        Commands::Migrate => {
            info!("Running database migrations");
            sqlx::migrate!("../migrations").run(&pool).await?;
            info!("Migrations completed successfully");
        }

        Commands::Run { archive_dir } => {
            // Override config with CLI args
            if let Some(dir) = archive_dir {
                config.ingest.archive_dir = dir;
            }

            info!(
                archive_dir = %config.ingest.archive_dir,
                "Starting continuous ingestion"
            );

            let app = app::App::new(config, pool).await?;
            app.run().await?;
        }
    }

    telemetry::shutdown();
    Ok(())
}
