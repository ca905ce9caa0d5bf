use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use medietat_refresh::{RefreshConfig, RefreshPipeline};
use medietat_store::PgOfferStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "medietat")]
#[command(about = "Medietat medical job aggregator")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape all sources once and reconcile the store.
    Refresh,
    /// Run the JSON API server.
    Serve {
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
    /// List the configured source ids.
    Sources,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = RefreshConfig::from_env();

    match cli.command.unwrap_or(Commands::Refresh) {
        Commands::Refresh => {
            let store = PgOfferStore::connect(&config.database_url).await?;
            let pipeline = RefreshPipeline::new(&config)?;
            let report = pipeline.run_once(&store).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Serve { port } => {
            let store = PgOfferStore::connect(&config.database_url).await?;
            let pipeline = Arc::new(RefreshPipeline::new(&config)?);
            let state = medietat_web::AppState::new(Arc::new(store), pipeline);
            medietat_web::serve(state, port).await?;
        }
        Commands::Sources => {
            let pipeline = RefreshPipeline::new(&config)?;
            for source_id in pipeline.source_ids() {
                println!("{source_id}");
            }
        }
    }

    Ok(())
}
