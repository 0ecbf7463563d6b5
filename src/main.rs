pub mod app;
pub mod boundary;
pub mod canvas;
pub mod config;
pub mod index;
pub mod overlay;
pub mod projection;
pub mod region;
pub mod scale;
pub mod server;
pub mod source;
pub mod types;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw the map once and write it as SVG
    Render {
        /// TOML configuration; built-in defaults when omitted
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        #[arg(short, long, value_name = "FILE", default_value = "map.svg")]
        output: PathBuf,
    },
    /// Serve the map with a reload button for the town markers
    Serve {
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Render { config, output } => {
            let app_config = config::AppConfig::load(config.as_deref())?;
            let session = app::MapSession::start(&app_config).await?;

            tokio::fs::write(output, session.svg())
                .await
                .with_context(|| format!("Failed to write {:?}", output))?;
            info!(output = ?output, "Map written");
        }
        Commands::Serve { config } => {
            let app_config = config::AppConfig::load(config.as_deref())?;
            server::start_server(app_config).await?;
        }
    }

    Ok(())
}
