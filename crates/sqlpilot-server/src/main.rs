use clap::{Parser, Subcommand};
use sqlpilot_core::{AppConfig, PromptContext};
use sqlpilot_llm::{GroqClient, SqlGenerator};
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod introspect;
mod routes;
mod state;

use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "sqlpilot", version, about = "Natural-language-to-SQL service")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server.
    Serve {
        /// Path to the configuration file.
        #[arg(long, env = "SQLPILOT_CONFIG", default_value = "sqlpilot.yaml")]
        config: PathBuf,
    },

    /// Print the column listing for a table and exit.
    Introspect {
        /// Path to the configuration file.
        #[arg(long, env = "SQLPILOT_CONFIG", default_value = "sqlpilot.yaml")]
        config: PathBuf,

        /// Table to inspect; defaults to the configured table name.
        #[arg(long)]
        table: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Serve { config } => serve(&config).await,
        Command::Introspect { config, table } => introspect::run(&config, table.as_deref()).await,
    }
}

async fn serve(config_path: &Path) -> anyhow::Result<()> {
    let cfg = AppConfig::from_file(config_path)?;

    let context = Arc::new(PromptContext::from_config(&cfg.prompt)?);
    let model = Arc::new(GroqClient::from_config(&cfg.llm)?);
    let generator = SqlGenerator::new(model, context);
    let state = Arc::new(AppState { generator });

    let app = routes::router(state);
    tracing::info!("sqlpilot listening on {}", cfg.server.bind);

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
