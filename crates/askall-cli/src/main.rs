//! askall: ask ChatGPT, Gemini and DeepSeek the same question at once
//!
//! Usage:
//!   askall serve [--config askall.toml] [--bind 127.0.0.1:3000] [--public-dir public]
//!   askall ask "What is 2+2?"
//!
//! API keys come from OPENAI_API_KEY, GEMINI_API_KEY and DEEPSEEK_API_KEY
//! (a `.env` file in the working directory is loaded first) or from the
//! `[providers.*]` tables of the config file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};
use askall_core::{AskAllConfig, Dispatcher};
use askall_gateway::GatewayServer;
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "askall", version, about = "Fan one prompt out to three LLM providers")]
struct Cli {
    /// Path to a TOML config file (default: ./askall.toml if present)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Address to listen on, overrides [server].bind
        #[arg(long)]
        bind: Option<String>,

        /// Directory of static files, overrides [server].public_dir
        #[arg(long)]
        public_dir: Option<PathBuf>,
    },
    /// Ask all three providers once and print the JSON result
    Ask {
        /// The prompt to send
        prompt: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Environment variables already set win over .env entries.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let cli = Cli::parse();
    let mut config = AskAllConfig::load(cli.config.as_deref())?;

    for id in config.missing_credentials() {
        warn!(
            "{} is not set; calls to {} will report an error",
            id.env_var(),
            id
        );
    }

    match cli.command {
        Command::Serve { bind, public_dir } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(dir) = public_dir {
                config.server.public_dir = dir;
            }
            serve(config).await
        }
        Command::Ask { prompt } => ask(config, &prompt).await,
    }
}

async fn serve(config: AskAllConfig) -> Result<()> {
    info!("askall v{} starting", env!("CARGO_PKG_VERSION"));
    let dispatcher = Arc::new(Dispatcher::from_config(&config.providers)?);
    GatewayServer::new(config.server, dispatcher)
        .run_until(shutdown_signal())
        .await
}

async fn ask(config: AskAllConfig, prompt: &str) -> Result<()> {
    if prompt.is_empty() {
        bail!("Prompt is missing");
    }
    let dispatcher = Dispatcher::from_config(&config.providers)?;
    let response = dispatcher.ask_all(prompt).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Wait for ctrl-c signal for graceful shutdown.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("received shutdown signal");
}
