//! # Chat Relay daemon (`relayd`)
//!
//! The `relayd` binary runs the relay: database initialization, a config
//! sanity check, and the HTTP server itself.
//!
//! ## Usage
//!
//! ```bash
//! relayd --config ./config/relay.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `relayd init` | Create the SQLite database and apply the schema |
//! | `relayd check` | Validate the configuration and report resolved settings |
//! | `relayd serve` | Start the HTTP server |
//!
//! ## Environment
//!
//! Provider credentials are read once at startup: `GEMINI_API_KEY`,
//! `MISTRAL_API_KEY`, `GITHUB_TOKEN`. A missing variable is logged as a
//! warning; the matching provider then requires a per-request key.
//! `RUST_LOG` controls log filtering (default `info`).

mod config;
mod models;
mod provider;
mod ratelimit;
mod server;
mod store;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

/// Chat Relay — a self-hosted gateway that fronts third-party LLM chat
/// APIs behind one normalized HTTP surface.
#[derive(Parser)]
#[command(
    name = "relayd",
    about = "Chat Relay — one HTTP surface over OpenAI, GitHub Models, Anthropic, Cohere, Mistral, and Gemini",
    version,
    long_about = "Chat Relay forwards browser chat turns to third-party LLM HTTP APIs, \
    normalizing six incompatible vendor wire formats behind one endpoint, with per-client \
    rate limiting and chat/message persistence in SQLite."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/relay.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the chats/messages tables.
    /// This command is idempotent — running it multiple times is safe.
    /// With no `[db].path` configured there is nothing to create.
    Init,

    /// Validate the configuration file and print the resolved settings.
    Check,

    /// Start the HTTP server.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let config = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            match &config.db.path {
                Some(path) => {
                    store::sqlite::SqliteStore::connect(path).await?;
                    println!("database initialized at {}", path.display());
                }
                None => {
                    println!("no [db].path configured; the relay will use an in-memory store");
                }
            }
            Ok(())
        }
        Commands::Check => {
            println!("config ok: {}", cli.config.display());
            println!("  bind:             {}", config.server.bind);
            println!(
                "  store:            {}",
                config
                    .db
                    .path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "in-memory".to_string())
            );
            println!("  default provider: {}", config.provider.default);
            println!("  rate limit:       {}/min", config.rate_limit.per_minute);
            println!(
                "  admin api:        {}",
                if config.admin.token.is_some() {
                    "enabled"
                } else {
                    "disabled (no admin.token)"
                }
            );
            Ok(())
        }
        Commands::Serve => {
            info!(config = %cli.config.display(), "starting chat relay");
            server::run_server(&config).await
        }
    }
}
