//! # lana-api
//!
//! Lana backend server binary — loads settings and secrets, wires the
//! OpenRouter provider and the hosted-store client into the HTTP server,
//! and runs until interrupted.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lana_llm::{OpenRouterConfig, OpenRouterProvider};
use lana_server::{LanaServer, ServerConfig};
use lana_settings::{LanaSettings, Secrets};
use lana_store::{StoreClient, StoreConfig};
use tracing_subscriber::EnvFilter;

/// Lana backend server.
#[derive(Parser, Debug)]
#[command(name = "lana-api", about = "Lana personal finance backend server")]
struct Cli {
    /// Host to bind (overrides settings if specified).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings if specified).
    #[arg(long)]
    port: Option<u16>,

    /// Path to the settings file (default `~/.lana/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,
}

/// Build the provider config from secrets and settings.
fn provider_config(secrets: &Secrets, settings: &LanaSettings) -> OpenRouterConfig {
    let mut config = OpenRouterConfig::new(&secrets.openrouter_api_key, &secrets.site_url);
    config.model = settings.llm.model.clone();
    config.app_title = settings.llm.app_title.clone();
    config
}

/// `RUST_LOG` wins when set, otherwise the settings file's level applies.
fn log_filter(settings: &LanaSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.clone()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Settings are needed before logging init (they carry the log level).
    let settings = match args.settings {
        Some(ref path) => lana_settings::load_settings_from_path(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => lana_settings::load_settings().context("Failed to load settings")?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&settings))
        .init();

    let secrets = Secrets::from_env().context(
        "Missing credentials (set OPENROUTER_API_KEY, SUPABASE_URL, SUPABASE_ANON_KEY)",
    )?;

    let provider = OpenRouterProvider::new(provider_config(&secrets, &settings));
    let store = StoreClient::new(StoreConfig {
        base_url: secrets.supabase_url.clone(),
        anon_key: secrets.supabase_anon_key.clone(),
    });

    let config = ServerConfig {
        host: args.host.unwrap_or_else(|| settings.server.host.clone()),
        port: args.port.unwrap_or(settings.server.port),
    };

    tracing::info!(
        model = settings.llm.model.as_str(),
        host = config.host.as_str(),
        port = config.port,
        "starting lana-api"
    );

    let server = LanaServer::new(config, provider, store, settings);

    // Ctrl-C cancels the shutdown token, which drains in-flight requests.
    let shutdown = Arc::clone(server.shutdown());
    let _signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            shutdown.shutdown();
        }
    });

    server.serve().await.context("Server error")?;

    tracing::info!("Shutdown complete");
    Ok(())
}
