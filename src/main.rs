use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use codesplain::api::server::{start_server, AppState};
use codesplain::cache::ExplanationCache;
use codesplain::config::{ProviderConfig, ServerConfig};
use codesplain::providers::{CompletionProvider, OpenAiProvider};

/// Explain uploaded source files with an LLM, caching by content hash.
#[derive(Debug, Parser)]
#[command(name = "codesplain", version)]
struct Cli {
    /// Bind address for the HTTP server.
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Listen port.
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Model identifier sent to the completion API.
    #[arg(long)]
    model: Option<String>,

    /// Base URL of the OpenAI-compatible completion API.
    #[arg(long)]
    api_base: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before reading OPENAI_API_KEY.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut provider_config = ProviderConfig::default();
    if let Some(model) = cli.model {
        provider_config.model = model;
    }
    if let Some(api_base) = cli.api_base {
        provider_config.api_base = api_base;
    }

    let provider = OpenAiProvider::from_config(None, &provider_config)
        .context("no API key available; set OPENAI_API_KEY")?;
    tracing::info!(
        model = %provider.model(),
        "explanation provider ready"
    );

    let cache = Arc::new(ExplanationCache::new(Arc::new(provider)));
    let server_config = ServerConfig {
        bind: cli.bind,
        port: cli.port,
    };

    start_server(&server_config, AppState::new(cache))
        .await
        .map_err(|e| anyhow::anyhow!(e))
}
