//! docqa - document question answering server
//!
//! Entry point for the docqa server.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use docqa::config::{ProviderConfig, ProviderKind};
use docqa::server::{init_metrics, init_tracing, App, ServerConfig};
use docqa::service::IndexService;
use docqa::{Config, Result};

/// docqa - question answering over a directory of PDF documents
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory scanned for PDF documents
    #[arg(short, long, env = "DOCQA_DOCS_DIR", default_value = "./uploads")]
    docs_dir: std::path::PathBuf,

    /// Directory for the digest store and persisted index
    #[arg(short, long, env = "DOCQA_EMBEDDINGS_DIR", default_value = "./embeddings")]
    embeddings_dir: std::path::PathBuf,

    /// Host address to bind to
    #[arg(long, env = "DOCQA_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "DOCQA_PORT", default_value = "5000")]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DOCQA_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "DOCQA_LOG_JSON")]
    log_json: bool,

    /// Seconds between periodic scans
    #[arg(long, env = "DOCQA_SCAN_INTERVAL", default_value = "3600")]
    scan_interval: u64,

    /// Window size in characters
    #[arg(long, env = "DOCQA_CHUNK_SIZE", default_value = "1000")]
    chunk_size: usize,

    /// Characters shared by consecutive windows
    #[arg(long, env = "DOCQA_CHUNK_OVERLAP", default_value = "200")]
    chunk_overlap: usize,

    /// Embedding and generation backend (gemini, ollama, placeholder)
    #[arg(long, env = "DOCQA_PROVIDER", default_value = "gemini")]
    provider: String,

    /// Embedding model (provider default if unset)
    #[arg(long, env = "DOCQA_EMBEDDING_MODEL")]
    embedding_model: Option<String>,

    /// Chat model (provider default if unset)
    #[arg(long, env = "DOCQA_CHAT_MODEL")]
    chat_model: Option<String>,

    /// Provider base URL (provider default if unset)
    #[arg(long, env = "DOCQA_BASE_URL")]
    base_url: Option<String>,

    /// Provider API key
    #[arg(long, env = "DOCQA_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

impl Cli {
    fn provider_config(&self) -> Result<ProviderConfig> {
        let kind: ProviderKind = self.provider.parse()?;
        let mut provider = ProviderConfig::for_kind(kind);

        if let Some(model) = &self.embedding_model {
            provider.embedding_model.clone_from(model);
        }
        if let Some(model) = &self.chat_model {
            provider.chat_model.clone_from(model);
        }
        if let Some(url) = &self.base_url {
            provider.base_url.clone_from(url);
        }
        provider.api_key = self
            .api_key
            .clone()
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .filter(|k| !k.is_empty());

        Ok(provider)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with configuration
    init_tracing(&cli.log_level, cli.log_json);

    tracing::info!("docqa v{} starting...", env!("CARGO_PKG_VERSION"));

    // Build config from CLI
    let config = Config {
        provider: cli.provider_config()?,
        docs_dir: cli.docs_dir,
        embeddings_dir: cli.embeddings_dir,
        host: cli.host,
        port: cli.port,
        log_level: cli.log_level,
        scan_interval: Duration::from_secs(cli.scan_interval),
        chunk_size: cli.chunk_size,
        chunk_overlap: cli.chunk_overlap,
    };

    tracing::debug!(?config, "Configuration loaded");

    // Validate config
    config.validate()?;

    std::fs::create_dir_all(&config.docs_dir)?;
    std::fs::create_dir_all(&config.embeddings_dir)?;

    tracing::info!(
        docs = %config.docs_dir.display(),
        embeddings = %config.embeddings_dir.display(),
        addr = %config.server_addr(),
        "Directories ready"
    );

    // Initialize metrics
    init_metrics();

    let service = Arc::new(IndexService::from_config(&config)?);

    // First pass runs the initial scan
    let _timer = service.run_periodic();

    let server_config = ServerConfig {
        host: config.host,
        port: config.port,
    };

    App::new(server_config, service).run().await
}
