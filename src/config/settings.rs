//! Configuration settings and validation.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

/// File name of the persisted digest mapping.
pub const HASH_STORE_FILE: &str = "file_hashes.json";

/// Directory name of the persisted vector index.
pub const INDEX_DIR: &str = "vector_index";

/// Which backend serves embeddings and answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Google Generative Language API.
    Gemini,
    /// Local Ollama server.
    Ollama,
    /// Deterministic offline provider (no network).
    Placeholder,
}

impl ProviderKind {
    /// Default embedding model for this provider.
    #[must_use]
    pub const fn default_embedding_model(self) -> &'static str {
        match self {
            Self::Gemini => "models/embedding-001",
            Self::Ollama => "nomic-embed-text",
            Self::Placeholder => "placeholder",
        }
    }

    /// Default chat model for this provider.
    #[must_use]
    pub const fn default_chat_model(self) -> &'static str {
        match self {
            Self::Gemini => "gemini-pro",
            Self::Ollama => "llama3",
            Self::Placeholder => "placeholder",
        }
    }

    /// Default API base URL for this provider.
    #[must_use]
    pub const fn default_base_url(self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Self::Ollama => "http://localhost:11434",
            Self::Placeholder => "",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            "placeholder" => Ok(Self::Placeholder),
            other => Err(Error::config(format!(
                "unknown provider '{other}', must be one of: gemini, ollama, placeholder"
            ))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
            Self::Placeholder => "placeholder",
        };
        f.write_str(name)
    }
}

/// Embedding and generation backend settings.
#[derive(Clone)]
pub struct ProviderConfig {
    /// Backend kind.
    pub kind: ProviderKind,
    /// Embedding model identifier.
    pub embedding_model: String,
    /// Chat/generation model identifier.
    pub chat_model: String,
    /// API base URL.
    pub base_url: String,
    /// API key (required for Gemini).
    pub api_key: Option<String>,
}

impl ProviderConfig {
    /// Settings for `kind` using its default models and URL.
    #[must_use]
    pub fn for_kind(kind: ProviderKind) -> Self {
        Self {
            kind,
            embedding_model: kind.default_embedding_model().to_string(),
            chat_model: kind.default_chat_model().to_string(),
            base_url: kind.default_base_url().to_string(),
            api_key: None,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::for_kind(ProviderKind::Gemini)
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("embedding_model", &self.embedding_model)
            .field("chat_model", &self.chat_model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Main configuration for the docqa server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory scanned (recursively) for PDF documents.
    pub docs_dir: PathBuf,

    /// Directory holding the digest mapping and the persisted index.
    pub embeddings_dir: PathBuf,

    /// Host address to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Minimum time between two executed scans once an index exists.
    pub scan_interval: Duration,

    /// Window size in characters.
    pub chunk_size: usize,

    /// Characters shared by consecutive windows.
    pub chunk_overlap: usize,

    /// Embedding and generation backend.
    pub provider: ProviderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("./uploads"),
            embeddings_dir: PathBuf::from("./embeddings"),
            host: "0.0.0.0".to_string(),
            port: 5000,
            log_level: "info".to_string(),
            scan_interval: Duration::from_secs(3600),
            chunk_size: 1000,
            chunk_overlap: 200,
            provider: ProviderConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::config("port cannot be 0"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.host.is_empty() {
            return Err(Error::config("host cannot be empty"));
        }

        if self.chunk_size == 0 {
            return Err(Error::config("chunk_size cannot be 0"));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        if self.provider.kind == ProviderKind::Gemini
            && self.provider.api_key.as_deref().map_or(true, str::is_empty)
        {
            return Err(Error::config(
                "gemini provider requires an API key (DOCQA_API_KEY or GOOGLE_API_KEY)",
            ));
        }

        Ok(())
    }

    /// Get the path to the persisted digest mapping.
    #[must_use]
    pub fn hash_store_path(&self) -> PathBuf {
        self.embeddings_dir.join(HASH_STORE_FILE)
    }

    /// Get the directory of the persisted vector index.
    #[must_use]
    pub fn index_dir(&self) -> PathBuf {
        self.embeddings_dir.join(INDEX_DIR)
    }

    /// Get the server address as a string.
    #[must_use]
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            provider: ProviderConfig::for_kind(ProviderKind::Placeholder),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.scan_interval, Duration::from_secs(3600));
        assert_eq!(config.provider.kind, ProviderKind::Gemini);
    }

    #[test]
    fn test_placeholder_config_is_valid() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_gemini_requires_api_key() {
        let config = Config::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("API key"));

        let mut with_key = Config::new();
        with_key.provider.api_key = Some("secret".to_string());
        assert!(with_key.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_port() {
        let config = Config {
            port: 0,
            ..valid_config()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("port"));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = Config {
            log_level: "invalid".to_string(),
            ..valid_config()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log level"));
    }

    #[test]
    fn test_log_level_case_insensitive() {
        for level in ["TRACE", "Debug", "INFO", "Warn", "ERROR"] {
            let config = Config {
                log_level: level.to_string(),
                ..valid_config()
            };
            assert!(
                config.validate().is_ok(),
                "Level '{level}' should be valid (case insensitive)"
            );
        }
    }

    #[test]
    fn test_validate_empty_host() {
        let config = Config {
            host: String::new(),
            ..valid_config()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("host"));
    }

    #[test]
    fn test_validate_zero_chunk_size() {
        let config = Config {
            chunk_size: 0,
            chunk_overlap: 0,
            ..valid_config()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chunk_size"));
    }

    #[test]
    fn test_overlap_must_be_smaller_than_window() {
        let config = Config {
            chunk_size: 200,
            chunk_overlap: 200,
            ..valid_config()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chunk_overlap"));

        let config = Config {
            chunk_size: 200,
            chunk_overlap: 199,
            ..valid_config()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_persisted_paths() {
        let config = Config {
            embeddings_dir: PathBuf::from("/var/lib/docqa"),
            ..valid_config()
        };
        assert_eq!(
            config.hash_store_path(),
            PathBuf::from("/var/lib/docqa/file_hashes.json")
        );
        assert_eq!(config.index_dir(), PathBuf::from("/var/lib/docqa/vector_index"));
    }

    #[test]
    fn test_server_addr() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 9090,
            ..valid_config()
        };
        assert_eq!(config.server_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("Gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!("ollama".parse::<ProviderKind>().unwrap(), ProviderKind::Ollama);
        assert!("openai".parse::<ProviderKind>().is_err());
        assert_eq!(ProviderKind::Placeholder.to_string(), "placeholder");
    }

    #[test]
    fn test_api_key_redacted_in_debug() {
        let mut provider = ProviderConfig::default();
        provider.api_key = Some("super-secret".to_string());
        let debug = format!("{provider:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("redacted"));
    }
}
