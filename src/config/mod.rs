//! Configuration management for docqa.
//!
//! Supports configuration from:
//! - Command-line arguments (highest priority)
//! - Environment variables
//! - Built-in defaults (lowest priority)

mod settings;

pub use settings::{Config, ProviderConfig, ProviderKind, HASH_STORE_FILE, INDEX_DIR};
