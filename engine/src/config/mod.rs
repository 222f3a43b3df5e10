//! Configuration management
//!
//! This module handles loading, validation, and management of the librarian
//! configuration. Settings come from three layers, later layers winning:
//!
//! 1. Built-in defaults
//! 2. A TOML file (`--config PATH`, or `./librarian.toml` when present)
//! 3. Environment variables (a `.env` file is loaded into the environment first)
//!
//! # Configuration Sections
//!
//! - **core**: log level, response log path
//! - **llm**: completion service endpoint, model and per-call timeout
//! - **embedding**: embedding service endpoint and model
//! - **index**: collection store directory, collection name, retrieval count
//! - **books**: path to the book summaries JSON file
//!
//! # Environment Variables
//!
//! | variable | setting |
//! |---|---|
//! | `LIBRARIAN_LOG_LEVEL` | `core.log_level` |
//! | `RESPONSE_LOG_PATH` | `core.response_log` |
//! | `OPENAI_BASE_URL` | `llm.base_url` and `embedding.base_url` |
//! | `OPENAI_MODEL` | `llm.model` |
//! | `OPENAI_EMBEDDING_MODEL` | `embedding.model` |
//! | `INDEX_DIR` | `index.dir` |
//! | `INDEX_COLLECTION` | `index.collection` |
//! | `RAG_TOP_K` | `index.top_k` |
//! | `BOOKS_PATH` | `books.path` |
//!
//! The API key is not part of the configuration; see [`crate::secrets`].
//!
//! # Examples
//!
//! ```no_run
//! use librarian_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load(None)?;
//! println!("Model: {}", config.llm.model);
//! println!("Index: {:?}", config.index.dir);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "librarian.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Completion service settings
    #[serde(default)]
    pub llm: LLMConfig,

    /// Embedding service settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Semantic index settings
    #[serde(default)]
    pub index: IndexConfig,

    /// Book data settings
    #[serde(default)]
    pub books: BooksConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// JSONL response log path (supports ~ expansion)
    #[serde(default = "default_response_log")]
    pub response_log: PathBuf,
}

/// Completion service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Chat model identifier
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Timeout applied to each completion call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    // Note: API key resolved from OPENAI_API_KEY or the OS keychain, not stored here
}

/// Embedding service configuration
///
/// The model must be the one the index was built with; a mismatch degrades
/// ranking silently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Embedding model identifier
    #[serde(default = "default_embedding_model")]
    pub model: String,
}

/// Semantic index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Directory holding persisted collections (supports ~ expansion)
    #[serde(default = "default_index_dir")]
    pub dir: PathBuf,

    /// Collection name
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Number of hits retrieved per user message
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

/// Book data configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BooksConfig {
    /// Path to the JSON array of book records (supports ~ expansion)
    #[serde(default = "default_books_path")]
    pub path: PathBuf,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_response_log() -> PathBuf {
    PathBuf::from("response_log.jsonl")
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_index_dir() -> PathBuf {
    PathBuf::from(".index")
}

fn default_collection() -> String {
    "books".to_string()
}

fn default_top_k() -> usize {
    5
}

fn default_books_path() -> PathBuf {
    PathBuf::from("data/book_summaries.json")
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            response_log: default_response_log(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_chat_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_embedding_model(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: default_index_dir(),
            collection: default_collection(),
            top_k: default_top_k(),
        }
    }
}

impl Default for BooksConfig {
    fn default() -> Self {
        Self {
            path: default_books_path(),
        }
    }
}

impl Config {
    /// Load configuration from all layers
    ///
    /// Reads `path` when given, otherwise `./librarian.toml` if it exists,
    /// otherwise starts from defaults. Environment overrides are applied
    /// afterwards and the result is validated.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An explicitly given file cannot be read
    /// - TOML parsing fails
    /// - An environment override has an invalid value
    /// - Validation fails
    pub fn load(path: Option<&Path>) -> Result<Self, EngineError> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.exists() {
                    Self::read_file(local)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate_and_process()?;

        Ok(config)
    }

    /// Load configuration from a specific path, without environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let mut config = Self::read_file(path)?;
        config.validate_and_process()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Apply overrides from a variable lookup (normally the process environment)
    ///
    /// Empty values are ignored so that `OPENAI_MODEL=` does not blank a setting.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), EngineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(level) = get("LIBRARIAN_LOG_LEVEL") {
            self.core.log_level = level.to_lowercase();
        }
        if let Some(path) = get("RESPONSE_LOG_PATH") {
            self.core.response_log = PathBuf::from(path);
        }
        if let Some(base_url) = get("OPENAI_BASE_URL") {
            self.llm.base_url = base_url.clone();
            self.embedding.base_url = base_url;
        }
        if let Some(model) = get("OPENAI_MODEL") {
            self.llm.model = model;
        }
        if let Some(model) = get("OPENAI_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Some(dir) = get("INDEX_DIR") {
            self.index.dir = PathBuf::from(dir);
        }
        if let Some(collection) = get("INDEX_COLLECTION") {
            self.index.collection = collection;
        }
        if let Some(top_k) = get("RAG_TOP_K") {
            self.index.top_k = top_k.trim().parse().map_err(|_| {
                EngineError::Config(format!("RAG_TOP_K must be a positive integer, got '{}'", top_k))
            })?;
        }
        if let Some(path) = get("BOOKS_PATH") {
            self.books.path = PathBuf::from(path);
        }

        Ok(())
    }

    /// Validate and process configuration
    ///
    /// This method:
    /// - Validates the log level, retrieval count, timeout and identifiers
    /// - Strips trailing slashes from base URLs
    /// - Expands ~ in paths
    ///
    /// # Errors
    ///
    /// Returns an error if any value is out of range or a path cannot be expanded.
    pub fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.index.top_k == 0 {
            return Err(EngineError::Config(
                "index.top_k must be at least 1".to_string(),
            ));
        }

        if self.llm.timeout_secs == 0 {
            return Err(EngineError::Config(
                "llm.timeout_secs must be at least 1".to_string(),
            ));
        }

        if self.llm.model.trim().is_empty() || self.embedding.model.trim().is_empty() {
            return Err(EngineError::Config(
                "llm.model and embedding.model must not be empty".to_string(),
            ));
        }

        if self.index.collection.trim().is_empty()
            || self.index.collection.contains(['/', '\\'])
        {
            return Err(EngineError::Config(format!(
                "Invalid collection name '{}'",
                self.index.collection
            )));
        }

        self.llm.base_url = self.llm.base_url.trim_end_matches('/').to_string();
        self.embedding.base_url = self.embedding.base_url.trim_end_matches('/').to_string();

        self.core.response_log = expand_path(&self.core.response_log)?;
        self.index.dir = expand_path(&self.index.dir)?;
        self.books.path = expand_path(&self.books.path)?;

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_creation() {
        let config = Config::default();

        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert_eq!(config.index.collection, "books");
        assert_eq!(config.index.top_k, 5);
        assert_eq!(config.books.path, PathBuf::from("data/book_summaries.json"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup(&[
                ("OPENAI_MODEL", "gpt-4o"),
                ("OPENAI_BASE_URL", "http://localhost:8080/v1/"),
                ("RAG_TOP_K", "3"),
                ("BOOKS_PATH", "/srv/books.json"),
            ]))
            .unwrap();
        config.validate_and_process().unwrap();

        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.base_url, "http://localhost:8080/v1");
        assert_eq!(config.embedding.base_url, "http://localhost:8080/v1");
        assert_eq!(config.index.top_k, 3);
        assert_eq!(config.books.path, PathBuf::from("/srv/books.json"));
    }

    #[test]
    fn test_empty_override_is_ignored() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup(&[("OPENAI_MODEL", "  ")]))
            .unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn test_invalid_top_k_override() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(lookup(&[("RAG_TOP_K", "many")]))
            .unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let mut config = Config::default();
        config.index.top_k = 0;
        assert!(config.validate_and_process().is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = Config::default();
        config.core.log_level = "loud".to_string();
        assert!(config.validate_and_process().is_err());
    }

    #[test]
    fn test_collection_with_separator_rejected() {
        let mut config = Config::default();
        config.index.collection = "../books".to_string();
        assert!(config.validate_and_process().is_err());
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test");
        let expanded = expand_path(&path).unwrap();

        let home = dirs::home_dir().unwrap();
        assert_eq!(expanded, home.join("test"));
    }

    #[test]
    fn test_expand_path_without_tilde() {
        let path = PathBuf::from("/absolute/path");
        let expanded = expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[llm]
model = "gpt-4o"
"#,
        )
        .unwrap();

        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.timeout_secs, 60);
        assert_eq!(config.index.top_k, 5);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_string = toml::to_string(&config).unwrap();

        let deserialized: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(config.core.log_level, deserialized.core.log_level);
        assert_eq!(config.index.dir, deserialized.index.dir);
    }
}
