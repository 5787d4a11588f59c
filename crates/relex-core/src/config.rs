//! relex Configuration Management
//!
//! Handles configuration from environment variables and TOML config files
//! with sensible defaults for local use.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Dictionary loading
    pub dictionaries: DictionaryConfig,

    /// Relation extraction pipeline
    pub pipeline: PipelineConfig,

    /// Distributed storage access
    pub storage: StorageConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Dictionaries
        if let Ok(folder) = std::env::var("RELEX_DICTIONARIES") {
            config.dictionaries.folder = Some(PathBuf::from(folder));
        }
        if let Ok(value) = std::env::var("RELEX_CASE_SENSITIVE") {
            config.dictionaries.case_sensitive =
                value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "RELEX_CASE_SENSITIVE".to_string(),
                    value,
                })?;
        }

        // WebHDFS
        if let Ok(url) = std::env::var("HDFS_URL") {
            config.storage.hdfs_url = Some(url);
        }
        if let Ok(user) = std::env::var("HDFS_USER") {
            config.storage.hdfs_user = Some(user);
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::ParseError { message, .. } => ConfigError::ParseError { path, message },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<string>"),
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;

        if env_config.dictionaries.folder.is_some() {
            self.dictionaries.folder = env_config.dictionaries.folder;
        }
        // presence of the variable matters, so `false` can override the file
        if std::env::var_os("RELEX_CASE_SENSITIVE").is_some() {
            self.dictionaries.case_sensitive = env_config.dictionaries.case_sensitive;
        }
        if env_config.storage.hdfs_url.is_some() {
            self.storage.hdfs_url = env_config.storage.hdfs_url;
        }
        if env_config.storage.hdfs_user.is_some() {
            self.storage.hdfs_user = env_config.storage.hdfs_user;
        }
        if std::env::var_os("LOG_LEVEL").is_some() {
            self.logging.level = env_config.logging.level;
        }

        Ok(self)
    }
}

/// Dictionary loading configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    /// Folder holding the dictionary files
    pub folder: Option<PathBuf>,

    /// Keep the original casing of entries and tokens
    pub case_sensitive: bool,

    /// Words never added to any dictionary
    pub stop_words: Option<StopWords>,

    /// File name suffixes recognized as dictionaries
    pub accepted_extensions: Vec<String>,
}

/// Suffixes accepted by default. `dict` has no leading dot on purpose so
/// that names such as `genes_dict` are picked up too.
pub const DEFAULT_ACCEPTED_EXTENSIONS: [&str; 5] = [".dic", "dict", ".txt", ".tsv", ".csv"];

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            folder: None,
            case_sensitive: false,
            stop_words: None,
            accepted_extensions: DEFAULT_ACCEPTED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Stop words given either as a whitespace separated string or a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StopWords {
    Text(String),
    Set(HashSet<String>),
}

impl StopWords {
    pub fn into_set(self) -> HashSet<String> {
        match self {
            Self::Text(text) => text.split_whitespace().map(str::to_string).collect(),
            Self::Set(set) => set,
        }
    }
}

impl From<&str> for StopWords {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for StopWords {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<HashSet<String>> for StopWords {
    fn from(set: HashSet<String>) -> Self {
        Self::Set(set)
    }
}

/// A single value or a list of values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

/// Relation extraction pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Entity class of the first relation argument
    pub class1: Option<String>,

    /// Entity class of the second relation argument
    pub class2: Option<String>,

    /// Relation type being modeled
    pub rel_type: Option<String>,

    /// Parser to use (`default`)
    pub parser: String,

    /// Tokenizer to use (`from_parser` or `generic`)
    pub tokenizer: String,

    /// Feature generator names, in execution order
    pub feature_generators: Option<OneOrMany<String>>,

    /// Feature dictionary persisted between training and prediction
    pub feature_set_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            class1: None,
            class2: None,
            rel_type: None,
            parser: "default".to_string(),
            tokenizer: "from_parser".to_string(),
            feature_generators: None,
            feature_set_path: None,
        }
    }
}

/// Distributed storage (WebHDFS) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// WebHDFS endpoint, e.g. `http://namenode:9870`
    pub hdfs_url: Option<String>,

    /// User name sent as `user.name`
    pub hdfs_user: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            hdfs_url: None,
            hdfs_user: None,
            timeout_secs: 60,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
