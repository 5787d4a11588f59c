//! relex Core - Dataset model, feature dictionary, and shared types
//!
//! This crate defines the core abstractions used throughout relex:
//! - Dataset model (documents, parts, sentences, tokens, entities, edges)
//! - Feature values and the shared feature dictionary
//! - Common error types
//! - Configuration management

pub mod config;
pub mod dataset;
pub mod features;

pub use config::{
    AppConfig, ConfigError, DictionaryConfig, LoggingConfig, OneOrMany, PipelineConfig,
    StopWords, StorageConfig,
};
pub use dataset::{
    Dataset, Dependency, Document, Edge, EdgeTarget, Entity, Part, Relation, Sentence, Token,
};
pub use features::{FeatureDictionary, FeatureMap, FeatureValue};

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for relex operations
#[derive(Error, Debug)]
pub enum RelexError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// A collaborator could not be resolved while building a pipeline
    #[error("Invalid {role}: {message}")]
    InvalidComponent { role: &'static str, message: String },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RelexError {
    /// Wrap an IO error together with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_component(role: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidComponent {
            role,
            message: message.into(),
        }
    }
}

impl From<ConfigError> for RelexError {
    fn from(err: ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RelexError>;

// ============================================================================
// Tests
// ============================================================================
