//! Error types for the hub policy library

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("profile catalog is empty")]
    EmptyCatalog,

    #[error("duplicate profile slug: {0}")]
    DuplicateSlug(String),

    #[error("invalid resource quantity for {key}: {value:?}")]
    InvalidQuantity { key: String, value: String },

    #[error("invalid last-activity timestamp {value:?}: {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type HubResult<T> = Result<T, HubError>;
