use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{0} is not configured (set it in the [store] section or the environment)")]
    MissingSetting(&'static str),
}

#[derive(Debug, Error)]
pub enum PostError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid post JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Post must have title and content (missing {0})")]
    MissingField(&'static str),

    #[error("Cannot derive a slug from title {0:?}; set \"slug\" explicitly")]
    EmptySlug(String),

    #[error("Invalid publishedAt {value:?}: {source}")]
    InvalidDate {
        value: String,
        source: chrono::ParseError,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Request to content store failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("Failed to encode request: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected content store response: {0}")]
    Response(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document already exists: {0}")]
    Conflict(String),
}
