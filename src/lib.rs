use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Could not connect to PostgreSQL at {address}: {source}")]
    Connection {
        address: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("pgvector extension is not installed in database '{database}'")]
    MissingVectorExtension { database: String },

    #[error("Could not reach Ollama at {url}: {message}")]
    ModelServiceUnavailable { url: String, message: String },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Coarse classification of a failure, used to pick the hint shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The database or the model service could not be reached
    Connectivity,
    /// The environment lacks something the run needs (pgvector, valid settings)
    MissingCapability,
    /// Anything else a remote call or local step reported
    Unexpected,
}

impl RagError {
    #[inline]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Connection { .. } | Self::ModelServiceUnavailable { .. } => {
                FailureKind::Connectivity
            }
            Self::MissingVectorExtension { .. } | Self::Config(_) => {
                FailureKind::MissingCapability
            }
            Self::Embedding(_)
            | Self::Generation(_)
            | Self::DimensionMismatch { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::Other(_) => FailureKind::Unexpected,
        }
    }
}

pub mod commands;
pub mod config;
pub mod database;
pub mod ingest;
pub mod ollama;
pub mod query;

#[cfg(feature = "bench")]
pub mod internal {
    pub use crate::ingest::split_sentences;
}
