#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::database::postgres::models::DistanceMetric;

/// Upper bound pgvector accepts for a `VECTOR(n)` column
const MAX_VECTOR_DIMENSION: u32 = 16_000;
const MAX_TOP_K: u32 = 100;
const REDACTED_PASSWORD: &str = "********";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
}

impl Default for DatabaseConfig {
    #[inline]
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            name: "rag_db".to_string(),
            user: "rag_user".to_string(),
            password: "password".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OllamaConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub embedding_model: String,
    pub generation_model: String,
    pub embedding_dimension: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Default for OllamaConfig {
    #[inline]
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 11434,
            embedding_model: "nomic-embed-text".to_string(),
            generation_model: "gemma3:270m".to_string(),
            // nomic-embed-text output width
            embedding_dimension: 768,
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: u32,
    pub distance: DistanceMetric,
}

impl Default for RetrievalConfig {
    #[inline]
    fn default() -> Self {
        Self {
            top_k: 3,
            distance: DistanceMetric::Cosine,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid database host: {0} (cannot be empty)")]
    InvalidDatabaseHost(String),
    #[error("Invalid database name: {0} (cannot be empty)")]
    InvalidDatabaseName(String),
    #[error("Invalid database user: {0} (cannot be empty)")]
    InvalidDatabaseUser(String),
    #[error("Invalid embedding dimension: {0} (must be between 1 and 16000)")]
    InvalidEmbeddingDimension(u32),
    #[error("Invalid top_k: {0} (must be between 1 and 100)")]
    InvalidTopK(u32),
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    /// Default configuration directory (`~/.ollama-pg-rag`)
    #[inline]
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".ollama-pg-rag"))
            .ok_or(ConfigError::DirectoryError)
    }

    /// Load `config.toml` from `config_dir`, falling back to defaults when the file is absent
    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                base_dir: config_dir.as_ref().to_path_buf(),
                ..Self::default()
            });
        }

        let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: config_path.clone(),
                source,
            })?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config.validate()?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<(), ConfigError> {
        self.validate()?;

        let config_dir = self.get_base_dir();

        fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self)?;

        fs::write(&config_path, content).map_err(|source| ConfigError::Write {
            path: config_path.clone(),
            source,
        })?;

        Ok(())
    }

    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.get_base_dir().join("config.toml")
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.ollama.validate()?;
        self.retrieval.validate()?;
        Ok(())
    }

    #[inline]
    pub fn ollama_url(&self) -> Result<Url, ConfigError> {
        self.ollama.ollama_url()
    }

    /// Copy of this configuration that is safe to print
    #[inline]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if !config.database.password.is_empty() {
            config.database.password = REDACTED_PASSWORD.to_string();
        }
        config
    }
}

impl DatabaseConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidDatabaseHost(self.host.clone()));
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidDatabaseName(self.name.clone()));
        }

        if self.user.trim().is_empty() {
            return Err(ConfigError::InvalidDatabaseUser(self.user.clone()));
        }

        Ok(())
    }

    /// `host:port/name`, for log lines and error messages
    #[inline]
    pub fn address(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.name)
    }
}

impl OllamaConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol != "http" && self.protocol != "https" {
            return Err(ConfigError::InvalidProtocol(self.protocol.clone()));
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        self.ollama_url()?;

        if self.embedding_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.embedding_model.clone()));
        }

        if self.generation_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.generation_model.clone()));
        }

        if !(1..=MAX_VECTOR_DIMENSION).contains(&self.embedding_dimension) {
            return Err(ConfigError::InvalidEmbeddingDimension(
                self.embedding_dimension,
            ));
        }

        Ok(())
    }

    #[inline]
    pub fn ollama_url(&self) -> Result<Url, ConfigError> {
        let url_str = format!("{}://{}:{}", self.protocol, self.host, self.port);
        let url = Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str.clone()))?;
        if url.host_str().is_none_or(str::is_empty) {
            return Err(ConfigError::InvalidUrl(url_str));
        }
        Ok(url)
    }
}

impl RetrievalConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_TOP_K).contains(&self.top_k) {
            return Err(ConfigError::InvalidTopK(self.top_k));
        }
        Ok(())
    }
}
