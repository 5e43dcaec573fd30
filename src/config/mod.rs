// Configuration management module
// TOML settings for the database, the Ollama runtime and retrieval

pub mod settings;

pub use settings::{Config, ConfigError, DatabaseConfig, OllamaConfig, RetrievalConfig};

/// Get the default configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::default_dir()
}
