//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, EmbeddingConfig, LlmConfig, LogFormat, LoggingConfig, StorageBackend, StorageConfig,
    VectorIndexConfig, VectorIndexProvider,
};

/// Read a secret from the environment variable named in configuration
pub fn read_secret(var: &str) -> anyhow::Result<String> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => anyhow::bail!("Environment variable {} is not set", var),
    }
}
