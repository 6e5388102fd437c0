//! Configuration for the self-reflective RAG orchestrator service.
//!
//! Loads a single `Settings` struct from environment variables at startup
//! — there is no hot-reload and no per-tenant override;
//! the settings are constructed once in `main` and shared as an `Arc`
//! across every `run()` call.

pub mod settings;

pub use settings::{Deadlines, Settings, WeightsConfig};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}
