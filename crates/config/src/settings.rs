//! Typed application settings, layered from environment variables.
//!
//! Defaults are merged with an environment-variable source; this workspace
//! has no per-environment YAML files to load, so every recognized option is
//! set via an environment variable and the `config` crate is used purely as
//! an env-var-merging `Source`.

use std::time::Duration;

use config::{Config, Environment};
use serde::Deserialize;

use crate::ConfigError;

/// Per-collaborator and per-run deadlines
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Deadlines {
    pub critic_timeout_s: u64,
    pub generator_timeout_s: u64,
    pub embedder_timeout_s: u64,
    pub index_timeout_s: u64,
    pub rerank_timeout_s: u64,
    pub audit_timeout_s: u64,
    pub run_deadline_s: u64,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            critic_timeout_s: 30,
            generator_timeout_s: 60,
            embedder_timeout_s: 10,
            index_timeout_s: 10,
            rerank_timeout_s: 10,
            audit_timeout_s: 5,
            run_deadline_s: 120,
        }
    }
}

impl Deadlines {
    pub fn critic(&self) -> Duration {
        Duration::from_secs(self.critic_timeout_s)
    }

    pub fn generator(&self) -> Duration {
        Duration::from_secs(self.generator_timeout_s)
    }

    pub fn embedder(&self) -> Duration {
        Duration::from_secs(self.embedder_timeout_s)
    }

    pub fn index(&self) -> Duration {
        Duration::from_secs(self.index_timeout_s)
    }

    pub fn rerank(&self) -> Duration {
        Duration::from_secs(self.rerank_timeout_s)
    }

    pub fn audit(&self) -> Duration {
        Duration::from_secs(self.audit_timeout_s)
    }

    pub fn run(&self) -> Duration {
        Duration::from_secs(self.run_deadline_s)
    }
}

/// The selection weights read from config; validated to sum to 1.0 by
/// `Settings::load`, mirroring `SelectionWeights` in `credit-explain-core`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WeightsConfig {
    pub weight_isrel: f32,
    pub weight_issup: f32,
    pub weight_isuse: f32,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            weight_isrel: 0.45,
            weight_issup: 0.40,
            weight_isuse: 0.15,
        }
    }
}

/// Top-level application settings, loaded once at service startup and
/// shared read-only across every `run()` call.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Bearer credential for the Groq-compatible chat-completion endpoint.
    pub groq_api_key: String,
    /// Optional base endpoint override for the Groq-compatible API.
    pub groq_endpoint: Option<String>,
    /// Directory backing the vector store / audit files.
    pub vectorstore_dir: String,
    pub critic_model: String,
    pub generator_model: String,
    pub embed_model: String,
    /// Embedding endpoint the `HttpEmbedder` adapter calls.
    pub embed_endpoint: String,
    /// Reranker endpoint the `HttpCrossEncoder` adapter calls.
    pub rerank_endpoint: String,
    /// Qdrant collection backing the `QdrantVectorIndex` adapter.
    pub qdrant_collection: String,
    pub qdrant_endpoint: String,
    pub qdrant_api_key: Option<String>,
    pub vector_dim: usize,

    pub top_k: usize,
    pub top_n: usize,
    pub support_threshold: f32,

    pub weights: WeightsConfig,
    pub deadlines: Deadlines,

    /// Directory `JsonlAuditSink` writes `audit_YYYYMMDD.jsonl` and
    /// `audit_<run_id>.json` files under.
    pub audit_dir: String,
    /// Directory uploaded PDFs (see `POST /upload`) are stored under.
    pub upload_dir: String,

    pub server_port: u16,
    pub log_level: String,
    pub log_json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            groq_api_key: String::new(),
            groq_endpoint: None,
            vectorstore_dir: "./data/vectorstore".to_string(),
            critic_model: "llama-3.1-8b-instant".to_string(),
            generator_model: "llama-3.3-70b-versatile".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            embed_endpoint: "http://localhost:8081/embed".to_string(),
            rerank_endpoint: "http://localhost:8082/rerank".to_string(),
            qdrant_collection: "credit_explain_passages".to_string(),
            qdrant_endpoint: "http://localhost:6334".to_string(),
            qdrant_api_key: None,
            vector_dim: 768,
            top_k: 50,
            top_n: 6,
            support_threshold: 0.7,
            weights: WeightsConfig::default(),
            deadlines: Deadlines::default(),
            audit_dir: "./data/audit".to_string(),
            upload_dir: "./data/uploads".to_string(),
            server_port: 8080,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl Settings {
    /// Load settings from environment variables over the documented
    /// defaults. Recognized variable names are bare and un-prefixed
    /// (`GROQ_API_KEY`, `TOP_K`, `TOP_N`, `SUPPORT_THRESHOLD`, deadlines,
    /// server and storage paths, ...).
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Config::try_from(&Settings::default())?;

        let built = Config::builder()
            .add_source(defaults)
            .add_source(Environment::default().separator("__"))
            .build()?;

        let settings: Settings = built.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "TOP_K".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.top_n == 0 {
            return Err(ConfigError::InvalidValue {
                field: "TOP_N".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.support_threshold) {
            return Err(ConfigError::InvalidValue {
                field: "SUPPORT_THRESHOLD".to_string(),
                message: "must be within [0.0, 1.0]".to_string(),
            });
        }
        let sum = self.weights.weight_isrel + self.weights.weight_issup + self.weights.weight_isuse;
        if (sum - 1.0).abs() > 1e-3 {
            return Err(ConfigError::InvalidValue {
                field: "weights".to_string(),
                message: format!("isrel+issup+isuse must sum to 1.0, got {sum}"),
            });
        }
        Ok(())
    }
}
