//! Tunables for [`crate::SelfReflectiveRag`], independent of any concrete
//! configuration-loading mechanism — `credit-explain-config::Settings` is
//! converted into this at service startup.

use std::time::Duration;

use credit_explain_core::SelectionWeights;

/// Per-collaborator and per-run deadlines
#[derive(Debug, Clone, Copy)]
pub struct Deadlines {
    pub critic: Duration,
    pub generator: Duration,
    pub embedder: Duration,
    pub index: Duration,
    pub rerank: Duration,
    pub audit: Duration,
    pub run: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            critic: Duration::from_secs(30),
            generator: Duration::from_secs(60),
            embedder: Duration::from_secs(10),
            index: Duration::from_secs(10),
            rerank: Duration::from_secs(10),
            audit: Duration::from_secs(5),
            run: Duration::from_secs(120),
        }
    }
}

/// Everything `SelfReflectiveRag::run` needs besides its collaborators.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    pub weights: SelectionWeights,
    pub top_k: usize,
    pub top_n: usize,
    pub support_threshold: f32,
    pub deadlines: Deadlines,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            weights: SelectionWeights::default(),
            top_k: 50,
            top_n: 6,
            support_threshold: 0.7,
            deadlines: Deadlines::default(),
        }
    }
}
