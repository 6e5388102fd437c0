//! Embedder trait: maps query text to a dense vector.

use async_trait::async_trait;

use crate::error::Result;

/// Maps query text to a dense vector.
///
/// Dimensionality and normalization must match whatever the `VectorIndex`
/// was populated with — the index is the source of truth for both, this
/// trait only has to agree with it. Empty input returns an empty vector;
/// the Orchestrator treats that as the `S_EMPTY` terminal rather than
/// asking the embedder to validate input itself.
#[async_trait]
pub trait Embedder: Send + Sync + 'static {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Name for logging/provenance (e.g. the configured `EMBED_MODEL`).
    fn model_name(&self) -> &str;
}
