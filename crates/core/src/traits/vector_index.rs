//! VectorIndex trait: k-NN search over pre-indexed passages.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::passage::Passage;

/// An equality predicate on a passage metadata field.
///
/// Malformed filters (unknown field types, unsupported operators on the
/// concrete adapter) must fail the call loudly — never be silently
/// dropped
#[derive(Debug, Clone)]
pub struct MetadataFilter {
    pub field: String,
    pub value: Value,
}

impl MetadataFilter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// k-NN search over pre-indexed passages.
///
/// Results are ordered by increasing distance, at most `k` items, never
/// containing duplicate `id`s within one call.
#[async_trait]
pub trait VectorIndex: Send + Sync + 'static {
    async fn search(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<Passage>>;
}
