//! Retrieved and re-ranked passage types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A passage returned by the `VectorIndex`, before re-ranking.
///
/// `id` is unique within a single run; `distance` is the raw similarity
/// score reported by the index (smaller is closer, under the index's own
/// metric — it is never compared across indexes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub id: String,
    pub text: String,
    pub metadata: HashMap<String, Value>,
    pub distance: f32,
}

/// A `Passage` augmented with a cross-encoder relevance score.
///
/// Higher `rerank_score` means more relevant. `index` is the passage's
/// position after re-ranking (0-based) and is attached before any
/// concurrent per-candidate work begins, so that the eventual Candidate
/// can carry it through regardless of completion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedPassage {
    pub passage: Passage,
    pub rerank_score: f32,
    pub index: usize,
}

impl RankedPassage {
    pub fn id(&self) -> &str {
        &self.passage.id
    }

    pub fn text(&self) -> &str {
        &self.passage.text
    }
}
