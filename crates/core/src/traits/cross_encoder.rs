//! CrossEncoder trait: re-ranks (query, passage) pairs.

use async_trait::async_trait;

use crate::error::Result;
use crate::passage::{Passage, RankedPassage};

/// Re-ranks `(query, passage)` pairs by relevance.
///
/// Output length is at most `min(top_n, passages.len())`. Scores returned
/// by one call are only comparable to each other within that call — never
/// across calls or against raw retrieval distances. Ties are broken with a
/// stable sort on the candidates' original order.
#[async_trait]
pub trait CrossEncoder: Send + Sync + 'static {
    async fn rerank(
        &self,
        query: &str,
        passages: Vec<Passage>,
        top_n: usize,
    ) -> Result<Vec<RankedPassage>>;
}
