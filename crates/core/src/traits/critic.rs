//! Critic trait: decides whether to retrieve, and scores candidate answers.

use async_trait::async_trait;

use crate::critic_scores::{CriticScores, RetrievalDecision};
use crate::error::Result;
use crate::query::Query;

/// Decides whether retrieval is warranted, and scores a
/// `(query, answer, passage)` triple along three axes.
///
/// Both operations prompt an LLM with a strict JSON-shape instruction and
/// MUST NOT propagate a raw parse/type/network failure — implementations
/// return `Ok` with the documented fallback value rather than `Err`, so the
/// trait's `Result` only ever carries truly unrecoverable failures (the
/// Orchestrator still treats even those as "fall back").
#[async_trait]
pub trait Critic: Send + Sync + 'static {
    async fn decide(&self, query: &Query) -> Result<RetrievalDecision>;

    async fn score(&self, query: &Query, answer_text: &str, passage_text: &str) -> Result<CriticScores>;

    fn model_name(&self) -> &str;
}
