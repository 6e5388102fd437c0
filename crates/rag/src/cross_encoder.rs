//! `CrossEncoder` adapter backed by a configurable HTTP reranker endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use credit_explain_core::{CrossEncoder, Passage, RankedPassage, Result};

use crate::RagError;

#[derive(Debug, Clone)]
pub struct CrossEncoderConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

/// A `CrossEncoder` that calls a configurable HTTP reranker endpoint,
/// sending the query paired with each passage's text and receiving back a
/// relevance score per passage.
pub struct HttpCrossEncoder {
    client: Client,
    config: CrossEncoderConfig,
}

impl HttpCrossEncoder {
    pub fn new(config: CrossEncoderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RagError::Configuration(format!("failed to build http client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Pair each passage with its score, sort by score descending (stable,
    /// so equal-scoring passages keep the reranker's original relative
    /// order), and keep the top `top_n`.
    fn rank_by_score(passages: Vec<Passage>, scores: Vec<f32>, top_n: usize) -> Vec<RankedPassage> {
        let mut scored: Vec<(Passage, f32)> = passages.into_iter().zip(scores).collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_n);

        scored
            .into_iter()
            .enumerate()
            .map(|(index, (passage, rerank_score))| RankedPassage {
                passage,
                rerank_score,
                index,
            })
            .collect()
    }
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    documents: Vec<&'a str>,
}

#[derive(Deserialize)]
struct RerankResponse {
    scores: Vec<f32>,
}

#[async_trait]
impl CrossEncoder for HttpCrossEncoder {
    async fn rerank(&self, query: &str, passages: Vec<Passage>, top_n: usize) -> Result<Vec<RankedPassage>> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        let documents: Vec<&str> = passages.iter().map(|p| p.text.as_str()).collect();

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&RerankRequest { query, documents })
            .send()
            .await
            .map_err(RagError::from)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::Reranker(format!("rerank request rejected ({status}): {body}")).into());
        }

        let parsed: RerankResponse = response
            .json()
            .await
            .map_err(|e| RagError::Reranker(format!("invalid rerank response: {e}")))?;

        if parsed.scores.len() != passages.len() {
            return Err(RagError::Reranker(format!(
                "reranker returned {} scores for {} passages",
                parsed.scores.len(),
                passages.len()
            ))
            .into());
        }

        Ok(Self::rank_by_score(passages, parsed.scores, top_n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn passage(id: &str) -> Passage {
        Passage {
            id: id.to_string(),
            text: format!("text for {id}"),
            metadata: HashMap::new(),
            distance: 0.0,
        }
    }

    #[test]
    fn rank_by_score_sorts_descending() {
        let passages = vec![passage("a"), passage("b"), passage("c")];
        let scores = vec![0.2, 0.9, 0.5];

        let ranked = HttpCrossEncoder::rank_by_score(passages, scores, 10);

        let ids: Vec<&str> = ranked.iter().map(|r| r.passage.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn rank_by_score_truncates_to_top_n() {
        let passages = vec![passage("a"), passage("b"), passage("c")];
        let scores = vec![0.9, 0.8, 0.7];

        let ranked = HttpCrossEncoder::rank_by_score(passages, scores, 2);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].passage.id, "a");
        assert_eq!(ranked[1].passage.id, "b");
    }

    #[test]
    fn rank_by_score_is_stable_for_tied_scores() {
        let passages = vec![passage("a"), passage("b"), passage("c")];
        let scores = vec![0.5, 0.5, 0.9];

        let ranked = HttpCrossEncoder::rank_by_score(passages, scores, 10);

        // "c" wins outright; "a" and "b" tie and must keep their input order.
        let ids: Vec<&str> = ranked.iter().map(|r| r.passage.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn rank_by_score_assigns_sequential_post_rerank_indices() {
        let passages = vec![passage("a"), passage("b")];
        let scores = vec![0.1, 0.9];

        let ranked = HttpCrossEncoder::rank_by_score(passages, scores, 10);

        assert_eq!(ranked[0].index, 0);
        assert_eq!(ranked[1].index, 1);
    }

    #[test]
    fn rank_by_score_handles_an_empty_input() {
        let ranked = HttpCrossEncoder::rank_by_score(vec![], vec![], 10);
        assert!(ranked.is_empty());
    }
}
