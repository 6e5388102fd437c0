//! End-to-end tests of `SelfReflectiveRag::run` against hand-written mock
//! collaborators, covering the documented failure branches and the happy
//! path.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use credit_explain_core::{
    Answer, AuditRecord, AuditSink, Citation, Confidence, Critic, CriticScores, CrossEncoder, Embedder,
    Error, Generator, MetadataFilter, Passage, Query, RankedPassage, Result as CoreResult,
    RetrievalDecision, VectorIndex,
};
use credit_explain_orchestrator::{Deadlines, OrchestratorConfig, SelfReflectiveRag};

fn fast_deadlines() -> Deadlines {
    Deadlines {
        critic: Duration::from_millis(200),
        generator: Duration::from_millis(200),
        embedder: Duration::from_millis(200),
        index: Duration::from_millis(200),
        rerank: Duration::from_millis(200),
        audit: Duration::from_millis(200),
        run: Duration::from_millis(200),
    }
}

struct MockCritic {
    retrieve: bool,
    decide_fails: bool,
    scores_by_passage_text: HashMap<String, CriticScores>,
}

#[async_trait]
impl Critic for MockCritic {
    async fn decide(&self, _query: &Query) -> CoreResult<RetrievalDecision> {
        if self.decide_fails {
            return Err(Error::Critic("malformed reply".to_string()));
        }
        Ok(RetrievalDecision {
            retrieve: self.retrieve,
            notes: None,
        })
    }

    async fn score(&self, _query: &Query, _answer_text: &str, passage_text: &str) -> CoreResult<CriticScores> {
        Ok(self
            .scores_by_passage_text
            .get(passage_text)
            .cloned()
            .unwrap_or_else(|| CriticScores::fallback("no score configured for this passage")))
    }

    fn model_name(&self) -> &str {
        "mock-critic"
    }
}

struct MockGenerator {
    confidence: Confidence,
    follow_ups: Vec<String>,
    delay_by_passage_text: HashMap<String, Duration>,
}

impl MockGenerator {
    fn plain(confidence: Confidence, follow_ups: Vec<String>) -> Self {
        Self {
            confidence,
            follow_ups,
            delay_by_passage_text: HashMap::new(),
        }
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn answer(&self, _query: &Query, passages: &[RankedPassage]) -> CoreResult<Answer> {
        if let Some(rp) = passages.first() {
            if let Some(delay) = self.delay_by_passage_text.get(rp.text()) {
                tokio::time::sleep(*delay).await;
            }
        }
        let citations = passages
            .first()
            .map(|rp| {
                vec![Citation {
                    doc_id: rp.id().to_string(),
                    chunk_id: None,
                    text_excerpt: rp.text().to_string(),
                }]
            })
            .unwrap_or_default();
        Ok(Answer {
            explanation: "Banks must maintain a minimum capital adequacy ratio under Basel III."
                .to_string(),
            citations,
            confidence: self.confidence,
            follow_up_questions: None,
            model_version: Some("mock-generator-v1".to_string()),
        })
    }

    async fn followups(
        &self,
        _query: &Query,
        _answer: &Answer,
        _passages: &[RankedPassage],
    ) -> CoreResult<Vec<String>> {
        Ok(self.follow_ups.clone())
    }

    fn model_name(&self) -> &str {
        "mock-generator"
    }
}

struct MockEmbedder {
    vector: Vec<f32>,
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, _text: &str) -> CoreResult<Vec<f32>> {
        Ok(self.vector.clone())
    }

    fn model_name(&self) -> &str {
        "mock-embedder"
    }
}

struct MockVectorIndex {
    passages: Vec<Passage>,
}

#[async_trait]
impl VectorIndex for MockVectorIndex {
    async fn search(
        &self,
        _vector: &[f32],
        _k: usize,
        _filter: Option<&MetadataFilter>,
    ) -> CoreResult<Vec<Passage>> {
        Ok(self.passages.clone())
    }
}

struct IdentityCrossEncoder;

#[async_trait]
impl CrossEncoder for IdentityCrossEncoder {
    async fn rerank(&self, _query: &str, passages: Vec<Passage>, top_n: usize) -> CoreResult<Vec<RankedPassage>> {
        Ok(passages
            .into_iter()
            .take(top_n)
            .enumerate()
            .map(|(index, passage)| RankedPassage {
                rerank_score: 1.0 - (index as f32 * 0.01),
                passage,
                index,
            })
            .collect())
    }
}

#[derive(Default)]
struct CapturingAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

#[async_trait]
impl AuditSink for CapturingAuditSink {
    async fn write(&self, record: &AuditRecord) -> CoreResult<String> {
        let run_id = record.run_id.clone();
        self.records.lock().unwrap().push(record.clone());
        Ok(run_id)
    }
}

fn passage(index: usize) -> Passage {
    Passage {
        id: format!("doc-{index}"),
        text: format!("passage-text-{index}"),
        metadata: HashMap::new(),
        distance: 0.1 * index as f32,
    }
}

#[tokio::test]
async fn e1_out_of_domain_skips_retrieval() {
    let critic = Arc::new(MockCritic {
        retrieve: false,
        decide_fails: false,
        scores_by_passage_text: HashMap::new(),
    });
    let generator = Arc::new(MockGenerator::plain(Confidence::Low, vec!["n/a".to_string()]));
    let embedder = Arc::new(MockEmbedder { vector: vec![0.1, 0.2] });
    let index = Arc::new(MockVectorIndex { passages: vec![] });
    let cross_encoder = Arc::new(IdentityCrossEncoder);
    let audit = Arc::new(CapturingAuditSink::default());

    let rag = SelfReflectiveRag::new(
        critic,
        embedder,
        index,
        cross_encoder,
        generator,
        audit.clone(),
        OrchestratorConfig {
            deadlines: fast_deadlines(),
            ..Default::default()
        },
    );

    let response = rag.run("Who won the 2022 World Cup?", None).await;

    assert!(!response.retrieval_performed);
    assert!(response.error.is_none());
    assert!(response.answer.citations.is_empty());
    assert_eq!(audit.records.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn e2_happy_path_selects_best_candidate_and_reports_high_confidence() {
    let passages: Vec<Passage> = (0..6).map(passage).collect();
    let mut scores = HashMap::new();
    scores.insert("passage-text-0".to_string(), CriticScores { isrel: 0.9, issup: 0.85, isuse: 0.7, notes: None });
    for i in 1..6 {
        scores.insert(format!("passage-text-{i}"), CriticScores { isrel: 0.5, issup: 0.5, isuse: 0.5, notes: None });
    }

    let critic = Arc::new(MockCritic {
        retrieve: true,
        decide_fails: false,
        scores_by_passage_text: scores,
    });
    let generator = Arc::new(MockGenerator::plain(
        Confidence::High,
        vec!["Q1?".to_string(), "Q2?".to_string(), "Q3?".to_string()],
    ));
    let embedder = Arc::new(MockEmbedder { vector: vec![0.1; 8] });
    let index = Arc::new(MockVectorIndex { passages });
    let cross_encoder = Arc::new(IdentityCrossEncoder);
    let audit = Arc::new(CapturingAuditSink::default());

    let rag = SelfReflectiveRag::new(
        critic,
        embedder,
        index,
        cross_encoder,
        generator,
        audit.clone(),
        OrchestratorConfig {
            deadlines: fast_deadlines(),
            ..Default::default()
        },
    );

    let response = rag
        .run("What is the minimum capital adequacy ratio for banks under Basel III?", None)
        .await;

    assert!(response.error.is_none());
    assert!(response.retrieval_performed);
    assert_eq!(response.answer.confidence, Confidence::High);
    assert!(!response.answer.citations.is_empty());
    assert_eq!(response.answer.citations[0].doc_id, "doc-0");
    let follow_ups = response.answer.follow_up_questions.unwrap();
    assert!((3..=5).contains(&follow_ups.len()));

    let records = audit.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].selected_candidate_index, Some(0));
}

#[tokio::test]
async fn e3_insufficient_support_degrades_to_low_confidence_error() {
    let passages: Vec<Passage> = (0..6).map(passage).collect();
    let mut scores = HashMap::new();
    scores.insert("passage-text-0".to_string(), CriticScores { isrel: 0.6, issup: 0.5, isuse: 0.4, notes: None });
    for i in 1..6 {
        scores.insert(format!("passage-text-{i}"), CriticScores { isrel: 0.4, issup: 0.3, isuse: 0.2, notes: None });
    }

    let critic = Arc::new(MockCritic {
        retrieve: true,
        decide_fails: false,
        scores_by_passage_text: scores,
    });
    let generator = Arc::new(MockGenerator::plain(Confidence::Medium, vec!["Q1?".to_string()]));
    let embedder = Arc::new(MockEmbedder { vector: vec![0.1; 8] });
    let index = Arc::new(MockVectorIndex { passages });
    let cross_encoder = Arc::new(IdentityCrossEncoder);
    let audit = Arc::new(CapturingAuditSink::default());

    let rag = SelfReflectiveRag::new(
        critic,
        embedder,
        index,
        cross_encoder,
        generator,
        audit.clone(),
        OrchestratorConfig {
            deadlines: fast_deadlines(),
            ..Default::default()
        },
    );

    let response = rag.run("What is the Basel III liquidity coverage ratio?", None).await;

    assert_eq!(response.error.as_deref(), Some("insufficient_support"));
    assert!(response.retrieval_performed);
    assert_eq!(response.answer.confidence, Confidence::Low);

    let records = audit.records.lock().unwrap();
    assert_eq!(records[0].error, Some(credit_explain_core::RunError::InsufficientSupport));
}

#[tokio::test]
async fn e4_empty_retrieval_returns_canned_answer() {
    let critic = Arc::new(MockCritic {
        retrieve: true,
        decide_fails: false,
        scores_by_passage_text: HashMap::new(),
    });
    let generator = Arc::new(MockGenerator::plain(Confidence::Low, vec![]));
    let embedder = Arc::new(MockEmbedder { vector: vec![0.1; 8] });
    let index = Arc::new(MockVectorIndex { passages: vec![] });
    let cross_encoder = Arc::new(IdentityCrossEncoder);
    let audit = Arc::new(CapturingAuditSink::default());

    let rag = SelfReflectiveRag::new(
        critic,
        embedder,
        index,
        cross_encoder,
        generator,
        audit.clone(),
        OrchestratorConfig {
            deadlines: fast_deadlines(),
            ..Default::default()
        },
    );

    let response = rag.run("What is KYC?", None).await;

    assert_eq!(response.error.as_deref(), Some("empty_retrieval"));
    assert!(response.retrieval_performed);
    assert!(response.answer.citations.is_empty());
    assert_eq!(audit.records.lock().unwrap()[0].retrieved_count, 0);
}

#[tokio::test]
async fn e5_malformed_critic_decision_falls_back_to_retrieve_true() {
    let passages: Vec<Passage> = (0..3).map(passage).collect();
    let mut scores = HashMap::new();
    for i in 0..3 {
        scores.insert(format!("passage-text-{i}"), CriticScores { isrel: 0.9, issup: 0.9, isuse: 0.9, notes: None });
    }

    let critic = Arc::new(MockCritic {
        retrieve: true,
        decide_fails: true,
        scores_by_passage_text: scores,
    });
    let generator = Arc::new(MockGenerator::plain(Confidence::High, vec!["Q1?".to_string(), "Q2?".to_string(), "Q3?".to_string()]));
    let embedder = Arc::new(MockEmbedder { vector: vec![0.1; 8] });
    let index = Arc::new(MockVectorIndex { passages });
    let cross_encoder = Arc::new(IdentityCrossEncoder);
    let audit = Arc::new(CapturingAuditSink::default());

    let rag = SelfReflectiveRag::new(
        critic,
        embedder,
        index,
        cross_encoder,
        generator,
        audit.clone(),
        OrchestratorConfig {
            deadlines: fast_deadlines(),
            ..Default::default()
        },
    );

    let response = rag.run("What is the minimum reserve requirement?", None).await;

    assert!(response.error.is_none());
    assert!(response.retrieval_performed);
    let records = audit.records.lock().unwrap();
    assert_eq!(records[0].retrieval_decision.notes.as_deref(), Some("fallback"));
}

#[tokio::test]
async fn e6_deadline_expiry_resolves_on_the_completed_subset() {
    let passages: Vec<Passage> = (0..6).map(passage).collect();
    let mut scores = HashMap::new();
    for i in 0..6 {
        scores.insert(format!("passage-text-{i}"), CriticScores { isrel: 0.9, issup: 0.9, isuse: 0.9, notes: None });
    }
    let mut delays = HashMap::new();
    for i in 2..6 {
        delays.insert(format!("passage-text-{i}"), Duration::from_millis(500));
    }

    let critic = Arc::new(MockCritic {
        retrieve: true,
        decide_fails: false,
        scores_by_passage_text: scores,
    });
    let generator = Arc::new(MockGenerator {
        confidence: Confidence::High,
        follow_ups: vec!["Q1?".to_string(), "Q2?".to_string(), "Q3?".to_string()],
        delay_by_passage_text: delays,
    });
    let embedder = Arc::new(MockEmbedder { vector: vec![0.1; 8] });
    let index = Arc::new(MockVectorIndex { passages });
    let cross_encoder = Arc::new(IdentityCrossEncoder);
    let audit = Arc::new(CapturingAuditSink::default());

    let mut deadlines = fast_deadlines();
    deadlines.run = Duration::from_millis(40);

    let rag = SelfReflectiveRag::new(
        critic,
        embedder,
        index,
        cross_encoder,
        generator,
        audit.clone(),
        OrchestratorConfig {
            deadlines,
            ..Default::default()
        },
    );

    let response = rag.run("What is the minimum capital adequacy ratio?", None).await;

    // Candidates 0 and 1 complete well inside the 40ms run deadline; 2-5
    // are aborted mid-flight and never contribute a Candidate.
    assert!(response.retrieval_performed);
    let records = audit.records.lock().unwrap();
    let cancelled = records[0]
        .provenance_meta
        .as_ref()
        .and_then(|meta| meta.get("cancelled"))
        .and_then(|v| v.as_bool());
    assert_eq!(cancelled, Some(true));
}
