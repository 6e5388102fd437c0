//! `SelfReflectiveRag`: the orchestrator driving the retrieval-decision,
//! rerank, per-candidate fan-out, selection, and follow-up state machine.
//!
//! Every public call goes through [`SelfReflectiveRag::run`], which never
//! panics and never returns an `Err` — every branch terminates in a
//! [`Response`], with a matching [`AuditRecord`] durably written (or a
//! best-effort attempt logged on failure) before the response is returned.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use credit_explain_core::{
    Answer, AuditCandidate, AuditRecord, AuditSink, Candidate, Confidence, Critic, CriticScores,
    CrossEncoder, Embedder, Generator, ModelVersions, Passage, Query, RankedPassage,
    RetrievalDecision, Response, RunError, RunStatus, VectorIndex,
};
use serde_json::json;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::config::OrchestratorConfig;
use crate::followups::default_followups;

/// Holds the run-scoped identifiers threaded through every terminal state,
/// so the per-terminal builder methods don't each take a five-argument
/// preamble.
struct RunCtx {
    run_id: String,
    timestamp: DateTime<Utc>,
    start: Instant,
    case_id: Option<String>,
}

impl RunCtx {
    fn latency_s(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// The self-reflective RAG orchestrator. Holds `Arc`-shared collaborator
/// clients constructed once at service startup and an immutable
/// [`OrchestratorConfig`]; safe to share across concurrently executing
/// `run()` calls.
pub struct SelfReflectiveRag {
    critic: Arc<dyn Critic>,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    cross_encoder: Arc<dyn CrossEncoder>,
    generator: Arc<dyn Generator>,
    audit_sink: Arc<dyn AuditSink>,
    config: OrchestratorConfig,
}

impl SelfReflectiveRag {
    pub fn new(
        critic: Arc<dyn Critic>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        cross_encoder: Arc<dyn CrossEncoder>,
        generator: Arc<dyn Generator>,
        audit_sink: Arc<dyn AuditSink>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            critic,
            embedder,
            index,
            cross_encoder,
            generator,
            audit_sink,
            config,
        }
    }

    fn model_versions(&self) -> ModelVersions {
        ModelVersions {
            critic: Some(self.critic.model_name().to_string()),
            generator: Some(self.generator.model_name().to_string()),
            embedding: Some(self.embedder.model_name().to_string()),
        }
    }

    /// The single public entry point. Drives S0 through whichever terminal
    /// state the query resolves to.
    #[tracing::instrument(skip(self, case_id), fields(run_id = tracing::field::Empty))]
    pub async fn run(&self, query_text: &str, case_id: Option<String>) -> Response {
        let ctx = RunCtx {
            run_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            start: Instant::now(),
            case_id: case_id.clone(),
        };
        tracing::Span::current().record("run_id", tracing::field::display(&ctx.run_id));
        tracing::info!(stage = "S0", "run started");

        // Charged from S0, not from wherever retrieval happens to land, so
        // the documented per-run bound holds regardless of how much of the
        // budget S1/S3 already spent.
        let pipeline_deadline = ctx.start + self.config.deadlines.run;

        // S0/precondition: query.text must be non-empty after trimming.
        let query = match Query::new(query_text, case_id) {
            Ok(q) => q,
            Err(_) => return self.bad_request(ctx).await,
        };

        // S1 DecideRetrieve
        let decision = self.decide_retrieve(&query).await;
        tracing::info!(stage = "S1", retrieve = decision.retrieve, "retrieval decision");

        if !decision.retrieve {
            return self.generate_without_context(ctx, query, decision).await;
        }

        // S3 Retrieve: embed.
        let embedding = match tokio::time::timeout(
            self.config.deadlines.embedder,
            self.embedder.embed(query.text()),
        )
        .await
        {
            Ok(Ok(v)) => v,
            Ok(Err(e)) => {
                return self
                    .pipeline_error(ctx, query, decision, format!("embedder error: {e}"))
                    .await
            }
            Err(_) => {
                return self
                    .pipeline_error(ctx, query, decision, "embedder call timed out".to_string())
                    .await
            }
        };

        if embedding.is_empty() {
            return self.empty_retrieval(ctx, query, decision).await;
        }

        // S3 Retrieve: search.
        let passages = match tokio::time::timeout(
            self.config.deadlines.index,
            self.index.search(&embedding, self.config.top_k, None),
        )
        .await
        {
            Ok(Ok(p)) => p,
            Ok(Err(e)) => {
                return self
                    .pipeline_error(ctx, query, decision, format!("vector index error: {e}"))
                    .await
            }
            Err(_) => {
                return self
                    .pipeline_error(ctx, query, decision, "vector index call timed out".to_string())
                    .await
            }
        };

        if passages.is_empty() {
            return self.empty_retrieval(ctx, query, decision).await;
        }
        let retrieved_count = passages.len();
        tracing::info!(stage = "S3", retrieved_count, "retrieval complete");

        // S4 Rerank.
        let (ranked, rerank_failed) = match tokio::time::timeout(
            self.config.deadlines.rerank,
            self.cross_encoder
                .rerank(query.text(), passages.clone(), self.config.top_n),
        )
        .await
        {
            Ok(Ok(r)) => (r, false),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "rerank failed, falling back to distance order");
                (Self::fallback_rerank(passages, self.config.top_n), true)
            }
            Err(_) => {
                tracing::warn!("rerank timed out, falling back to distance order");
                (Self::fallback_rerank(passages, self.config.top_n), true)
            }
        };
        tracing::info!(stage = "S4", top_n = ranked.len(), rerank_failed, "rerank complete");

        // S5 PerCandidate (bounded concurrency, deadline-aware).
        let (candidates, cancelled) = self.run_candidates(&query, &ranked, pipeline_deadline).await;
        tracing::info!(
            stage = "S5",
            survived = candidates.len(),
            cancelled,
            "per-candidate processing complete"
        );

        // S6 Select.
        if candidates.is_empty() {
            return self
                .processing_failure(ctx, query, decision, retrieved_count, &ranked, rerank_failed, cancelled)
                .await;
        }

        let mut sorted = candidates;
        sorted.sort_by(Candidate::selection_order);
        let best = sorted[0].clone();
        tracing::info!(stage = "S6", selected_index = best.index, combined = best.combined, "candidate selected");

        if best.scores.issup < self.config.support_threshold {
            return self
                .insufficient_support(
                    ctx,
                    query,
                    decision,
                    retrieved_count,
                    &ranked,
                    &sorted,
                    &best,
                    rerank_failed,
                    cancelled,
                )
                .await;
        }

        // S7 FollowUps.
        let follow_ups = match tokio::time::timeout(
            self.config.deadlines.generator,
            self.generator.followups(&query, &best.answer, &ranked),
        )
        .await
        {
            Ok(Ok(qs)) if !qs.is_empty() => qs.into_iter().take(5).collect(),
            _ => default_followups(),
        };

        let mut answer = best.answer.clone();
        answer = answer.with_follow_ups(follow_ups);

        // S8 Success.
        self.success(
            ctx,
            query,
            decision,
            retrieved_count,
            &ranked,
            &sorted,
            &best,
            answer,
            rerank_failed,
            cancelled,
        )
        .await
    }

    async fn decide_retrieve(&self, query: &Query) -> RetrievalDecision {
        match tokio::time::timeout(self.config.deadlines.critic, self.critic.decide(query)).await {
            Ok(Ok(decision)) => decision,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "critic decide failed, defaulting to retrieve=true");
                RetrievalDecision::fallback("fallback")
            }
            Err(_) => {
                tracing::warn!("critic decide timed out, defaulting to retrieve=true");
                RetrievalDecision::fallback("fallback")
            }
        }
    }

    /// Sort by ascending `distance` and take the first `top_n` as a
    /// deterministic substitute ranking when the cross-encoder is
    /// unavailable. `rerank_score` is set to `-distance` so "higher is more
    /// relevant" still holds for the fallback scores.
    fn fallback_rerank(passages: Vec<Passage>, top_n: usize) -> Vec<RankedPassage> {
        let mut sorted = passages;
        sorted.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
        sorted.truncate(top_n);
        sorted
            .into_iter()
            .enumerate()
            .map(|(index, passage)| RankedPassage {
                rerank_score: -passage.distance,
                passage,
                index,
            })
            .collect()
    }

    /// S5: fan out one task per ranked passage, bounded to `top_n`
    /// in-flight workers by a semaphore, collecting completed candidates
    /// until either every task finishes or the overall run deadline
    /// elapses. On deadline, outstanding tasks are aborted and whatever
    /// candidates completed first are kept.
    async fn run_candidates(
        &self,
        query: &Query,
        ranked: &[RankedPassage],
        deadline: Instant,
    ) -> (Vec<Candidate>, bool) {
        let semaphore = Arc::new(Semaphore::new(self.config.top_n.max(1)));
        let mut set = JoinSet::new();

        for rp in ranked.iter().cloned() {
            let generator = Arc::clone(&self.generator);
            let critic = Arc::clone(&self.critic);
            let query = query.clone();
            let weights = self.config.weights;
            let generator_timeout = self.config.deadlines.generator;
            let critic_timeout = self.config.deadlines.critic;
            let sem = Arc::clone(&semaphore);

            set.spawn(async move {
                let _permit = sem.acquire_owned().await.expect("semaphore never closed");
                Self::process_candidate(generator, critic, query, rp, weights, generator_timeout, critic_timeout).await
            });
        }

        let mut candidates = Vec::new();
        let mut cancelled = false;
        let mut aborted = false;

        loop {
            if set.is_empty() {
                break;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() && !aborted {
                cancelled = true;
                aborted = true;
                set.abort_all();
            }
            // Once aborted, keep draining with no further wait: every
            // outstanding task is already being cancelled and will resolve
            // to a JoinError almost immediately.
            let next = if aborted {
                set.join_next().await
            } else {
                match tokio::time::timeout(remaining, set.join_next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        cancelled = true;
                        aborted = true;
                        set.abort_all();
                        continue;
                    }
                }
            };
            match next {
                Some(Ok(Some(candidate))) => candidates.push(candidate),
                Some(Ok(None)) => {}
                Some(Err(join_err)) => {
                    if !join_err.is_cancelled() {
                        tracing::warn!(error = %join_err, "candidate task panicked");
                    }
                }
                None => break,
            }
        }

        (candidates, cancelled)
    }

    /// One passage's worth of S5 work: generate, then score, dropping the
    /// candidate only if both steps failed.
    async fn process_candidate(
        generator: Arc<dyn Generator>,
        critic: Arc<dyn Critic>,
        query: Query,
        ranked: RankedPassage,
        weights: credit_explain_core::SelectionWeights,
        generator_timeout: std::time::Duration,
        critic_timeout: std::time::Duration,
    ) -> Option<Candidate> {
        let passages = std::slice::from_ref(&ranked);
        let gen_result = tokio::time::timeout(generator_timeout, generator.answer(&query, passages)).await;

        let (answer, generation_failed) = match gen_result {
            Ok(Ok(answer)) => (answer, false),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, passage = ranked.id(), "generator failed for candidate");
                (Self::fallback_answer(), true)
            }
            Err(_) => {
                tracing::warn!(passage = ranked.id(), "generator timed out for candidate");
                (Self::fallback_answer(), true)
            }
        };

        let score_result = tokio::time::timeout(
            critic_timeout,
            critic.score(&query, &answer.explanation, ranked.text()),
        )
        .await;

        let (scores, scoring_failed) = match score_result {
            Ok(Ok(s)) => (s.clamped(), false),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, passage = ranked.id(), "critic scoring failed for candidate");
                (CriticScores::fallback("critic call failed"), true)
            }
            Err(_) => {
                tracing::warn!(passage = ranked.id(), "critic scoring timed out for candidate");
                (CriticScores::fallback("critic call timed out"), true)
            }
        };

        if generation_failed && scoring_failed {
            return None;
        }

        let combined = scores.combined(&weights);
        let index = ranked.index;
        Some(Candidate {
            passage: ranked,
            answer,
            scores,
            combined,
            index,
        })
    }

    fn fallback_answer() -> Answer {
        Answer {
            explanation: Answer::EMPTY_EXPLANATION_STANDIN.to_string(),
            citations: vec![],
            confidence: Confidence::Low,
            follow_up_questions: None,
            model_version: None,
        }
    }

    fn audit_candidates(ranked: &[RankedPassage], candidates: &[Candidate]) -> Vec<AuditCandidate> {
        let by_index: HashMap<usize, &Candidate> = candidates.iter().map(|c| (c.index, c)).collect();
        ranked
            .iter()
            .map(|rp| {
                let scored = by_index.get(&rp.index);
                AuditCandidate {
                    candidate_id: rp.id().to_string(),
                    doc_text_preview: AuditCandidate::preview(rp.text()),
                    metadata: rp.passage.metadata.clone(),
                    retrieval_score: rp.passage.distance,
                    rerank_score: Some(rp.rerank_score),
                    isrel_score: scored.map(|c| c.scores.isrel),
                    issup_score: scored.map(|c| c.scores.issup),
                    isuse_score: scored.map(|c| c.scores.isuse),
                }
            })
            .collect()
    }

    async fn write_audit(&self, record: AuditRecord) -> String {
        match tokio::time::timeout(self.config.deadlines.audit, self.audit_sink.write(&record)).await {
            Ok(Ok(audit_id)) => audit_id,
            Ok(Err(e)) => {
                tracing::error!(error = %e, run_id = %record.run_id, "audit sink write failed");
                String::new()
            }
            Err(_) => {
                tracing::error!(run_id = %record.run_id, "audit sink write timed out");
                String::new()
            }
        }
    }

    // ---- Terminal states -------------------------------------------------

    async fn bad_request(&self, ctx: RunCtx) -> Response {
        let answer = Answer {
            explanation: "The query text must be non-empty.".to_string(),
            citations: vec![],
            confidence: Confidence::Low,
            follow_up_questions: None,
            model_version: None,
        };
        let record = AuditRecord {
            run_id: ctx.run_id.clone(),
            timestamp: ctx.timestamp,
            case_id: ctx.case_id.clone(),
            query: String::new(),
            retrieval_decision: RetrievalDecision {
                retrieve: false,
                notes: Some("not evaluated: bad_request".to_string()),
            },
            retrieval_performed: false,
            retrieved_count: 0,
            top_candidates: vec![],
            rerank_scores: vec![],
            selected_candidate_index: None,
            selected_candidate_scores: None,
            confidence: Confidence::Low,
            result: json!({ "explanation": answer.explanation }),
            follow_up_questions: vec![],
            latency_s: ctx.latency_s(),
            model_versions: ModelVersions::default(),
            error: Some(RunError::BadRequest),
            status: RunStatus::Error,
            provenance_meta: None,
        };
        let audit_id = self.write_audit(record).await;
        Response {
            run_id: ctx.run_id,
            answer,
            provenance_meta: None,
            audit_id,
            retrieval_performed: false,
            processing_time: ctx.latency_s(),
            error: Some(RunError::BadRequest.as_str().to_string()),
        }
    }

    async fn generate_without_context(&self, ctx: RunCtx, query: Query, decision: RetrievalDecision) -> Response {
        let answer = match tokio::time::timeout(self.config.deadlines.generator, self.generator.answer(&query, &[])).await
        {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "generator failed in no-retrieval branch");
                Self::fallback_answer()
            }
            Err(_) => {
                tracing::warn!("generator timed out in no-retrieval branch");
                Self::fallback_answer()
            }
        };

        let record = AuditRecord {
            run_id: ctx.run_id.clone(),
            timestamp: ctx.timestamp,
            case_id: ctx.case_id.clone(),
            query: query.text().to_string(),
            retrieval_decision: decision,
            retrieval_performed: false,
            retrieved_count: 0,
            top_candidates: vec![],
            rerank_scores: vec![],
            selected_candidate_index: None,
            selected_candidate_scores: None,
            confidence: answer.confidence,
            result: json!(answer),
            follow_up_questions: answer.follow_up_questions.clone().unwrap_or_default(),
            latency_s: ctx.latency_s(),
            model_versions: self.model_versions(),
            error: None,
            status: RunStatus::Success,
            provenance_meta: None,
        };
        let audit_id = self.write_audit(record).await;
        Response {
            run_id: ctx.run_id,
            answer,
            provenance_meta: None,
            audit_id,
            retrieval_performed: false,
            processing_time: ctx.latency_s(),
            error: None,
        }
    }

    async fn empty_retrieval(&self, ctx: RunCtx, query: Query, decision: RetrievalDecision) -> Response {
        let answer = Answer {
            explanation: "No relevant documents were found in the index for this query.".to_string(),
            citations: vec![],
            confidence: Confidence::Low,
            follow_up_questions: None,
            model_version: None,
        };
        let record = AuditRecord {
            run_id: ctx.run_id.clone(),
            timestamp: ctx.timestamp,
            case_id: ctx.case_id.clone(),
            query: query.text().to_string(),
            retrieval_decision: decision,
            retrieval_performed: true,
            retrieved_count: 0,
            top_candidates: vec![],
            rerank_scores: vec![],
            selected_candidate_index: None,
            selected_candidate_scores: None,
            confidence: Confidence::Low,
            result: json!({ "explanation": answer.explanation }),
            follow_up_questions: vec![],
            latency_s: ctx.latency_s(),
            model_versions: self.model_versions(),
            error: Some(RunError::EmptyRetrieval),
            status: RunStatus::Error,
            provenance_meta: None,
        };
        let audit_id = self.write_audit(record).await;
        Response {
            run_id: ctx.run_id,
            answer,
            provenance_meta: None,
            audit_id,
            retrieval_performed: true,
            processing_time: ctx.latency_s(),
            error: Some(RunError::EmptyRetrieval.as_str().to_string()),
        }
    }

    async fn pipeline_error(&self, ctx: RunCtx, query: Query, decision: RetrievalDecision, message: String) -> Response {
        tracing::error!(error = %message, "pipeline error");
        let answer = Answer {
            explanation: "An unexpected error occurred while processing this query.".to_string(),
            citations: vec![],
            confidence: Confidence::Low,
            follow_up_questions: None,
            model_version: None,
        };
        let record = AuditRecord {
            run_id: ctx.run_id.clone(),
            timestamp: ctx.timestamp,
            case_id: ctx.case_id.clone(),
            query: query.text().to_string(),
            retrieval_decision: decision,
            retrieval_performed: false,
            retrieved_count: 0,
            top_candidates: vec![],
            rerank_scores: vec![],
            selected_candidate_index: None,
            selected_candidate_scores: None,
            confidence: Confidence::Low,
            result: json!({ "explanation": answer.explanation }),
            follow_up_questions: vec![],
            latency_s: ctx.latency_s(),
            model_versions: self.model_versions(),
            error: Some(RunError::PipelineError),
            status: RunStatus::Error,
            provenance_meta: Some(json!({ "detail": message })),
        };
        let audit_id = self.write_audit(record).await;
        Response {
            run_id: ctx.run_id,
            answer,
            provenance_meta: None,
            audit_id,
            retrieval_performed: false,
            processing_time: ctx.latency_s(),
            error: Some(RunError::PipelineError.as_str().to_string()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn processing_failure(
        &self,
        ctx: RunCtx,
        query: Query,
        decision: RetrievalDecision,
        retrieved_count: usize,
        ranked: &[RankedPassage],
        rerank_failed: bool,
        cancelled: bool,
    ) -> Response {
        let answer = Answer {
            explanation: "Every candidate passage failed generation and scoring; no answer could be produced."
                .to_string(),
            citations: vec![],
            confidence: Confidence::Low,
            follow_up_questions: None,
            model_version: None,
        };
        let top_candidates = Self::audit_candidates(ranked, &[]);
        let rerank_scores = ranked.iter().map(|r| r.rerank_score).collect();
        let record = AuditRecord {
            run_id: ctx.run_id.clone(),
            timestamp: ctx.timestamp,
            case_id: ctx.case_id.clone(),
            query: query.text().to_string(),
            retrieval_decision: decision,
            retrieval_performed: true,
            retrieved_count,
            top_candidates,
            rerank_scores,
            selected_candidate_index: None,
            selected_candidate_scores: None,
            confidence: Confidence::Low,
            result: json!({ "explanation": answer.explanation }),
            follow_up_questions: vec![],
            latency_s: ctx.latency_s(),
            model_versions: self.model_versions(),
            error: Some(RunError::ProcessingFailure),
            status: RunStatus::Error,
            provenance_meta: Some(json!({ "rerank_failed": rerank_failed, "cancelled": cancelled })),
        };
        let audit_id = self.write_audit(record).await;
        Response {
            run_id: ctx.run_id,
            answer,
            provenance_meta: None,
            audit_id,
            retrieval_performed: true,
            processing_time: ctx.latency_s(),
            error: Some(RunError::ProcessingFailure.as_str().to_string()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn insufficient_support(
        &self,
        ctx: RunCtx,
        query: Query,
        decision: RetrievalDecision,
        retrieved_count: usize,
        ranked: &[RankedPassage],
        candidates: &[Candidate],
        best: &Candidate,
        rerank_failed: bool,
        cancelled: bool,
    ) -> Response {
        let mut answer = best.answer.clone();
        answer.confidence = Confidence::Low;
        answer.follow_up_questions = Some(default_followups());

        let top_candidates = Self::audit_candidates(ranked, candidates);
        let rerank_scores = ranked.iter().map(|r| r.rerank_score).collect();
        let record = AuditRecord {
            run_id: ctx.run_id.clone(),
            timestamp: ctx.timestamp,
            case_id: ctx.case_id.clone(),
            query: query.text().to_string(),
            retrieval_decision: decision,
            retrieval_performed: true,
            retrieved_count,
            top_candidates,
            rerank_scores,
            selected_candidate_index: Some(best.index),
            selected_candidate_scores: Some(best.scores.clone()),
            confidence: Confidence::Low,
            result: json!(answer),
            follow_up_questions: answer.follow_up_questions.clone().unwrap_or_default(),
            latency_s: ctx.latency_s(),
            model_versions: self.model_versions(),
            error: Some(RunError::InsufficientSupport),
            status: RunStatus::Error,
            provenance_meta: Some(json!({
                "rerank_failed": rerank_failed,
                "cancelled": cancelled,
                "best_issup": best.scores.issup,
                "support_threshold": self.config.support_threshold,
            })),
        };
        let audit_id = self.write_audit(record).await;
        Response {
            run_id: ctx.run_id,
            answer,
            provenance_meta: None,
            audit_id,
            retrieval_performed: true,
            processing_time: ctx.latency_s(),
            error: Some(RunError::InsufficientSupport.as_str().to_string()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn success(
        &self,
        ctx: RunCtx,
        query: Query,
        decision: RetrievalDecision,
        retrieved_count: usize,
        ranked: &[RankedPassage],
        candidates: &[Candidate],
        best: &Candidate,
        answer: Answer,
        rerank_failed: bool,
        cancelled: bool,
    ) -> Response {
        let top_candidates = Self::audit_candidates(ranked, candidates);
        let rerank_scores = ranked.iter().map(|r| r.rerank_score).collect();
        let provenance_meta = json!({
            "used_chunks": [best.passage.id()],
            "rerank_failed": rerank_failed,
            "cancelled": cancelled,
        });
        let record = AuditRecord {
            run_id: ctx.run_id.clone(),
            timestamp: ctx.timestamp,
            case_id: ctx.case_id.clone(),
            query: query.text().to_string(),
            retrieval_decision: decision,
            retrieval_performed: true,
            retrieved_count,
            top_candidates,
            rerank_scores,
            selected_candidate_index: Some(best.index),
            selected_candidate_scores: Some(best.scores.clone()),
            confidence: answer.confidence,
            result: json!(answer),
            follow_up_questions: answer.follow_up_questions.clone().unwrap_or_default(),
            latency_s: ctx.latency_s(),
            model_versions: self.model_versions(),
            error: None,
            status: RunStatus::Success,
            provenance_meta: Some(provenance_meta.clone()),
        };
        let audit_id = self.write_audit(record).await;
        Response {
            run_id: ctx.run_id,
            answer,
            provenance_meta: Some(provenance_meta),
            audit_id,
            retrieval_performed: true,
            processing_time: ctx.latency_s(),
            error: None,
        }
    }
}
