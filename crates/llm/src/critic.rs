//! `Critic` collaborator backed by a Groq-compatible chat model.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use credit_explain_core::{Critic, CriticScores, Query, Result, RetrievalDecision};

use crate::groq::GroqClient;
use crate::prompts::{critic_retrieve_prompt, critic_score_prompt};

#[derive(Deserialize)]
struct RetrieveReply {
    retrieve: bool,
    #[serde(default)]
    notes: Option<String>,
}

pub struct GroqCritic {
    client: GroqClient,
}

impl GroqCritic {
    pub fn new(client: GroqClient) -> Self {
        Self { client }
    }

    fn extract_json(reply: &str) -> &str {
        let start = reply.find('{');
        let end = reply.rfind('}');
        match (start, end) {
            (Some(s), Some(e)) if e >= s => &reply[s..=e],
            _ => reply,
        }
    }

    /// Pull one score field out of a parsed reply object, coercing a
    /// numeric-looking string to a number, and defaulting a missing or
    /// non-numeric field to the midpoint independently of the other two —
    /// a single bad field must not discard the scores the model did return.
    fn coerce_score(object: Option<&serde_json::Map<String, Value>>, field: &str) -> f32 {
        const DEFAULT: f32 = 0.5;
        match object.and_then(|o| o.get(field)) {
            Some(Value::Number(n)) => n.as_f64().map(|f| f as f32).unwrap_or(DEFAULT),
            Some(Value::String(s)) => s.trim().parse::<f32>().unwrap_or(DEFAULT),
            _ => DEFAULT,
        }
    }
}

#[async_trait]
impl Critic for GroqCritic {
    async fn decide(&self, query: &Query) -> Result<RetrievalDecision> {
        let prompt = critic_retrieve_prompt(query.text());
        match self.client.complete(&prompt, 200).await {
            Ok(reply) => match serde_json::from_str::<RetrieveReply>(Self::extract_json(&reply)) {
                Ok(parsed) => Ok(RetrievalDecision {
                    retrieve: parsed.retrieve,
                    notes: parsed.notes,
                }),
                Err(e) => {
                    tracing::warn!(error = %e, "critic decide reply failed to parse, falling back to retrieve=true");
                    Ok(RetrievalDecision::fallback("unparseable critic reply"))
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "critic decide call failed, falling back to retrieve=true");
                Ok(RetrievalDecision::fallback("critic call failed"))
            }
        }
    }

    async fn score(&self, query: &Query, answer_text: &str, passage_text: &str) -> Result<CriticScores> {
        let prompt = critic_score_prompt(query.text(), answer_text, passage_text);
        match self.client.complete(&prompt, 300).await {
            Ok(reply) => match serde_json::from_str::<Value>(Self::extract_json(&reply)) {
                Ok(value) => {
                    let object = value.as_object();
                    let notes = object
                        .and_then(|o| o.get("notes"))
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string());
                    Ok(CriticScores {
                        isrel: Self::coerce_score(object, "isrel"),
                        issup: Self::coerce_score(object, "issup"),
                        isuse: Self::coerce_score(object, "isuse"),
                        notes,
                    }
                    .clamped())
                }
                Err(e) => {
                    tracing::warn!(error = %e, "critic score reply was not valid JSON, falling back to midpoint scores");
                    Ok(CriticScores::fallback("unparseable critic reply"))
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "critic score call failed, falling back to midpoint scores");
                Ok(CriticScores::fallback("critic call failed"))
            }
        }
    }

    fn model_name(&self) -> &str {
        self.client.model()
    }
}
