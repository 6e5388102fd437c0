//! `Generator` collaborator backed by a Groq-compatible chat model.

use std::str::FromStr;

use async_trait::async_trait;
use serde::Deserialize;

use credit_explain_core::{Answer, Citation, Confidence, Generator, Query, RankedPassage, Result};

use crate::groq::GroqClient;
use crate::prompts::{follow_up_prompt, generator_answer_prompt};

const MAX_FOLLOW_UPS: usize = 5;

fn default_follow_ups() -> Vec<String> {
    vec![
        "What specific regulation or clause does this answer rely on?".to_string(),
        "Are there any exceptions to this rule?".to_string(),
        "When was this requirement last updated?".to_string(),
        "Which entities does this requirement apply to?".to_string(),
        "Where can I find the official documentation for this rule?".to_string(),
    ]
}

#[derive(Deserialize)]
struct AnswerReply {
    explanation: String,
    #[serde(default)]
    citations: Vec<CitationReply>,
    confidence: String,
}

#[derive(Deserialize)]
struct CitationReply {
    doc_id: String,
    #[serde(default)]
    chunk_id: Option<String>,
    text_excerpt: String,
}

#[derive(Deserialize)]
struct FollowUpReply {
    questions: Vec<String>,
}

pub struct GroqGenerator {
    client: GroqClient,
}

impl GroqGenerator {
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
}

#[async_trait]
impl Generator for GroqGenerator {
    async fn answer(&self, query: &Query, passages: &[RankedPassage]) -> Result<Answer> {
        let prompt = generator_answer_prompt(query.text(), passages);
        let reply = match self.client.complete(&prompt, 768).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "generator call failed, returning empty-explanation standin");
                return Ok(Answer {
                    explanation: Answer::EMPTY_EXPLANATION_STANDIN.to_string(),
                    citations: vec![],
                    confidence: Confidence::Low,
                    follow_up_questions: None,
                    model_version: Some(self.client.model().to_string()),
                });
            }
        };

        match serde_json::from_str::<AnswerReply>(Self::extract_json(&reply)) {
            Ok(parsed) => {
                let explanation = if parsed.explanation.trim().is_empty() {
                    Answer::EMPTY_EXPLANATION_STANDIN.to_string()
                } else {
                    parsed.explanation
                };
                let confidence = Confidence::from_str(&parsed.confidence).unwrap_or_default();
                Ok(Answer {
                    explanation,
                    citations: parsed
                        .citations
                        .into_iter()
                        .map(|c| Citation {
                            doc_id: c.doc_id,
                            chunk_id: c.chunk_id,
                            text_excerpt: c.text_excerpt,
                        })
                        .collect(),
                    confidence,
                    follow_up_questions: None,
                    model_version: Some(self.client.model().to_string()),
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, raw = %reply, "generator reply failed to parse, falling back to raw text");
                Ok(Answer {
                    explanation: if reply.trim().is_empty() {
                        Answer::EMPTY_EXPLANATION_STANDIN.to_string()
                    } else {
                        reply
                    },
                    citations: vec![],
                    confidence: Confidence::Low,
                    follow_up_questions: None,
                    model_version: Some(self.client.model().to_string()),
                })
            }
        }
    }

    async fn followups(&self, query: &Query, answer: &Answer, passages: &[RankedPassage]) -> Result<Vec<String>> {
        let confidence = format!("{:?}", answer.confidence).to_uppercase();
        let prompt = follow_up_prompt(query.text(), &answer.explanation, passages.len(), &confidence);

        let reply = match self.client.complete(&prompt, 300).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "follow-up call failed, using default questions");
                return Ok(default_follow_ups());
            }
        };

        match serde_json::from_str::<FollowUpReply>(Self::extract_json(&reply)) {
            Ok(parsed) => {
                let mut questions = parsed.questions;
                questions.truncate(MAX_FOLLOW_UPS);
                if questions.is_empty() {
                    Ok(default_follow_ups())
                } else {
                    Ok(questions)
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "follow-up reply failed to parse, using default questions");
                Ok(default_follow_ups())
            }
        }
    }

    fn model_name(&self) -> &str {
        self.client.model()
    }
}
