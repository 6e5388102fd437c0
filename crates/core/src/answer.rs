//! The Generator's output contract.

use serde::{Deserialize, Serialize};

/// Confidence the Generator assigns to an `Answer`.
///
/// `HIGH` is reserved for claims fully supported by multiple passages, per
/// the generator prompt contract; any value that fails to parse as one of
/// these three falls back to `MEDIUM`, never `HIGH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Default for Confidence {
    fn default() -> Self {
        Confidence::Medium
    }
}

impl std::str::FromStr for Confidence {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Ok(Confidence::High),
            "MEDIUM" => Ok(Confidence::Medium),
            "LOW" => Ok(Confidence::Low),
            _ => Err(()),
        }
    }
}

/// A citation backing a claim in an `Answer`'s explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub doc_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<String>,
    pub text_excerpt: String,
}

/// The structured, citation-bearing answer produced by the Generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub explanation: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_questions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

impl Answer {
    /// The canned stand-in used whenever the Generator produces an empty
    /// explanation (malformed reply, truncated output, etc).
    pub const EMPTY_EXPLANATION_STANDIN: &'static str =
        "The system was unable to produce an explanation for this query.";

    pub fn with_follow_ups(mut self, questions: Vec<String>) -> Self {
        self.follow_up_questions = Some(questions);
        self
    }
}
