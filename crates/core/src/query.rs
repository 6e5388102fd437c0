//! The inbound question the orchestrator answers.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A natural-language question, optionally scoped to a case.
///
/// Immutable once constructed — `Query::new` is the only way to produce one,
/// and it enforces the non-empty-after-trim precondition from the
/// Orchestrator's S0 start state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    text: String,
    case_id: Option<String>,
}

impl Query {
    /// Build a `Query`, trimming `text` and rejecting it if empty.
    pub fn new(text: impl Into<String>, case_id: Option<String>) -> Result<Self> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation("query text must be non-empty".to_string()));
        }
        Ok(Self {
            text: trimmed.to_string(),
            case_id,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn case_id(&self) -> Option<&str> {
        self.case_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_after_trim() {
        assert!(Query::new("   \n\t  ", None).is_err());
        assert!(Query::new("", None).is_err());
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let q = Query::new("  What is KYC?  ", Some("case-1".to_string())).unwrap();
        assert_eq!(q.text(), "What is KYC?");
        assert_eq!(q.case_id(), Some("case-1"));
    }
}
