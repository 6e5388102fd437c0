//! The built-in follow-up question list, used whenever `Generator::followups`
//! fails or returns nothing and as the starting point for the
//! insufficient-support terminal's response.

/// Five generic domain questions, independent of any specific query —
/// the orchestrator's own safety net, distinct from (but shaped like) the
/// Generator adapter's identical default list.
pub fn default_followups() -> Vec<String> {
    vec![
        "What specific regulation or clause does this answer rely on?".to_string(),
        "Are there any exceptions to this rule?".to_string(),
        "When was this requirement last updated?".to_string(),
        "Which entities or institutions does this requirement apply to?".to_string(),
        "Where can I find the official documentation for this rule?".to_string(),
    ]
}
