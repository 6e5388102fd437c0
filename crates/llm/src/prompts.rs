//! Prompt templates for the Critic and Generator.
//!
//! Each template expects a single JSON object back, with no surrounding
//! commentary — callers parse-or-fallback rather than trust the model to
//! follow the instruction perfectly.

use credit_explain_core::RankedPassage;

/// Characters a query/answer/passage is truncated to before being
/// interpolated into a prompt.
pub const PROMPT_TRUNCATION_CHARS: usize = 2_000;

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

pub fn critic_retrieve_prompt(query: &str) -> String {
    let query = truncate(query, PROMPT_TRUNCATION_CHARS);
    format!(
        r#"You are a critic deciding whether an AI system needs to retrieve external documents to answer a query. The system answers questions about the following in-domain topics: banking regulations, credit/lending, KYC/AML, consumer protection, internal policies, risk management. Use the following rules:

- RETRIEVE (set true) if: the query is about specific facts, figures, regulations, clauses, policies, or events within these topics, or otherwise requires current, specific, or verifiable information.
- DO NOT RETRIEVE (set false) if: the query is a general greeting, a simple thank you, completely unrelated to these topics, or too broad/vague to be answered with documents.

QUERY: {query}

Return only a JSON object of this exact shape, nothing else:
{{"retrieve": true, "notes": "..."}}
If unsure, set retrieve = true."#
    )
}

pub fn critic_score_prompt(query: &str, answer: &str, passage: &str) -> String {
    let query = truncate(query, PROMPT_TRUNCATION_CHARS);
    let answer = truncate(answer, PROMPT_TRUNCATION_CHARS);
    let passage = truncate(passage, PROMPT_TRUNCATION_CHARS);
    format!(
        r#"You are a critic evaluating an AI's answer against a source passage. Score the answer on three criteria:

QUERY: {query}
GENERATED ANSWER: {answer}
SOURCE PASSAGE: {passage}

CRITERIA:
1. isrel (Relevance): 0.0-1.0. How relevant is the source passage to the original query? Ignore the answer.
2. issup (Support): 0.0-1.0. How well does the source passage support the specific claims in the generated answer? (1.0 = perfect support, 0.0 = contradiction or no support).
3. isuse (Utility): 0.0-1.0. How useful is this passage for forming a comprehensive and helpful answer to the query?

Return only a JSON object of this exact shape, nothing else:
{{"isrel": 0.9, "issup": 0.8, "isuse": 0.7, "notes": "..."}}"#
    )
}

pub fn generator_answer_prompt(query: &str, passages: &[RankedPassage]) -> String {
    let query = truncate(query, PROMPT_TRUNCATION_CHARS);
    let mut passages_block = String::new();
    for p in passages {
        let doc_type = p
            .passage
            .metadata
            .get("doc_type")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        let text = truncate(p.text(), 1000);
        passages_block.push_str(&format!("[ID: {} | Type: {doc_type}]\n{text}\n\n", p.id()));
    }
    format!(
        r#"You are an expert compliance analyst. Your task is to answer the user's query based ONLY on the provided passages.

USER'S QUERY: {query}

RELEVANT PASSAGES:
{passages_block}
INSTRUCTIONS:
1. Write a concise, evidence-backed explanation (maximum 6 sentences) to answer the query.
2. Every factual claim must be supported by an inline citation. Use the exact ID from the passage reference, like [doc123_chunk45].
3. Your entire response must be a valid JSON object in this exact format:
{{
  "explanation": "Your explanation with citations [doc123_chunk45] placed inline.",
  "citations": [
    {{"doc_id": "doc123", "chunk_id": "chunk45", "text_excerpt": "The exact sentence from the passage that supports the claim."}}
  ],
  "confidence": "HIGH|MEDIUM|LOW"
}}
4. Assess your confidence:
   - HIGH: the answer is directly and fully supported by multiple of the provided passages.
   - MEDIUM: the answer is partially supported or requires reasonable inference.
   - LOW: the passages are related but do not fully answer the query.

Do not include any other text, commentary, or chain-of-thought outside the JSON object."#
    )
}

pub fn follow_up_prompt(
    original_query: &str,
    answer_explanation: &str,
    passages_count: usize,
    confidence: &str,
) -> String {
    format!(
        r#"You are an expert compliance analyst. Based on the conversation context, generate relevant follow-up questions that a user might ask next.

CONTEXT:
- Original Query: {original_query}
- Answer Provided: {answer_explanation}
- Number of Supporting Passages: {passages_count}
- Answer Confidence: {confidence}

INSTRUCTIONS:
1. Generate 3-5 natural, helpful follow-up questions that dive deeper into the topic.
2. Questions should be based on the provided answer and likely user interests.
3. Make questions specific and actionable.
4. Return only a JSON object with a list of questions:
{{"questions": ["...", "..."]}}"#
    )
}
