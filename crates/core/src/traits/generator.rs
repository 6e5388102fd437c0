//! Generator trait: drafts the grounded answer and follow-up questions.

use async_trait::async_trait;

use crate::answer::Answer;
use crate::error::Result;
use crate::passage::RankedPassage;
use crate::query::Query;

/// Drafts an answer grounded in the supplied passages, and proposes
/// follow-up questions once an answer has been selected.
///
/// `answer` must cite only passage ids present in `passages` — citing an
/// id absent from the supplied set is a contract violation the Orchestrator
/// is entitled to treat as a generation failure.
#[async_trait]
pub trait Generator: Send + Sync + 'static {
    async fn answer(&self, query: &Query, passages: &[RankedPassage]) -> Result<Answer>;

    async fn followups(
        &self,
        query: &Query,
        answer: &Answer,
        passages: &[RankedPassage],
    ) -> Result<Vec<String>>;

    fn model_name(&self) -> &str;
}
