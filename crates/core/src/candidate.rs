//! The per-passage unit of work produced by stage S5 of the orchestrator.

use serde::{Deserialize, Serialize};

use crate::answer::Answer;
use crate::critic_scores::CriticScores;
use crate::passage::RankedPassage;

/// One processed `RankedPassage`: its generated answer, its critic scores,
/// and the resulting combined selection score.
///
/// `index` duplicates `passage.index` for convenience at the call sites
/// that sort and tie-break on it (see the Selector6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub passage: RankedPassage,
    pub answer: Answer,
    pub scores: CriticScores,
    pub combined: f32,
    pub index: usize,
}

impl Candidate {
    /// Order candidates for S6 Select: `combined` descending, then `issup`
    /// descending, then post-rerank `index` ascending. Used with
    /// `slice::sort_by` (never `sort_unstable_by`) so the ordering stays
    /// deterministic across otherwise-equal candidates.
    pub fn selection_order(a: &Candidate, b: &Candidate) -> std::cmp::Ordering {
        b.combined
            .partial_cmp(&a.combined)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.scores
                    .issup
                    .partial_cmp(&a.scores.issup)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.index.cmp(&b.index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::Confidence;
    use proptest::prelude::*;

    fn candidate(combined: f32, issup: f32, index: usize) -> Candidate {
        Candidate {
            passage: crate::passage::RankedPassage {
                passage: crate::passage::Passage {
                    id: format!("p{index}"),
                    text: String::new(),
                    metadata: Default::default(),
                    distance: 0.0,
                },
                rerank_score: 0.0,
                index,
            },
            answer: Answer {
                explanation: String::new(),
                citations: vec![],
                confidence: Confidence::Low,
                follow_up_questions: None,
                model_version: None,
            },
            scores: CriticScores {
                isrel: 0.0,
                issup,
                isuse: 0.0,
                notes: None,
            },
            combined,
            index,
        }
    }

    #[test]
    fn orders_by_combined_then_issup_then_index() {
        let mut candidates = vec![
            candidate(0.5, 0.9, 2),
            candidate(0.8, 0.1, 0),
            candidate(0.5, 0.95, 1),
        ];
        candidates.sort_by(Candidate::selection_order);
        let indices: Vec<usize> = candidates.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn monotonicity_never_prefers_lower_combined() {
        let higher = candidate(0.9, 0.1, 5);
        let lower = candidate(0.1, 0.99, 0);
        let mut candidates = vec![lower.clone(), higher.clone()];
        candidates.sort_by(Candidate::selection_order);
        assert_eq!(candidates[0].index, higher.index);
    }

    proptest! {
        /// Invariant 7: whenever `c1.combined > c2.combined`, the sort never
        /// places `c2` ahead of `c1`, for arbitrary combined/issup/index triples.
        #[test]
        fn never_selects_strictly_lower_combined_over_higher(
            c1 in (0.0f32..=1.0, 0.0f32..=1.0, 0usize..20),
            c2 in (0.0f32..=1.0, 0.0f32..=1.0, 0usize..20),
        ) {
            let a = candidate(c1.0, c1.1, c1.2);
            let b = candidate(c2.0, c2.1, c2.2);
            let mut candidates = vec![a.clone(), b.clone()];
            candidates.sort_by(Candidate::selection_order);

            if a.combined > b.combined {
                prop_assert_eq!(candidates[0].index, a.index);
            } else if b.combined > a.combined {
                prop_assert_eq!(candidates[0].index, b.index);
            }
        }
    }
}
