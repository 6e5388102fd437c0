//! Critic scoring output and the retrieval-decision type.

use serde::{Deserialize, Serialize};

/// Per-passage critic scores, each clamped to `[0.0, 1.0]` on ingress.
///
/// - `isrel`: is the passage about the query topic at all?
/// - `issup`: does the passage evidence the specific claims in the answer?
/// - `isuse`: how useful would this passage be for a comprehensive answer?
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticScores {
    pub isrel: f32,
    pub issup: f32,
    pub isuse: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CriticScores {
    /// The documented fallback used when a Critic call fails or its reply
    /// cannot be parsed: all three axes at the midpoint.
    pub fn fallback(notes: impl Into<String>) -> Self {
        Self {
            isrel: 0.5,
            issup: 0.5,
            isuse: 0.5,
            notes: Some(notes.into()),
        }
    }

    /// Clamp each field to `[0.0, 1.0]`.
    pub fn clamped(mut self) -> Self {
        self.isrel = self.isrel.clamp(0.0, 1.0);
        self.issup = self.issup.clamp(0.0, 1.0);
        self.isuse = self.isuse.clamp(0.0, 1.0);
        self
    }

    /// Weighted combination used for candidate selection.
    pub fn combined(&self, weights: &SelectionWeights) -> f32 {
        weights.isrel * self.isrel + weights.issup * self.issup + weights.isuse * self.isuse
    }
}

/// Weights used to combine `CriticScores` into a single selection score.
///
/// Must sum to `1.0`.
#[derive(Debug, Clone, Copy)]
pub struct SelectionWeights {
    pub isrel: f32,
    pub issup: f32,
    pub isuse: f32,
}

impl Default for SelectionWeights {
    fn default() -> Self {
        Self {
            isrel: 0.45,
            issup: 0.40,
            isuse: 0.15,
        }
    }
}

impl SelectionWeights {
    /// `true` within floating-point tolerance of the required invariant
    /// `sum(weights) == 1.0`.
    pub fn is_normalized(&self) -> bool {
        (self.isrel + self.issup + self.isuse - 1.0).abs() <= 1e-6
    }
}

/// Whether the Critic believes retrieval is warranted for a query.
///
/// Defaults to `retrieve = true` (fail-open) whenever the Critic's reply is
/// missing, malformed, or times out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalDecision {
    pub retrieve: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl RetrievalDecision {
    pub fn fallback(notes: impl Into<String>) -> Self {
        Self {
            retrieve: true,
            notes: Some(notes.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_weights_sum_to_one() {
        assert!(SelectionWeights::default().is_normalized());
    }

    #[test]
    fn clamping_bounds_out_of_range_scores() {
        let scores = CriticScores {
            isrel: 1.5,
            issup: -0.2,
            isuse: 0.4,
            notes: None,
        }
        .clamped();
        assert_eq!(scores.isrel, 1.0);
        assert_eq!(scores.issup, 0.0);
        assert_eq!(scores.isuse, 0.4);
    }

    #[test]
    fn combined_matches_weighted_sum() {
        let scores = CriticScores {
            isrel: 0.9,
            issup: 0.85,
            isuse: 0.7,
            notes: None,
        };
        let combined = scores.combined(&SelectionWeights::default());
        assert!((combined - 0.850).abs() < 1e-6);
    }

    proptest! {
        /// Invariant 4: clamping always lands in `[0.0, 1.0]`, for any input.
        #[test]
        fn clamped_scores_always_within_unit_interval(
            isrel in any::<f32>(),
            issup in any::<f32>(),
            isuse in any::<f32>(),
        ) {
            let scores = CriticScores { isrel, issup, isuse, notes: None }.clamped();
            prop_assert!((0.0..=1.0).contains(&scores.isrel) || scores.isrel.is_nan());
            prop_assert!((0.0..=1.0).contains(&scores.issup) || scores.issup.is_nan());
            prop_assert!((0.0..=1.0).contains(&scores.isuse) || scores.isuse.is_nan());
        }

        /// Invariant 4: `combined` always equals the documented weighted sum
        /// to within floating-point tolerance, for any already-clamped input.
        #[test]
        fn combined_always_matches_weighted_sum(
            isrel in 0.0f32..=1.0,
            issup in 0.0f32..=1.0,
            isuse in 0.0f32..=1.0,
        ) {
            let scores = CriticScores { isrel, issup, isuse, notes: None };
            let weights = SelectionWeights::default();
            let combined = scores.combined(&weights);
            let expected = weights.isrel * isrel + weights.issup * issup + weights.isuse * isuse;
            prop_assert!((combined - expected).abs() <= 1e-6);
        }
    }
}
