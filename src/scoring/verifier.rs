//! Verification scoring strategies

use chrono::Utc;

use crate::contribution::VerificationOutcome;

/// Pure content-quality scorer.
///
/// Implementations must be deterministic for a given input and free of side
/// effects; the lifecycle engine may re-invoke them on retry.
pub trait VerificationScorer: Send + Sync {
    fn score(&self, content: &str) -> VerificationOutcome;
}

/// Rule-based scorer: substance (length) plus vocabulary diversity.
///
/// Not a quality model — a deterministic placeholder with the same contract,
/// so the real model drops in without orchestrator changes.
pub struct HeuristicScorer {
    pass_threshold: f64,
}

impl HeuristicScorer {
    pub fn new(pass_threshold: f64) -> Self {
        Self { pass_threshold }
    }
}

impl VerificationScorer for HeuristicScorer {
    fn score(&self, content: &str) -> VerificationOutcome {
        let words: Vec<&str> = content.split_whitespace().collect();
        let total = words.len();

        let length_component = (total as f64 / 120.0).min(1.0);

        let diversity_component = if total == 0 {
            0.0
        } else {
            let unique: std::collections::HashSet<String> =
                words.iter().map(|w| w.to_lowercase()).collect();
            unique.len() as f64 / total as f64
        };

        let score = (0.6 * length_component + 0.4 * diversity_component).clamp(0.0, 1.0);
        let passed = score >= self.pass_threshold;

        // Confidence grows with sample size: short content is a weak signal
        let confidence = (0.5 + 0.45 * length_component).min(0.95);

        VerificationOutcome {
            score,
            passed,
            confidence,
            rationale: format!(
                "{} words, length {:.2}, diversity {:.2}, threshold {:.2}",
                total, length_component, diversity_component, self.pass_threshold
            ),
            at: Utc::now(),
        }
    }
}

/// Fixed-outcome scorer for tests and wiring checks
pub struct FixedScorer {
    score: f64,
    confidence: f64,
    pass_threshold: f64,
}

impl FixedScorer {
    pub fn new(score: f64, pass_threshold: f64) -> Self {
        Self {
            score,
            confidence: 0.9,
            pass_threshold,
        }
    }
}

impl VerificationScorer for FixedScorer {
    fn score(&self, _content: &str) -> VerificationOutcome {
        VerificationOutcome {
            score: self.score,
            passed: self.score >= self.pass_threshold,
            confidence: self.confidence,
            rationale: "fixed outcome".to_string(),
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_content_scores_zero() {
        let scorer = HeuristicScorer::new(0.5);
        let outcome = scorer.score("");
        assert_eq!(outcome.score, 0.0);
        assert!(!outcome.passed);
    }

    #[test]
    fn test_repetitive_content_scores_low() {
        let scorer = HeuristicScorer::new(0.5);
        let outcome = scorer.score("spam spam spam spam spam spam");
        assert!(outcome.score < 0.3, "got {}", outcome.score);
        assert!(!outcome.passed);
    }

    #[test]
    fn test_substantial_content_passes() {
        let scorer = HeuristicScorer::new(0.5);
        let content = (0..150)
            .map(|i| format!("word{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let outcome = scorer.score(&content);
        assert!(outcome.passed, "score {}", outcome.score);
        assert!(outcome.score <= 1.0);
        assert!(outcome.confidence <= 0.95);
    }

    #[test]
    fn test_scorer_is_deterministic() {
        let scorer = HeuristicScorer::new(0.5);
        let a = scorer.score("the quick brown fox jumps over the lazy dog");
        let b = scorer.score("the quick brown fox jumps over the lazy dog");
        assert_eq!(a.score, b.score);
        assert_eq!(a.passed, b.passed);
    }

    #[test]
    fn test_fixed_scorer_respects_threshold() {
        let low = FixedScorer::new(0.2, 0.5).score("anything");
        assert!(!low.passed);
        let high = FixedScorer::new(0.8, 0.5).score("anything");
        assert!(high.passed);
    }
}
