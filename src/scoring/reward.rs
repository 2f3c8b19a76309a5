//! Reward policy strategies

use crate::contribution::Contribution;

/// Pure reward computation for a verified contribution.
///
/// The formula is deliberately configuration, not code: implementations are
/// swappable and the amounts they use come from `Args`.
pub trait RewardPolicy: Send + Sync {
    fn reward(&self, contribution: &Contribution) -> f64;
}

/// Base amount scaled by the latest quality score
pub struct QualityScaledReward {
    base: f64,
}

impl QualityScaledReward {
    pub fn new(base: f64) -> Self {
        Self { base }
    }
}

impl RewardPolicy for QualityScaledReward {
    fn reward(&self, contribution: &Contribution) -> f64 {
        let score = contribution.quality_score.unwrap_or(0.0);
        self.base * score.clamp(0.0, 1.0)
    }
}

/// Fixed amount regardless of quality, for tests and wiring checks
pub struct FlatReward {
    amount: f64,
}

impl FlatReward {
    pub fn new(amount: f64) -> Self {
        Self { amount }
    }
}

impl RewardPolicy for FlatReward {
    fn reward(&self, _contribution: &Contribution) -> f64 {
        self.amount
    }
}
