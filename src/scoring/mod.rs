//! Pluggable scoring strategies
//!
//! Verification, risk assessment, and reward are pure functions behind
//! traits so a stub, a rule-based implementation, and a model-backed
//! implementation satisfy the same contract. The lifecycle engine never
//! depends on which is installed.
//!
//! ## Strategies
//!
//! - **VerificationScorer**: content -> quality score + pass/fail + confidence
//! - **RiskAssessor**: structured payload + context -> risk level + factors
//! - **RewardPolicy**: verified contribution -> reward amount

pub mod reward;
pub mod risk;
pub mod verifier;

pub use reward::{FlatReward, QualityScaledReward, RewardPolicy};
pub use risk::{RiskAssessor, WeightedRiskAssessor};
pub use verifier::{FixedScorer, HeuristicScorer, VerificationScorer};
