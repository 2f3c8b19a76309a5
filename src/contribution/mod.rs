//! Contribution domain: entity model, storage, and the lifecycle engine
//!
//! ## Modules
//!
//! - `model` - the Contribution entity, lifecycle states, and artifacts
//! - `store` - storage trait with optimistic compare-and-set transitions
//! - `lifecycle` - the orchestrator driving contributions through the state machine

pub mod lifecycle;
pub mod model;
pub mod store;

pub use lifecycle::{LifecycleConfig, LifecycleEngine};
pub use model::{
    Contribution, ContributionId, LifecycleState, RiskAssessment, RiskFactor, RiskLevel,
    SyncOutcome, SyncResult, VerificationOutcome,
};
pub use store::{ContributionStore, InMemoryContributionStore, StateChange};
