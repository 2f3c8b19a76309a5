//! Contribution storage
//!
//! [`ContributionStore`] owns contribution records and the optimistic
//! state-transition primitive; it carries no business logic. The lifecycle
//! engine computes a [`StateChange`] and submits it with the record version
//! it read — a version mismatch means another caller won the race, and the
//! submitted change is discarded without partial effects.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;

use super::model::{
    Contribution, ContributionId, LifecycleState, RiskAssessment, SyncResult, VerificationOutcome,
};
use crate::types::{ArborError, Result};

// ============================================================================
// State change
// ============================================================================

/// One atomic state transition plus the artifact that produced it.
///
/// The persisted state and its artifact are never visible independently:
/// a contribution showing `VERIFIED` always has the outcome attached.
#[derive(Debug, Clone, Default)]
pub struct StateChange {
    pub to: Option<LifecycleState>,
    pub processed: Option<serde_json::Value>,
    pub verification: Option<VerificationOutcome>,
    pub risk: Option<RiskAssessment>,
    pub sync_results: Vec<SyncResult>,
    pub reward: Option<f64>,
    pub failure: Option<String>,
}

impl StateChange {
    /// Change targeting the given lifecycle state
    pub fn into_state(to: LifecycleState) -> Self {
        Self {
            to: Some(to),
            ..Self::default()
        }
    }

    pub fn with_processed(mut self, payload: serde_json::Value) -> Self {
        self.processed = Some(payload);
        self
    }

    pub fn with_verification(mut self, outcome: VerificationOutcome) -> Self {
        self.verification = Some(outcome);
        self
    }

    pub fn with_risk(mut self, risk: RiskAssessment) -> Self {
        self.risk = Some(risk);
        self
    }

    pub fn with_sync_results(mut self, results: Vec<SyncResult>) -> Self {
        self.sync_results = results;
        self
    }

    pub fn with_reward(mut self, amount: f64) -> Self {
        self.reward = Some(amount);
        self
    }

    pub fn with_failure(mut self, kind: impl Into<String>) -> Self {
        self.failure = Some(kind.into());
        self
    }
}

// ============================================================================
// Store trait
// ============================================================================

/// Durable keyed storage for contribution records
#[async_trait]
pub trait ContributionStore: Send + Sync {
    /// Persist a freshly created record
    async fn insert(&self, contribution: Contribution) -> Result<()>;

    /// Load a record by id
    async fn get(&self, id: &ContributionId) -> Result<Contribution>;

    /// All records submitted by a user, newest first
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Contribution>>;

    /// Record counts per lifecycle state (status reporting)
    async fn state_counts(&self) -> Result<HashMap<String, usize>>;

    /// Apply a state transition if and only if the record version still
    /// matches `expected_version`. Returns the updated record, or
    /// [`ArborError::Conflict`] when another writer committed first.
    async fn transition(
        &self,
        id: &ContributionId,
        expected_version: u64,
        change: StateChange,
    ) -> Result<Contribution>;

    /// Append a verification outcome without touching lifecycle state.
    /// The record's current score/pass-fail follow the appended outcome.
    async fn append_verification(
        &self,
        id: &ContributionId,
        outcome: VerificationOutcome,
    ) -> Result<Contribution>;
}

// ============================================================================
// In-memory store
// ============================================================================

/// Thread-safe in-memory store, the reference [`ContributionStore`]
pub struct InMemoryContributionStore {
    records: DashMap<ContributionId, Contribution>,
}

impl InMemoryContributionStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }
}

impl Default for InMemoryContributionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContributionStore for InMemoryContributionStore {
    async fn insert(&self, contribution: Contribution) -> Result<()> {
        let id = contribution.id;
        if self.records.contains_key(&id) {
            return Err(ArborError::Internal(format!(
                "duplicate contribution id {}",
                id
            )));
        }
        self.records.insert(id, contribution);
        Ok(())
    }

    async fn get(&self, id: &ContributionId) -> Result<Contribution> {
        self.records
            .get(id)
            .map(|r| r.value().clone())
            .ok_or_else(|| ArborError::NotFound(format!("contribution {}", id)))
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Contribution>> {
        let mut out: Vec<Contribution> = self
            .records
            .iter()
            .filter(|r| r.value().user_id == user_id)
            .map(|r| r.value().clone())
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn state_counts(&self) -> Result<HashMap<String, usize>> {
        let mut counts = HashMap::new();
        for r in self.records.iter() {
            *counts.entry(r.value().state.to_string()).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn transition(
        &self,
        id: &ContributionId,
        expected_version: u64,
        change: StateChange,
    ) -> Result<Contribution> {
        let mut entry = self
            .records
            .get_mut(id)
            .ok_or_else(|| ArborError::NotFound(format!("contribution {}", id)))?;
        let record = entry.value_mut();

        if record.version != expected_version {
            return Err(ArborError::Conflict(format!(
                "contribution {} is at version {}, caller read {}",
                id, record.version, expected_version
            )));
        }

        if let Some(to) = change.to {
            if !record.state.allows(to) {
                return Err(ArborError::Internal(format!(
                    "illegal transition {} -> {} for contribution {}",
                    record.state, to, id
                )));
            }
            record.state = to;
        }

        if let Some(payload) = change.processed {
            record.processed = Some(payload);
        }
        if let Some(outcome) = change.verification {
            record.quality_score = Some(outcome.score);
            record.passed = Some(outcome.passed);
            record.verifications.push(outcome);
        }
        if let Some(risk) = change.risk {
            record.risk = Some(risk);
        }
        record.sync_results.extend(change.sync_results);
        if let Some(amount) = change.reward {
            record.reward = Some(amount);
        }
        if let Some(kind) = change.failure {
            record.failure = Some(kind);
        }

        record.version += 1;
        Ok(record.clone())
    }

    async fn append_verification(
        &self,
        id: &ContributionId,
        outcome: VerificationOutcome,
    ) -> Result<Contribution> {
        let mut entry = self
            .records
            .get_mut(id)
            .ok_or_else(|| ArborError::NotFound(format!("contribution {}", id)))?;
        let record = entry.value_mut();

        record.quality_score = Some(outcome.score);
        record.passed = Some(outcome.passed);
        record.verifications.push(outcome);
        record.version += 1;
        Ok(record.clone())
    }
}
