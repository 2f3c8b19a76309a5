//! Contribution lifecycle engine
//!
//! Drives a contribution through its state machine one step per `advance`
//! call: domain processing, verification, the reject-or-assess decision,
//! integration fan-out, and reward. Each step computes its artifact first
//! and then commits state + artifact in a single compare-and-set against
//! the record version read at the start — a lost race discards the
//! computed artifact and re-reads instead of double-applying.
//!
//! ## Failure policy
//!
//! - Required steps (domain dispatch) retry up to the configured bound and
//!   then move the contribution to `FAILED` with the error kind recorded.
//!   The caller gets the failed record back, never an escaped error.
//! - Best-effort steps (integration sync) record failures as data and the
//!   contribution advances regardless.

use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::model::{Contribution, ContributionId, LifecycleState, VerificationOutcome};
use super::store::{ContributionStore, StateChange};
use crate::domains::DomainDispatcher;
use crate::integrations::IntegrationPool;
use crate::scoring::{RewardPolicy, RiskAssessor, VerificationScorer};
use crate::types::{ArborError, Result};

/// Maximum title length accepted at submission
const MAX_TITLE_LEN: usize = 200;

/// Internal bound on compare-and-set retries within one `advance` call
const CAS_RETRIES: u32 = 8;

/// Tunables for the lifecycle engine
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Retries for a required step before the contribution fails
    pub step_retries: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self { step_retries: 2 }
    }
}

/// The contribution lifecycle orchestrator.
///
/// Holds one instance of each collaborator, injected at construction;
/// nothing here is global or lazily initialized.
pub struct LifecycleEngine {
    store: Arc<dyn ContributionStore>,
    dispatcher: Arc<DomainDispatcher>,
    scorer: Arc<dyn VerificationScorer>,
    assessor: Arc<dyn RiskAssessor>,
    reward_policy: Arc<dyn RewardPolicy>,
    pool: Arc<IntegrationPool>,
    config: LifecycleConfig,
}

impl LifecycleEngine {
    pub fn new(
        store: Arc<dyn ContributionStore>,
        dispatcher: Arc<DomainDispatcher>,
        scorer: Arc<dyn VerificationScorer>,
        assessor: Arc<dyn RiskAssessor>,
        reward_policy: Arc<dyn RewardPolicy>,
        pool: Arc<IntegrationPool>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            scorer,
            assessor,
            reward_policy,
            pool,
            config,
        }
    }

    /// Validate and persist a new contribution in `SUBMITTED`
    pub async fn submit(
        &self,
        user_id: &str,
        title: &str,
        content: &str,
        domain: &str,
    ) -> Result<ContributionId> {
        if title.trim().is_empty() {
            return Err(ArborError::Validation("title must not be empty".into()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(ArborError::Validation(format!(
                "title must be at most {} characters",
                MAX_TITLE_LEN
            )));
        }
        if content.trim().is_empty() {
            return Err(ArborError::Validation("content must not be empty".into()));
        }

        let contribution = Contribution::new(
            user_id.to_string(),
            title.to_string(),
            content.to_string(),
            domain.to_string(),
        );
        let id = contribution.id;
        self.store.insert(contribution).await?;

        info!(contribution = %id, user = %user_id, domain = %domain, "Contribution submitted");
        Ok(id)
    }

    /// Load a contribution
    pub async fn get(&self, id: &ContributionId) -> Result<Contribution> {
        self.store.get(id).await
    }

    /// All contributions by a user, newest first
    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<Contribution>> {
        self.store.list_by_user(user_id).await
    }

    /// Advance the contribution one lifecycle step.
    ///
    /// Idempotent on terminal states (returns the record unchanged). When a
    /// concurrent caller commits the same step first, this call returns the
    /// fresh record without committing a second transition.
    pub async fn advance(&self, id: &ContributionId) -> Result<Contribution> {
        let mut current = self.store.get(id).await?;
        if current.state.is_terminal() {
            return Ok(current);
        }

        let observed_state = current.state;
        let mut attempts: u32 = 0;

        loop {
            let change = self.compute_step(&current).await?;
            let target = change.to;

            match self.store.transition(id, current.version, change).await {
                Ok(updated) => {
                    info!(
                        contribution = %id,
                        from = %observed_state,
                        to = %updated.state,
                        version = updated.version,
                        "Lifecycle transition committed"
                    );
                    return Ok(updated);
                }
                Err(ArborError::Conflict(_)) => {
                    let fresh = self.store.get(id).await?;
                    if fresh.state != observed_state {
                        // Another caller already performed this step; nothing
                        // left to commit from this invocation.
                        info!(
                            contribution = %id,
                            state = %fresh.state,
                            "Lost advance race, step already committed elsewhere"
                        );
                        return Ok(fresh);
                    }
                    attempts += 1;
                    if attempts > CAS_RETRIES {
                        return Err(ArborError::Internal(format!(
                            "persistent store contention on contribution {} (target {:?})",
                            id, target
                        )));
                    }
                    warn!(
                        contribution = %id,
                        attempt = attempts,
                        "Store conflict without a state change, recomputing"
                    );
                    current = fresh;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Force re-verification in any lifecycle state.
    ///
    /// Appends a new outcome to the history and updates the contribution's
    /// current score/pass-fail to it; lifecycle state is untouched.
    pub async fn verify(&self, id: &ContributionId) -> Result<VerificationOutcome> {
        let contribution = self.store.get(id).await?;
        let outcome = self.scorer.score(&contribution.content);

        self.store.append_verification(id, outcome.clone()).await?;
        info!(
            contribution = %id,
            score = outcome.score,
            passed = outcome.passed,
            "Verification outcome recorded"
        );
        Ok(outcome)
    }

    /// Compute the one state change due for the contribution's current state
    async fn compute_step(&self, current: &Contribution) -> Result<StateChange> {
        match current.state {
            LifecycleState::Submitted => self.step_process(current).await,
            LifecycleState::Processed => Ok(self.step_verify(current)),
            LifecycleState::Verified => Ok(self.step_assess(current)),
            LifecycleState::RiskAssessed => Ok(self.step_sync(current).await),
            LifecycleState::Synced => Ok(self.step_reward(current)),
            state => Err(ArborError::Internal(format!(
                "advance reached terminal state {} without short-circuiting",
                state
            ))),
        }
    }

    /// SUBMITTED -> PROCESSED via domain dispatch (required, retried)
    async fn step_process(&self, current: &Contribution) -> Result<StateChange> {
        let payload = json!({
            "title": current.title,
            "content": current.content,
            "user_id": current.user_id,
            "domain": current.domain,
        });

        let mut last_err: Option<ArborError> = None;
        for attempt in 0..=self.config.step_retries {
            match self
                .dispatcher
                .dispatch(&current.domain, payload.clone())
                .await
            {
                Ok(processed) => {
                    return Ok(StateChange::into_state(LifecycleState::Processed)
                        .with_processed(processed));
                }
                Err(e) => {
                    warn!(
                        contribution = %current.id,
                        domain = %current.domain,
                        attempt = attempt + 1,
                        error = %e,
                        "Domain processing attempt failed"
                    );
                    last_err = Some(e);
                }
            }
        }

        let err = last_err.unwrap_or_else(|| ArborError::Domain("unknown".into()));
        error!(
            contribution = %current.id,
            domain = %current.domain,
            error = %err,
            "Domain processing exhausted retries, failing contribution"
        );
        Ok(StateChange::into_state(LifecycleState::Failed).with_failure(err.kind()))
    }

    /// PROCESSED -> VERIFIED, outcome attached in the same write
    fn step_verify(&self, current: &Contribution) -> StateChange {
        let outcome = self.scorer.score(&current.content);
        StateChange::into_state(LifecycleState::Verified).with_verification(outcome)
    }

    /// VERIFIED -> REJECTED (latest outcome failed) or RISK_ASSESSED
    fn step_assess(&self, current: &Contribution) -> StateChange {
        let passed = current
            .latest_verification()
            .map(|o| o.passed)
            .unwrap_or(false);

        if !passed {
            return StateChange::into_state(LifecycleState::Rejected);
        }

        let payload = current.processed.clone().unwrap_or_else(|| {
            json!({
                "title": current.title,
                "content": current.content,
            })
        });
        let risk = self.assessor.assess(&payload, &current.domain);
        StateChange::into_state(LifecycleState::RiskAssessed).with_risk(risk)
    }

    /// RISK_ASSESSED -> SYNCED; best-effort fan-out, failures become data
    async fn step_sync(&self, current: &Contribution) -> StateChange {
        let results = self.pool.sync_all(&current.id.to_string()).await;
        StateChange::into_state(LifecycleState::Synced).with_sync_results(results)
    }

    /// SYNCED -> REWARDED
    fn step_reward(&self, current: &Contribution) -> StateChange {
        let amount = self.reward_policy.reward(current);
        StateChange::into_state(LifecycleState::Rewarded).with_reward(amount)
    }
}
