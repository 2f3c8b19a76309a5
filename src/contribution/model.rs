//! Contribution entity and lifecycle artifacts
//!
//! A contribution moves forward through a fixed state machine:
//!
//! ```text
//! SUBMITTED -> PROCESSED -> VERIFIED -> RISK_ASSESSED -> SYNCED -> REWARDED
//!                              |
//!                              +-> REJECTED   (latest verification failed)
//! any non-terminal ------------+-> FAILED     (required step exhausted retries)
//! ```
//!
//! Artifacts produced along the way (verification outcomes, risk assessment,
//! sync results, reward) live on the record next to the state that produced
//! them; the store persists state and artifact in one write so neither is
//! ever visible without the other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identity
// ============================================================================

/// Opaque contribution identifier, assigned at creation and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContributionId(Uuid);

impl ContributionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse from its string form (API path segments)
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for ContributionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContributionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// Lifecycle states
// ============================================================================

/// Position in the forward-only contribution state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    Submitted,
    Processed,
    Verified,
    RiskAssessed,
    Synced,
    Rewarded,
    Rejected,
    Failed,
}

impl LifecycleState {
    /// Terminal states accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LifecycleState::Rewarded | LifecycleState::Rejected | LifecycleState::Failed
        )
    }

    /// Whether `to` is a legal forward edge from this state.
    ///
    /// `Failed` is reachable from every non-terminal state; `Rejected` only
    /// from `Verified`. Nothing moves backward.
    pub fn allows(&self, to: LifecycleState) -> bool {
        if self.is_terminal() {
            return false;
        }
        if to == LifecycleState::Failed {
            return true;
        }
        matches!(
            (*self, to),
            (LifecycleState::Submitted, LifecycleState::Processed)
                | (LifecycleState::Processed, LifecycleState::Verified)
                | (LifecycleState::Verified, LifecycleState::RiskAssessed)
                | (LifecycleState::Verified, LifecycleState::Rejected)
                | (LifecycleState::RiskAssessed, LifecycleState::Synced)
                | (LifecycleState::Synced, LifecycleState::Rewarded)
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Submitted => "SUBMITTED",
            LifecycleState::Processed => "PROCESSED",
            LifecycleState::Verified => "VERIFIED",
            LifecycleState::RiskAssessed => "RISK_ASSESSED",
            LifecycleState::Synced => "SYNCED",
            LifecycleState::Rewarded => "REWARDED",
            LifecycleState::Rejected => "REJECTED",
            LifecycleState::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Artifacts
// ============================================================================

/// Outcome of one external-system sync attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOutcome {
    Success,
    Failure,
    Skipped,
}

/// Per-system sync record, appended to a contribution and never rewritten
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResult {
    /// External system name (e.g. "code-hosting")
    pub system: String,
    pub outcome: SyncOutcome,
    /// Error detail for failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub at: DateTime<Utc>,
}

impl SyncResult {
    pub fn success(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            outcome: SyncOutcome::Success,
            detail: None,
            at: Utc::now(),
        }
    }

    pub fn failure(system: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            outcome: SyncOutcome::Failure,
            detail: Some(detail.into()),
            at: Utc::now(),
        }
    }
}

/// One verification pass over a contribution's content.
///
/// Re-verification appends a new outcome; history is never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationOutcome {
    /// Quality score in [0, 1]
    pub score: f64,
    /// Whether the score cleared the configured pass threshold
    pub passed: bool,
    /// Scorer confidence in [0, 1]
    pub confidence: f64,
    /// Free-text rationale from the scorer
    pub rationale: String,
    pub at: DateTime<Utc>,
}

/// Enumerated risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// A named factor contributing to a risk assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub weight: f64,
}

/// Risk assessment over an arbitrary structured payload.
///
/// Computed independently of any contribution; the lifecycle attaches one
/// during the `VERIFIED -> RISK_ASSESSED` step, but standalone assessment
/// touches no contribution at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    /// Assessor confidence in [0, 1]
    pub confidence: f64,
    /// Contributing factors, ordered by weight descending
    pub factors: Vec<RiskFactor>,
}

// ============================================================================
// Contribution
// ============================================================================

/// A unit of user-submitted work moving through the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contribution {
    pub id: ContributionId,
    pub user_id: String,
    pub title: String,
    pub content: String,
    /// Target domain tag; unknown tags route to the fallback strategy
    pub domain: String,
    pub created_at: DateTime<Utc>,
    pub state: LifecycleState,
    /// Latest quality score; None until first verified
    pub quality_score: Option<f64>,
    /// Latest pass/fail; None until first verified
    pub passed: Option<bool>,
    /// Risk assessment; None until assessed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskAssessment>,
    /// Granted reward amount; None until rewarded
    pub reward: Option<f64>,
    /// Append-only per-system sync records
    pub sync_results: Vec<SyncResult>,
    /// Append-only verification history; latest entry drives score/passed
    pub verifications: Vec<VerificationOutcome>,
    /// Domain-transformed payload from processing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed: Option<serde_json::Value>,
    /// Originating error kind when state is FAILED
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    /// Optimistic-concurrency counter, incremented on every store write
    pub version: u64,
}

impl Contribution {
    /// Create a fresh record in `SUBMITTED`
    pub fn new(user_id: String, title: String, content: String, domain: String) -> Self {
        Self {
            id: ContributionId::new(),
            user_id,
            title,
            content,
            domain,
            created_at: Utc::now(),
            state: LifecycleState::Submitted,
            quality_score: None,
            passed: None,
            risk: None,
            reward: None,
            sync_results: Vec::new(),
            verifications: Vec::new(),
            processed: None,
            failure: None,
            version: 0,
        }
    }

    /// Latest verification outcome, if any
    pub fn latest_verification(&self) -> Option<&VerificationOutcome> {
        self.verifications.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_edges() {
        use LifecycleState::*;
        assert!(Submitted.allows(Processed));
        assert!(Processed.allows(Verified));
        assert!(Verified.allows(RiskAssessed));
        assert!(Verified.allows(Rejected));
        assert!(RiskAssessed.allows(Synced));
        assert!(Synced.allows(Rewarded));
    }

    #[test]
    fn test_no_backward_edges() {
        use LifecycleState::*;
        assert!(!Processed.allows(Submitted));
        assert!(!Verified.allows(Processed));
        assert!(!Synced.allows(RiskAssessed));
        assert!(!Submitted.allows(Rejected));
    }

    #[test]
    fn test_failed_reachable_from_non_terminal_only() {
        use LifecycleState::*;
        for state in [Submitted, Processed, Verified, RiskAssessed, Synced] {
            assert!(state.allows(Failed), "{state} should allow FAILED");
        }
        for state in [Rewarded, Rejected, Failed] {
            assert!(state.is_terminal());
            assert!(!state.allows(Failed));
        }
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&LifecycleState::RiskAssessed).unwrap();
        assert_eq!(json, "\"RISK_ASSESSED\"");
    }

    #[test]
    fn test_new_contribution_starts_clean() {
        let c = Contribution::new(
            "u1".into(),
            "Title".into(),
            "content".into(),
            "research".into(),
        );
        assert_eq!(c.state, LifecycleState::Submitted);
        assert_eq!(c.version, 0);
        assert!(c.quality_score.is_none());
        assert!(c.latest_verification().is_none());
    }
}
