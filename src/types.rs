//! Shared error taxonomy and result alias for Arbor
//!
//! Every component reports failures through [`ArborError`]. The taxonomy
//! mirrors the propagation policy: validation and lookup failures map to
//! 4xx responses, optimistic-concurrency losses are retried internally and
//! never reach a caller, and exhausted required steps surface as a terminal
//! contribution state rather than an escaped error.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, ArborError>;

/// Arbor error taxonomy
#[derive(Debug, Error)]
pub enum ArborError {
    /// Bad caller input. Never retried.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown contribution, workflow, or run id.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A domain strategy failed. Terminal for the contribution being processed.
    #[error("Domain processing error: {0}")]
    Domain(String),

    /// A remote sync/query call failed. Recorded as sync-result data inside
    /// the lifecycle; surfaced directly only by the standalone endpoints.
    #[error("Integration error: {0}")]
    Integration(String),

    /// Optimistic-concurrency loss on a store transition. Retried internally.
    #[error("Store conflict: {0}")]
    Conflict(String),

    /// A required lifecycle step exhausted its retry budget.
    #[error("Fatal: {0}")]
    Fatal(String),

    /// Everything else (serialization, channel loss, listener failure).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ArborError {
    /// Stable kind label, recorded on contributions that reach `FAILED` and
    /// echoed in structured API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ArborError::Validation(_) => "validation",
            ArborError::NotFound(_) => "not_found",
            ArborError::Domain(_) => "domain_processing",
            ArborError::Integration(_) => "integration",
            ArborError::Conflict(_) => "store_conflict",
            ArborError::Fatal(_) => "fatal",
            ArborError::Internal(_) => "internal",
        }
    }

    /// Whether the condition is safe to retry without escalating.
    ///
    /// Conflicts are always retried (re-read then re-apply); integration
    /// failures are retried by the per-call backoff helper. Validation and
    /// lookup failures never are.
    pub fn is_transient(&self) -> bool {
        matches!(self, ArborError::Conflict(_) | ArborError::Integration(_))
    }
}

impl From<std::io::Error> for ArborError {
    fn from(e: std::io::Error) -> Self {
        ArborError::Internal(format!("I/O error: {}", e))
    }
}

impl From<serde_json::Error> for ArborError {
    fn from(e: serde_json::Error) -> Self {
        ArborError::Internal(format!("JSON error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(ArborError::Validation("x".into()).kind(), "validation");
        assert_eq!(ArborError::Conflict("x".into()).kind(), "store_conflict");
        assert_eq!(ArborError::Fatal("x".into()).kind(), "fatal");
    }

    #[test]
    fn test_transient_split() {
        assert!(ArborError::Conflict("lost race".into()).is_transient());
        assert!(ArborError::Integration("timeout".into()).is_transient());
        assert!(!ArborError::Validation("empty title".into()).is_transient());
        assert!(!ArborError::NotFound("missing".into()).is_transient());
    }
}
