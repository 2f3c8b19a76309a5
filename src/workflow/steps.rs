//! Built-in workflow steps
//!
//! Maintenance steps over the integration pool. Workflows composed from
//! these run on demand via the workflows API; tests compose their own mock
//! steps instead.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::WorkflowStep;
use crate::contribution::SyncOutcome;
use crate::integrations::{Connectivity, IntegrationPool};
use crate::types::{ArborError, Result};

/// Fails while any integration dependency reports unavailable.
///
/// Under per-step retry this doubles as a bounded wait for dependencies to
/// come back before later steps touch them.
pub struct ProbeIntegrationsStep {
    pool: Arc<IntegrationPool>,
}

impl ProbeIntegrationsStep {
    pub fn new(pool: Arc<IntegrationPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkflowStep for ProbeIntegrationsStep {
    fn name(&self) -> &str {
        "probe-integrations"
    }

    async fn execute(&self) -> Result<()> {
        let down: Vec<String> = self
            .pool
            .connectivity()
            .into_iter()
            .filter(|(_, status)| *status == Connectivity::Unavailable)
            .map(|(name, _)| name)
            .collect();

        if down.is_empty() {
            Ok(())
        } else {
            Err(ArborError::Integration(format!(
                "unavailable integrations: {}",
                down.join(", ")
            )))
        }
    }
}

/// Re-syncs a fixed target across every configured integration.
///
/// Partial failure is tolerated (sync is best-effort telemetry); the step
/// fails only when every client failed, which points at this node rather
/// than at any one remote.
pub struct SyncIntegrationsStep {
    pool: Arc<IntegrationPool>,
    target: String,
}

impl SyncIntegrationsStep {
    pub fn new(pool: Arc<IntegrationPool>, target: impl Into<String>) -> Self {
        Self {
            pool,
            target: target.into(),
        }
    }
}

#[async_trait]
impl WorkflowStep for SyncIntegrationsStep {
    fn name(&self) -> &str {
        "sync-integrations"
    }

    async fn execute(&self) -> Result<()> {
        let results = self.pool.sync_all(&self.target).await;
        if results.is_empty() {
            return Ok(());
        }

        let successes = results
            .iter()
            .filter(|r| r.outcome == SyncOutcome::Success)
            .count();
        info!(
            target = %self.target,
            successes = successes,
            total = results.len(),
            "Maintenance sync completed"
        );

        if successes == 0 {
            Err(ArborError::Integration(
                "every integration sync failed".into(),
            ))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::{IntegrationClient, QueryReply, SyncAck};
    use serde_json::json;
    use std::time::Duration;

    struct Stub {
        name: &'static str,
        fail: bool,
    }

    #[async_trait]
    impl IntegrationClient for Stub {
        fn name(&self) -> &str {
            self.name
        }

        async fn sync(&self, target: &str) -> Result<SyncAck> {
            if self.fail {
                Err(ArborError::Integration("down".into()))
            } else {
                Ok(SyncAck {
                    system: self.name.to_string(),
                    target: target.to_string(),
                    remote_status: None,
                })
            }
        }

        async fn query(&self, _text: &str) -> Result<QueryReply> {
            Ok(QueryReply {
                system: self.name.to_string(),
                response: json!({}),
            })
        }
    }

    fn pool(fail_a: bool, fail_b: bool) -> Arc<IntegrationPool> {
        Arc::new(IntegrationPool::new(
            vec![
                Arc::new(Stub {
                    name: "code-hosting",
                    fail: fail_a,
                }),
                Arc::new(Stub {
                    name: "document-db",
                    fail: fail_b,
                }),
            ],
            Duration::from_millis(100),
            2,
        ))
    }

    #[tokio::test]
    async fn test_probe_passes_on_healthy_pool() {
        let step = ProbeIntegrationsStep::new(pool(false, false));
        assert!(step.execute().await.is_ok());
    }

    #[tokio::test]
    async fn test_probe_fails_when_client_unavailable() {
        let p = pool(true, false);
        // Two failed sweeps push the failing client past the threshold
        p.sync_all("t").await;
        p.sync_all("t").await;

        let step = ProbeIntegrationsStep::new(p);
        let err = step.execute().await.unwrap_err();
        assert!(err.to_string().contains("code-hosting"));
    }

    #[tokio::test]
    async fn test_sync_step_tolerates_partial_failure() {
        let step = SyncIntegrationsStep::new(pool(true, false), "board-1");
        assert!(step.execute().await.is_ok());
    }

    #[tokio::test]
    async fn test_sync_step_fails_when_everything_fails() {
        let step = SyncIntegrationsStep::new(pool(true, true), "board-1");
        assert!(step.execute().await.is_err());
    }

    #[tokio::test]
    async fn test_sync_step_noop_on_empty_pool() {
        let empty = Arc::new(IntegrationPool::new(vec![], Duration::from_millis(50), 2));
        let step = SyncIntegrationsStep::new(empty, "board-1");
        assert!(step.execute().await.is_ok());
    }
}
