//! Integration client pool
//!
//! One client per external system (code-hosting, project-tracking,
//! document-database, AI-query). Every call carries a bounded timeout and a
//! retry budget; a client's persistent failure never blocks the others —
//! the pool converts failures into [`SyncResult`] data and keeps going.
//!
//! The pool also keeps per-client health counters so the health endpoints
//! can report each dependency as connected, degraded, or unavailable.

pub mod http;
pub mod retry;

pub use http::{HttpIntegration, IntegrationSystem};
pub use retry::{CallError, RetryConfig};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::contribution::SyncResult;
use crate::types::{ArborError, Result};

// ============================================================================
// Capability
// ============================================================================

/// Acknowledgement from a successful sync call
#[derive(Debug, Clone, Serialize)]
pub struct SyncAck {
    pub system: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_status: Option<String>,
}

/// Reply from a query call
#[derive(Debug, Clone, Serialize)]
pub struct QueryReply {
    pub system: String,
    pub response: Value,
}

/// Adapter to one external system
#[async_trait]
pub trait IntegrationClient: Send + Sync {
    fn name(&self) -> &str;

    /// Idempotent sync of the given target identifier
    async fn sync(&self, target: &str) -> Result<SyncAck>;

    /// Free-text query against the system
    async fn query(&self, text: &str) -> Result<QueryReply>;
}

// ============================================================================
// Health tracking
// ============================================================================

/// Reported connectivity of one dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    Connected,
    Degraded,
    Unavailable,
}

/// Per-client call counters
#[derive(Debug, Clone, Default)]
struct ClientHealth {
    consecutive_failures: u32,
    total_calls: u64,
    last_success: Option<DateTime<Utc>>,
    last_failure: Option<DateTime<Utc>>,
}

/// Snapshot of one client's call counters for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct ClientStats {
    pub total_calls: u64,
    pub consecutive_failures: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_success: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_failure: Option<DateTime<Utc>>,
}

// ============================================================================
// Pool
// ============================================================================

/// Pool of configured integration clients
pub struct IntegrationPool {
    clients: Vec<Arc<dyn IntegrationClient>>,
    health: DashMap<String, ClientHealth>,
    /// Outer bound on one client's whole sync attempt (retries included)
    client_timeout: Duration,
    /// Consecutive failures before a client reports unavailable
    failure_threshold: u32,
}

impl IntegrationPool {
    pub fn new(
        clients: Vec<Arc<dyn IntegrationClient>>,
        client_timeout: Duration,
        failure_threshold: u32,
    ) -> Self {
        let health = DashMap::new();
        for client in &clients {
            health.insert(client.name().to_string(), ClientHealth::default());
        }
        Self {
            clients,
            health,
            client_timeout,
            failure_threshold: failure_threshold.max(1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Names of configured clients
    pub fn names(&self) -> Vec<String> {
        self.clients.iter().map(|c| c.name().to_string()).collect()
    }

    fn record_success(&self, name: &str) {
        let mut entry = self.health.entry(name.to_string()).or_default();
        entry.consecutive_failures = 0;
        entry.total_calls += 1;
        entry.last_success = Some(Utc::now());
    }

    fn record_failure(&self, name: &str) {
        let mut entry = self.health.entry(name.to_string()).or_default();
        entry.consecutive_failures += 1;
        entry.total_calls += 1;
        entry.last_failure = Some(Utc::now());
    }

    /// Connectivity per configured client
    pub fn connectivity(&self) -> HashMap<String, Connectivity> {
        self.clients
            .iter()
            .map(|c| {
                let status = self
                    .health
                    .get(c.name())
                    .map(|h| {
                        if h.consecutive_failures == 0 {
                            Connectivity::Connected
                        } else if h.consecutive_failures < self.failure_threshold {
                            Connectivity::Degraded
                        } else {
                            Connectivity::Unavailable
                        }
                    })
                    .unwrap_or(Connectivity::Connected);
                (c.name().to_string(), status)
            })
            .collect()
    }

    /// Call counters per configured client
    pub fn stats(&self) -> HashMap<String, ClientStats> {
        self.clients
            .iter()
            .map(|c| {
                let stats = self
                    .health
                    .get(c.name())
                    .map(|h| ClientStats {
                        total_calls: h.total_calls,
                        consecutive_failures: h.consecutive_failures,
                        last_success: h.last_success,
                        last_failure: h.last_failure,
                    })
                    .unwrap_or(ClientStats {
                        total_calls: 0,
                        consecutive_failures: 0,
                        last_success: None,
                        last_failure: None,
                    });
                (c.name().to_string(), stats)
            })
            .collect()
    }

    /// Fan out a sync to every configured client concurrently.
    ///
    /// Joins on all of them — not first-to-finish — and returns exactly one
    /// [`SyncResult`] per client. Failures and timeouts become failure
    /// records; they never abort the other clients. An empty pool returns
    /// an empty batch (no-op success).
    pub async fn sync_all(&self, target: &str) -> Vec<SyncResult> {
        if self.clients.is_empty() {
            return Vec::new();
        }

        let calls = self.clients.iter().map(|client| {
            let client = Arc::clone(client);
            let target = target.to_string();
            let timeout = self.client_timeout;
            async move {
                let name = client.name().to_string();
                match tokio::time::timeout(timeout, client.sync(&target)).await {
                    Ok(Ok(_ack)) => (name, None),
                    Ok(Err(e)) => (name, Some(e.to_string())),
                    Err(_) => (
                        name,
                        Some(format!("timed out after {}ms", timeout.as_millis())),
                    ),
                }
            }
        });

        let outcomes = join_all(calls).await;

        let mut results = Vec::with_capacity(outcomes.len());
        for (name, error) in outcomes {
            match error {
                None => {
                    self.record_success(&name);
                    results.push(SyncResult::success(&name));
                }
                Some(detail) => {
                    self.record_failure(&name);
                    warn!(system = %name, error = %detail, "Integration sync failed");
                    results.push(SyncResult::failure(&name, detail));
                }
            }
        }

        info!(
            target = %target,
            total = results.len(),
            failures = results
                .iter()
                .filter(|r| r.outcome == crate::contribution::SyncOutcome::Failure)
                .count(),
            "Integration fan-out complete"
        );
        results
    }

    fn client_named(&self, system: &str) -> Result<&Arc<dyn IntegrationClient>> {
        self.clients
            .iter()
            .find(|c| c.name() == system)
            .ok_or_else(|| ArborError::NotFound(format!("integration {}", system)))
    }

    /// Sync one named system; failure surfaces to the caller (standalone endpoint)
    pub async fn sync_one(&self, system: &str, target: &str) -> Result<SyncAck> {
        let client = self.client_named(system)?;
        match tokio::time::timeout(self.client_timeout, client.sync(target)).await {
            Ok(Ok(ack)) => {
                self.record_success(system);
                Ok(ack)
            }
            Ok(Err(e)) => {
                self.record_failure(system);
                Err(e)
            }
            Err(_) => {
                self.record_failure(system);
                Err(ArborError::Integration(format!(
                    "{} sync timed out after {}ms",
                    system,
                    self.client_timeout.as_millis()
                )))
            }
        }
    }

    /// Query one named system
    pub async fn query(&self, system: &str, text: &str) -> Result<QueryReply> {
        let client = self.client_named(system)?;
        match tokio::time::timeout(self.client_timeout, client.query(text)).await {
            Ok(Ok(reply)) => {
                self.record_success(system);
                Ok(reply)
            }
            Ok(Err(e)) => {
                self.record_failure(system);
                Err(e)
            }
            Err(_) => {
                self.record_failure(system);
                Err(ArborError::Integration(format!(
                    "{} query timed out after {}ms",
                    system,
                    self.client_timeout.as_millis()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contribution::SyncOutcome;
    use serde_json::json;

    struct MockClient {
        name: &'static str,
        fail: bool,
        delay: Option<Duration>,
    }

    impl MockClient {
        fn ok(name: &'static str) -> Arc<dyn IntegrationClient> {
            Arc::new(Self {
                name,
                fail: false,
                delay: None,
            })
        }

        fn failing(name: &'static str) -> Arc<dyn IntegrationClient> {
            Arc::new(Self {
                name,
                fail: true,
                delay: None,
            })
        }

        fn slow(name: &'static str, delay: Duration) -> Arc<dyn IntegrationClient> {
            Arc::new(Self {
                name,
                fail: false,
                delay: Some(delay),
            })
        }
    }

    #[async_trait]
    impl IntegrationClient for MockClient {
        fn name(&self) -> &str {
            self.name
        }

        async fn sync(&self, target: &str) -> Result<SyncAck> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(ArborError::Integration(format!("{} is down", self.name)));
            }
            Ok(SyncAck {
                system: self.name.to_string(),
                target: target.to_string(),
                remote_status: Some("synced".into()),
            })
        }

        async fn query(&self, _text: &str) -> Result<QueryReply> {
            if self.fail {
                return Err(ArborError::Integration(format!("{} is down", self.name)));
            }
            Ok(QueryReply {
                system: self.name.to_string(),
                response: json!({"answer": 42}),
            })
        }
    }

    fn pool(clients: Vec<Arc<dyn IntegrationClient>>) -> IntegrationPool {
        IntegrationPool::new(clients, Duration::from_millis(200), 3)
    }

    #[tokio::test]
    async fn test_fan_out_one_failure_still_completes() {
        let pool = pool(vec![
            MockClient::ok("code-hosting"),
            MockClient::failing("project-tracking"),
            MockClient::ok("document-db"),
        ]);

        let results = pool.sync_all("repo-1").await;
        assert_eq!(results.len(), 3);

        let failures: Vec<_> = results
            .iter()
            .filter(|r| r.outcome == SyncOutcome::Failure)
            .collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].system, "project-tracking");
        assert!(failures[0].detail.is_some());
    }

    #[tokio::test]
    async fn test_empty_pool_is_noop_success() {
        let pool = pool(vec![]);
        assert!(pool.is_empty());
        assert!(pool.sync_all("anything").await.is_empty());
    }

    #[tokio::test]
    async fn test_slow_client_times_out_without_blocking_others() {
        let pool = pool(vec![
            MockClient::slow("document-db", Duration::from_secs(5)),
            MockClient::ok("code-hosting"),
        ]);

        let results = pool.sync_all("t").await;
        assert_eq!(results.len(), 2);

        let slow = results.iter().find(|r| r.system == "document-db").unwrap();
        assert_eq!(slow.outcome, SyncOutcome::Failure);
        let fast = results.iter().find(|r| r.system == "code-hosting").unwrap();
        assert_eq!(fast.outcome, SyncOutcome::Success);
    }

    #[tokio::test]
    async fn test_connectivity_degrades_then_goes_unavailable() {
        let pool = pool(vec![MockClient::failing("ai-query")]);

        assert_eq!(
            pool.connectivity()["ai-query"],
            Connectivity::Connected,
            "fresh client reports connected"
        );

        pool.sync_all("t").await;
        assert_eq!(pool.connectivity()["ai-query"], Connectivity::Degraded);

        pool.sync_all("t").await;
        pool.sync_all("t").await;
        assert_eq!(pool.connectivity()["ai-query"], Connectivity::Unavailable);
    }

    #[tokio::test]
    async fn test_success_resets_health() {
        let pool = pool(vec![MockClient::ok("code-hosting")]);
        pool.record_failure("code-hosting");
        pool.record_failure("code-hosting");
        assert_eq!(pool.connectivity()["code-hosting"], Connectivity::Degraded);

        pool.sync_all("t").await;
        assert_eq!(pool.connectivity()["code-hosting"], Connectivity::Connected);
    }

    #[tokio::test]
    async fn test_sync_one_unknown_system() {
        let pool = pool(vec![MockClient::ok("code-hosting")]);
        let err = pool.sync_one("imaginary", "t").await.unwrap_err();
        assert!(matches!(err, ArborError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_query_routes_to_named_client() {
        let pool = pool(vec![
            MockClient::ok("code-hosting"),
            MockClient::ok("ai-query"),
        ]);
        let reply = pool.query("ai-query", "what is risk?").await.unwrap();
        assert_eq!(reply.system, "ai-query");
        assert_eq!(reply.response["answer"], 42);
    }
}
