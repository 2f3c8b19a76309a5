//! HTTP-backed integration clients
//!
//! One client per external system, each owning its credential and base
//! endpoint. All four share the same transport shape: JSON POST with a
//! bearer token, per-call timeout, and the shared retry helper. They differ
//! only in endpoint paths and the identifier key the remote expects.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::retry::{with_retry, CallError, RetryConfig};
use super::{IntegrationClient, QueryReply, SyncAck};
use crate::types::{ArborError, Result};

/// External system variants the platform integrates with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationSystem {
    CodeHosting,
    ProjectTracking,
    DocumentDb,
    AiQuery,
}

impl IntegrationSystem {
    pub fn name(&self) -> &'static str {
        match self {
            IntegrationSystem::CodeHosting => "code-hosting",
            IntegrationSystem::ProjectTracking => "project-tracking",
            IntegrationSystem::DocumentDb => "document-db",
            IntegrationSystem::AiQuery => "ai-query",
        }
    }

    /// Identifier key the remote expects in sync payloads
    fn target_key(&self) -> &'static str {
        match self {
            IntegrationSystem::CodeHosting => "repository",
            IntegrationSystem::ProjectTracking => "project_id",
            IntegrationSystem::DocumentDb => "database_id",
            IntegrationSystem::AiQuery => "target",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "code-hosting" => Some(IntegrationSystem::CodeHosting),
            "project-tracking" => Some(IntegrationSystem::ProjectTracking),
            "document-db" => Some(IntegrationSystem::DocumentDb),
            "ai-query" => Some(IntegrationSystem::AiQuery),
            _ => None,
        }
    }
}

/// HTTP integration client for one external system
pub struct HttpIntegration {
    system: IntegrationSystem,
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
    retry: RetryConfig,
}

impl HttpIntegration {
    pub fn new(
        system: IntegrationSystem,
        base_url: String,
        token: Option<String>,
        call_timeout: Duration,
        retry: RetryConfig,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(call_timeout)
            .build()
            .map_err(|e| ArborError::Internal(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            system,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            http,
            retry,
        })
    }

    /// One JSON POST attempt, classified for the retry helper
    async fn post_json(&self, path: &str, body: &Value) -> std::result::Result<Value, CallError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.post(&url).json(body);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(classify_reqwest_error)?;
        let status = response.status();

        if status.is_server_error() || status.as_u16() == 429 {
            return Err(CallError::Transient(format!("HTTP {} from {}", status, url)));
        }
        if !status.is_success() {
            return Err(CallError::Permanent(format!("HTTP {} from {}", status, url)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| CallError::Permanent(format!("invalid JSON body: {}", e)))
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> CallError {
    if e.is_timeout() || e.is_connect() {
        CallError::Transient(e.to_string())
    } else {
        CallError::Permanent(e.to_string())
    }
}

#[async_trait]
impl IntegrationClient for HttpIntegration {
    fn name(&self) -> &str {
        self.system.name()
    }

    async fn sync(&self, target: &str) -> Result<SyncAck> {
        let body = json!({ self.system.target_key(): target });
        debug!(system = %self.name(), target = %target, "Syncing with external system");

        let reply = with_retry(&self.retry, self.name(), || self.post_json("/sync", &body))
            .await
            .map_err(|e| ArborError::Integration(format!("{} sync: {}", self.name(), e)))?;

        Ok(SyncAck {
            system: self.name().to_string(),
            target: target.to_string(),
            remote_status: reply
                .get("status")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    async fn query(&self, text: &str) -> Result<QueryReply> {
        let body = json!({ "query": text });
        debug!(system = %self.name(), "Querying external system");

        let reply = with_retry(&self.retry, self.name(), || self.post_json("/query", &body))
            .await
            .map_err(|e| ArborError::Integration(format!("{} query: {}", self.name(), e)))?;

        Ok(QueryReply {
            system: self.name().to_string(),
            response: reply,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_names_round_trip() {
        for system in [
            IntegrationSystem::CodeHosting,
            IntegrationSystem::ProjectTracking,
            IntegrationSystem::DocumentDb,
            IntegrationSystem::AiQuery,
        ] {
            assert_eq!(IntegrationSystem::from_name(system.name()), Some(system));
        }
        assert_eq!(IntegrationSystem::from_name("unknown"), None);
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client = HttpIntegration::new(
            IntegrationSystem::CodeHosting,
            "https://code.example.com/".into(),
            None,
            Duration::from_secs(5),
            RetryConfig::default(),
        )
        .unwrap();
        assert_eq!(client.base_url, "https://code.example.com");
    }

    #[test]
    fn test_target_keys_differ_per_system() {
        assert_eq!(IntegrationSystem::CodeHosting.target_key(), "repository");
        assert_eq!(IntegrationSystem::ProjectTracking.target_key(), "project_id");
        assert_eq!(IntegrationSystem::DocumentDb.target_key(), "database_id");
    }
}
