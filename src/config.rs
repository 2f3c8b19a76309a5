//! Configuration for Arbor
//!
//! CLI arguments and environment variable handling using clap. Every
//! setting is resolvable from the environment so deployments configure the
//! process without flags; `.env` files are honored via dotenvy in main.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

/// Arbor - contribution lifecycle platform
#[derive(Parser, Debug, Clone)]
#[command(name = "arbor")]
#[command(about = "Contribution lifecycle platform: verification, risk, sync, rewards")]
pub struct Args {
    /// Unique node identifier for this instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (missing integration credentials tolerated)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Allowed CORS origin for API responses
    #[arg(long, env = "CORS_ORIGIN", default_value = "*")]
    pub cors_origin: String,

    /// Code-hosting service base URL (client is disabled when unset)
    #[arg(long, env = "CODE_HOSTING_URL")]
    pub code_hosting_url: Option<String>,

    /// Code-hosting service API token
    #[arg(long, env = "CODE_HOSTING_TOKEN")]
    pub code_hosting_token: Option<String>,

    /// Project-tracking service base URL (client is disabled when unset)
    #[arg(long, env = "PROJECT_TRACKING_URL")]
    pub project_tracking_url: Option<String>,

    /// Project-tracking service API token
    #[arg(long, env = "PROJECT_TRACKING_TOKEN")]
    pub project_tracking_token: Option<String>,

    /// Document-database service base URL (client is disabled when unset)
    #[arg(long, env = "DOCUMENT_DB_URL")]
    pub document_db_url: Option<String>,

    /// Document-database service API token
    #[arg(long, env = "DOCUMENT_DB_TOKEN")]
    pub document_db_token: Option<String>,

    /// AI-query service base URL (client is disabled when unset)
    #[arg(long, env = "AI_QUERY_URL")]
    pub ai_query_url: Option<String>,

    /// AI-query service API token
    #[arg(long, env = "AI_QUERY_TOKEN")]
    pub ai_query_token: Option<String>,

    /// Timeout per remote integration call in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "10000")]
    pub request_timeout_ms: u64,

    /// Maximum retries for a transient integration failure
    #[arg(long, env = "INTEGRATION_RETRIES", default_value = "3")]
    pub integration_retries: u32,

    /// Base backoff between integration retries in milliseconds (doubles per attempt)
    #[arg(long, env = "RETRY_BACKOFF_MS", default_value = "250")]
    pub retry_backoff_ms: u64,

    /// Consecutive failures before a client is reported unavailable
    #[arg(long, env = "FAILURE_THRESHOLD", default_value = "3")]
    pub failure_threshold: u32,

    /// Quality score at or above which a verification passes
    #[arg(long, env = "VERIFY_PASS_THRESHOLD", default_value = "0.5")]
    pub verify_pass_threshold: f64,

    /// Base reward amount, scaled by quality score at grant time
    #[arg(long, env = "BASE_REWARD", default_value = "100.0")]
    pub base_reward: f64,

    /// Retries for a required lifecycle step before the contribution fails
    #[arg(long, env = "STEP_RETRIES", default_value = "2")]
    pub step_retries: u32,

    /// Retries per workflow step before the run fails
    #[arg(long, env = "WORKFLOW_STEP_RETRIES", default_value = "2")]
    pub workflow_step_retries: u32,
}

impl Args {
    /// Integration systems with a configured base URL, as (name, url, token)
    pub fn configured_integrations(&self) -> Vec<(&'static str, String, Option<String>)> {
        let mut out = Vec::new();
        if let Some(ref url) = self.code_hosting_url {
            out.push(("code-hosting", url.clone(), self.code_hosting_token.clone()));
        }
        if let Some(ref url) = self.project_tracking_url {
            out.push((
                "project-tracking",
                url.clone(),
                self.project_tracking_token.clone(),
            ));
        }
        if let Some(ref url) = self.document_db_url {
            out.push(("document-db", url.clone(), self.document_db_token.clone()));
        }
        if let Some(ref url) = self.ai_query_url {
            out.push(("ai-query", url.clone(), self.ai_query_token.clone()));
        }
        out
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.verify_pass_threshold) {
            return Err("VERIFY_PASS_THRESHOLD must be within [0, 1]".to_string());
        }

        if self.base_reward < 0.0 {
            return Err("BASE_REWARD must not be negative".to_string());
        }

        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }

        if !self.dev_mode {
            for (name, _, token) in self.configured_integrations() {
                if token.is_none() {
                    return Err(format!(
                        "{} integration requires a token in production mode",
                        name
                    ));
                }
            }
        }

        Ok(())
    }
}
