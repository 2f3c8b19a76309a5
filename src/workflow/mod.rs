//! Workflow orchestration
//!
//! A workflow is a named, ordered list of steps registered at construction.
//! `run` executes the steps in order with a per-step retry bound; the first
//! step to exhaust its retries fails the whole run and later steps never
//! execute. Every invocation creates a fresh run record — there is no
//! resume of a previous failed run.

pub mod steps;

pub use steps::{ProbeIntegrationsStep, SyncIntegrationsStep};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::types::{ArborError, Result};

// ============================================================================
// Types
// ============================================================================

/// Status of one step within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// Overall status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
}

/// Per-step record within a run
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub name: String,
    pub status: StepStatus,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// One execution instance of a named workflow
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowRun {
    pub workflow_id: String,
    pub run_id: String,
    pub steps: Vec<StepRecord>,
    pub overall: RunStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// One step of a workflow
#[async_trait]
pub trait WorkflowStep: Send + Sync {
    fn name(&self) -> &str;
    async fn execute(&self) -> Result<()>;
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Configuration for workflow execution
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Retries per step before the run fails
    pub step_retries: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self { step_retries: 2 }
    }
}

/// Executes registered workflows and retains their run records
pub struct WorkflowOrchestrator {
    workflows: HashMap<String, Vec<Arc<dyn WorkflowStep>>>,
    runs: RwLock<HashMap<String, WorkflowRun>>,
    config: WorkflowConfig,
}

impl WorkflowOrchestrator {
    pub fn new(config: WorkflowConfig) -> Self {
        Self {
            workflows: HashMap::new(),
            runs: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Register a workflow as an ordered step list
    pub fn register(&mut self, workflow_id: impl Into<String>, steps: Vec<Arc<dyn WorkflowStep>>) {
        self.workflows.insert(workflow_id.into(), steps);
    }

    /// Registered workflow ids, sorted
    pub fn workflow_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.workflows.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of retained run records
    pub async fn run_count(&self) -> usize {
        self.runs.read().await.len()
    }

    /// Execute a workflow, returning the finished run record.
    ///
    /// The record is also retained for `status` lookups, and is visible in
    /// its in-flight form while steps execute.
    pub async fn run(&self, workflow_id: &str) -> Result<WorkflowRun> {
        let steps = self
            .workflows
            .get(workflow_id)
            .ok_or_else(|| ArborError::NotFound(format!("workflow {}", workflow_id)))?
            .clone();

        let run_id = Uuid::new_v4().to_string();
        let mut run = WorkflowRun {
            workflow_id: workflow_id.to_string(),
            run_id: run_id.clone(),
            steps: steps
                .iter()
                .map(|s| StepRecord {
                    name: s.name().to_string(),
                    status: StepStatus::Pending,
                    attempts: 0,
                    detail: None,
                })
                .collect(),
            overall: RunStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
        };
        self.store_run(&run).await;

        info!(workflow = %workflow_id, run = %run_id, steps = steps.len(), "Workflow run started");

        for (index, step) in steps.iter().enumerate() {
            run.steps[index].status = StepStatus::Running;
            self.store_run(&run).await;

            let mut attempts: u32 = 0;
            let failure = loop {
                attempts += 1;
                match step.execute().await {
                    Ok(()) => break None,
                    Err(e) => {
                        warn!(
                            workflow = %workflow_id,
                            run = %run_id,
                            step = %step.name(),
                            attempt = attempts,
                            error = %e,
                            "Workflow step attempt failed"
                        );
                        if attempts > self.config.step_retries {
                            break Some(e);
                        }
                    }
                }
            };

            run.steps[index].attempts = attempts;
            match failure {
                None => {
                    run.steps[index].status = StepStatus::Succeeded;
                    self.store_run(&run).await;
                }
                Some(e) => {
                    // Fail fast: later steps stay pending
                    run.steps[index].status = StepStatus::Failed;
                    run.steps[index].detail = Some(e.to_string());
                    run.overall = RunStatus::Failed;
                    run.finished_at = Some(Utc::now());
                    self.store_run(&run).await;
                    info!(workflow = %workflow_id, run = %run_id, step = %step.name(), "Workflow run failed");
                    return Ok(run);
                }
            }
        }

        run.overall = RunStatus::Succeeded;
        run.finished_at = Some(Utc::now());
        self.store_run(&run).await;
        info!(workflow = %workflow_id, run = %run_id, "Workflow run succeeded");
        Ok(run)
    }

    /// Look up a retained run record
    pub async fn status(&self, run_id: &str) -> Result<WorkflowRun> {
        self.runs
            .read()
            .await
            .get(run_id)
            .cloned()
            .ok_or_else(|| ArborError::NotFound(format!("workflow run {}", run_id)))
    }

    async fn store_run(&self, run: &WorkflowRun) {
        self.runs
            .write()
            .await
            .insert(run.run_id.clone(), run.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingStep {
        name: &'static str,
        calls: Arc<AtomicU32>,
        fail_first: u32,
    }

    #[async_trait]
    impl WorkflowStep for CountingStep {
        fn name(&self) -> &str {
            self.name
        }

        async fn execute(&self) -> Result<()> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err(ArborError::Internal(format!("{} not ready", self.name)))
            } else {
                Ok(())
            }
        }
    }

    fn step(name: &'static str, fail_first: u32) -> (Arc<dyn WorkflowStep>, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        (
            Arc::new(CountingStep {
                name,
                calls: Arc::clone(&calls),
                fail_first,
            }),
            calls,
        )
    }

    #[tokio::test]
    async fn test_run_succeeds_through_all_steps() {
        let mut orchestrator = WorkflowOrchestrator::new(WorkflowConfig::default());
        let (a, _) = step("collect", 0);
        let (b, _) = step("publish", 0);
        orchestrator.register("nightly", vec![a, b]);

        let run = orchestrator.run("nightly").await.unwrap();
        assert_eq!(run.overall, RunStatus::Succeeded);
        assert!(run
            .steps
            .iter()
            .all(|s| s.status == StepStatus::Succeeded));
        assert!(run.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_flaky_step_retries_within_bound() {
        let mut orchestrator =
            WorkflowOrchestrator::new(WorkflowConfig { step_retries: 2 });
        let (a, calls) = step("flaky", 2);
        orchestrator.register("w", vec![a]);

        let run = orchestrator.run("w").await.unwrap();
        assert_eq!(run.overall, RunStatus::Succeeded);
        assert_eq!(run.steps[0].attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_step_fails_run_and_skips_rest() {
        let mut orchestrator =
            WorkflowOrchestrator::new(WorkflowConfig { step_retries: 1 });
        let (a, _) = step("first", 0);
        let (b, _) = step("always-broken", 99);
        let (c, c_calls) = step("never-reached", 0);
        orchestrator.register("w", vec![a, b, c]);

        let run = orchestrator.run("w").await.unwrap();
        assert_eq!(run.overall, RunStatus::Failed);
        assert_eq!(run.steps[0].status, StepStatus::Succeeded);
        assert_eq!(run.steps[1].status, StepStatus::Failed);
        assert!(run.steps[1].detail.is_some());
        assert_eq!(run.steps[2].status, StepStatus::Pending);
        assert_eq!(c_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_each_run_is_fresh() {
        let mut orchestrator = WorkflowOrchestrator::new(WorkflowConfig::default());
        let (a, _) = step("only", 0);
        orchestrator.register("w", vec![a]);

        let first = orchestrator.run("w").await.unwrap();
        let second = orchestrator.run("w").await.unwrap();
        assert_ne!(first.run_id, second.run_id);
        assert_eq!(orchestrator.run_count().await, 2);
    }

    #[tokio::test]
    async fn test_status_returns_retained_run() {
        let mut orchestrator = WorkflowOrchestrator::new(WorkflowConfig::default());
        let (a, _) = step("only", 0);
        orchestrator.register("w", vec![a]);

        let run = orchestrator.run("w").await.unwrap();
        let fetched = orchestrator.status(&run.run_id).await.unwrap();
        assert_eq!(fetched.run_id, run.run_id);
        assert_eq!(fetched.overall, RunStatus::Succeeded);

        let err = orchestrator.status("missing").await.unwrap_err();
        assert!(matches!(err, ArborError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unknown_workflow_is_not_found() {
        let orchestrator = WorkflowOrchestrator::new(WorkflowConfig::default());
        let err = orchestrator.run("ghost").await.unwrap_err();
        assert!(matches!(err, ArborError::NotFound(_)));
    }
}
