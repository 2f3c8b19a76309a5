//! Arbor - contribution lifecycle platform

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arbor::{
    config::Args,
    contribution::{InMemoryContributionStore, LifecycleConfig, LifecycleEngine},
    domains::DomainDispatcher,
    integrations::{
        HttpIntegration, IntegrationClient, IntegrationPool, IntegrationSystem, RetryConfig,
    },
    scoring::{HeuristicScorer, QualityScaledReward, WeightedRiskAssessor},
    server,
    workflow::{
        ProbeIntegrationsStep, SyncIntegrationsStep, WorkflowConfig, WorkflowOrchestrator,
        WorkflowStep,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("arbor={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  Arbor - Contribution Lifecycle");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!(
        "Mode: {}",
        if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" }
    );
    info!("Pass threshold: {}", args.verify_pass_threshold);
    info!("Base reward: {}", args.base_reward);
    let configured = args.configured_integrations();
    info!("Integrations: {} configured", configured.len());
    for (name, url, _) in &configured {
        info!("  {}: {}", name, url);
    }
    info!("======================================");

    // Build integration clients from configuration
    let retry = RetryConfig {
        max_retries: args.integration_retries,
        base_backoff: Duration::from_millis(args.retry_backoff_ms),
    };
    let call_timeout = Duration::from_millis(args.request_timeout_ms);

    let mut clients: Vec<Arc<dyn IntegrationClient>> = Vec::new();
    for (name, url, token) in configured {
        let system = IntegrationSystem::from_name(name)
            .expect("configured_integrations yields known system names");
        match HttpIntegration::new(system, url, token, call_timeout, retry.clone()) {
            Ok(client) => clients.push(Arc::new(client)),
            Err(e) => {
                error!("Failed to build {} client: {}", name, e);
                std::process::exit(1);
            }
        }
    }

    // Outer per-client bound covers the full retry schedule of one call
    let client_timeout =
        Duration::from_millis(args.request_timeout_ms * (args.integration_retries as u64 + 2));
    let pool = Arc::new(IntegrationPool::new(
        clients,
        client_timeout,
        args.failure_threshold,
    ));

    // Component set, constructed once and injected everywhere
    let store = Arc::new(InMemoryContributionStore::new());
    let dispatcher = Arc::new(DomainDispatcher::with_defaults());
    let scorer = Arc::new(HeuristicScorer::new(args.verify_pass_threshold));
    let assessor = Arc::new(WeightedRiskAssessor::new());
    let reward_policy = Arc::new(QualityScaledReward::new(args.base_reward));

    let engine = Arc::new(LifecycleEngine::new(
        store.clone(),
        dispatcher.clone(),
        scorer,
        assessor.clone(),
        reward_policy,
        Arc::clone(&pool),
        LifecycleConfig {
            step_retries: args.step_retries,
        },
    ));

    // Built-in maintenance workflow over the integration pool
    let mut workflows = WorkflowOrchestrator::new(WorkflowConfig {
        step_retries: args.workflow_step_retries,
    });
    let maintenance_steps: Vec<Arc<dyn WorkflowStep>> = vec![
        Arc::new(ProbeIntegrationsStep::new(Arc::clone(&pool))),
        Arc::new(SyncIntegrationsStep::new(
            Arc::clone(&pool),
            "arbor-platform",
        )),
    ];
    workflows.register("integration-maintenance", maintenance_steps);
    info!("Workflows registered: {:?}", workflows.workflow_ids());

    let state = Arc::new(server::AppState::new(
        args,
        store,
        engine,
        dispatcher,
        assessor,
        pool,
        Arc::new(workflows),
    ));

    // Run the server
    if let Err(e) = server::run(state).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
