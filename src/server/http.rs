//! HTTP server implementation
//!
//! hyper http1 with TokioIo and a hand-rolled method/path router. Each
//! connection is served on its own task; handlers share the injected
//! component set through [`AppState`].

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::config::Args;
use crate::contribution::{ContributionStore, LifecycleEngine};
use crate::domains::DomainDispatcher;
use crate::integrations::IntegrationPool;
use crate::routes;
use crate::scoring::RiskAssessor;
use crate::types::ArborError;
use crate::workflow::WorkflowOrchestrator;

/// Shared application state: one instance of every component, built in main
/// and injected here. Nothing is global or lazily constructed.
pub struct AppState {
    pub args: Args,
    pub store: Arc<dyn ContributionStore>,
    pub engine: Arc<LifecycleEngine>,
    pub dispatcher: Arc<DomainDispatcher>,
    pub assessor: Arc<dyn RiskAssessor>,
    pub pool: Arc<IntegrationPool>,
    pub workflows: Arc<WorkflowOrchestrator>,
    pub started_at: Instant,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        args: Args,
        store: Arc<dyn ContributionStore>,
        engine: Arc<LifecycleEngine>,
        dispatcher: Arc<DomainDispatcher>,
        assessor: Arc<dyn RiskAssessor>,
        pool: Arc<IntegrationPool>,
        workflows: Arc<WorkflowOrchestrator>,
    ) -> Self {
        Self {
            args,
            store,
            engine,
            dispatcher,
            assessor,
            pool,
            workflows,
            started_at: Instant::now(),
        }
    }
}

/// Bind and serve until the process exits
pub async fn run(state: Arc<AppState>) -> Result<(), ArborError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Arbor listening on {} as node {}",
        state.args.listen, state.args.node_id
    );
    if state.args.dev_mode {
        info!("Development mode enabled - integration credentials optional");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        (Method::GET, "/") => routes::overview(state),

        // Liveness probe - 200 while the process runs
        (Method::GET, "/health") | (Method::GET, "/healthz") => routes::health_check(state),

        // Readiness probe - 503 while a dependency is unavailable
        (Method::GET, "/ready") | (Method::GET, "/readyz") => routes::readiness_check(state),

        (Method::GET, "/version") => routes::version_info(),

        (Method::GET, "/status") => routes::status_check(state).await,

        (Method::OPTIONS, _) => routes::preflight_response(&state.args.cors_origin),

        // Contribution lifecycle
        (Method::POST, "/api/v1/contributions") => routes::handle_submit(state, req).await,

        (Method::GET, p)
            if p.starts_with("/api/v1/contributions/") && p.ends_with("/verify") =>
        {
            let id = p
                .trim_start_matches("/api/v1/contributions/")
                .trim_end_matches("/verify");
            routes::handle_verify(state, id).await
        }

        (Method::POST, p)
            if p.starts_with("/api/v1/contributions/") && p.ends_with("/advance") =>
        {
            let id = p
                .trim_start_matches("/api/v1/contributions/")
                .trim_end_matches("/advance");
            routes::handle_advance(state, id).await
        }

        (Method::GET, p) if p.starts_with("/api/v1/contributions/") => {
            let id = p.trim_start_matches("/api/v1/contributions/");
            if id.contains('/') {
                routes::not_found_response(p)
            } else {
                routes::handle_get_contribution(state, id).await
            }
        }

        (Method::GET, p) if p.starts_with("/api/v1/users/") && p.ends_with("/dashboard") => {
            let user_id = p
                .trim_start_matches("/api/v1/users/")
                .trim_end_matches("/dashboard");
            routes::handle_dashboard(state, user_id).await
        }

        // Domain dispatch
        (Method::POST, "/api/v1/domain-requests") => {
            routes::handle_domain_request(state, req).await
        }

        (Method::GET, "/api/v1/domains") => routes::handle_list_domains(state),

        // Integrations
        (Method::POST, p)
            if p.starts_with("/api/v1/integrations/") && p.ends_with("/sync") =>
        {
            let system = p
                .trim_start_matches("/api/v1/integrations/")
                .trim_end_matches("/sync")
                .to_string();
            routes::handle_integration_sync(state, &system, req).await
        }

        // AI
        (Method::POST, "/api/v1/ai/risk-assessment") => {
            routes::handle_risk_assessment(state, req).await
        }

        (Method::POST, "/api/v1/ai/query") => routes::handle_ai_query(state, req).await,

        // Workflows
        (Method::GET, p) if p.starts_with("/api/v1/workflows/runs/") => {
            let run_id = p.trim_start_matches("/api/v1/workflows/runs/");
            routes::handle_workflow_status(state, run_id).await
        }

        (Method::POST, p) if p.starts_with("/api/v1/workflows/") && p.ends_with("/run") => {
            let workflow_id = p
                .trim_start_matches("/api/v1/workflows/")
                .trim_end_matches("/run");
            routes::handle_workflow_run(state, workflow_id).await
        }

        (_, p) => routes::not_found_response(p),
    };

    Ok(response)
}
