//! HTTP API for policy hooks, health checks and Prometheus metrics

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use hub_lib::{
    culler::{evaluate, session_from_pod},
    health::{Component, ComponentStatus, HealthRegistry},
    observability::{PolicyMetrics, StructuredLogger},
    options_from_form, AdminSettings, CullEvaluation, CullerSettings, FormData, GpuAwarePolicy,
    HubConfig, OAuthSettings, Privilege, Profile, ProfileCatalog, SessionSpec,
};
use k8s_openapi::api::core::v1::Pod;
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state, immutable after startup apart from health
#[derive(Clone)]
pub struct AppState {
    pub catalog: ProfileCatalog,
    pub culler: CullerSettings,
    pub policy: GpuAwarePolicy,
    pub auth: Option<OAuthSettings>,
    pub admin: AdminSettings,
    pub base_image: String,
    pub health_registry: HealthRegistry,
    pub metrics: PolicyMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        config: &HubConfig,
        catalog: ProfileCatalog,
        health_registry: HealthRegistry,
        metrics: PolicyMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            catalog,
            culler: config.culler.clone(),
            policy: GpuAwarePolicy::from_settings(&config.culler),
            auth: config.auth.clone(),
            admin: config.admin.clone(),
            base_image: config.server.base_image.clone(),
            health_registry,
            metrics,
            logger,
        }
    }

    /// Report the state of the loaded configuration to the health registry
    pub async fn record_component_health(&self) {
        let issues = self.catalog.audit();
        self.metrics.set_catalog_state(self.catalog.len(), issues.len());
        if issues.is_empty() {
            self.health_registry.set_healthy(Component::Catalog).await;
        } else {
            let message = issues
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            self.health_registry
                .set_degraded(Component::Catalog, message)
                .await;
        }

        self.health_registry.set_healthy(Component::CullPolicy).await;

        if self.auth.is_some() {
            self.health_registry.set_healthy(Component::Auth).await;
        } else {
            self.health_registry
                .set_degraded(Component::Auth, "no OAuth provider configured")
                .await;
        }
    }
}

/// Profile resolution request sent by the spawner integration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveRequest {
    /// Submitted spawn form
    #[serde(default)]
    pub form: FormData,
    /// Hub username of the requester
    pub username: String,
    /// Current spawner state; a fresh session when absent
    #[serde(default)]
    pub base: Option<SessionSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResponse {
    /// Slug of the profile that was applied
    pub profile: String,
    /// Whether the requested slug was unknown
    pub fallback: bool,
    pub privilege: Privilege,
    pub session: SessionSpec,
}

/// Culling evaluation request sent by the culler integration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateRequest {
    /// Spawner state; reconstructed from the pod when absent
    #[serde(default)]
    pub session: Option<SessionSpec>,
    pub pod: Pod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub oauth: Option<OAuthSettings>,
    pub admin_users: Vec<String>,
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %err, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            Vec::new(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

async fn list_profiles(State(state): State<Arc<AppState>>) -> Json<Vec<Profile>> {
    Json(state.catalog.profiles().to_vec())
}

async fn resolve_profile(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResolveRequest>,
) -> Json<ResolveResponse> {
    let options = options_from_form(&request.form);
    let privilege = state.admin.privilege_of(&request.username);
    let base = request
        .base
        .unwrap_or_else(|| SessionSpec::with_image(state.base_image.clone()));

    let resolved = state.catalog.resolve(&options.profile).slug.clone();
    let fallback = state.catalog.lookup(&options.profile).is_none();
    let session = state.catalog.apply(&options, privilege, base);

    state.metrics.inc_profile_applied(&resolved, fallback);
    state.logger.log_profile_applied(
        &request.username,
        &options.profile,
        &resolved,
        privilege,
        &session,
    );

    Json(ResolveResponse {
        profile: resolved,
        fallback,
        privilege,
        session,
    })
}

async fn culler_settings(State(state): State<Arc<AppState>>) -> Json<CullerSettings> {
    Json(state.culler.clone())
}

async fn evaluate_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EvaluateRequest>,
) -> Json<CullEvaluation> {
    let session = request
        .session
        .unwrap_or_else(|| session_from_pod(&request.pod));
    let evaluation = evaluate(&state.policy, &session, &request.pod, Utc::now());

    state.metrics.observe_evaluation(&evaluation);
    state.logger.log_cull_evaluated(&evaluation);

    Json(evaluation)
}

async fn auth_settings(State(state): State<Arc<AppState>>) -> Json<AuthResponse> {
    Json(AuthResponse {
        oauth: state.auth.as_ref().map(OAuthSettings::redacted),
        admin_users: state.admin.users.clone(),
    })
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/v1/profiles", get(list_profiles))
        .route("/v1/profiles/resolve", post(resolve_profile))
        .route("/v1/culler/settings", get(culler_settings))
        .route("/v1/culler/evaluate", post(evaluate_session))
        .route("/v1/auth", get(auth_settings))
        .with_state(state)
}

/// Start the API server and run until `shutdown` resolves
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting policy API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
