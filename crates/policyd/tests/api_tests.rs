//! Integration tests for the policy API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use hub_lib::{
    health::{Component, HealthRegistry},
    observability::{PolicyMetrics, StructuredLogger},
    AdminSettings, HubConfig, OAuthSettings, ProfileCatalog,
};
use hub_policyd::{create_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn oauth() -> OAuthSettings {
    serde_json::from_value(json!({
        "client_id": "hub",
        "client_secret": "s3cret",
        "oauth_callback_url": "https://hub.example.org/hub/oauth_callback",
        "authorize_url": "https://auth.example.org/authorize/",
        "token_url": "https://auth.example.org/token/",
        "userdata_url": "https://auth.example.org/userinfo/"
    }))
    .unwrap()
}

async fn setup_test_app() -> (Router, Arc<AppState>) {
    let config = HubConfig {
        auth: Some(oauth()),
        admin: AdminSettings {
            users: vec!["ops.lead".to_string()],
        },
        ..Default::default()
    };
    let catalog = ProfileCatalog::new(hub_lib::profiles::builtin_profiles()).unwrap();

    let state = Arc::new(AppState::new(
        &config,
        catalog,
        HealthRegistry::new(),
        PolicyMetrics::new(),
        StructuredLogger::new("test"),
    ));
    state.record_component_health().await;

    (create_router(state.clone()), state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

async fn post(app: Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn gpu_pod(last_activity: &str, gpus: &str) -> Value {
    json!({
        "metadata": {
            "name": "jupyter-alice",
            "namespace": "jhub",
            "annotations": {
                "jupyterhub.alpha.kubernetes.io/last-activity": last_activity
            }
        },
        "spec": {
            "containers": [{
                "name": "notebook",
                "image": "nvcr.io/nvidia/pytorch:24.11-py3",
                "resources": {
                    "limits": {"nvidia.com/gpu": gpus, "cpu": "16"}
                }
            }]
        }
    })
}

#[tokio::test]
async fn test_healthz_reports_components() {
    let (app, _state) = setup_test_app().await;
    let (status, health) = get(app, "/healthz").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert!(health["components"]["catalog"].is_object());
    assert!(health["components"]["cull_policy"].is_object());
    assert!(health["components"]["auth"].is_object());
}

#[tokio::test]
async fn test_healthz_returns_503_when_unhealthy() {
    let (app, state) = setup_test_app().await;
    state
        .health_registry
        .set_unhealthy(Component::Catalog, "empty")
        .await;

    let (status, health) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health["status"], "unhealthy");
}

#[tokio::test]
async fn test_readyz_follows_registry() {
    let (app, state) = setup_test_app().await;
    let (status, readiness) = get(app.clone(), "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["ready"], false);

    state.health_registry.set_ready(true).await;
    let (status, readiness) = get(app, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(readiness["ready"], true);
}

#[tokio::test]
async fn test_list_profiles() {
    let (app, _state) = setup_test_app().await;
    let (status, profiles) = get(app, "/v1/profiles").await;

    assert_eq!(status, StatusCode::OK);
    let profiles = profiles.as_array().unwrap();
    assert_eq!(profiles.len(), 6);
    assert_eq!(profiles[0]["slug"], "cpu-default");
    assert_eq!(profiles[0]["default"], true);
}

#[tokio::test]
async fn test_resolve_gpu_profile_for_standard_user() {
    let (app, _state) = setup_test_app().await;
    let (status, body) = post(
        app,
        "/v1/profiles/resolve",
        json!({
            "username": "student",
            "form": {
                "profile": ["gpu-pytorch-single"],
                "custom_image": ["evil/image"],
                "custom_gpus": ["8"]
            }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"], "gpu-pytorch-single");
    assert_eq!(body["fallback"], false);
    assert_eq!(body["privilege"], "standard");
    assert_eq!(body["session"]["image"], "nvcr.io/nvidia/pytorch:24.11-py3");
    assert_eq!(body["session"]["extra_resource_limits"]["nvidia.com/gpu"], "1");
    assert_eq!(body["session"]["environment"]["NVIDIA_VISIBLE_DEVICES"], "all");
}

#[tokio::test]
async fn test_resolve_admin_overrides() {
    let (app, _state) = setup_test_app().await;
    let (_, body) = post(
        app,
        "/v1/profiles/resolve",
        json!({
            "username": "ops.lead",
            "form": {
                "custom_image": ["  registry.example.org/lab:dev "],
                "custom_gpus": ["2"]
            }
        }),
    )
    .await;

    assert_eq!(body["profile"], "cpu-default");
    assert_eq!(body["privilege"], "admin");
    assert_eq!(body["session"]["image"], "registry.example.org/lab:dev");
    assert_eq!(body["session"]["extra_resource_limits"]["nvidia.com/gpu"], "2");
    assert_eq!(body["session"]["extra_resource_guarantees"]["nvidia.com/gpu"], "2");
}

#[tokio::test]
async fn test_resolve_unknown_profile_falls_back() {
    let (app, _state) = setup_test_app().await;
    let (status, body) = post(
        app,
        "/v1/profiles/resolve",
        json!({"username": "student", "form": {"profile": ["gpu-h100-octa"]}}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"], "cpu-default");
    assert_eq!(body["fallback"], true);
}

#[tokio::test]
async fn test_evaluate_gpu_session() {
    let (app, _state) = setup_test_app().await;
    let (status, body) = post(
        app,
        "/v1/culler/evaluate",
        json!({"pod": gpu_pod("2000-01-01T00:00:00Z", "2")}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pod"], "jupyter-alice");
    assert_eq!(body["namespace"], "jhub");
    assert_eq!(body["timeout_secs"], 21600);
    assert_eq!(body["proceed"], true);
    assert_eq!(body["accelerator_units"], 2);
    // years idle plus the dual-GPU bonus
    assert!(body["priority"].as_i64().unwrap() > 20);
}

#[tokio::test]
async fn test_evaluate_uses_supplied_session() {
    let (app, _state) = setup_test_app().await;
    let (_, body) = post(
        app,
        "/v1/culler/evaluate",
        json!({
            "pod": gpu_pod("not-a-timestamp", "1"),
            "session": {
                "image": "quay.io/jupyter/scipy-notebook:2024-10-07",
                "cpu_limit": 2.0,
                "mem_limit": "2G",
                "cpu_guarantee": 0.1,
                "mem_guarantee": "512M"
            }
        }),
    )
    .await;

    assert_eq!(body["timeout_secs"], 7200);
    assert_eq!(body["priority"], 0);
    assert_eq!(body["proceed"], true);
}

#[tokio::test]
async fn test_culler_settings() {
    let (app, _state) = setup_test_app().await;
    let (_, body) = get(app, "/v1/culler/settings").await;

    assert_eq!(body["timeout"], 7200);
    assert_eq!(body["every"], 600);
    assert_eq!(body["concurrency"], 10);
    assert_eq!(body["max_age"], 0);
    assert_eq!(body["remove_named_servers"], true);
}

#[tokio::test]
async fn test_auth_settings_are_redacted() {
    let (app, _state) = setup_test_app().await;
    let (_, body) = get(app, "/v1/auth").await;

    assert_eq!(body["oauth"]["client_id"], "hub");
    assert_eq!(body["oauth"]["client_secret"], "<redacted>");
    assert_eq!(body["oauth"]["username_claim"], "preferred_username");
    assert_eq!(body["admin_users"][0], "ops.lead");
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, _state) = setup_test_app().await;
    post(
        app.clone(),
        "/v1/profiles/resolve",
        json!({"username": "student", "form": {}}),
    )
    .await;

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();
    assert!(metrics_text.contains("hub_policy_profile_applications_total"));
    assert!(metrics_text.contains("hub_policy_catalog_profiles"));
}
