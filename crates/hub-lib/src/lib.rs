//! Policy library for a multi-tenant notebook hub on Kubernetes
//!
//! This crate provides:
//! - The compute profile catalog and its resolution to session specs
//! - GPU-aware idle culling policy
//! - Authenticator and admin settings
//! - Configuration loading, health checks and observability

pub mod auth;
pub mod config;
pub mod culler;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod profiles;
pub mod render;

pub use auth::{AdminSettings, OAuthSettings};
pub use config::{HubConfig, ServerSettings};
pub use culler::{CullEvaluation, CullPolicy, CullerSettings, GpuAwarePolicy};
pub use error::{HubError, HubResult};
pub use health::{
    Component, ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse,
    ReadinessResponse,
};
pub use models::*;
pub use observability::{PolicyMetrics, StructuredLogger};
pub use profiles::{options_from_form, FormData, ProfileCatalog, UserOptions};
