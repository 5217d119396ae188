//! Core data models for notebook profiles and sessions

use k8s_openapi::api::core::v1::Toleration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fallback CPU limit when a profile does not declare one
pub const DEFAULT_CPU_LIMIT: f64 = 2.0;
/// Fallback memory limit when a profile does not declare one
pub const DEFAULT_MEM_LIMIT: &str = "2G";
/// Fallback CPU guarantee when a profile does not declare one
pub const DEFAULT_CPU_GUARANTEE: f64 = 0.1;
/// Fallback memory guarantee when a profile does not declare one
pub const DEFAULT_MEM_GUARANTEE: &str = "512M";

/// Image used by a fresh session before any profile is applied
pub const DEFAULT_SESSION_IMAGE: &str = "quay.io/jupyter/scipy-notebook:2024-10-07";

/// A user-selectable compute profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub display_name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub kubespawner_override: ResourceOverride,
}

/// Resource overrides applied to a session when its profile is selected
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_limit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem_limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_guarantee: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem_guarantee: Option<String>,
    /// Extended resource limits, e.g. `nvidia.com/gpu: "1"`
    #[serde(default)]
    pub extra_resource_limits: BTreeMap<String, String>,
    #[serde(default)]
    pub extra_resource_guarantees: BTreeMap<String, String>,
    #[serde(default)]
    pub node_selector: BTreeMap<String, String>,
    #[serde(default)]
    pub tolerations: Vec<Toleration>,
}

/// Spawner-side view of a single-user session.
///
/// This is what a profile is applied to at session start and what the
/// culling timeout inspects later on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSpec {
    pub image: String,
    pub cpu_limit: f64,
    pub mem_limit: String,
    pub cpu_guarantee: f64,
    pub mem_guarantee: String,
    #[serde(default)]
    pub extra_resource_limits: BTreeMap<String, String>,
    #[serde(default)]
    pub extra_resource_guarantees: BTreeMap<String, String>,
    #[serde(default)]
    pub node_selector: BTreeMap<String, String>,
    #[serde(default)]
    pub tolerations: Vec<Toleration>,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

impl SessionSpec {
    /// Create a session spec with the given image and fallback resources
    pub fn with_image(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            cpu_limit: DEFAULT_CPU_LIMIT,
            mem_limit: DEFAULT_MEM_LIMIT.to_string(),
            cpu_guarantee: DEFAULT_CPU_GUARANTEE,
            mem_guarantee: DEFAULT_MEM_GUARANTEE.to_string(),
            extra_resource_limits: BTreeMap::new(),
            extra_resource_guarantees: BTreeMap::new(),
            node_selector: BTreeMap::new(),
            tolerations: Vec::new(),
            environment: BTreeMap::new(),
        }
    }
}

impl Default for SessionSpec {
    fn default() -> Self {
        Self::with_image(DEFAULT_SESSION_IMAGE)
    }
}

/// Whether the requesting identity may override catalog settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privilege {
    Admin,
    Standard,
}

impl Privilege {
    pub fn is_admin(self) -> bool {
        matches!(self, Privilege::Admin)
    }
}
