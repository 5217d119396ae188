//! Idle-session culling policy
//!
//! The external culler polls every tracked session at a fixed interval and
//! asks this module three questions per session:
//! - how long may it stay idle ([`CullPolicy::timeout`])
//! - may it be removed now ([`CullPolicy::should_proceed_with_removal`])
//! - how urgently should it be removed ([`CullPolicy::priority`])
//!
//! Answers never fail: problems degrade to the permissive outcome.

mod accelerators;
mod evaluation;
mod policy;
mod settings;

pub use accelerators::{
    is_accelerator_key, pod_accelerator_units, pod_holds_accelerator, session_accelerator_units,
    GPU_RESOURCE_KEY, MIG_RESOURCE_MARKER,
};
pub use evaluation::{evaluate, rank, session_from_pod, CullEvaluation};
pub use policy::{GpuAwarePolicy, LAST_ACTIVITY_ANNOTATION};
pub use settings::{CullerSettings, PriorityBonuses, TimeoutTiers};

use crate::models::SessionSpec;
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Pod;
use std::time::Duration;

/// Decisions the external culler delegates for each tracked session
pub trait CullPolicy: Send + Sync {
    /// Idle time after which the session becomes eligible for removal
    fn timeout(&self, session: &SessionSpec, pod: &Pod) -> Duration;

    /// Hook run right before removal. Returning `false` would block it.
    fn should_proceed_with_removal(&self, session: &SessionSpec, pod: &Pod) -> bool;

    /// Removal urgency; higher values are removed first
    fn priority(&self, session: &SessionSpec, pod: &Pod, now: DateTime<Utc>) -> i64;
}
