//! GPU-aware culling policy
//!
//! Sessions holding accelerators get longer idle timeouts, but once idle
//! they are removed ahead of CPU-only sessions so the GPUs are freed first.

use super::accelerators::{is_accelerator_key, parse_units, session_accelerator_units};
use super::settings::{CullerSettings, PriorityBonuses, TimeoutTiers};
use super::CullPolicy;
use crate::error::{HubError, HubResult};
use crate::models::SessionSpec;
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Pod;
use std::time::Duration;
use tracing::{debug, info};

/// Pod annotation where the hub records the last user activity
pub const LAST_ACTIVITY_ANNOTATION: &str = "jupyterhub.alpha.kubernetes.io/last-activity";

const SECS_PER_HOUR: i64 = 3600;

/// Culling policy keyed on accelerator holdings
#[derive(Debug, Clone, Default)]
pub struct GpuAwarePolicy {
    timeouts: TimeoutTiers,
    bonuses: PriorityBonuses,
}

impl GpuAwarePolicy {
    pub fn new(timeouts: TimeoutTiers, bonuses: PriorityBonuses) -> Self {
        Self { timeouts, bonuses }
    }

    pub fn from_settings(settings: &CullerSettings) -> Self {
        Self::new(settings.timeouts.clone(), settings.bonuses.clone())
    }

    fn bonus_for(&self, units: i64) -> i64 {
        if units >= 2 {
            self.bonuses.multi_accelerator
        } else if units >= 1 {
            self.bonuses.single_accelerator
        } else {
            0
        }
    }

    /// Adds to `priority` as it goes, so a failure keeps what was counted
    fn accumulate_priority(&self, pod: &Pod, now: DateTime<Utc>, priority: &mut i64) -> HubResult<()> {
        let last_activity = pod
            .metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(LAST_ACTIVITY_ANNOTATION))
            .filter(|v| !v.is_empty());

        if let Some(raw) = last_activity {
            let last_active = DateTime::parse_from_rfc3339(raw).map_err(|source| {
                HubError::InvalidTimestamp {
                    value: raw.clone(),
                    source,
                }
            })?;
            let idle = now.signed_duration_since(last_active.with_timezone(&Utc));
            *priority = priority.saturating_add(idle.num_seconds() / SECS_PER_HOUR);
        }

        let containers = pod.spec.iter().flat_map(|spec| spec.containers.iter());
        for container in containers {
            let Some(limits) = container.resources.as_ref().and_then(|r| r.limits.as_ref()) else {
                continue;
            };

            let mut units: i64 = 0;
            for (key, quantity) in limits {
                if is_accelerator_key(key) {
                    units = units.saturating_add(parse_units(key, &quantity.0)?);
                }
            }
            *priority = priority.saturating_add(self.bonus_for(units));
        }

        Ok(())
    }
}

impl CullPolicy for GpuAwarePolicy {
    fn timeout(&self, session: &SessionSpec, _pod: &Pod) -> Duration {
        let units = session_accelerator_units(&session.extra_resource_limits);
        let secs = if units >= 2 {
            self.timeouts.multi_accelerator_secs
        } else if units >= 1 {
            self.timeouts.single_accelerator_secs
        } else {
            self.timeouts.cpu_secs
        };
        Duration::from_secs(secs)
    }

    fn should_proceed_with_removal(&self, _session: &SessionSpec, pod: &Pod) -> bool {
        if super::pod_holds_accelerator(pod) {
            info!(
                event = "gpu_pod_culled",
                pod_name = pod.metadata.name.as_deref().unwrap_or("<unnamed>"),
                "Culling GPU pod"
            );
        }
        true
    }

    fn priority(&self, _session: &SessionSpec, pod: &Pod, now: DateTime<Utc>) -> i64 {
        let mut priority = 0;
        if let Err(err) = self.accumulate_priority(pod, now, &mut priority) {
            debug!(
                pod_name = pod.metadata.name.as_deref().unwrap_or("<unnamed>"),
                error = %err,
                priority,
                "Priority computation stopped early"
            );
        }
        priority
    }
}
