//! Observability for the policy service
//!
//! Provides:
//! - Prometheus metrics (profile applications, fallbacks, cull evaluations)
//! - Structured JSON logging with tracing

use crate::culler::CullEvaluation;
use crate::models::{Privilege, SessionSpec};
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Buckets for removal priority (idle hours plus accelerator bonus)
const PRIORITY_BUCKETS: &[f64] = &[0.0, 1.0, 2.0, 4.0, 8.0, 12.0, 24.0, 48.0, 96.0];

static GLOBAL_METRICS: OnceLock<PolicyMetricsInner> = OnceLock::new();

struct PolicyMetricsInner {
    profile_applications: IntCounterVec,
    profile_fallbacks: IntCounter,
    cull_evaluations: IntCounter,
    cull_priority: Histogram,
    accelerator_sessions_evaluated: IntCounter,
    catalog_profiles: IntGauge,
    catalog_issues: IntGauge,
}

impl PolicyMetricsInner {
    fn new() -> Self {
        Self {
            profile_applications: register_int_counter_vec!(
                "hub_policy_profile_applications_total",
                "Profiles applied to starting sessions",
                &["profile"]
            )
            .expect("Failed to register profile_applications"),

            profile_fallbacks: register_int_counter!(
                "hub_policy_profile_fallbacks_total",
                "Requests for unknown profile slugs served by the fallback profile"
            )
            .expect("Failed to register profile_fallbacks"),

            cull_evaluations: register_int_counter!(
                "hub_policy_cull_evaluations_total",
                "Sessions evaluated for idle culling"
            )
            .expect("Failed to register cull_evaluations"),

            cull_priority: register_histogram!(
                "hub_policy_cull_priority",
                "Removal priority of evaluated sessions",
                PRIORITY_BUCKETS.to_vec()
            )
            .expect("Failed to register cull_priority"),

            accelerator_sessions_evaluated: register_int_counter!(
                "hub_policy_accelerator_sessions_evaluated_total",
                "Evaluated sessions holding at least one accelerator"
            )
            .expect("Failed to register accelerator_sessions_evaluated"),

            catalog_profiles: register_int_gauge!(
                "hub_policy_catalog_profiles",
                "Number of profiles in the loaded catalog"
            )
            .expect("Failed to register catalog_profiles"),

            catalog_issues: register_int_gauge!(
                "hub_policy_catalog_issues",
                "Non-fatal issues found in the loaded catalog"
            )
            .expect("Failed to register catalog_issues"),
        }
    }
}

/// Lightweight handle to the global metrics; clones share the same metrics.
#[derive(Clone)]
pub struct PolicyMetrics {
    _private: (),
}

impl Default for PolicyMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(PolicyMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &PolicyMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn inc_profile_applied(&self, slug: &str, fallback: bool) {
        self.inner()
            .profile_applications
            .with_label_values(&[slug])
            .inc();
        if fallback {
            self.inner().profile_fallbacks.inc();
        }
    }

    pub fn observe_evaluation(&self, evaluation: &CullEvaluation) {
        let inner = self.inner();
        inner.cull_evaluations.inc();
        inner.cull_priority.observe(evaluation.priority as f64);
        if evaluation.accelerator_units.unwrap_or(0) > 0 {
            inner.accelerator_sessions_evaluated.inc();
        }
    }

    pub fn set_catalog_state(&self, profiles: usize, issues: usize) {
        self.inner().catalog_profiles.set(profiles as i64);
        self.inner().catalog_issues.set(issues as i64);
    }
}

/// Event-tagged logging for policy decisions
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_profile_applied(
        &self,
        username: &str,
        requested: &str,
        resolved: &str,
        privilege: Privilege,
        spec: &SessionSpec,
    ) {
        if requested != resolved {
            warn!(
                event = "profile_fallback",
                service = %self.service,
                username = %username,
                requested = %requested,
                resolved = %resolved,
                "Unknown profile requested, serving fallback"
            );
        }

        info!(
            event = "profile_applied",
            service = %self.service,
            username = %username,
            profile = %resolved,
            admin = privilege.is_admin(),
            image = %spec.image,
            cpu_limit = spec.cpu_limit,
            mem_limit = %spec.mem_limit,
            accelerators = ?spec.extra_resource_limits,
            "Applied profile to session"
        );
    }

    pub fn log_cull_evaluated(&self, evaluation: &CullEvaluation) {
        info!(
            event = "cull_evaluated",
            service = %self.service,
            pod = %evaluation.pod,
            namespace = %evaluation.namespace,
            timeout_secs = evaluation.timeout_secs,
            priority = evaluation.priority,
            proceed = evaluation.proceed,
            accelerator_units = ?evaluation.accelerator_units,
            "Evaluated session for culling"
        );
    }

    pub fn log_startup(&self, version: &str, profiles: usize, listen_port: u16) {
        info!(
            event = "service_started",
            service = %self.service,
            version = %version,
            profiles = profiles,
            listen_port = listen_port,
            "Policy service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Policy service shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_metrics_handles_share_registry() {
        let metrics = PolicyMetrics::new();
        let other = metrics.clone();

        metrics.inc_profile_applied("cpu-default", false);
        other.inc_profile_applied("nope", true);
        metrics.set_catalog_state(6, 0);
        metrics.observe_evaluation(&CullEvaluation {
            pod: "jupyter-alice".to_string(),
            namespace: "jhub".to_string(),
            timeout_secs: 14400,
            priority: 13,
            proceed: true,
            accelerator_units: Some(1),
        });

        assert!(other.inner().profile_fallbacks.get() >= 1);
        assert!(other.inner().cull_evaluations.get() >= 1);
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("hub-policyd");
        assert_eq!(logger.service, "hub-policyd");
    }
}
