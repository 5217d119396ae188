//! Combined policy answers for a single session

use super::accelerators::{is_accelerator_key, pod_accelerator_units};
use super::CullPolicy;
use crate::models::SessionSpec;
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Pod;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything the culler asks about one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CullEvaluation {
    pub pod: String,
    pub namespace: String,
    pub timeout_secs: u64,
    pub priority: i64,
    pub proceed: bool,
    /// Accelerator units across all containers, `None` if unparseable
    pub accelerator_units: Option<i64>,
}

/// Ask all three policy questions for one session
pub fn evaluate(
    policy: &dyn CullPolicy,
    session: &SessionSpec,
    pod: &Pod,
    now: DateTime<Utc>,
) -> CullEvaluation {
    CullEvaluation {
        pod: pod.metadata.name.clone().unwrap_or_default(),
        namespace: pod.metadata.namespace.clone().unwrap_or_default(),
        timeout_secs: policy.timeout(session, pod).as_secs(),
        priority: policy.priority(session, pod, now),
        proceed: policy.should_proceed_with_removal(session, pod),
        accelerator_units: pod_accelerator_units(pod)
            .ok()
            .map(|units| units.into_iter().fold(0, i64::saturating_add)),
    }
}

/// Order evaluations so the first entry should be removed first
pub fn rank(evaluations: &mut [CullEvaluation]) {
    evaluations.sort_by(|a, b| b.priority.cmp(&a.priority));
}

/// Reconstruct the spawner view of a running pod.
///
/// Used when only the cluster state is at hand: the image and accelerator
/// limits come from the first container.
pub fn session_from_pod(pod: &Pod) -> SessionSpec {
    let mut session = SessionSpec::default();
    let Some(container) = pod.spec.as_ref().and_then(|s| s.containers.first()) else {
        return session;
    };

    if let Some(image) = &container.image {
        session.image = image.clone();
    }

    if let Some(resources) = &container.resources {
        session.extra_resource_limits = accelerator_entries(resources.limits.as_ref());
        session.extra_resource_guarantees = accelerator_entries(resources.requests.as_ref());
    }
    session.node_selector = pod
        .spec
        .as_ref()
        .and_then(|s| s.node_selector.clone())
        .unwrap_or_default();
    session
}

fn accelerator_entries(
    quantities: Option<&BTreeMap<String, k8s_openapi::apimachinery::pkg::api::resource::Quantity>>,
) -> BTreeMap<String, String> {
    quantities
        .into_iter()
        .flatten()
        .filter(|(key, _)| is_accelerator_key(key))
        .map(|(key, quantity)| (key.clone(), quantity.0.clone()))
        .collect()
}
