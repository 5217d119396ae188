//! Accelerator resource detection

use crate::error::{HubError, HubResult};
use k8s_openapi::api::core::v1::Pod;
use std::collections::BTreeMap;
use tracing::debug;

/// Extended resource name of a whole NVIDIA GPU
pub const GPU_RESOURCE_KEY: &str = "nvidia.com/gpu";

/// Substring shared by all MIG partition resource names
pub const MIG_RESOURCE_MARKER: &str = "mig-";

/// Whether a resource name denotes a GPU or a GPU partition
pub fn is_accelerator_key(key: &str) -> bool {
    key.contains(GPU_RESOURCE_KEY) || key.contains(MIG_RESOURCE_MARKER)
}

/// Parse a whole-unit quantity such as `"2"`
pub(crate) fn parse_units(key: &str, value: &str) -> HubResult<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| HubError::InvalidQuantity {
            key: key.to_string(),
            value: value.to_string(),
        })
}

fn units_or_zero(key: &str, value: &str) -> i64 {
    parse_units(key, value).unwrap_or_else(|err| {
        debug!(error = %err, "Ignoring unparseable accelerator quantity");
        0
    })
}

/// Accelerator units declared on the spawner side.
///
/// Whole GPUs and MIG slices are not added up: the larger of the GPU count
/// and any single MIG quantity wins. Unparseable quantities count as zero.
pub fn session_accelerator_units(limits: &BTreeMap<String, String>) -> i64 {
    let mut units = limits
        .get(GPU_RESOURCE_KEY)
        .map(|v| units_or_zero(GPU_RESOURCE_KEY, v))
        .unwrap_or(0);

    for (key, value) in limits {
        if key.contains(MIG_RESOURCE_MARKER) {
            units = units.max(units_or_zero(key, value));
        }
    }
    units
}

/// Whether any container of the pod has an accelerator limit
pub fn pod_holds_accelerator(pod: &Pod) -> bool {
    pod.spec
        .iter()
        .flat_map(|spec| spec.containers.iter())
        .filter_map(|c| c.resources.as_ref().and_then(|r| r.limits.as_ref()))
        .any(|limits| limits.keys().any(|k| is_accelerator_key(k)))
}

/// Accelerator units per container, in container order.
///
/// Fails on the first container whose accelerator quantity is not a whole
/// number; containers without limits are skipped.
pub fn pod_accelerator_units(pod: &Pod) -> HubResult<Vec<i64>> {
    let mut per_container = Vec::new();
    let containers = pod.spec.iter().flat_map(|spec| spec.containers.iter());

    for container in containers {
        let Some(limits) = container.resources.as_ref().and_then(|r| r.limits.as_ref()) else {
            continue;
        };

        let mut count: i64 = 0;
        for (key, quantity) in limits {
            if is_accelerator_key(key) {
                count = parse_units(key, &quantity.0)?.saturating_add(count);
            }
        }
        per_container.push(count);
    }
    Ok(per_container)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::culler::policy::tests::pod_with_limits;

    fn limits(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_accelerator_key_detection() {
        assert!(is_accelerator_key("nvidia.com/gpu"));
        assert!(is_accelerator_key("nvidia.com/mig-1g.5gb"));
        assert!(is_accelerator_key("nvidia.com/mig-3g.20gb"));
        assert!(!is_accelerator_key("cpu"));
        assert!(!is_accelerator_key("memory"));
        assert!(!is_accelerator_key("ephemeral-storage"));
    }

    #[test]
    fn test_session_units() {
        assert_eq!(session_accelerator_units(&limits(&[])), 0);
        assert_eq!(session_accelerator_units(&limits(&[("nvidia.com/gpu", "2")])), 2);
        assert_eq!(
            session_accelerator_units(&limits(&[("nvidia.com/mig-1g.5gb", "1")])),
            1
        );
        assert_eq!(
            session_accelerator_units(&limits(&[
                ("nvidia.com/gpu", "1"),
                ("nvidia.com/mig-1g.5gb", "3")
            ])),
            3
        );
        assert_eq!(
            session_accelerator_units(&limits(&[("nvidia.com/gpu", "lots")])),
            0
        );
    }

    #[test]
    fn test_pod_units_per_container() {
        let pod = pod_with_limits(None, &[&[("nvidia.com/gpu", "1")], &[], &[("cpu", "2")]]);
        assert_eq!(pod_accelerator_units(&pod).unwrap(), vec![1, 0, 0]);
        assert!(pod_holds_accelerator(&pod));

        let cpu_only = pod_with_limits(None, &[&[("cpu", "2"), ("memory", "2G")]]);
        assert!(!pod_holds_accelerator(&cpu_only));
    }

    #[test]
    fn test_pod_units_saturate() {
        let pod = pod_with_limits(
            None,
            &[&[("nvidia.com/gpu", "9223372036854775807"), ("nvidia.com/mig-1g.5gb", "1")]],
        );
        assert_eq!(pod_accelerator_units(&pod).unwrap(), vec![i64::MAX]);
    }

    #[test]
    fn test_pod_units_rejects_fractional_quantity() {
        let pod = pod_with_limits(None, &[&[("nvidia.com/gpu", "500m")]]);
        assert!(matches!(
            pod_accelerator_units(&pod),
            Err(HubError::InvalidQuantity { .. })
        ));
    }
}
