//! Built-in profile catalog for the GPU cluster

use crate::culler::GPU_RESOURCE_KEY;
use crate::models::{Profile, ResourceOverride};
use k8s_openapi::api::core::v1::Toleration;
use std::collections::BTreeMap;

/// Node label carrying the GPU product name
pub const GPU_PRODUCT_LABEL: &str = "nvidia.com/gpu.product";

/// Product name of the cluster's A100 cards
pub const GPU_PRODUCT_A100: &str = "NVIDIA-A100-PCIE-40GB";

/// Taint key on GPU nodes
pub const GPU_TOLERATION_KEY: &str = "nvidia.com/gpu";

const PYTORCH_IMAGE: &str = "nvcr.io/nvidia/pytorch:24.11-py3";
const TENSORFLOW_IMAGE: &str = "nvcr.io/nvidia/tensorflow:24.11-tf2-py3";

/// Build the default catalog. The first entry is the default profile.
pub fn builtin_profiles() -> Vec<Profile> {
    vec![
        Profile {
            display_name: "CPU (Default)".to_string(),
            slug: "cpu-default".to_string(),
            description: "Standard CPU-only environment for development and testing".to_string(),
            default: true,
            kubespawner_override: ResourceOverride {
                image: Some("quay.io/jupyter/scipy-notebook:2024-10-07".to_string()),
                cpu_limit: Some(2.0),
                mem_limit: Some("2G".to_string()),
                cpu_guarantee: Some(0.1),
                mem_guarantee: Some("512M".to_string()),
                ..Default::default()
            },
        },
        gpu_profile(
            "GPU: PyTorch (1×)",
            "gpu-pytorch-single",
            "PyTorch environment with single NVIDIA A100 GPU",
            PYTORCH_IMAGE,
            GpuShape::SINGLE,
        ),
        gpu_profile(
            "GPU: TensorFlow (1×)",
            "gpu-tensorflow-single",
            "TensorFlow environment with single NVIDIA A100 GPU",
            TENSORFLOW_IMAGE,
            GpuShape::SINGLE,
        ),
        gpu_profile(
            "GPU: PyTorch (2×)",
            "gpu-pytorch-dual",
            "PyTorch environment with dual NVIDIA A100 GPUs",
            PYTORCH_IMAGE,
            GpuShape::DUAL,
        ),
        gpu_profile(
            "GPU: TensorFlow (2×)",
            "gpu-tensorflow-dual",
            "TensorFlow environment with dual NVIDIA A100 GPUs",
            TENSORFLOW_IMAGE,
            GpuShape::DUAL,
        ),
        gpu_profile(
            "GPU: MIG 1g.5gb",
            "gpu-mig-1g5",
            "MIG slice environment (1 compute instance, 5GB memory)",
            PYTORCH_IMAGE,
            GpuShape::MIG_1G_5GB,
        ),
    ]
}

/// Resource sizing of a GPU profile
struct GpuShape {
    cpu_limit: f64,
    mem_limit: &'static str,
    cpu_guarantee: f64,
    mem_guarantee: &'static str,
    resource_key: &'static str,
    units: &'static str,
}

impl GpuShape {
    const SINGLE: GpuShape = GpuShape {
        cpu_limit: 16.0,
        mem_limit: "64G",
        cpu_guarantee: 2.0,
        mem_guarantee: "8G",
        resource_key: GPU_RESOURCE_KEY,
        units: "1",
    };

    const DUAL: GpuShape = GpuShape {
        cpu_limit: 32.0,
        mem_limit: "128G",
        cpu_guarantee: 4.0,
        mem_guarantee: "16G",
        resource_key: GPU_RESOURCE_KEY,
        units: "2",
    };

    const MIG_1G_5GB: GpuShape = GpuShape {
        cpu_limit: 8.0,
        mem_limit: "32G",
        cpu_guarantee: 1.0,
        mem_guarantee: "4G",
        resource_key: "nvidia.com/mig-1g.5gb",
        units: "1",
    };
}

fn gpu_profile(
    display_name: &str,
    slug: &str,
    description: &str,
    image: &str,
    shape: GpuShape,
) -> Profile {
    let accelerators: BTreeMap<String, String> =
        BTreeMap::from([(shape.resource_key.to_string(), shape.units.to_string())]);

    Profile {
        display_name: display_name.to_string(),
        slug: slug.to_string(),
        description: description.to_string(),
        default: false,
        kubespawner_override: ResourceOverride {
            image: Some(image.to_string()),
            cpu_limit: Some(shape.cpu_limit),
            mem_limit: Some(shape.mem_limit.to_string()),
            cpu_guarantee: Some(shape.cpu_guarantee),
            mem_guarantee: Some(shape.mem_guarantee.to_string()),
            extra_resource_limits: accelerators.clone(),
            extra_resource_guarantees: accelerators,
            node_selector: BTreeMap::from([(
                GPU_PRODUCT_LABEL.to_string(),
                GPU_PRODUCT_A100.to_string(),
            )]),
            tolerations: vec![gpu_toleration()],
        },
    }
}

fn gpu_toleration() -> Toleration {
    Toleration {
        key: Some(GPU_TOLERATION_KEY.to_string()),
        operator: Some("Exists".to_string()),
        effect: Some("NoSchedule".to_string()),
        ..Default::default()
    }
}
