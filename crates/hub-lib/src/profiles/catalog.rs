//! Profile catalog lookup and application to sessions

use crate::culler::GPU_RESOURCE_KEY;
use crate::error::{HubError, HubResult};
use crate::models::{
    Privilege, Profile, SessionSpec, DEFAULT_CPU_GUARANTEE, DEFAULT_CPU_LIMIT,
    DEFAULT_MEM_GUARANTEE, DEFAULT_MEM_LIMIT,
};
use crate::profiles::UserOptions;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

/// Environment injected into sessions that hold a full GPU
pub const GPU_ENVIRONMENT: [(&str, &str); 3] = [
    ("NVIDIA_VISIBLE_DEVICES", "all"),
    ("NVIDIA_DRIVER_CAPABILITIES", "compute,utility"),
    ("CUDA_DEVICE_ORDER", "PCI_BUS_ID"),
];

/// Non-fatal catalog problems reported at load time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum CatalogIssue {
    /// No profile carries the default flag
    NoDefault,
    /// More than one profile carries the default flag
    MultipleDefaults { slugs: Vec<String> },
    /// Unknown slugs fall back to the first entry, which is not the default
    FallbackNotDefault { first: String },
}

impl fmt::Display for CatalogIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogIssue::NoDefault => write!(f, "no profile is marked as default"),
            CatalogIssue::MultipleDefaults { slugs } => {
                write!(f, "several profiles are marked as default: {}", slugs.join(", "))
            }
            CatalogIssue::FallbackNotDefault { first } => write!(
                f,
                "unknown slugs fall back to '{}', which is not marked as default",
                first
            ),
        }
    }
}

/// Immutable, ordered set of profiles with unique slugs
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ProfileCatalog {
    profiles: Vec<Profile>,
}

impl ProfileCatalog {
    /// Build a catalog, rejecting empty lists and duplicate slugs
    pub fn new(profiles: Vec<Profile>) -> HubResult<Self> {
        if profiles.is_empty() {
            return Err(HubError::EmptyCatalog);
        }

        let mut seen = HashSet::new();
        for profile in &profiles {
            if !seen.insert(profile.slug.as_str()) {
                return Err(HubError::DuplicateSlug(profile.slug.clone()));
            }
        }

        let catalog = Self { profiles };
        for issue in catalog.audit() {
            warn!(issue = %issue, "Profile catalog issue");
        }
        Ok(catalog)
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// The entry unknown slugs resolve to
    pub fn fallback(&self) -> &Profile {
        &self.profiles[0]
    }

    /// Exact slug lookup
    pub fn lookup(&self, slug: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.slug == slug)
    }

    /// Resolve a slug, falling back to the first catalog entry.
    ///
    /// The fallback does not consult the default flag; see [`Self::audit`].
    pub fn resolve(&self, slug: &str) -> &Profile {
        match self.lookup(slug) {
            Some(profile) => profile,
            None => {
                debug!(slug = %slug, fallback = %self.fallback().slug, "Unknown profile slug");
                self.fallback()
            }
        }
    }

    /// Report default-flag problems without rejecting the catalog
    pub fn audit(&self) -> Vec<CatalogIssue> {
        let defaults: Vec<String> = self
            .profiles
            .iter()
            .filter(|p| p.default)
            .map(|p| p.slug.clone())
            .collect();

        let mut issues = Vec::new();
        match defaults.len() {
            0 => issues.push(CatalogIssue::NoDefault),
            1 => {}
            _ => issues.push(CatalogIssue::MultipleDefaults { slugs: defaults }),
        }

        if !self.fallback().default {
            issues.push(CatalogIssue::FallbackNotDefault {
                first: self.fallback().slug.clone(),
            });
        }
        issues
    }

    /// Apply the selected profile to a session spec.
    ///
    /// Custom image and GPU count only take effect for admins.
    pub fn apply(
        &self,
        options: &UserOptions,
        privilege: Privilege,
        base: SessionSpec,
    ) -> SessionSpec {
        let profile = self.resolve(&options.profile);
        let ov = &profile.kubespawner_override;
        let mut spec = base;

        spec.image = match (&options.custom_image, privilege.is_admin()) {
            (Some(image), true) => image.clone(),
            _ => ov.image.clone().unwrap_or(spec.image),
        };

        spec.cpu_limit = ov.cpu_limit.unwrap_or(DEFAULT_CPU_LIMIT);
        spec.mem_limit = ov
            .mem_limit
            .clone()
            .unwrap_or_else(|| DEFAULT_MEM_LIMIT.to_string());
        spec.cpu_guarantee = ov.cpu_guarantee.unwrap_or(DEFAULT_CPU_GUARANTEE);
        spec.mem_guarantee = ov
            .mem_guarantee
            .clone()
            .unwrap_or_else(|| DEFAULT_MEM_GUARANTEE.to_string());

        spec.extra_resource_limits = ov.extra_resource_limits.clone();
        spec.extra_resource_guarantees = ov.extra_resource_guarantees.clone();

        if options.custom_gpus > 0 && privilege.is_admin() {
            let count = options.custom_gpus.to_string();
            spec.extra_resource_limits
                .insert(GPU_RESOURCE_KEY.to_string(), count.clone());
            spec.extra_resource_guarantees
                .insert(GPU_RESOURCE_KEY.to_string(), count);
        }

        spec.node_selector = ov.node_selector.clone();
        spec.tolerations = ov.tolerations.clone();

        let holds_gpu = spec
            .extra_resource_limits
            .get(GPU_RESOURCE_KEY)
            .is_some_and(|v| !v.is_empty());
        if holds_gpu {
            spec.environment.extend(
                GPU_ENVIRONMENT
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string())),
            );
        }

        spec
    }
}
