//! Hub policy configuration
//!
//! Built-in defaults, then an optional TOML file, then `HUB_*` environment
//! variables (nested keys separated by `__`, e.g. `HUB_AUTH__CLIENT_SECRET`).
//! The profile catalog is read from its own YAML file when one is named.

use crate::auth::{AdminSettings, OAuthSettings};
use crate::culler::CullerSettings;
use crate::error::{HubError, HubResult};
use crate::models::{Profile, DEFAULT_SESSION_IMAGE};
use crate::profiles::{builtin_profiles, ProfileCatalog};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "HUB_CONFIG";

const ENV_PREFIX: &str = "HUB";

/// Complete policy configuration, read once at startup
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HubConfig {
    /// YAML file with the profile list; the built-in catalog when absent
    #[serde(default)]
    pub profiles_file: Option<PathBuf>,

    #[serde(default)]
    pub culler: CullerSettings,

    #[serde(default)]
    pub auth: Option<OAuthSettings>,

    #[serde(default)]
    pub admin: AdminSettings,

    #[serde(default)]
    pub server: ServerSettings,
}

/// Settings of the policy hook service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Image sessions start from before a profile is applied
    #[serde(default = "default_base_image")]
    pub base_image: String,
}

fn default_listen_port() -> u16 {
    8080
}

fn default_base_image() -> String {
    DEFAULT_SESSION_IMAGE.to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            base_image: default_base_image(),
        }
    }
}

impl HubConfig {
    /// Load configuration from `path`, or from `$HUB_CONFIG` when `path` is `None`
    pub fn load(path: Option<&Path>) -> HubResult<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut builder = config::Config::builder();
        if let Some(path) = &path {
            info!(path = %path.display(), "Loading hub configuration file");
            builder = builder.add_source(config::File::from(path.as_path()).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("admin.users")
                    .try_parsing(true),
            )
            .build()?;

        let mut loaded: HubConfig = config.try_deserialize()?;

        // Relative profile files are resolved against the config file
        if let (Some(profiles), Some(dir)) = (
            loaded.profiles_file.as_mut(),
            path.as_deref().and_then(Path::parent),
        ) {
            if profiles.is_relative() {
                *profiles = dir.join(&*profiles);
            }
        }

        debug!(config = ?loaded, "Hub configuration loaded");
        Ok(loaded)
    }

    /// Build the profile catalog named by this configuration
    pub fn catalog(&self) -> HubResult<ProfileCatalog> {
        let profiles = match &self.profiles_file {
            Some(path) => load_profiles(path)?,
            None => builtin_profiles(),
        };
        ProfileCatalog::new(profiles)
    }
}

/// Read a YAML profile list
pub fn load_profiles(path: &Path) -> HubResult<Vec<Profile>> {
    let content = std::fs::read_to_string(path).map_err(|source| HubError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let profiles: Vec<Profile> = serde_yaml::from_str(&content)?;
    info!(path = %path.display(), count = profiles.len(), "Loaded profile catalog");
    Ok(profiles)
}
