//! Configuration and cluster access for the CLI

use anyhow::{Context, Result};
use hub_lib::{HubConfig, ProfileCatalog};
use kube::config::{KubeConfigOptions, Kubeconfig};
use std::path::Path;

/// Load the hub configuration and its profile catalog
pub fn load_hub(config_path: Option<&Path>) -> Result<(HubConfig, ProfileCatalog)> {
    let config = HubConfig::load(config_path).context("Failed to load hub configuration")?;
    let catalog = config.catalog().context("Failed to load profile catalog")?;
    Ok((config, catalog))
}

/// Build a Kubernetes client.
///
/// An explicit kubeconfig file wins; otherwise the configuration is inferred
/// the way kubectl does it (`KUBECONFIG` path list, `~/.kube/config`, then
/// in-cluster service account).
pub async fn kube_client(kubeconfig: Option<&str>) -> Result<kube::Client> {
    let config = match kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("Failed to read kubeconfig {}", path))?;
            kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .context("Invalid kubeconfig")?
        }
        None => kube::Config::infer()
            .await
            .context("Failed to infer Kubernetes configuration")?,
    };
    kube::Client::try_from(config).context("Failed to create Kubernetes client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_explicit_kubeconfig_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-kubeconfig");
        let path = path.to_str().unwrap();

        let err = kube_client(Some(path)).await.err().unwrap();
        assert!(err.to_string().contains(path));
    }

    #[test]
    fn test_load_hub_with_builtin_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hub.toml");
        std::fs::write(&path, "[culler]\nconcurrency = 3\n").unwrap();

        let (config, catalog) = load_hub(Some(&path)).unwrap();
        assert_eq!(config.culler.concurrency, 3);
        assert_eq!(catalog.fallback().slug, "cpu-default");
    }
}
