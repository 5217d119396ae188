//! Helm values rendering for the zero-to-jupyterhub chart

use crate::auth::{AdminSettings, OAuthSettings};
use crate::config::HubConfig;
use crate::culler::CullerSettings;
use crate::error::HubResult;
use crate::models::Profile;
use crate::profiles::ProfileCatalog;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Values<'a> {
    hub: HubValues<'a>,
    singleuser: SingleUserValues<'a>,
    cull: CullValues,
}

#[derive(Debug, Serialize)]
struct HubValues<'a> {
    config: HubConfigValues<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct HubConfigValues<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    generic_o_authenticator: Option<OAuthSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    jupyter_hub: Option<JupyterHubValues>,
    authenticator: AuthenticatorValues<'a>,
}

#[derive(Debug, Serialize)]
struct JupyterHubValues {
    authenticator_class: &'static str,
}

#[derive(Debug, Serialize)]
struct AuthenticatorValues<'a> {
    admin_users: &'a [String],
}

#[derive(Debug, Serialize)]
struct SingleUserValues<'a> {
    #[serde(rename = "profileList")]
    profile_list: &'a [Profile],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CullValues {
    enabled: bool,
    timeout: u64,
    every: u64,
    concurrency: u32,
    max_age: u64,
    remove_named_servers: bool,
}

impl From<&CullerSettings> for CullValues {
    fn from(settings: &CullerSettings) -> Self {
        Self {
            enabled: true,
            timeout: settings.timeout,
            every: settings.every,
            concurrency: settings.concurrency,
            max_age: settings.max_age,
            remove_named_servers: settings.remove_named_servers,
        }
    }
}

/// Render the chart values for the configured hub.
///
/// The OAuth client secret is replaced by a placeholder unless
/// `include_secret` is set.
pub fn render_values(
    config: &HubConfig,
    catalog: &ProfileCatalog,
    include_secret: bool,
) -> HubResult<String> {
    render(
        catalog,
        &config.culler,
        config.auth.as_ref(),
        &config.admin,
        include_secret,
    )
}

fn render(
    catalog: &ProfileCatalog,
    culler: &CullerSettings,
    auth: Option<&OAuthSettings>,
    admin: &AdminSettings,
    include_secret: bool,
) -> HubResult<String> {
    let oauth = auth.map(|a| if include_secret { a.clone() } else { a.redacted() });

    let values = Values {
        hub: HubValues {
            config: HubConfigValues {
                jupyter_hub: oauth.as_ref().map(|_| JupyterHubValues {
                    authenticator_class: "generic-oauth",
                }),
                generic_o_authenticator: oauth,
                authenticator: AuthenticatorValues {
                    admin_users: &admin.users,
                },
            },
        },
        singleuser: SingleUserValues {
            profile_list: catalog.profiles(),
        },
        cull: CullValues::from(culler),
    };

    Ok(serde_yaml::to_string(&values)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::REDACTED;
    use crate::profiles::builtin_profiles;

    fn oauth() -> OAuthSettings {
        serde_json::from_value(serde_json::json!({
            "client_id": "hub",
            "client_secret": "s3cret",
            "oauth_callback_url": "https://hub.example.org/hub/oauth_callback",
            "authorize_url": "https://auth.example.org/authorize/",
            "token_url": "https://auth.example.org/token/",
            "userdata_url": "https://auth.example.org/userinfo/"
        }))
        .unwrap()
    }

    fn parse(rendered: &str) -> serde_yaml::Value {
        serde_yaml::from_str(rendered).unwrap()
    }

    #[test]
    fn test_render_full_values() {
        let config = HubConfig {
            auth: Some(oauth()),
            admin: AdminSettings {
                users: vec!["ops.lead".to_string()],
            },
            ..Default::default()
        };
        let catalog = ProfileCatalog::new(builtin_profiles()).unwrap();
        let values = parse(&render_values(&config, &catalog, false).unwrap());

        let hub_config = &values["hub"]["config"];
        assert_eq!(hub_config["GenericOAuthenticator"]["client_secret"], REDACTED);
        assert_eq!(hub_config["GenericOAuthenticator"]["client_id"], "hub");
        assert_eq!(hub_config["JupyterHub"]["authenticator_class"], "generic-oauth");
        assert_eq!(hub_config["Authenticator"]["admin_users"][0], "ops.lead");

        let profiles = values["singleuser"]["profileList"].as_sequence().unwrap();
        assert_eq!(profiles.len(), 6);
        assert_eq!(profiles[0]["slug"], "cpu-default");
        assert_eq!(
            profiles[1]["kubespawner_override"]["extra_resource_limits"]["nvidia.com/gpu"],
            "1"
        );

        assert_eq!(values["cull"]["timeout"], 7200);
        assert_eq!(values["cull"]["every"], 600);
        assert_eq!(values["cull"]["maxAge"], 0);
        assert_eq!(values["cull"]["removeNamedServers"], true);
    }

    #[test]
    fn test_render_with_secret() {
        let config = HubConfig {
            auth: Some(oauth()),
            ..Default::default()
        };
        let catalog = ProfileCatalog::new(builtin_profiles()).unwrap();
        let rendered = render_values(&config, &catalog, true).unwrap();
        assert!(rendered.contains("s3cret"));
    }

    #[test]
    fn test_render_without_auth() {
        let catalog = ProfileCatalog::new(builtin_profiles()).unwrap();
        let values = parse(&render_values(&HubConfig::default(), &catalog, false).unwrap());
        assert!(values["hub"]["config"].get("GenericOAuthenticator").is_none());
        assert!(values["hub"]["config"].get("JupyterHub").is_none());
    }
}
