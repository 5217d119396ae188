//! OAuth and admin settings for the hub's authenticator

use crate::models::Privilege;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder shown wherever the client secret would be printed
pub const REDACTED: &str = "<redacted>";

/// Settings of the OpenID Connect provider used for login
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub oauth_callback_url: String,
    pub authorize_url: String,
    pub token_url: String,
    pub userdata_url: String,
    #[serde(default = "default_login_service")]
    pub login_service: String,
    #[serde(default = "default_username_claim")]
    pub username_claim: String,
    #[serde(default = "default_userdata_params")]
    pub userdata_params: BTreeMap<String, String>,
    #[serde(default = "default_scope")]
    pub scope: Vec<String>,
    #[serde(default = "default_claim_groups_key")]
    pub claim_groups_key: String,
}

fn default_login_service() -> String {
    "CPS Authentik".to_string()
}

fn default_username_claim() -> String {
    "preferred_username".to_string()
}

fn default_userdata_params() -> BTreeMap<String, String> {
    BTreeMap::from([("state".to_string(), "state".to_string())])
}

fn default_scope() -> Vec<String> {
    ["openid", "profile", "email", "groups"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_claim_groups_key() -> String {
    "groups".to_string()
}

impl OAuthSettings {
    /// Copy with the client secret replaced by a placeholder
    pub fn redacted(&self) -> Self {
        Self {
            client_secret: REDACTED.to_string(),
            ..self.clone()
        }
    }
}

impl fmt::Debug for OAuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &REDACTED)
            .field("oauth_callback_url", &self.oauth_callback_url)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("userdata_url", &self.userdata_url)
            .field("login_service", &self.login_service)
            .field("username_claim", &self.username_claim)
            .field("scope", &self.scope)
            .field("claim_groups_key", &self.claim_groups_key)
            .finish()
    }
}

/// Users allowed to override profile images and GPU counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSettings {
    #[serde(default)]
    pub users: Vec<String>,
}

impl AdminSettings {
    pub fn privilege_of(&self, username: &str) -> Privilege {
        if self.users.iter().any(|u| u == username) {
            Privilege::Admin
        } else {
            Privilege::Standard
        }
    }
}
