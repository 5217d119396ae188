//! Authenticator commands

use anyhow::Result;
use colored::Colorize;
use hub_lib::{AdminSettings, OAuthSettings};
use serde::Serialize;

use crate::output::{print_heading, print_json, print_warning, OutputFormat};

#[derive(Serialize)]
struct AuthView<'a> {
    oauth: Option<OAuthSettings>,
    admin_users: &'a [String],
}

/// Show the authenticator settings with the client secret redacted
pub fn show_auth(
    auth: Option<&OAuthSettings>,
    admin: &AdminSettings,
    format: OutputFormat,
) -> Result<()> {
    let oauth = auth.map(OAuthSettings::redacted);

    match format {
        OutputFormat::Json => print_json(&AuthView {
            oauth,
            admin_users: &admin.users,
        })?,
        OutputFormat::Table => {
            print_heading("Authentication");
            match &oauth {
                Some(oauth) => {
                    println!("Login service:    {}", oauth.login_service.cyan());
                    println!("Client ID:        {}", oauth.client_id);
                    println!("Client secret:    {}", oauth.client_secret);
                    println!("Callback URL:     {}", oauth.oauth_callback_url);
                    println!("Authorize URL:    {}", oauth.authorize_url);
                    println!("Token URL:        {}", oauth.token_url);
                    println!("Userdata URL:     {}", oauth.userdata_url);
                    println!("Username claim:   {}", oauth.username_claim);
                    println!("Groups claim:     {}", oauth.claim_groups_key);
                    println!("Scope:            {}", oauth.scope.join(" "));
                }
                None => print_warning("No OAuth provider configured"),
            }
            println!();
            println!("{}", "Admin users".bold());
            println!("{}", "-".repeat(50));
            if admin.users.is_empty() {
                println!("(none)");
            }
            for user in &admin.users {
                println!("  {}", user);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_never_carries_secret() {
        let oauth: OAuthSettings = serde_json::from_value(serde_json::json!({
            "client_id": "hub",
            "client_secret": "s3cret",
            "oauth_callback_url": "https://hub.example.org/hub/oauth_callback",
            "authorize_url": "https://sso.example.org/authorize",
            "token_url": "https://sso.example.org/token",
            "userdata_url": "https://sso.example.org/userinfo"
        }))
        .unwrap();
        let admin = AdminSettings {
            users: vec!["alice".to_string()],
        };

        let view = AuthView {
            oauth: Some(oauth.redacted()),
            admin_users: &admin.users,
        };
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("s3cret"));
        assert!(json.contains("alice"));

        show_auth(Some(&oauth), &admin, OutputFormat::Table).unwrap();
        show_auth(None, &AdminSettings::default(), OutputFormat::Json).unwrap();
    }
}
