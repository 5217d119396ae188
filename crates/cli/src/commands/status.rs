//! Status of a running policy service

use anyhow::Result;
use colored::Colorize;
use hub_lib::{ComponentStatus, HealthResponse, Profile, ReadinessResponse};
use serde::Serialize;

use crate::client::ApiClient;
use crate::output::{color_status, print_heading, print_json, OutputFormat};

#[derive(Serialize)]
struct StatusView {
    health: HealthResponse,
    readiness: ReadinessResponse,
    profiles: usize,
}

fn status_label(status: ComponentStatus) -> &'static str {
    match status {
        ComponentStatus::Healthy => "healthy",
        ComponentStatus::Degraded => "degraded",
        ComponentStatus::Unhealthy => "unhealthy",
    }
}

/// Query probes and catalog of a running `hub-policyd`
pub async fn show_status(api_url: &str, format: OutputFormat) -> Result<()> {
    let client = ApiClient::new(api_url)?;

    let (_, health): (_, HealthResponse) = client.probe("healthz").await?;
    let (_, readiness): (_, ReadinessResponse) = client.probe("readyz").await?;
    let profiles: Vec<Profile> = client.get("v1/profiles").await?;

    match format {
        OutputFormat::Json => print_json(&StatusView {
            health,
            readiness,
            profiles: profiles.len(),
        })?,
        OutputFormat::Table => {
            print_heading(&format!("Policy service at {}", api_url));
            println!("Status:    {}", color_status(status_label(health.status)));
            let ready = if readiness.ready { "ready" } else { "not ready" };
            match &readiness.reason {
                Some(reason) => println!("Readiness: {} ({})", color_status(ready), reason),
                None => println!("Readiness: {}", color_status(ready)),
            }
            println!("Profiles:  {}", profiles.len());
            println!();
            println!("{}", "Components".bold());
            println!("{}", "-".repeat(50));
            for (component, component_health) in &health.components {
                let line = format!(
                    "{:<12} {}",
                    component.as_str(),
                    color_status(status_label(component_health.status))
                );
                match &component_health.message {
                    Some(message) => println!("{}  {}", line, message.dimmed()),
                    None => println!("{}", line),
                }
            }
        }
    }
    Ok(())
}
