//! Idle culling commands

use anyhow::{Context, Result};
use chrono::Utc;
use colored::Colorize;
use hub_lib::culler::{evaluate, rank, session_from_pod};
use hub_lib::{CullEvaluation, CullerSettings, GpuAwarePolicy, SessionSpec};
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams};
use serde::de::DeserializeOwned;
use std::path::Path;
use tabled::Tabled;

use crate::output::{
    color_priority, format_duration, print_heading, print_json, print_rows, OutputFormat,
};

/// Row for culling ranking table
#[derive(Tabled)]
struct EvaluationRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Pod")]
    pod: String,
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "GPUs")]
    accelerators: String,
    #[tabled(rename = "Idle Timeout")]
    timeout: String,
    #[tabled(rename = "Priority")]
    priority: String,
}

fn rows(evaluations: &[CullEvaluation]) -> Vec<EvaluationRow> {
    evaluations
        .iter()
        .enumerate()
        .map(|(i, e)| EvaluationRow {
            rank: i + 1,
            pod: e.pod.clone(),
            namespace: e.namespace.clone(),
            accelerators: e
                .accelerator_units
                .map(|u| u.to_string())
                .unwrap_or_else(|| "?".to_string()),
            timeout: format_duration(e.timeout_secs),
            priority: color_priority(e.priority),
        })
        .collect()
}

/// Show the culler settings
pub fn show_settings(settings: &CullerSettings, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(settings)?,
        OutputFormat::Table => {
            print_heading("Idle Culler");
            println!("Base timeout:          {}", format_duration(settings.timeout));
            println!("Poll interval:         {}", format_duration(settings.every));
            println!("Concurrency:           {}", settings.concurrency);
            println!(
                "Max age:               {}",
                settings
                    .max_age()
                    .map(|d| format_duration(d.as_secs()))
                    .unwrap_or_else(|| "disabled".to_string())
            );
            println!("Remove named servers:  {}", settings.remove_named_servers);
            println!();
            println!("{}", "Timeouts by accelerator count".bold());
            println!("{}", "-".repeat(50));
            println!("CPU only:              {}", format_duration(settings.timeouts.cpu_secs));
            println!(
                "1 GPU:                 {}",
                format_duration(settings.timeouts.single_accelerator_secs)
            );
            println!(
                "2+ GPUs:               {}",
                format_duration(settings.timeouts.multi_accelerator_secs)
            );
            println!();
            println!("{}", "Priority bonus".bold());
            println!("{}", "-".repeat(50));
            println!("1 GPU:                 +{}", settings.bonuses.single_accelerator);
            println!("2+ GPUs:               +{}", settings.bonuses.multi_accelerator);
        }
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Evaluate a pod manifest stored as JSON
pub fn evaluate_file(
    settings: &CullerSettings,
    pod_path: &Path,
    session_path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let pod: Pod = read_json(pod_path)?;
    let session: SessionSpec = match session_path {
        Some(path) => read_json(path)?,
        None => session_from_pod(&pod),
    };

    let policy = GpuAwarePolicy::from_settings(settings);
    let evaluation = evaluate(&policy, &session, &pod, Utc::now());

    match format {
        OutputFormat::Json => print_json(&evaluation)?,
        OutputFormat::Table => {
            print_heading(&format!("Culling policy for {}", evaluation.pod));
            println!("Idle timeout:     {}", format_duration(evaluation.timeout_secs));
            println!("Priority:         {}", color_priority(evaluation.priority));
            println!(
                "Accelerators:     {}",
                evaluation
                    .accelerator_units
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "unparseable".to_string())
            );
            println!(
                "Removal allowed:  {}",
                if evaluation.proceed { "yes".green() } else { "no".red() }
            );
        }
    }
    Ok(())
}

/// Rank running notebook pods by removal priority
pub async fn rank_pods(
    settings: &CullerSettings,
    kubeconfig: Option<&str>,
    namespace: &str,
    selector: &str,
    format: OutputFormat,
) -> Result<()> {
    let client = crate::config::kube_client(kubeconfig).await?;
    let pods: Api<Pod> = Api::namespaced(client, namespace);
    let list = pods
        .list(&ListParams::default().labels(selector))
        .await
        .with_context(|| format!("Failed to list pods in namespace {}", namespace))?;
    tracing::debug!(count = list.items.len(), "Listed notebook pods");

    let policy = GpuAwarePolicy::from_settings(settings);
    let now = Utc::now();
    let mut evaluations: Vec<CullEvaluation> = list
        .items
        .iter()
        .map(|pod| evaluate(&policy, &session_from_pod(pod), pod, now))
        .collect();
    rank(&mut evaluations);

    print_rows(&evaluations, rows, format)
}
