//! Notebook hub policy CLI
//!
//! Inspect the profile catalog, preview culling decisions against live pods,
//! and render chart values for the hub.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{auth, culler, profiles, render, status};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Notebook hub policy CLI
#[derive(Parser)]
#[command(name = "hubctl")]
#[command(author, version, about = "CLI for the notebook hub policy", long_about = None)]
pub struct Cli {
    /// Hub configuration file (can also be set via HUB_CONFIG env var)
    #[arg(long, env = "HUB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to kubeconfig file (inferred from KUBECONFIG, ~/.kube/config or
    /// the in-cluster service account if not specified)
    #[arg(long)]
    pub kubeconfig: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect the compute profile catalog
    #[command(subcommand)]
    Profiles(ProfilesCommands),

    /// Inspect and preview the idle culling policy
    #[command(subcommand)]
    Culler(CullerCommands),

    /// Inspect authenticator settings
    #[command(subcommand)]
    Auth(AuthCommands),

    /// Render deployment artifacts
    #[command(subcommand)]
    Render(RenderCommands),

    /// Show the status of a running policy service
    Status {
        /// Policy service URL (can also be set via HUB_POLICY_URL env var)
        #[arg(long, env = "HUB_POLICY_URL", default_value = "http://localhost:8080")]
        api_url: String,
    },
}

#[derive(Subcommand)]
pub enum ProfilesCommands {
    /// List profiles in catalog order
    List,

    /// Show a single profile
    Show {
        /// Profile slug
        slug: String,
    },

    /// Check the catalog for default-profile problems
    Validate,

    /// Resolve a spawn form submission to a session spec
    Resolve {
        /// Selected profile slug
        #[arg(long)]
        profile: Option<String>,

        /// Custom image (honored for admins only)
        #[arg(long)]
        custom_image: Option<String>,

        /// Custom GPU count (honored for admins only)
        #[arg(long)]
        custom_gpus: Option<String>,

        /// Submitting user
        #[arg(long, default_value = "cli-user")]
        user: String,
    },
}

#[derive(Subcommand)]
pub enum CullerCommands {
    /// Show culler settings and timeout tiers
    Settings,

    /// Evaluate a pod manifest (JSON) against the culling policy
    Evaluate {
        /// Pod manifest file
        pod: PathBuf,

        /// Session spec file (derived from the pod if not specified)
        #[arg(long)]
        session: Option<PathBuf>,
    },

    /// Rank running notebook pods by removal priority
    Rank {
        /// Namespace of the notebook pods
        #[arg(long, short, default_value = "jhub")]
        namespace: String,

        /// Label selector of notebook pods
        #[arg(long, short = 'l', default_value = "component=singleuser-server")]
        selector: String,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Show OAuth settings (secret redacted) and admin users
    Show,
}

#[derive(Subcommand)]
pub enum RenderCommands {
    /// Render Helm values for the hub chart
    Values {
        /// Include the OAuth client secret instead of a placeholder
        #[arg(long)]
        include_secret: bool,

        /// Output file path (stdout if not specified)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli).await {
        output::print_error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let load = || config::load_hub(cli.config.as_deref());

    match cli.command {
        Commands::Profiles(profiles_cmd) => {
            let (hub, catalog) = load()?;
            match profiles_cmd {
                ProfilesCommands::List => {
                    profiles::list_profiles(&catalog, cli.format)?;
                }
                ProfilesCommands::Show { slug } => {
                    profiles::show_profile(&catalog, &slug, cli.format)?;
                }
                ProfilesCommands::Validate => {
                    profiles::validate_catalog(&catalog, cli.format)?;
                }
                ProfilesCommands::Resolve {
                    profile,
                    custom_image,
                    custom_gpus,
                    user,
                } => {
                    let args = profiles::ResolveArgs {
                        profile,
                        custom_image,
                        custom_gpus,
                        user,
                    };
                    profiles::resolve_profile(
                        &catalog,
                        &hub.admin,
                        &hub.server.base_image,
                        args,
                        cli.format,
                    )?;
                }
            }
        }
        Commands::Culler(culler_cmd) => {
            let (hub, _) = load()?;
            match culler_cmd {
                CullerCommands::Settings => {
                    culler::show_settings(&hub.culler, cli.format)?;
                }
                CullerCommands::Evaluate { pod, session } => {
                    culler::evaluate_file(&hub.culler, &pod, session.as_deref(), cli.format)?;
                }
                CullerCommands::Rank {
                    namespace,
                    selector,
                } => {
                    culler::rank_pods(
                        &hub.culler,
                        cli.kubeconfig.as_deref(),
                        &namespace,
                        &selector,
                        cli.format,
                    )
                    .await?;
                }
            }
        }
        Commands::Auth(AuthCommands::Show) => {
            let (hub, _) = load()?;
            auth::show_auth(hub.auth.as_ref(), &hub.admin, cli.format)?;
        }
        Commands::Render(RenderCommands::Values {
            include_secret,
            output,
        }) => {
            let (hub, catalog) = load()?;
            render::render(&hub, &catalog, include_secret, output.as_deref())?;
        }
        Commands::Status { api_url } => {
            status::show_status(&api_url, cli.format).await?;
        }
    }

    Ok(())
}
