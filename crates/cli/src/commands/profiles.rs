//! Profile catalog commands

use anyhow::{bail, Result};
use colored::Colorize;
use hub_lib::{
    options_from_form, AdminSettings, FormData, Profile, ProfileCatalog, SessionSpec,
};
use tabled::Tabled;

use crate::output::{
    format_resources, print_heading, print_info, print_json, print_rows, print_success,
    print_warning, OutputFormat,
};

/// Row for profiles table
#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "Slug")]
    slug: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Default")]
    default: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "Accelerators")]
    accelerators: String,
}

impl From<&Profile> for ProfileRow {
    fn from(profile: &Profile) -> Self {
        let ov = &profile.kubespawner_override;
        Self {
            slug: profile.slug.clone(),
            name: profile.display_name.clone(),
            default: if profile.default { "✓".green().to_string() } else { String::new() },
            cpu: format!(
                "{} / {}",
                opt(ov.cpu_guarantee.map(|c| c.to_string())),
                opt(ov.cpu_limit.map(|c| c.to_string()))
            ),
            memory: format!(
                "{} / {}",
                opt(ov.mem_guarantee.clone()),
                opt(ov.mem_limit.clone())
            ),
            accelerators: format_resources(&ov.extra_resource_limits),
        }
    }
}

fn opt(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

/// List all profiles in catalog order
pub fn list_profiles(catalog: &ProfileCatalog, format: OutputFormat) -> Result<()> {
    print_rows(
        catalog.profiles(),
        |profiles| profiles.iter().map(ProfileRow::from).collect(),
        format,
    )
}

/// Show one profile in full
pub fn show_profile(catalog: &ProfileCatalog, slug: &str, format: OutputFormat) -> Result<()> {
    let Some(profile) = catalog.lookup(slug) else {
        bail!("Unknown profile '{}'", slug);
    };

    match format {
        OutputFormat::Json => print_json(profile)?,
        OutputFormat::Table => {
            let ov = &profile.kubespawner_override;
            print_heading(&profile.display_name);
            println!("Slug:          {}", profile.slug.cyan());
            println!("Description:   {}", profile.description);
            println!("Default:       {}", profile.default);
            println!("Image:         {}", ov.image.as_deref().unwrap_or("-"));
            println!(
                "CPU:           guarantee {} / limit {}",
                opt(ov.cpu_guarantee.map(|c| c.to_string())),
                opt(ov.cpu_limit.map(|c| c.to_string()))
            );
            println!(
                "Memory:        guarantee {} / limit {}",
                opt(ov.mem_guarantee.clone()),
                opt(ov.mem_limit.clone())
            );
            println!("Limits:        {}", format_resources(&ov.extra_resource_limits));
            println!(
                "Guarantees:    {}",
                format_resources(&ov.extra_resource_guarantees)
            );
            println!("Node selector: {}", format_resources(&ov.node_selector));
            for toleration in &ov.tolerations {
                println!(
                    "Toleration:    {} {} {}",
                    toleration.key.as_deref().unwrap_or("*"),
                    toleration.operator.as_deref().unwrap_or("Equal"),
                    toleration.effect.as_deref().unwrap_or("")
                );
            }
        }
    }
    Ok(())
}

/// Report catalog issues; fails when there are any
pub fn validate_catalog(catalog: &ProfileCatalog, format: OutputFormat) -> Result<()> {
    let issues = catalog.audit();

    match format {
        OutputFormat::Json => print_json(&issues)?,
        OutputFormat::Table => {
            if issues.is_empty() {
                print_success(&format!(
                    "Catalog is valid ({} profiles, default '{}')",
                    catalog.len(),
                    catalog.fallback().slug
                ));
            }
            for issue in &issues {
                print_warning(&issue.to_string());
            }
        }
    }

    if !issues.is_empty() {
        bail!("{} catalog issue(s) found", issues.len());
    }
    Ok(())
}

/// Arguments of `profiles resolve`, shaped like the spawn form
pub struct ResolveArgs {
    pub profile: Option<String>,
    pub custom_image: Option<String>,
    pub custom_gpus: Option<String>,
    pub user: String,
}

/// Resolve a form submission as the spawner would
pub fn resolve_profile(
    catalog: &ProfileCatalog,
    admin: &AdminSettings,
    base_image: &str,
    args: ResolveArgs,
    format: OutputFormat,
) -> Result<()> {
    let mut form = FormData::new();
    let fields = [
        ("profile", args.profile),
        ("custom_image", args.custom_image),
        ("custom_gpus", args.custom_gpus),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            form.insert(key.to_string(), vec![value]);
        }
    }

    let options = options_from_form(&form);
    let privilege = admin.privilege_of(&args.user);
    let resolved = catalog.resolve(&options.profile);
    let session = catalog.apply(&options, privilege, SessionSpec::with_image(base_image));

    match format {
        OutputFormat::Json => print_json(&session)?,
        OutputFormat::Table => {
            if resolved.slug != options.profile {
                print_warning(&format!(
                    "Unknown profile '{}', falling back to '{}'",
                    options.profile, resolved.slug
                ));
            }
            if !privilege.is_admin() && (options.custom_image.is_some() || options.custom_gpus > 0) {
                print_info(&format!(
                    "'{}' is not an admin; custom image and GPU count are ignored",
                    args.user
                ));
            }

            print_heading(&format!("Session for {} ({})", args.user, resolved.slug));
            println!("Image:         {}", session.image.cyan());
            println!(
                "CPU:           guarantee {} / limit {}",
                session.cpu_guarantee, session.cpu_limit
            );
            println!(
                "Memory:        guarantee {} / limit {}",
                session.mem_guarantee, session.mem_limit
            );
            println!("Limits:        {}", format_resources(&session.extra_resource_limits));
            println!(
                "Guarantees:    {}",
                format_resources(&session.extra_resource_guarantees)
            );
            println!("Node selector: {}", format_resources(&session.node_selector));
            println!("Tolerations:   {}", session.tolerations.len());
            println!("Environment:   {}", format_resources(&session.environment));
        }
    }
    Ok(())
}
