//! Chart values rendering

use anyhow::{Context, Result};
use hub_lib::render::render_values;
use hub_lib::{HubConfig, ProfileCatalog};
use std::path::Path;

use crate::output::print_success;

/// Render Helm values for the hub chart to stdout or a file
pub fn render(
    config: &HubConfig,
    catalog: &ProfileCatalog,
    include_secret: bool,
    output: Option<&Path>,
) -> Result<()> {
    let values =
        render_values(config, catalog, include_secret).context("Failed to render values")?;

    match output {
        Some(path) => {
            std::fs::write(path, &values)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            print_success(&format!("Values written to {}", path.display()));
        }
        None => print!("{}", values),
    }
    Ok(())
}
