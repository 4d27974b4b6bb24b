//! Static config templating

use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

use anyhow::{
    Context,
    Result,
};
use tracing::info;

use crate::error::{
    BuildError,
    WriteErrors,
};

/// Token replaced with the plugin version
pub const PLACEHOLDER: &str = "{{version}}";

/// Template of the Traefik static configuration, relative to the repo root
pub const STATIC_CONFIG_TEMPLATE: &str = "config-static.yaml.tmpl";

/// Files receiving the rendered static configuration
pub const STATIC_CONFIG_DESTINATIONS: [&str; 2] =
    ["config-static.yaml", "e2e/config-static.remote.yaml"];

/// Replace the first placeholder in `template` with `version`
pub fn render(template: &str, version: &str) -> String {
    template.replacen(PLACEHOLDER, version, 1)
}

/// Write `rendered` to every destination
///
/// A failing destination does not stop the others; all failures are
/// returned together.
pub fn write<P: AsRef<Path>>(rendered: &str, destinations: &[P]) -> Result<(), WriteErrors> {
    let mut errors = WriteErrors::new();
    for destination in destinations {
        let destination = destination.as_ref();
        match fs::write(destination, rendered) {
            Ok(()) => info!("Wrote {}", destination.display()),
            Err(e) => errors.push(destination.to_path_buf(), e),
        }
    }
    errors.into_result()
}

/// Render `template` with `version` into `destinations`
///
/// Fails before touching any file when `version` is missing or empty.
pub fn update_version<P: AsRef<Path>>(
    template: &str,
    version: Option<&str>,
    destinations: &[P],
) -> Result<()> {
    let version = version.filter(|v| !v.is_empty()).ok_or(BuildError::MissingVersion)?;
    let rendered = render(template, version);
    write(&rendered, destinations)?;
    Ok(())
}

/// Read the static config template below `root` and render it into the
/// default destinations below `root`
pub fn update_static_config(root: &Path, version: Option<&str>) -> Result<()> {
    let version = version.filter(|v| !v.is_empty()).ok_or(BuildError::MissingVersion)?;

    let template_path = root.join(STATIC_CONFIG_TEMPLATE);
    let template = fs::read_to_string(&template_path)
        .with_context(|| format!("Failed to read template {}", template_path.display()))?;

    let destinations: Vec<PathBuf> =
        STATIC_CONFIG_DESTINATIONS.iter().map(|d| root.join(d)).collect();
    update_version(&template, Some(version), &destinations)
}
