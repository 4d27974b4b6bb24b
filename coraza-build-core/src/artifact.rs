//! Versioned artifact acquisition
//!
//! Resolves the release download URL for a version, downloads the zip into
//! the build directory, unpacks it there and removes the archive.

use std::{
    fs,
    io,
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

use crate::{
    extract::extract,
    fetch::ArtifactFetcher,
    version::Version,
};

/// Placeholder substituted with the version in [`ArtifactSource::url_template`]
pub const VERSION_PLACEHOLDER: &str = "{version}";

pub const DEFAULT_URL_TEMPLATE: &str = "https://github.com/timbit123/coraza-http-wasm/releases/download/{version}/coraza-http-wasm-{version}.zip";

pub const DEFAULT_ARCHIVE_NAME: &str = "coraza-http-wasm.zip";

/// Where release archives live and what to call them locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSource {
    pub url_template: String,
    pub archive_name: String,
}

impl Default for ArtifactSource {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
        }
    }
}

impl ArtifactSource {
    /// Download URL of `version`
    pub fn url(&self, version: &Version) -> String {
        self.url_template.replace(VERSION_PLACEHOLDER, version.as_str())
    }

    /// Local path of the downloaded archive inside `build_dir`
    pub fn archive_path(&self, build_dir: &Path) -> PathBuf {
        build_dir.join(&self.archive_name)
    }
}

/// Ensure `dir` exists. An existing directory is not an error.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    match fs::create_dir(dir) {
        Ok(()) => {
            info!("Created directory {}", dir.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to create directory '{}'", dir.display())),
    }
}

/// Fetch `version` of the plugin artifact into `build_dir` using the default
/// release store
pub fn acquire(version: &Version, build_dir: &Path) -> Result<()> {
    acquire_from(&ArtifactSource::default(), &ArtifactFetcher::new()?, version, build_dir)
}

/// Fetch `version` from `source` and unpack it into `build_dir`
pub fn acquire_from(
    source: &ArtifactSource,
    fetcher: &ArtifactFetcher,
    version: &Version,
    build_dir: &Path,
) -> Result<()> {
    ensure_dir(build_dir)?;

    let url = source.url(version);
    let archive = source.archive_path(build_dir);

    fetcher.fetch(&url, &archive)?;
    extract(&archive)?;

    discard_archive(&archive)?;

    info!("Plugin {} ready in {}", version, build_dir.display());
    Ok(())
}

/// Delete the unpacked archive; failing to do so fails the acquisition
fn discard_archive(archive: &Path) -> Result<()> {
    fs::remove_file(archive)
        .with_context(|| format!("Failed to remove file '{}'", archive.display()))
}
