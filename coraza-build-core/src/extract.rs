//! Zip extraction next to the archive

use std::{
    fs::{
        self,
        File,
    },
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
use tracing::{
    debug,
    info,
};
use zip::ZipArchive;

use crate::error::BuildError;

/// Unpack every entry of `archive` into the directory containing it
///
/// Entries are written in central directory order and existing files are
/// overwritten. Entries naming a path outside that directory are rejected.
/// A failing entry stops the extraction; entries written before it stay.
pub fn extract(archive: &Path) -> Result<Vec<PathBuf>> {
    info!("Unzipping {}", archive.display());

    let dest = destination_dir(archive);
    fs::create_dir_all(&dest)
        .with_context(|| format!("Failed to create directory '{}'", dest.display()))?;

    let file =
        File::open(archive).with_context(|| format!("Failed to open {}", archive.display()))?;
    let mut zip = ZipArchive::new(file)
        .with_context(|| format!("Failed to read zip archive {}", archive.display()))?;

    let mut written = Vec::with_capacity(zip.len());
    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .with_context(|| format!("Failed to open entry #{} of {}", index, archive.display()))?;

        let relative = entry
            .enclosed_name()
            .map(|p| p.to_path_buf())
            .ok_or_else(|| BuildError::UnsafeEntryPath(entry.name().to_string()))?;
        let target = dest.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create directory '{}'", target.display()))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory '{}'", parent.display()))?;
        }

        let mut out = File::create(&target)
            .with_context(|| format!("Failed to create {}", target.display()))?;
        let bytes = io::copy(&mut entry, &mut out)
            .with_context(|| format!("Failed to extract {}", entry.name()))?;
        debug!("Extracted {} ({} bytes)", relative.display(), bytes);

        written.push(target);
    }

    info!("Extracted {} files into {}", written.len(), dest.display());
    Ok(written)
}

fn destination_dir(archive: &Path) -> PathBuf {
    match archive.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
