//! Top-level tasks exposed by `cargo xtask`

use std::{
    fs,
    path::PathBuf,
};

use anyhow::{
    Context,
    Result,
};
use tracing::info;

use crate::{
    artifact::{
        ArtifactSource,
        acquire_from,
        ensure_dir,
    },
    config::Settings,
    e2e::{
        E2eTopology,
        Variant,
    },
    fetch::ArtifactFetcher,
    template,
    tools::CommandRunner,
    version::{
        self,
        GhReleaseIndex,
        Version,
    },
};

/// Directory receiving the unpacked plugin, relative to the repo root
pub const BUILD_DIR: &str = "build";

/// Traefik plugin manifest copied next to the unpacked plugin
pub const PLUGIN_MANIFEST: &str = ".traefik.yml";

/// Everything the tasks need, wired once by the CLI
pub struct Tasks<'a> {
    settings: &'a Settings,
    runner:   &'a dyn CommandRunner,
    source:   ArtifactSource,
    fetcher:  ArtifactFetcher,
    topology: E2eTopology,
}

impl<'a> Tasks<'a> {
    pub fn new(settings: &'a Settings, runner: &'a dyn CommandRunner) -> Result<Self> {
        Ok(Self {
            settings,
            runner,
            source: ArtifactSource::default(),
            fetcher: ArtifactFetcher::new()?,
            topology: E2eTopology::default(),
        })
    }

    /// Fetch artifacts from another release store
    pub fn with_source(mut self, source: ArtifactSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_fetcher(mut self, fetcher: ArtifactFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn build_dir(&self) -> PathBuf {
        self.settings.path(BUILD_DIR)
    }

    /// Resolve the plugin version and unpack its artifact into `build/`
    pub fn download_artifact(&self) -> Result<Version> {
        let build_dir = self.build_dir();
        ensure_dir(&build_dir)?;

        let version = version::resolve(self.settings, &GhReleaseIndex::new(self.runner))?;
        acquire_from(&self.source, &self.fetcher, &version, &build_dir)?;
        Ok(version)
    }

    /// Run the e2e suite against the plugin published in the catalog
    pub fn e2e(&self) -> Result<()> {
        self.topology.run(self.runner, Variant::Remote, self.settings)
    }

    /// Run the e2e suite against a locally unpacked plugin
    pub fn e2e_local(&self) -> Result<()> {
        let build_dir = self.build_dir();
        ensure_dir(&build_dir)?;

        let manifest = self.settings.path(PLUGIN_MANIFEST);
        let manifest_copy = build_dir.join(PLUGIN_MANIFEST);
        info!("Copying {} to {}", manifest.display(), manifest_copy.display());
        fs::copy(&manifest, &manifest_copy).with_context(|| {
            format!(
                "Failed to copy file from {} to {}",
                manifest.display(),
                manifest_copy.display()
            )
        })?;

        let version = self.download_artifact()?;
        info!("Testing plugin {} from {}", version, build_dir.display());

        self.topology.run(self.runner, Variant::Local, self.settings)
    }

    /// Render the static Traefik config with the `VERSION` override
    pub fn update_version(&self) -> Result<()> {
        let version = self.settings.required_version()?;
        template::update_static_config(&self.settings.workspace_root, Some(version))
    }
}
