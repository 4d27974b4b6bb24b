//! Plugin version resolution

use std::fmt;

use serde::Deserialize;
use tracing::info;

use crate::{
    config::Settings,
    error::{
        BuildError,
        BuildResult,
    },
    tools::{
        CommandRunner,
        args,
    },
};

/// GitHub project publishing the coraza-http-wasm artifacts
pub const RELEASE_PROJECT: &str = "timbit123/coraza-http-wasm";

/// A non-empty release tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version(String);

impl Version {
    pub fn new(tag: impl Into<String>) -> BuildResult<Self> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(BuildError::Resolution("empty version".to_string()));
        }
        Ok(Self(tag))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of published releases, newest first
pub trait ReleaseIndex {
    fn latest_tag(&self) -> BuildResult<String>;
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
}

/// Release index backed by `gh api repos/<project>/releases`
pub struct GhReleaseIndex<'a> {
    runner:  &'a dyn CommandRunner,
    project: String,
}

impl<'a> GhReleaseIndex<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self::for_project(runner, RELEASE_PROJECT)
    }

    pub fn for_project(runner: &'a dyn CommandRunner, project: &str) -> Self {
        Self { runner, project: project.to_string() }
    }
}

impl ReleaseIndex for GhReleaseIndex<'_> {
    fn latest_tag(&self) -> BuildResult<String> {
        let endpoint = format!("repos/{}/releases", self.project);
        let body = self
            .runner
            .read("gh", &args(["api", endpoint.as_str()]))
            .map_err(|e| BuildError::Resolution(format!("{:#}", e)))?;

        let releases: Vec<Release> = serde_json::from_str(&body)
            .map_err(|e| BuildError::Resolution(format!("invalid releases response: {}", e)))?;

        releases
            .into_iter()
            .next()
            .map(|release| release.tag_name)
            .ok_or_else(|| {
                BuildError::Resolution(format!("no releases published for {}", self.project))
            })
    }
}

/// Pick the version to operate on: the explicit override when set,
/// otherwise the newest published release
pub fn resolve(settings: &Settings, index: &dyn ReleaseIndex) -> BuildResult<Version> {
    if let Some(version) = settings.version.as_deref().filter(|v| !v.is_empty()) {
        info!("Using version {} from VERSION", version);
        return Version::new(version);
    }

    let tag = index.latest_tag()?;
    info!("Resolved latest release {}", tag);
    Version::new(tag)
}
