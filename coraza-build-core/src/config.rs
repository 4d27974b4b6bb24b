//! Configuration management for the build and e2e tasks
//!
//! Everything the tasks read from the process environment is collected once
//! into [`Settings`] at the CLI boundary. Components only ever see the
//! struct, so tests can build one without touching real environment state.

use std::{
    env,
    path::PathBuf,
};

use crate::error::{
    BuildError,
    BuildResult,
};

/// Explicit plugin version override
pub const VERSION_ENV: &str = "VERSION";
/// Proxy endpoint (`host:port`) used by the e2e harness
pub const TRAEFIK_HOST_ENV: &str = "TRAEFIK_HOST";
/// Backend endpoint (`host:port`) used by the e2e harness
pub const HTTPBIN_HOST_ENV: &str = "HTTPBIN_HOST";

pub const DEFAULT_TRAEFIK_HOST: &str = "localhost:8080";
pub const DEFAULT_HTTPBIN_HOST: &str = "localhost:8000";

/// Task settings with defaults already applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Root of the plugin repository; relative paths resolve against it
    pub workspace_root: PathBuf,
    /// Explicit version override, `None` when unset or empty
    pub version:        Option<String>,
    /// Traefik `host:port`
    pub traefik_host:   String,
    /// httpbin `host:port`
    pub httpbin_host:   String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workspace_root: PathBuf::from("./"),
            version:        None,
            traefik_host:   DEFAULT_TRAEFIK_HOST.to_string(),
            httpbin_host:   DEFAULT_HTTPBIN_HOST.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from command line values, falling back to the process
    /// environment and then to the documented defaults
    pub fn from_env_and_args(
        workspace_root: PathBuf,
        version: Option<String>,
        traefik_host: Option<String>,
        httpbin_host: Option<String>,
    ) -> Self {
        Self::from_lookup(workspace_root, version, traefik_host, httpbin_host, |key| {
            env::var(key).ok()
        })
    }

    /// Same as [`Settings::from_env_and_args`] with an explicit variable
    /// lookup. Empty values count as unset.
    pub fn from_lookup(
        workspace_root: PathBuf,
        version: Option<String>,
        traefik_host: Option<String>,
        httpbin_host: Option<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let pick = |arg: Option<String>, key: &str| {
            arg.filter(|v| !v.is_empty()).or_else(|| lookup(key).filter(|v| !v.is_empty()))
        };

        Self {
            workspace_root,
            version: pick(version, VERSION_ENV),
            traefik_host: pick(traefik_host, TRAEFIK_HOST_ENV)
                .unwrap_or_else(|| DEFAULT_TRAEFIK_HOST.to_string()),
            httpbin_host: pick(httpbin_host, HTTPBIN_HOST_ENV)
                .unwrap_or_else(|| DEFAULT_HTTPBIN_HOST.to_string()),
        }
    }

    /// The version override, or [`BuildError::MissingVersion`]
    pub fn required_version(&self) -> BuildResult<&str> {
        self.version.as_deref().ok_or(BuildError::MissingVersion)
    }

    /// Resolve a repository-relative path against the workspace root
    pub fn path(&self, relative: impl AsRef<std::path::Path>) -> PathBuf {
        self.workspace_root.join(relative)
    }

    /// Fully qualified proxy endpoint passed to the e2e harness
    pub fn proxy_url(&self) -> String {
        format!("http://{}", self.traefik_host)
    }

    /// Fully qualified backend endpoint passed to the e2e harness
    pub fn httpbin_url(&self) -> String {
        format!("http://{}", self.httpbin_host)
    }
}
