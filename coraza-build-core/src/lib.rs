//! Coraza Build Core - build and e2e automation for the coraza-http-wasm
//! Traefik plugin
//!
//! This library holds the logic behind the `cargo xtask` targets of the
//! plugin repository. The binary in `xtask/` only parses arguments, sets up
//! logging and hands a [`Settings`] value to the tasks defined here.
//!
//! # Architecture
//!
//! - **Version resolution**: explicit `VERSION` override or the newest
//!   release published on GitHub ([`version`])
//! - **Artifact acquisition**: download the release zip, unpack it next to
//!   itself and remove the archive ([`fetch`], [`extract`], [`artifact`])
//! - **Config templating**: render the static Traefik config with the plugin
//!   version ([`template`])
//! - **E2E orchestration**: docker compose up, run the Coraza http e2e
//!   harness, always tear the topology down ([`e2e`])
//!
//! External programs (`gh`, `docker`, `go`) are reached through the
//! [`tools::CommandRunner`] trait so that every flow can be exercised without
//! them.

#![forbid(unsafe_code)]
// Lints configured in Cargo.toml

pub use std::path::{Path, PathBuf};

pub use anyhow::{Context, Result};

// Core modules
pub mod artifact;
pub mod config;
pub mod e2e;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod tasks;
pub mod template;
pub mod tools;
pub mod version;

// Public API
pub use artifact::{ArtifactSource, acquire};
pub use config::Settings;
pub use e2e::{E2eTopology, Variant};
pub use error::{BuildError, BuildResult, WriteErrors};
pub use tools::{CommandRunner, ShellRunner};
pub use version::Version;

/// Build core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
