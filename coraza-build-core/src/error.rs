//! Error types for the build and e2e tasks

use std::{
    fmt,
    io,
    path::PathBuf,
};

use thiserror::Error;

/// Result alias used by operations that only fail with a [`BuildError`]
pub type BuildResult<T> = Result<T, BuildError>;

/// Failures with a meaning the callers can act on
///
/// I/O and process failures that need no special handling travel as
/// `anyhow::Error` with context instead.
#[derive(Debug, Error)]
pub enum BuildError {
    /// `VERSION` is required by the task but was not provided
    #[error("VERSION environment variable is not set")]
    MissingVersion,

    /// The latest release could not be determined
    #[error("failed to resolve plugin version: {0}")]
    Resolution(String),

    /// The artifact server answered with something other than 200 OK
    #[error("bad status: {status} ({url})")]
    BadStatus {
        /// Status line as reported by the server
        status: String,
        /// Requested URL
        url:    String,
    },

    /// An archive entry would be written outside the destination directory
    #[error("archive entry '{0}' escapes the destination directory")]
    UnsafeEntryPath(String),

    /// `docker compose up` failed; nothing was started
    #[error("failed to start e2e service '{service}': {source}")]
    Startup {
        service: String,
        #[source]
        source:  anyhow::Error,
    },

    /// The e2e harness exited unsuccessfully
    #[error("e2e verification failed: {0}")]
    Verification(#[source] anyhow::Error),
}

/// Every failed destination of a multi-file write
#[derive(Debug, Default)]
pub struct WriteErrors {
    failures: Vec<(PathBuf, io::Error)>,
}

impl WriteErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: PathBuf, error: io::Error) {
        self.failures.push((path, error));
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Paths whose write failed, in the order they were attempted
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.failures.iter().map(|(path, _)| path)
    }

    /// `Ok(())` when nothing failed, otherwise all failures at once
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for WriteErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (path, error)) in self.failures.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "write {}: {}", path.display(), error)?;
        }
        Ok(())
    }
}

impl std::error::Error for WriteErrors {}
