//! External tool invocation
//!
//! The tasks shell out to `gh`, `docker` and `go`. They never spawn those
//! programs directly: every call goes through [`CommandRunner`], whose
//! production implementation is [`ShellRunner`] backed by `xshell`.

use std::path::Path;

use anyhow::{
    Context,
    Result,
};
use tracing::debug;
use xshell::Shell;

/// Seam for running external programs
pub trait CommandRunner {
    /// Run `program` with inherited stdio; a non-zero exit status is an error
    fn run(&self, program: &str, args: &[String]) -> Result<()>;

    /// Run `program` and return its trimmed stdout; a non-zero exit status
    /// is an error
    fn read(&self, program: &str, args: &[String]) -> Result<String>;
}

/// [`CommandRunner`] executing programs through an `xshell::Shell`
#[derive(Debug)]
pub struct ShellRunner {
    sh: Shell,
}

impl ShellRunner {
    /// Create a runner whose working directory is `workspace_root`
    pub fn new(workspace_root: &Path) -> Result<Self> {
        let sh = Shell::new().context("Failed to create xshell Shell")?;
        sh.change_dir(workspace_root);
        Ok(Self { sh })
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<()> {
        debug!("Running {} {}", program, args.join(" "));
        self.sh
            .cmd(program)
            .args(args)
            .run()
            .with_context(|| format!("'{} {}' failed", program, args.join(" ")))
    }

    fn read(&self, program: &str, args: &[String]) -> Result<String> {
        debug!("Reading output of {} {}", program, args.join(" "));
        self.sh
            .cmd(program)
            .args(args)
            .quiet()
            .read()
            .with_context(|| format!("'{} {}' failed", program, args.join(" ")))
    }
}

/// Build an owned argument list from string literals
pub fn args<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_builds_owned_list() {
        assert_eq!(args(["compose", "down", "-v"]), vec!["compose", "down", "-v"]);
    }

    #[test]
    fn test_scripted_runner_records_and_fails() {
        let runner = testing::ScriptedRunner::new().fail_when("logs");

        assert!(runner.run("docker", &args(["compose", "up"])).is_ok());
        assert!(runner.run("docker", &args(["compose", "logs", "traefik"])).is_err());
        assert_eq!(runner.calls(), vec!["docker compose up", "docker compose logs traefik"]);
    }
}
