//! End-to-end environment orchestration
//!
//! One call walks the topology through its whole lifecycle:
//!
//! 1. `docker compose up` for the selected Traefik service. If this fails
//!    nothing was started and nothing is torn down.
//! 2. The Coraza http e2e harness runs against the proxy and httpbin
//!    endpoints. On failure the Traefik logs are dumped.
//! 3. `docker compose down -v` runs from a scope guard armed right after a
//!    successful start, so it executes exactly once however step 2 ends.
//!    A teardown failure is only logged.

use std::fmt;

use anyhow::Result;
use tracing::{
    error,
    info,
    warn,
};

use crate::{
    config::Settings,
    error::BuildError,
    tools::CommandRunner,
};

/// Compose descriptors, relative to the repository root
pub const COMPOSE_FILES: [&str; 2] = ["docker-compose.yml", "e2e/docker-compose.e2e.yml"];

/// Go package of the Coraza http e2e harness
pub const HARNESS_PACKAGE: &str = "github.com/corazawaf/coraza/v3/http/e2e/cmd/httpe2e@main";

/// Service whose logs are dumped when verification fails
pub const LOGS_SERVICE: &str = "traefik";

/// Which Traefik service hosts the plugin under test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Plugin artifact unpacked into the local `build/` directory
    Local,
    /// Plugin fetched by Traefik from the plugin catalog
    Remote,
}

impl Variant {
    /// Compose service started for this variant
    pub fn service(self) -> String {
        format!("e2e_traefik_{}", self)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Local => write!(f, "local"),
            Variant::Remote => write!(f, "remote"),
        }
    }
}

/// The docker compose project used for the e2e run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct E2eTopology {
    compose_files: Vec<String>,
}

impl Default for E2eTopology {
    fn default() -> Self {
        Self::new(COMPOSE_FILES)
    }
}

impl E2eTopology {
    pub fn new<I, S>(compose_files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { compose_files: compose_files.into_iter().map(Into::into).collect() }
    }

    fn compose(&self, action: &[&str]) -> Vec<String> {
        let mut args = vec!["compose".to_string()];
        for file in &self.compose_files {
            args.push("-f".to_string());
            args.push(file.clone());
        }
        args.extend(action.iter().map(|a| a.to_string()));
        args
    }

    /// `docker` arguments starting the service of `variant`
    pub fn up_args(&self, variant: Variant) -> Vec<String> {
        let service = variant.service();
        self.compose(&["up", "-d", "--force-recreate", service.as_str()])
    }

    /// `docker` arguments stopping everything, volumes included
    pub fn down_args(&self) -> Vec<String> {
        self.compose(&["down", "-v"])
    }

    /// `docker` arguments printing the logs of `service`
    pub fn logs_args(&self, service: &str) -> Vec<String> {
        self.compose(&["logs", service])
    }

    /// Bring `variant` up, verify it and tear it down again
    pub fn run(
        &self,
        runner: &dyn CommandRunner,
        variant: Variant,
        settings: &Settings,
    ) -> Result<()> {
        let service = variant.service();
        info!("Starting e2e service {}", service);
        runner
            .run("docker", &self.up_args(variant))
            .map_err(|source| BuildError::Startup { service: service.clone(), source })?;

        let _teardown = scopeguard::guard((), |_| {
            info!("Tearing down e2e environment");
            if let Err(e) = runner.run("docker", &self.down_args()) {
                warn!("Failed to tear down e2e environment: {:#}", e);
            }
        });

        info!(
            "Running e2e harness against proxy {} and httpbin {}",
            settings.proxy_url(),
            settings.httpbin_url()
        );
        if let Err(e) = runner.run("go", &harness_args(settings)) {
            error!("E2E verification of {} failed", service);
            if let Err(logs_err) = runner.run("docker", &self.logs_args(LOGS_SERVICE)) {
                warn!("Failed to collect {} logs: {:#}", LOGS_SERVICE, logs_err);
            }
            return Err(BuildError::Verification(e).into());
        }

        info!("E2E verification of {} passed", service);
        Ok(())
    }
}

/// `go` arguments running the harness against the configured endpoints
pub fn harness_args(settings: &Settings) -> Vec<String> {
    vec![
        "run".to_string(),
        HARNESS_PACKAGE.to_string(),
        "--proxy-hostport".to_string(),
        settings.proxy_url(),
        "--httpbin-hostport".to_string(),
        settings.httpbin_url(),
    ]
}

#[cfg(test)]
mod tests {
    use std::panic::{
        AssertUnwindSafe,
        catch_unwind,
    };

    use anyhow::bail;

    use super::*;
    use crate::tools::testing::ScriptedRunner;

    fn run_with(runner: &ScriptedRunner, variant: Variant) -> Result<()> {
        E2eTopology::default().run(runner, variant, &Settings::default())
    }

    #[test]
    fn test_successful_run_walks_full_lifecycle() {
        let runner = ScriptedRunner::new();

        run_with(&runner, Variant::Remote).unwrap();

        assert_eq!(
            runner.calls(),
            vec![
                "docker compose -f docker-compose.yml -f e2e/docker-compose.e2e.yml up -d --force-recreate e2e_traefik_remote",
                "go run github.com/corazawaf/coraza/v3/http/e2e/cmd/httpe2e@main --proxy-hostport http://localhost:8080 --httpbin-hostport http://localhost:8000",
                "docker compose -f docker-compose.yml -f e2e/docker-compose.e2e.yml down -v",
            ]
        );
    }

    #[test]
    fn test_startup_failure_skips_teardown() {
        let runner = ScriptedRunner::new().fail_when(" up ");

        let err = run_with(&runner, Variant::Local).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::Startup { service, .. }) if service == "e2e_traefik_local"
        ));
        assert_eq!(runner.count("down -v"), 0);
        assert_eq!(runner.count("go run"), 0);
    }

    #[test]
    fn test_verification_failure_still_tears_down_once() {
        let runner = ScriptedRunner::new().fail_when("go run");

        let err = run_with(&runner, Variant::Local).unwrap_err();

        assert!(matches!(err.downcast_ref::<BuildError>(), Some(BuildError::Verification(_))));
        assert_eq!(runner.count("logs traefik"), 1);
        assert_eq!(runner.count("down -v"), 1);
        assert!(runner.calls().last().unwrap().ends_with("down -v"));
    }

    #[test]
    fn test_teardown_failure_does_not_mask_verification_error() {
        let runner = ScriptedRunner::new().fail_when("go run").fail_when("down").fail_when("logs");

        let err = run_with(&runner, Variant::Remote).unwrap_err();

        assert!(matches!(err.downcast_ref::<BuildError>(), Some(BuildError::Verification(_))));
        assert_eq!(runner.count("down -v"), 1);
    }

    #[test]
    fn test_teardown_failure_after_success_is_only_logged() {
        let runner = ScriptedRunner::new().fail_when("down");

        assert!(run_with(&runner, Variant::Remote).is_ok());
        assert_eq!(runner.count("down -v"), 1);
    }

    struct PanickingHarness {
        inner: ScriptedRunner,
    }

    impl CommandRunner for PanickingHarness {
        fn run(&self, program: &str, args: &[String]) -> Result<()> {
            self.inner.run(program, args)?;
            if program == "go" {
                panic!("harness crashed");
            }
            Ok(())
        }

        fn read(&self, _program: &str, _args: &[String]) -> Result<String> {
            bail!("not used")
        }
    }

    #[test]
    fn test_teardown_runs_when_verification_panics() {
        let runner = PanickingHarness { inner: ScriptedRunner::new() };

        let result = catch_unwind(AssertUnwindSafe(|| {
            E2eTopology::default().run(&runner, Variant::Local, &Settings::default())
        }));

        assert!(result.is_err());
        assert_eq!(runner.inner.count("down -v"), 1);
    }

    #[test]
    fn test_harness_uses_configured_endpoints() {
        let settings = Settings {
            traefik_host: "traefik:80".to_string(),
            httpbin_host: "httpbin:8080".to_string(),
            ..Settings::default()
        };

        let args = harness_args(&settings);

        assert_eq!(args[3], "http://traefik:80");
        assert_eq!(args[5], "http://httpbin:8080");
    }
}
