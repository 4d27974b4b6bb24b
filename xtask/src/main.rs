use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use colored::Colorize;
use coraza_build_core::{Settings, ShellRunner, tasks::Tasks};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Parser)]
#[clap(name = "xtask", version, about = "Coraza Traefik plugin build and e2e tasks")]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,
    #[clap(long, default_value = "./", help = "Path to the workspace root")]
    pub workspace_root: PathBuf,
    #[clap(long, default_value = "info", help = "Logging level (trace, debug, info, warn, error)")]
    pub log_level: String,
    #[clap(long, help = "Plugin version to use (overrides VERSION)")]
    pub plugin_version: Option<String>,
    #[clap(long, help = "Traefik host:port for the e2e harness (overrides TRAEFIK_HOST)")]
    pub traefik_host: Option<String>,
    #[clap(long, help = "httpbin host:port for the e2e harness (overrides HTTPBIN_HOST)")]
    pub httpbin_host: Option<String>,
}

#[derive(Debug, Parser)]
pub enum Command {
    /// Download the coraza-http-wasm release artifact into build/
    DownloadArtifact,
    /// Run the e2e suite against the plugin from the Traefik plugin catalog
    E2e,
    /// Run the e2e suite against a plugin unpacked into build/
    E2eLocal,
    /// Render config-static.yaml.tmpl with VERSION into the static configs
    UpdateVersion,
}

fn main() -> Result<()> {
    let opts = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(opts.log_level.parse::<Level>().unwrap_or(Level::INFO))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global default tracing subscriber")?;

    let settings = Settings::from_env_and_args(
        opts.workspace_root.clone(),
        opts.plugin_version.clone(),
        opts.traefik_host.clone(),
        opts.httpbin_host.clone(),
    );

    let runner = ShellRunner::new(&settings.workspace_root)?;
    info!("Changed directory to workspace root: {:?}", settings.workspace_root);
    let tasks = Tasks::new(&settings, &runner)?;

    match &opts.command {
        Command::DownloadArtifact => {
            let version = tasks.download_artifact()?;
            println!(
                "{} coraza-http-wasm {} unpacked into {}",
                "✓".green(),
                version,
                tasks.build_dir().display()
            );
        }
        Command::E2e => {
            tasks.e2e()?;
            println!("{} e2e (remote) passed", "✓".green());
        }
        Command::E2eLocal => {
            tasks.e2e_local()?;
            println!("{} e2e (local) passed", "✓".green());
        }
        Command::UpdateVersion => {
            tasks.update_version()?;
            println!("{} static config updated", "✓".green());
        }
    }

    Ok(())
}
