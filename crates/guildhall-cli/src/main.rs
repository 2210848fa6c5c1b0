//! Guildhall command-line interface.
//!
//! ```bash
//! # Create the schema in a fresh database
//! guildhall install
//!
//! # Only check the database engine version
//! guildhall check
//!
//! # Serve the registration and installation modules
//! guildhall serve --port 8080
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use guildhall_common::Localization;
use guildhall_config::{AppConfig, ConfigLoader};
use guildhall_db::SqliteDatabase;
use guildhall_gateway::GatewayServer;
use guildhall_installer::{InstallError, Installer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "guildhall", version, about = "Membership management server and installer")]
struct Cli {
    /// Config file (YAML or TOML)
    #[arg(short, long, global = true, env = "GUILDHALL_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP gateway
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
        /// Bearer token for the registration and update endpoints
        #[arg(long, env = "GUILDHALL_ADMIN_TOKEN", hide_env_values = true)]
        admin_token: Option<String>,
    },
    /// Check the database version, apply the install script and engine fixups
    Install {
        /// Script under installation/db_scripts; defaults to the configured one
        #[arg(long)]
        script: Option<String>,
    },
    /// Apply the configured update scripts
    Update,
    /// Check the database engine version only
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let mut config = ConfigLoader::load_or_default(cli.config.as_deref(), &cwd)
        .context("failed to load configuration")?;

    match cli.command {
        Command::Serve {
            host,
            port,
            admin_token,
        } => {
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            if admin_token.is_some() {
                config.gateway.admin_token = admin_token;
            }
            GatewayServer::new(config).run().await?;
        }
        Command::Install { script } => {
            let script = script.unwrap_or_else(|| config.installation.install_script.clone());
            run_installer(&config, |installer| installer.install(&script))?;
        }
        Command::Update => {
            let scripts = config.installation.update_scripts.clone();
            run_installer(&config, |installer| installer.update(&scripts))?;
        }
        Command::Check => {
            let db = SqliteDatabase::from_config(&config.database)?;
            let installer = installer_for(&config, &db);
            let version = installer
                .check()
                .map_err(|e| report_failure(&config, e))?;
            println!("database version {version} is supported");
        }
    }
    Ok(())
}

fn run_installer<F>(config: &AppConfig, step: F) -> Result<()>
where
    F: FnOnce(&Installer<'_>) -> std::result::Result<guildhall_installer::UpdateReport, InstallError>,
{
    let db = SqliteDatabase::from_config(&config.database)?;
    let installer = installer_for(config, &db);
    let report = step(&installer).map_err(|e| report_failure(config, e))?;

    info!(
        "applied {} script(s) to {}",
        report.scripts.len(),
        config.database.path.display()
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn installer_for<'a>(config: &AppConfig, db: &'a SqliteDatabase) -> Installer<'a> {
    Installer::new(
        db,
        config.installation.scripts_dir(),
        config.installation.download_url.clone(),
    )
}

/// Print the localized message and turn the failure into an `anyhow` error.
fn report_failure(config: &AppConfig, e: InstallError) -> anyhow::Error {
    let l10n = match &config.l10n.catalog {
        Some(path) => Localization::with_overrides(path).unwrap_or_default(),
        None => Localization::builtin(),
    };
    eprintln!("{}", plain_text(&e.message(&l10n)));
    anyhow::Error::new(e).context("installation step failed")
}

/// Installer messages are HTML fragments; drop the markup for the terminal.
fn plain_text(html: &str) -> String {
    let html = html.replace("<br />", "\n");
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
