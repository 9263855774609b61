//! `practrack-tui`: terminal client for practice sessions and practices.
//!
//! Every view is addressed by a route (`/practice-session`,
//! `/practice/3/edit`, ...). List, detail, form and delete screens are
//! written once over `Entity` and mounted per route; a background data
//! bridge forwards store changes from `practrack-core` into the action
//! loop.
//!
//! Logs go to a file (default `/tmp/practrack-tui.log`) so they never
//! corrupt the terminal.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screens;
mod theme;
mod tui;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use secrecy::SecretString;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use practrack_core::{Controller, ControllerConfig, Credentials, Route, TlsVerification};

use crate::app::App;

/// Terminal UI for tracking coding practice sessions.
#[derive(Parser, Debug)]
#[command(name = "practrack-tui", version, about)]
struct Cli {
    /// Server URL (e.g., http://localhost:8080)
    #[arg(short = 'u', long, env = "PRACTRACK_URL")]
    url: Option<url::Url>,

    /// Bearer token (JWT)
    #[arg(long, env = "PRACTRACK_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Config profile to use when no URL is given
    #[arg(short = 'p', long, env = "PRACTRACK_PROFILE")]
    profile: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(short = 'k', long)]
    insecure: bool,

    /// Route to open first, e.g. /practice/new
    #[arg(short = 'r', long, default_value = "/practice-session")]
    route: Route,

    /// Log file path
    #[arg(long, default_value = "/tmp/practrack-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing. The returned guard flushes pending lines on drop.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "practrack_tui={level},practrack_core={level},practrack_api={level}"
        ))
    });

    let dir = cli
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(std::path::Path::new("."));
    let file = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("practrack-tui.log"));

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    guard
}

/// Flags win over the config file.
fn controller_config(cli: &Cli) -> Result<ControllerConfig> {
    if let Some(url) = &cli.url {
        let auth = cli
            .token
            .clone()
            .map_or(Credentials::None, |t| Credentials::Token(SecretString::from(t)));
        let mut config = ControllerConfig::new(url.clone()).with_auth(auth);
        if cli.insecure {
            config.tls = TlsVerification::DangerAcceptInvalid;
        }
        return Ok(config);
    }

    let cfg = practrack_config::load_config().wrap_err("failed to read config")?;
    let name = cfg.profile_name(cli.profile.as_deref()).to_owned();
    let profile = cfg.profiles.get(&name).ok_or_else(|| {
        eyre!("no server configured: pass --url or run `practrack config init`")
    })?;

    let mut config = practrack_config::profile_to_controller_config(profile, &name, &cfg.defaults)
        .wrap_err_with(|| format!("profile '{name}' is incomplete"))?;
    if let Some(token) = &cli.token {
        config.auth = Credentials::Token(SecretString::from(token.clone()));
    }
    if cli.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli);

    let config = controller_config(&cli)?;
    info!(url = %config.url, route = %cli.route, "starting practrack-tui");

    let mut app = App::new(Controller::new(config), cli.route);
    app.run().await
}
