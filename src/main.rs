mod alert;
mod api;
mod clock;
mod diagnostics;
mod settings;
mod timer;
mod ui;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use clap::Parser;

use crate::api::{ApiServer, ApiServerConfig, ApiSharedState};
use crate::settings::load_settings;

#[derive(Parser, Debug)]
#[command(
    name = "stopclock",
    version,
    about = "Stopwatch and countdown timers with an audible ending alert"
)]
struct Cli {
    #[arg(long, default_value = "settings.json")]
    settings: PathBuf,

    /// Override the polling interval from the settings file.
    #[arg(long)]
    tick_interval_ms: Option<u64>,

    /// Run the headless tick-pacing benchmark and exit.
    #[arg(long)]
    diagnostics: bool,

    #[arg(long, default_value = "0.0.0.0")]
    api_bind: String,

    #[arg(long, default_value_t = 8099)]
    api_port: u16,

    /// Do not expose the local status API.
    #[arg(long)]
    no_api: bool,

    /// Disable the ending alert sound.
    #[arg(long)]
    muted: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = load_settings(&cli.settings)
        .with_context(|| format!("failed to load {}", cli.settings.display()))?;
    if let Some(tick_interval_ms) = cli.tick_interval_ms {
        if tick_interval_ms == 0 {
            bail!("--tick-interval-ms must be greater than zero");
        }
        settings.tick_interval_ms = tick_interval_ms;
    }

    if cli.diagnostics {
        diagnostics::run_diagnostics(settings.tick_interval_ms)?;
        return Ok(());
    }

    let api_server = if cli.no_api {
        None
    } else {
        Some(
            ApiServer::start(ApiServerConfig {
                bind_addr: cli.api_bind.clone(),
                port: cli.api_port,
            })
            .with_context(|| {
                format!(
                    "failed to start local API at {}:{}",
                    cli.api_bind, cli.api_port
                )
            })?,
        )
    };
    let api_state: Option<Arc<Mutex<ApiSharedState>>> =
        api_server.as_ref().map(|server| Arc::clone(&server.state));

    let ui_result = ui::app::run_gui(
        settings,
        cli.settings.clone(),
        cli.muted,
        api_state,
        cli.api_bind,
        cli.api_port,
    );

    drop(api_server);
    ui_result
}
