use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use taclink_core::{Config, Mode};
use tracing::info;

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser, Debug)]
#[command(name = "taclink", version, about = "Terminal chat front-end for a generation webhook")]
struct Args {
    /// Override the configured endpoint URL for this session (not persisted)
    #[arg(long)]
    endpoint: Option<String>,

    /// Generation mode to start in: "image" or "video"
    #[arg(long, default_value = "image")]
    mode: String,

    /// Enable debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

/// Logs go to a file; the terminal itself belongs to the TUI.
fn init_logging(verbose: bool) -> Result<()> {
    let log_dir = dirs::cache_dir()
        .context("could not determine cache directory")?
        .join("taclink");
    fs::create_dir_all(&log_dir)?;

    let log_file = fs::File::create(log_dir.join("taclink.log"))?;
    let filter = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let Some(mode) = Mode::from_str(&args.mode) else {
        eprintln!("Invalid mode '{}'. Valid modes: image, video", args.mode);
        std::process::exit(1);
    };

    init_logging(args.verbose)?;

    let config = Config::load().unwrap_or_else(|err| {
        tracing::warn!(%err, "could not read config, using defaults");
        Config::new()
    });

    info!(endpoint = %args.endpoint.as_deref().unwrap_or(&config.endpoint_url), ?mode, "starting session");

    let mut app = App::new(config, args.endpoint, mode)?;

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = run_app(&mut app, &mut terminal, &mut events).await;

    tui::restore()?;
    result
}

async fn run_app(app: &mut App, terminal: &mut tui::Tui, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        // Settle any finished request before drawing so the reply shows up
        // in the same frame.
        app.poll_request().await;

        terminal.draw(|frame| ui::render(app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(app, event)?;
        }
    }

    info!("session ended");
    Ok(())
}
