mod app;
mod auth;
mod components;
mod config;
mod data;
mod db;
mod models;
mod tui;

use anyhow::{Context, Result};
use app::{App, AppContext};
use config::{AppConfig, APP_NAME, APP_VERSION};
use crossterm::{
    event::DisableMouseCapture,
    terminal::{self, LeaveAlternateScreen},
};
use db::{SqliteStore, Storage};
use std::fs::File;
use std::io;
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tui::Tui;

fn main() -> Result<()> {
    let config = AppConfig::from_env();
    init_logging(&config)?;
    info!(version = APP_VERSION, db = %config.db_path.display(), "starting {APP_NAME}");

    let store = SqliteStore::open(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;
    let ctx = AppContext::load(Storage::new(store), config.bcrypt_cost)?;

    let _guard = CleanupGuard;
    let mut tui = Tui::new(config.tick_rate)?;
    tui.init()?;

    let mut app = App::new(ctx);
    let res = app.run(&mut tui);

    tui.exit()?;

    if let Err(e) = res {
        error!(error = ?e, "application error");
        eprintln!("Application Error: {e}");
    }
    info!("exiting");
    Ok(())
}

/// Sends tracing output to the log file; the terminal is owned by the UI.
fn init_logging(config: &AppConfig) -> Result<()> {
    let file = File::create(&config.log_path)
        .with_context(|| format!("Failed to create log file {}", config.log_path.display()))?;
    let filter = EnvFilter::try_new(&config.log_filter)
        .with_context(|| format!("Invalid log filter {:?}", config.log_filter))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

struct CleanupGuard;

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        // Ignore errors during cleanup
        let _ = terminal::disable_raw_mode();
        let _ = crossterm::execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
    }
}
