//! MenuBar - a desktop-shell menu bar for Windows
//!
//! Docks at the top of the primary screen as an AppBar, reserves its strip of
//! the work area and keeps its shadow in step with the shell's notifications.

#![windows_subsystem = "windows"]

mod config;

// The bar core is only driven by the Win32 backend
#[cfg_attr(not(windows), allow(dead_code))]
mod error;
#[cfg_attr(not(windows), allow(dead_code))]
mod actions;
#[cfg_attr(not(windows), allow(dead_code))]
mod bar;
#[cfg_attr(not(windows), allow(dead_code))]
mod clock;
#[cfg_attr(not(windows), allow(dead_code))]
mod geometry;
#[cfg_attr(not(windows), allow(dead_code))]
mod service;
#[cfg_attr(not(windows), allow(dead_code))]
mod shell;
#[cfg_attr(not(windows), allow(dead_code))]
mod tray;

#[cfg(windows)]
mod app;
#[cfg(windows)]
mod utils;
#[cfg(windows)]
mod window;

#[cfg(test)]
mod testing;

use anyhow::Result;
use log::{info, LevelFilter};
use std::sync::Arc;

use crate::config::Config;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_millis()
        .init();

    info!("Starting MenuBar v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Arc::new(Config::load_or_default()?);
    info!("Configuration loaded successfully");

    run(config)?;

    info!("MenuBar shutting down gracefully");
    Ok(())
}

#[cfg(windows)]
fn run(config: Arc<Config>) -> Result<()> {
    let mut app = app::Application::new(config)?;
    app.run()
}

#[cfg(not(windows))]
fn run(_config: Arc<Config>) -> Result<()> {
    anyhow::bail!("MenuBar docks against the Windows shell and cannot run on this platform")
}
