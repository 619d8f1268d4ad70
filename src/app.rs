//! Main application logic for MenuBar

use anyhow::Result;
use log::info;
use std::sync::Arc;

use crate::config::Config;
use crate::window::WindowManager;

/// Main application state
pub struct Application {
    window_manager: WindowManager,
}

impl Application {
    /// Create a new application instance
    pub fn new(config: Arc<Config>) -> Result<Self> {
        info!("Initializing MenuBar application");
        let window_manager = WindowManager::new(config)?;
        Ok(Self { window_manager })
    }

    /// Run the application
    pub fn run(&mut self) -> Result<()> {
        info!("Starting MenuBar main loop");

        self.window_manager.show();
        self.window_manager.run_message_loop()?;

        info!("MenuBar main loop ended");
        Ok(())
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        info!("Cleaning up MenuBar application");
    }
}
