//! Configuration management for MenuBar
//!
//! Handles loading and saving the user's bar settings.

use anyhow::Result;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// General application settings
    pub general: GeneralConfig,
    /// Appearance settings
    pub appearance: AppearanceConfig,
    /// Optional subsystems
    pub features: FeaturesConfig,
    /// Clock text formats
    pub clock: ClockConfig,
    /// Search service readiness
    pub search: SearchConfig,
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("menubar")
            .join("config.toml")
    }

    /// Load configuration from file or create default
    pub fn load_or_default() -> Result<Self> {
        Self::load_or_default_from(&Self::config_path())
    }

    pub fn load_or_default_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            info!("Loading configuration from: {:?}", config_path);
            let content = std::fs::read_to_string(config_path)?;
            match toml::from_str(&content) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    warn!("Failed to parse config, using defaults: {}", e);
                    return Ok(Self::default());
                }
            }
        }

        let config = Self::default();
        config.save_to(config_path)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        info!("Configuration saved to: {:?}", config_path);
        Ok(())
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Bar runs as the user's shell; restart Explorer when it closes
    pub user_shell: bool,
    /// Program used to open folders
    pub file_manager: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            user_shell: false,
            file_manager: "explorer.exe".to_string(),
        }
    }
}

/// Appearance configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    /// Bar height in logical pixels
    pub bar_height: u32,
    /// Draw the drop shadow below the bar
    pub shadow_enabled: bool,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            bar_height: 23,
            shadow_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// A taskbar companion is shown
    pub enable_taskbar: bool,
    /// Host the notification area
    pub enable_sys_tray: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            enable_taskbar: false,
            enable_sys_tray: true,
        }
    }
}

/// Clock configuration (chrono strftime patterns, empty for the long defaults)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClockConfig {
    pub time_format: String,
    pub date_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Windows service that backs search
    pub service_name: String,
    /// Seconds between readiness checks
    pub poll_interval_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            service_name: "WSearch".to_string(),
            poll_interval_secs: 5,
        }
    }
}
