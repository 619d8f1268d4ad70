//! Custom error types for the MenuBar application

use thiserror::Error;

/// Main error type for MenuBar operations
#[derive(Error, Debug)]
pub enum BarError {
    #[error("Window creation failed: {0}")]
    WindowCreation(String),

    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsApi(#[from] windows::core::Error),

    #[error("AppBar registration failed: {0}")]
    Registration(String),

    #[error("Service query failed for {service}: {reason}")]
    ServiceQuery { service: String, reason: String },

    #[error("Tray icon error: {0}")]
    TrayIcon(String),
}

/// Result type alias for MenuBar operations
pub type BarResult<T> = Result<T, BarError>;
