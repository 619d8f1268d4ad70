//! Win32 backend for the MenuBar application
//!
//! Native windows, the window procedure and the OS implementations of the
//! bar's collaborator traits.

pub mod manager;
pub mod menus;
pub mod proc;
pub mod services;
pub mod shadow;
pub mod shell;
pub mod state;
pub mod surface;

// Re-export main types for convenience
pub use manager::WindowManager;
pub use proc::WM_MENUBAR_TRAY;
