//! AppBar registration lifecycle
//!
//! Owns the bar's membership in the shell's docked-bar mechanism. Failures
//! from the shell never escape this type: a failed registration simply leaves
//! the bar unregistered, so its callback message is never treated as handled.

use log::{debug, info, warn};

use crate::geometry::{Rect, Size};

use super::{Edge, MessageId, ShellAppBar, WindowHandle};

/// An active AppBar registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppBarRegistration {
    pub message_id: MessageId,
    pub edge: Edge,
    pub owner: WindowHandle,
}

/// Registers and unregisters the bar with the shell
pub struct BarRegistrar {
    shell: Box<dyn ShellAppBar>,
    registration: Option<AppBarRegistration>,
}

impl BarRegistrar {
    pub fn new(shell: Box<dyn ShellAppBar>) -> Self {
        Self {
            shell,
            registration: None,
        }
    }

    /// Register `handle` as a docked bar on `edge` and reserve `size` device pixels.
    ///
    /// Returns `None` when the shell refused; the bar then runs undocked.
    pub fn register(&mut self, handle: WindowHandle, size: Size, edge: Edge) -> Option<MessageId> {
        if let Some(existing) = self.registration {
            debug!("AppBar already registered with message id {}", existing.message_id.0);
            return Some(existing.message_id);
        }

        let message_id = match self.shell.register(handle, edge) {
            Ok(id) => id,
            Err(e) => {
                warn!("Failed to register AppBar: {}", e);
                return None;
            }
        };

        self.registration = Some(AppBarRegistration {
            message_id,
            edge,
            owner: handle,
        });

        // Reserve the initial strip; a refusal here keeps the registration so
        // the next PositionChanged notification can try again.
        if let Err(e) = self.shell.set_position(handle, size, edge) {
            warn!("Failed to reserve initial AppBar position: {}", e);
        }

        info!(
            "AppBar registered on {:?} edge with message id {}",
            edge, message_id.0
        );
        Some(message_id)
    }

    /// Release the reserved screen space. Calling this again is a no-op.
    pub fn unregister(&mut self) {
        let Some(registration) = self.registration.take() else {
            debug!("AppBar unregister requested while not registered");
            return;
        };

        if let Err(e) = self.shell.reset_work_area() {
            warn!("Failed to reset work area: {}", e);
        }
        if let Err(e) = self.shell.unregister(registration.owner) {
            warn!("Failed to remove AppBar: {}", e);
        }
        info!("AppBar unregistered");
    }

    /// Negotiate a new docked position, returning the granted device-pixel rect
    pub fn set_position(&mut self, size: Size) -> Option<Rect> {
        let registration = self.registration?;
        match self
            .shell
            .set_position(registration.owner, size, registration.edge)
        {
            Ok(rect) => Some(rect),
            Err(e) => {
                warn!("AppBar position negotiation failed: {}", e);
                None
            }
        }
    }

    /// Forward a window activation to the shell
    pub fn on_activate(&mut self) {
        if let Some(registration) = self.registration {
            self.shell.activate(registration.owner);
        }
    }

    /// Forward a generic window-position change to the shell
    pub fn on_window_pos_changed(&mut self) {
        if let Some(registration) = self.registration {
            self.shell.window_pos_changed(registration.owner);
        }
    }

    pub fn message_id(&self) -> Option<MessageId> {
        self.registration.map(|r| r.message_id)
    }

    #[cfg(test)]
    pub fn is_registered(&self) -> bool {
        self.registration.is_some()
    }
}
