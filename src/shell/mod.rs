//! Shell integration for the bar
//!
//! Everything that talks to the desktop shell goes through the traits in this
//! module. The Win32 implementations live in `crate::window`; the components in
//! the submodules only see the traits, which keeps them testable off Windows.

pub mod dispatch;
pub mod fullscreen;
pub mod position;
pub mod registrar;

use parking_lot::Mutex;
use std::sync::{Arc, Weak};

use crate::error::BarResult;
use crate::geometry::{Rect, Size};

pub use dispatch::{BarEventHandler, MessageDispatcher, RawMessage};
pub use fullscreen::FullScreenModeController;
pub use position::PositionCoordinator;
pub use registrar::BarRegistrar;

/// Opaque identifier for a native window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

/// Callback message id handed out by the shell on registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub u32);

/// Screen edge an AppBar is docked to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Top,
    Right,
    Bottom,
}

impl Edge {
    /// Numeric edge code used by the AppBar protocol (ABE_*)
    pub fn code(self) -> u32 {
        match self {
            Edge::Left => 0,
            Edge::Top => 1,
            Edge::Right => 2,
            Edge::Bottom => 3,
        }
    }

    /// Strip a bar of `size` asks for on this edge of a `screen`-sized display.
    ///
    /// Horizontal bars span `size.width`; vertical bars run the full screen height.
    pub fn requested_rect(self, size: Size, screen: Size) -> Rect {
        match self {
            Edge::Top => Rect::new(0, 0, size.width, size.height),
            Edge::Bottom => Rect::new(0, screen.height - size.height, size.width, size.height),
            Edge::Left => Rect::new(0, 0, size.width, screen.height),
            Edge::Right => Rect::new(screen.width - size.width, 0, size.width, screen.height),
        }
    }
}

/// Explicit z-order placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZOrder {
    /// Above every non-topmost window
    TopMost,
    /// Top of the non-topmost band
    Top,
    /// Behind every other window
    Bottom,
}

/// The shell's docked-bar protocol
pub trait ShellAppBar {
    /// Register `handle` as an AppBar on `edge`, returning its callback message id
    fn register(&mut self, handle: WindowHandle, edge: Edge) -> BarResult<MessageId>;

    /// Remove the AppBar reservation for `handle`
    fn unregister(&mut self, handle: WindowHandle) -> BarResult<()>;

    /// Negotiate a position of `size` device pixels on `edge`.
    ///
    /// Returns the rectangle the shell granted, in device pixels.
    fn set_position(&mut self, handle: WindowHandle, size: Size, edge: Edge) -> BarResult<Rect>;

    /// Restore the desktop work area to the full screen
    fn reset_work_area(&mut self) -> BarResult<()>;

    /// Tell the shell the bar was activated
    fn activate(&mut self, handle: WindowHandle);

    /// Tell the shell the bar's window position changed
    fn window_pos_changed(&mut self, handle: WindowHandle);
}

/// A window that can be raised, lowered and pinned above others
pub trait StackedWindow {
    fn is_topmost(&self) -> bool;
    fn set_topmost(&mut self, topmost: bool);
    fn place(&mut self, order: ZOrder);
}

/// The bar's own native window
pub trait BarSurface: StackedWindow {
    fn handle(&self) -> WindowHandle;

    /// Current DPI of the monitor hosting the bar
    fn dpi(&self) -> u32;

    /// Current bounds in logical units
    fn bounds(&self) -> Rect;

    /// Move and resize, in logical units
    fn set_bounds(&mut self, bounds: Rect);

    fn set_visible(&mut self, visible: bool);
}

/// A window whose position follows the bar (the drop shadow)
pub trait CompanionWindow {
    /// Recompute position from the bar's new bounds
    fn set_position(&mut self, bar: &Rect);
}

/// The taskbar companion, which also follows full-screen suppression
pub trait TaskbarWindow: CompanionWindow + StackedWindow {}

impl<T: CompanionWindow + StackedWindow> TaskbarWindow for T {}

/// Non-owning references from the bar to its companion windows.
///
/// The composition root owns the windows. A companion that was never set or
/// has since been dropped is simply skipped.
#[derive(Default)]
pub struct Companions {
    shadow: Option<Weak<Mutex<dyn CompanionWindow>>>,
    taskbar: Option<Weak<Mutex<dyn TaskbarWindow>>>,
}

impl Companions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shadow(mut self, shadow: &Arc<Mutex<dyn CompanionWindow>>) -> Self {
        self.shadow = Some(Arc::downgrade(shadow));
        self
    }

    #[cfg(test)]
    pub fn with_taskbar(mut self, taskbar: &Arc<Mutex<dyn TaskbarWindow>>) -> Self {
        self.taskbar = Some(Arc::downgrade(taskbar));
        self
    }

    pub fn shadow(&self) -> Option<Arc<Mutex<dyn CompanionWindow>>> {
        self.shadow.as_ref().and_then(Weak::upgrade)
    }

    pub fn taskbar(&self) -> Option<Arc<Mutex<dyn TaskbarWindow>>> {
        self.taskbar.as_ref().and_then(Weak::upgrade)
    }

    /// Move the shadow under the bar, if there is one
    pub fn sync_shadow(&self, bar: &Rect) {
        if let Some(shadow) = self.shadow() {
            shadow.lock().set_position(bar);
        }
    }
}
