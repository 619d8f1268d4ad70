//! Classification and routing of raw window messages
//!
//! The bar's own AppBar callback message is allocated at runtime, so it is
//! checked first; the well-known window messages are routed afterwards through
//! a fixed table. Nothing here calls into the OS.

use log::{debug, trace};

use crate::geometry::decode_display_change;

use super::MessageId;

/// WM_ACTIVATE
pub const WM_ACTIVATE: u32 = 0x0006;
/// WM_WINDOWPOSCHANGED
pub const WM_WINDOWPOSCHANGED: u32 = 0x0047;
/// WM_DISPLAYCHANGE
pub const WM_DISPLAYCHANGE: u32 = 0x007E;

/// ABN_STATECHANGE
pub const ABN_STATECHANGE: usize = 0;
/// ABN_POSCHANGED
pub const ABN_POSCHANGED: usize = 1;
/// ABN_FULLSCREENAPP
pub const ABN_FULLSCREENAPP: usize = 2;
/// ABN_WINDOWARRANGE
pub const ABN_WINDOWARRANGE: usize = 3;

/// A window message as delivered to the window procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMessage {
    pub code: u32,
    pub wparam: usize,
    pub lparam: isize,
}

impl RawMessage {
    pub fn new(code: u32, wparam: usize, lparam: isize) -> Self {
        Self {
            code,
            wparam,
            lparam,
        }
    }
}

/// Receiver of classified bar events
pub trait BarEventHandler {
    /// The shell moved docked bars around; re-dock and resync companions
    fn on_position_changed(&mut self);

    /// A full-screen application appeared (`true`) or went away (`false`)
    fn on_full_screen_app(&mut self, entering: bool);

    /// The shell is about to arrange windows (`true`) or has finished (`false`)
    fn on_window_arrange(&mut self, begin: bool);

    fn on_activate(&mut self);

    fn on_window_pos_changed(&mut self);

    /// Display resolution changed, in device pixels
    fn on_display_change(&mut self, width: u32, height: u32);
}

/// What to do with a message that arrives while the bar is already handling
/// another one (a synchronous send from inside a handler)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyRoute {
    /// Hold it and hand it to the bar once the current handler returns
    Defer,
    /// Tell the shell the bar was activated, without touching the bar
    Activate,
    /// Tell the shell the bar moved, without touching the bar
    WindowPosChanged,
    /// Default window processing only
    Default,
}

/// Route taken for one of the fixed window messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Activate,
    WindowPosChanged,
    DisplayChange,
}

impl Route {
    /// Whether default processing should be skipped after the handler ran
    fn handled(self) -> bool {
        match self {
            Route::Activate | Route::WindowPosChanged => false,
            Route::DisplayChange => true,
        }
    }
}

const FIXED_ROUTES: &[(u32, Route)] = &[
    (WM_ACTIVATE, Route::Activate),
    (WM_WINDOWPOSCHANGED, Route::WindowPosChanged),
    (WM_DISPLAYCHANGE, Route::DisplayChange),
];

/// Dispatches window messages to a [`BarEventHandler`]
#[derive(Debug, Clone, Copy)]
pub struct MessageDispatcher {
    routes: &'static [(u32, Route)],
}

impl MessageDispatcher {
    pub fn new() -> Self {
        Self {
            routes: FIXED_ROUTES,
        }
    }

    /// Route `message` and report whether default processing should be skipped.
    ///
    /// `registered` is the active AppBar callback id, if any.
    pub fn dispatch<H: BarEventHandler + ?Sized>(
        &self,
        message: RawMessage,
        registered: Option<MessageId>,
        handler: &mut H,
    ) -> bool {
        if registered.is_some_and(|id| id.0 == message.code) {
            Self::dispatch_notification(message, handler);
            return true;
        }

        let Some(route) = self.route(message.code) else {
            return false;
        };

        match route {
            Route::Activate => handler.on_activate(),
            Route::WindowPosChanged => handler.on_window_pos_changed(),
            Route::DisplayChange => {
                let (width, height) = decode_display_change(message.lparam);
                debug!("Display changed to {}x{}", width, height);
                handler.on_display_change(width, height);
            }
        }
        route.handled()
    }

    /// Route for `code` when the bar cannot be reached.
    ///
    /// Shell notifications are deferred. The activation and position hooks
    /// only need the window handle, so they still reach the shell while
    /// registered.
    pub fn route_while_busy(&self, code: u32, registered: Option<MessageId>) -> BusyRoute {
        let Some(id) = registered else {
            return BusyRoute::Default;
        };
        if id.0 == code {
            return BusyRoute::Defer;
        }
        match self.route(code) {
            Some(Route::Activate) => BusyRoute::Activate,
            Some(Route::WindowPosChanged) => BusyRoute::WindowPosChanged,
            Some(Route::DisplayChange) | None => BusyRoute::Default,
        }
    }

    fn route(&self, code: u32) -> Option<Route> {
        self.routes
            .iter()
            .find(|(fixed, _)| *fixed == code)
            .map(|(_, route)| *route)
    }

    fn dispatch_notification<H: BarEventHandler + ?Sized>(message: RawMessage, handler: &mut H) {
        match message.wparam {
            ABN_POSCHANGED => {
                debug!("AppBar notification: position changed");
                handler.on_position_changed();
            }
            ABN_FULLSCREENAPP => {
                let entering = message.lparam != 0;
                debug!("AppBar notification: full-screen app (entering={})", entering);
                handler.on_full_screen_app(entering);
            }
            ABN_WINDOWARRANGE => {
                let begin = message.lparam != 0;
                debug!("AppBar notification: window arrange (begin={})", begin);
                handler.on_window_arrange(begin);
            }
            other => {
                trace!("Ignoring AppBar notification kind {}", other);
            }
        }
    }
}

impl Default for MessageDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
