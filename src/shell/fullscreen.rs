//! Full-screen suppression of the bar's always-on-top state

use log::{debug, info};
use parking_lot::Mutex;
use std::sync::Arc;

use super::{BarSurface, Companions, StackedWindow, TaskbarWindow, ZOrder};

/// Whether a full-screen application currently owns the bar's monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullScreenState {
    Normal,
    /// Always-on-top flags as they were before suppression
    SuppressedForFullScreen {
        bar_topmost: bool,
        taskbar_topmost: Option<bool>,
    },
}

/// Drops the bar (and the taskbar, when enabled) behind full-screen apps
pub struct FullScreenModeController {
    state: FullScreenState,
    taskbar_enabled: bool,
}

impl FullScreenModeController {
    pub fn new(taskbar_enabled: bool) -> Self {
        Self {
            state: FullScreenState::Normal,
            taskbar_enabled,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> FullScreenState {
        self.state
    }

    #[cfg(test)]
    pub fn is_suppressed(&self) -> bool {
        matches!(self.state, FullScreenState::SuppressedForFullScreen { .. })
    }

    /// Handle a full-screen notification from the shell
    pub fn on_full_screen_app(
        &mut self,
        entering: bool,
        surface: &mut dyn BarSurface,
        companions: &Companions,
    ) {
        match (entering, self.state) {
            (true, FullScreenState::Normal) => self.suppress(surface, companions),
            (
                false,
                FullScreenState::SuppressedForFullScreen {
                    bar_topmost,
                    taskbar_topmost,
                },
            ) => self.restore(bar_topmost, taskbar_topmost, surface, companions),
            _ => debug!(
                "Ignoring repeated full-screen notification (entering={})",
                entering
            ),
        }
    }

    fn suppress(&mut self, surface: &mut dyn BarSurface, companions: &Companions) {
        info!("Full-screen application detected, lowering bar");

        let bar_topmost = surface.is_topmost();
        lower(surface);

        let taskbar_topmost = self.enabled_taskbar(companions).map(|taskbar| {
            let mut taskbar = taskbar.lock();
            let was_topmost = taskbar.is_topmost();
            lower(&mut *taskbar);
            was_topmost
        });

        self.state = FullScreenState::SuppressedForFullScreen {
            bar_topmost,
            taskbar_topmost,
        };
    }

    fn restore(
        &mut self,
        bar_topmost: bool,
        taskbar_topmost: Option<bool>,
        surface: &mut dyn BarSurface,
        companions: &Companions,
    ) {
        info!("Full-screen application gone, restoring bar");

        raise(surface, bar_topmost);
        let taskbar = self.enabled_taskbar(companions);
        if let (Some(taskbar), Some(topmost)) = (taskbar, taskbar_topmost) {
            raise(&mut *taskbar.lock(), topmost);
        }

        self.state = FullScreenState::Normal;
    }

    fn enabled_taskbar(&self, companions: &Companions) -> Option<Arc<Mutex<dyn TaskbarWindow>>> {
        if self.taskbar_enabled {
            companions.taskbar()
        } else {
            None
        }
    }
}

fn lower<W: StackedWindow + ?Sized>(window: &mut W) {
    window.set_topmost(false);
    window.place(ZOrder::Bottom);
}

fn raise<W: StackedWindow + ?Sized>(window: &mut W, topmost: bool) {
    window.set_topmost(topmost);
    window.place(if topmost { ZOrder::TopMost } else { ZOrder::Top });
}
