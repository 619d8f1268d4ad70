//! Window manager for creating and managing the MenuBar window
//!
//! Creates the bar and shadow windows, builds the [`Bar`] with its Win32
//! collaborators and runs the message loop.

use anyhow::Result;
use log::{info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use windows::Win32::Foundation::HWND;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::HiDpi::{
    GetDpiForWindow, SetProcessDpiAwarenessContext, DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
};
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::bar::{Bar, BarServices};
use crate::config::Config;
use crate::error::BarError;
use crate::geometry::{DpiContext, Rect};
use crate::shell::{BarSurface, Companions, CompanionWindow, WindowHandle};
use crate::tray::NotifyIconTray;
use crate::utils::{get_screen_size, to_pcwstr, to_wide_string};

use super::services::{
    MessageBoxConfirmer, MessageBoxNotifier, ScmServiceQuery, ShellLauncher, WindowLifecycle,
    WindowTimers, Win32Session,
};
use super::shadow::ShadowWindow;
use super::shell::Win32AppBar;
use super::state::{set_appbar_message, set_bar, take_bar, with_bar};
use super::surface::Win32Surface;

/// Window class name
const WINDOW_CLASS: &str = "MenuBarWindowClass";
const WINDOW_TITLE: &str = "MenuBar";

/// Main window manager
pub struct WindowManager {
    hwnd: HWND,
    // Owned here; the bar only holds a weak reference
    _shadow: Option<Arc<Mutex<dyn CompanionWindow>>>,
}

impl WindowManager {
    /// Create the bar window and dock it
    pub fn new(config: Arc<Config>) -> Result<Self> {
        // Set DPI awareness
        unsafe {
            let _ = SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2);
        }

        let class_name = to_wide_string(WINDOW_CLASS);
        Self::register_window_class(&class_name)?;
        let hwnd = Self::create_window(&class_name)?;
        let handle = WindowHandle(hwnd.0 as isize);

        let dpi = DpiContext::new(unsafe { GetDpiForWindow(hwnd) });
        let screen = get_screen_size();
        let mut surface = Win32Surface::new(handle);
        surface.set_bounds(Rect::new(
            0,
            0,
            dpi.to_logical(screen.width),
            config.appearance.bar_height as i32,
        ));

        let shadow = if config.appearance.shadow_enabled {
            match ShadowWindow::create(handle) {
                Ok(shadow) => Some(Arc::new(Mutex::new(shadow)) as Arc<Mutex<dyn CompanionWindow>>),
                Err(e) => {
                    warn!("Failed to create shadow window: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let mut companions = Companions::new();
        if let Some(shadow) = &shadow {
            companions = companions.with_shadow(shadow);
        }

        let services = BarServices {
            shell: Box::new(Win32AppBar::new()),
            surface: Box::new(surface),
            companions,
            tray: Box::new(NotifyIconTray::new(hwnd)),
            search_query: Box::new(ScmServiceQuery::new()),
            scheduler: Box::new(WindowTimers::new(handle)),
            launcher: Box::new(ShellLauncher::new()),
            notifier: Box::new(MessageBoxNotifier::new(handle)),
            confirmer: Box::new(MessageBoxConfirmer::new(handle)),
            session: Box::new(Win32Session::new()),
            lifecycle: Box::new(WindowLifecycle::new(handle)),
        };
        set_bar(Bar::new(config, services));

        let message_id = with_bar(|bar| {
            bar.on_source_initialized(screen.width as u32, screen.height as u32)
        })
        .flatten();
        set_appbar_message(message_id);

        info!("Window created for a {}x{} screen", screen.width, screen.height);
        Ok(Self {
            hwnd,
            _shadow: shadow,
        })
    }

    /// Register the window class
    fn register_window_class(class_name: &[u16]) -> Result<()> {
        unsafe {
            let hinstance = GetModuleHandleW(None)?;

            let wc = WNDCLASSEXW {
                cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
                style: CS_HREDRAW | CS_VREDRAW,
                lpfnWndProc: Some(super::proc::window_proc),
                hInstance: hinstance.into(),
                hCursor: LoadCursorW(None, IDC_ARROW)?,
                lpszClassName: to_pcwstr(class_name),
                ..Default::default()
            };

            if RegisterClassExW(&wc) == 0 {
                return Err(BarError::WindowCreation("bar window class".into()).into());
            }
        }
        Ok(())
    }

    /// Create the bar window
    fn create_window(class_name: &[u16]) -> Result<HWND> {
        let title = to_wide_string(WINDOW_TITLE);

        // Topmost tool window, kept off the taskbar
        let ex_style = WS_EX_TOPMOST | WS_EX_TOOLWINDOW | WS_EX_NOACTIVATE;

        unsafe {
            let hinstance = GetModuleHandleW(None)?;

            let hwnd = CreateWindowExW(
                ex_style,
                to_pcwstr(class_name),
                to_pcwstr(&title),
                WS_POPUP,
                0,
                0,
                100,
                100, // Sized by the bar once it docks
                None,
                None,
                hinstance,
                None,
            )?;

            if hwnd.0.is_null() {
                return Err(BarError::WindowCreation("bar window".into()).into());
            }
            Ok(hwnd)
        }
    }

    /// Show the window and finish loading the bar
    pub fn show(&self) {
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_SHOWNOACTIVATE);
        }
        with_bar(|bar| bar.on_loaded());
    }

    /// Run the message loop
    pub fn run_message_loop(&self) -> Result<()> {
        unsafe {
            let mut msg = MSG::default();
            while GetMessageW(&mut msg, None, 0, 0).into() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
        Ok(())
    }
}

impl Drop for WindowManager {
    fn drop(&mut self) {
        // Dropping the bar releases any AppBar reservation still held
        drop(take_bar());
        set_appbar_message(None);
        unsafe {
            if IsWindow(self.hwnd).as_bool() {
                let _ = DestroyWindow(self.hwnd);
            }
        }
    }
}
