//! Notification-area (system tray) lifecycle for MenuBar

use log::{debug, info, warn};

use crate::error::BarResult;

/// A notification-area implementation the bar can host
pub trait TraySubsystem {
    fn initialize(&mut self) -> BarResult<()>;

    /// Must be safe to call when `initialize` never ran or failed
    fn destroy(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraySubsystemState {
    NotStarted,
    Started,
    /// Initialization failed; stays this way until the process restarts
    Failed,
}

/// Starts the tray when the bar has loaded and tears it down on close
pub struct TrayLifecycleManager {
    subsystem: Box<dyn TraySubsystem>,
    state: TraySubsystemState,
    attempted: bool,
}

impl TrayLifecycleManager {
    pub fn new(subsystem: Box<dyn TraySubsystem>) -> Self {
        Self {
            subsystem,
            state: TraySubsystemState::NotStarted,
            attempted: false,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> TraySubsystemState {
        self.state
    }

    /// Whether startup failed (for diagnostics)
    #[cfg(test)]
    pub fn failed(&self) -> bool {
        self.state == TraySubsystemState::Failed
    }

    /// Bar window finished loading
    pub fn on_loaded(&mut self, enabled: bool) {
        if !enabled {
            debug!("System tray disabled in configuration");
            return;
        }
        if self.attempted {
            debug!("System tray start already attempted");
            return;
        }
        self.attempted = true;

        match self.subsystem.initialize() {
            Ok(()) => {
                info!("System tray started");
                self.state = TraySubsystemState::Started;
            }
            Err(e) => {
                warn!("Failed to start system tray: {}", e);
                self.state = TraySubsystemState::Failed;
            }
        }
    }

    /// Bar window is closing
    pub fn on_closing(&mut self) {
        self.subsystem.destroy();
        if self.state == TraySubsystemState::Started {
            self.state = TraySubsystemState::NotStarted;
        }
        info!("System tray torn down");
    }
}

#[cfg(windows)]
pub use notify_icon::NotifyIconTray;

#[cfg(windows)]
mod notify_icon {
    use log::info;
    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::Shell::{
        Shell_NotifyIconW, NIF_ICON, NIF_MESSAGE, NIF_TIP, NIM_ADD, NIM_DELETE, NOTIFYICONDATAW,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        LoadImageW, HICON, IDI_APPLICATION, IMAGE_ICON, LR_DEFAULTSIZE, LR_SHARED,
    };

    use super::TraySubsystem;
    use crate::error::{BarError, BarResult};
    use crate::utils::to_wide_string;
    use crate::window::WM_MENUBAR_TRAY;

    /// Tray icon identifier
    const TRAY_ICON_ID: u32 = 1;

    /// The bar's icon in the notification area
    pub struct NotifyIconTray {
        hwnd: HWND,
        is_added: bool,
    }

    impl NotifyIconTray {
        pub fn new(hwnd: HWND) -> Self {
            Self {
                hwnd,
                is_added: false,
            }
        }

        fn load_default_icon() -> BarResult<HICON> {
            // Shared system icon, so nothing to destroy later
            let icon = unsafe {
                LoadImageW(
                    None,
                    IDI_APPLICATION,
                    IMAGE_ICON,
                    0,
                    0,
                    LR_DEFAULTSIZE | LR_SHARED,
                )?
            };
            Ok(HICON(icon.0))
        }
    }

    impl TraySubsystem for NotifyIconTray {
        fn initialize(&mut self) -> BarResult<()> {
            if self.is_added {
                return Ok(());
            }

            let tooltip = to_wide_string("MenuBar");
            let mut nid = NOTIFYICONDATAW {
                cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
                hWnd: self.hwnd,
                uID: TRAY_ICON_ID,
                uFlags: NIF_ICON | NIF_MESSAGE | NIF_TIP,
                uCallbackMessage: WM_MENUBAR_TRAY,
                hIcon: Self::load_default_icon()?,
                ..Default::default()
            };

            let tooltip_len = tooltip.len().min(nid.szTip.len());
            nid.szTip[..tooltip_len].copy_from_slice(&tooltip[..tooltip_len]);

            unsafe {
                if !Shell_NotifyIconW(NIM_ADD, &nid).as_bool() {
                    return Err(BarError::TrayIcon("Failed to add tray icon".into()));
                }
            }

            self.is_added = true;
            info!("Tray icon added");
            Ok(())
        }

        fn destroy(&mut self) {
            if !self.is_added {
                return;
            }

            let nid = NOTIFYICONDATAW {
                cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
                hWnd: self.hwnd,
                uID: TRAY_ICON_ID,
                ..Default::default()
            };

            unsafe {
                let _ = Shell_NotifyIconW(NIM_DELETE, &nid);
            }
            self.is_added = false;
            info!("Tray icon removed");
        }
    }
}
