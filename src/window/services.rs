//! OS-backed collaborators for the bar: service status, timers, process
//! launch, user messages, session control and shutdown

use log::{debug, warn};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{CloseHandle, BOOL, BOOLEAN, HANDLE, HWND, LPARAM, LUID, WPARAM};
use windows::Win32::Security::{
    AdjustTokenPrivileges, LookupPrivilegeValueW, LUID_AND_ATTRIBUTES, SE_PRIVILEGE_ENABLED,
    SE_SHUTDOWN_NAME, TOKEN_ADJUST_PRIVILEGES, TOKEN_PRIVILEGES, TOKEN_QUERY,
};
use windows::Win32::System::Power::SetSuspendState;
use windows::Win32::System::Shutdown::{
    ExitWindowsEx, EWX_LOGOFF, EWX_POWEROFF, EWX_REBOOT, EWX_SHUTDOWN, EXIT_WINDOWS_FLAGS,
    SHTDN_REASON_FLAG_PLANNED, SHTDN_REASON_MAJOR_OTHER, SHTDN_REASON_MINOR_OTHER,
};
use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};
use windows::Win32::System::Services::{
    CloseServiceHandle, OpenSCManagerW, OpenServiceW, QueryServiceStatus, SC_HANDLE,
    SC_MANAGER_CONNECT, SERVICE_QUERY_STATUS, SERVICE_RUNNING, SERVICE_STATUS, SERVICE_STOPPED,
};
use windows::Win32::UI::Shell::ShellExecuteW;
use windows::Win32::UI::WindowsAndMessaging::{
    KillTimer, MessageBoxW, PostMessageW, SetTimer, IDOK, MB_ICONERROR, MB_ICONWARNING, MB_OK,
    MB_OKCANCEL, SW_SHOWNORMAL, WM_CLOSE,
};

use crate::actions::{
    Confirmation, Confirmer, LifecycleController, Notifier, ProcessLauncher, SessionAction,
    SessionControl,
};
use crate::error::{BarError, BarResult};
use crate::service::{Scheduler, ServiceQuery, ServiceState, TimerId};
use crate::shell::WindowHandle;
use crate::utils::{to_pcwstr, to_wide_string};

use super::proc::WM_MENUBAR_NOTIFY;
use super::shell::to_hwnd;

/// Closes a service control handle when dropped
struct ServiceHandle(SC_HANDLE);

impl Drop for ServiceHandle {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseServiceHandle(self.0);
        }
    }
}

/// Service status from the service control manager
#[derive(Default)]
pub struct ScmServiceQuery;

impl ScmServiceQuery {
    pub fn new() -> Self {
        Self
    }
}

impl ServiceQuery for ScmServiceQuery {
    fn query_status(&mut self, service: &str) -> BarResult<ServiceState> {
        let failed = |e: windows::core::Error| BarError::ServiceQuery {
            service: service.to_string(),
            reason: e.to_string(),
        };
        let name = to_wide_string(service);

        unsafe {
            let manager = ServiceHandle(
                OpenSCManagerW(PCWSTR::null(), PCWSTR::null(), SC_MANAGER_CONNECT).map_err(failed)?,
            );
            let handle = ServiceHandle(
                OpenServiceW(manager.0, to_pcwstr(&name), SERVICE_QUERY_STATUS).map_err(failed)?,
            );

            let mut status = SERVICE_STATUS::default();
            QueryServiceStatus(handle.0, &mut status).map_err(failed)?;

            Ok(match status.dwCurrentState {
                SERVICE_RUNNING => ServiceState::Running,
                SERVICE_STOPPED => ServiceState::Stopped,
                _ => ServiceState::Unknown,
            })
        }
    }
}

/// `WM_TIMER` timers on the bar window
pub struct WindowTimers {
    handle: WindowHandle,
}

impl WindowTimers {
    pub fn new(handle: WindowHandle) -> Self {
        Self { handle }
    }
}

impl Scheduler for WindowTimers {
    fn schedule(&mut self, timer: TimerId, interval: Duration) {
        let millis = interval.as_millis().min(u32::MAX as u128) as u32;
        let id = unsafe { SetTimer(to_hwnd(self.handle), timer.0, millis, None) };
        if id == 0 {
            warn!("Failed to start timer {}", timer.0);
        }
    }

    fn cancel(&mut self, timer: TimerId) {
        unsafe {
            let _ = KillTimer(to_hwnd(self.handle), timer.0);
        }
    }
}

/// Starts programs, documents and shell locations through `ShellExecuteW`
#[derive(Default)]
pub struct ShellLauncher;

impl ShellLauncher {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessLauncher for ShellLauncher {
    fn start_process(&mut self, target: &str, args: Option<&str>) -> bool {
        let file = to_wide_string(target);
        let params = args.map(to_wide_string);
        let params = params.as_deref().map_or(PCWSTR::null(), to_pcwstr);

        let result = unsafe {
            ShellExecuteW(
                None,
                w!("open"),
                to_pcwstr(&file),
                params,
                PCWSTR::null(),
                SW_SHOWNORMAL,
            )
        };
        // Values above 32 mean success
        let ok = result.0 as isize > 32;
        if !ok {
            debug!("ShellExecuteW({}) returned {}", target, result.0 as isize);
        }
        ok
    }
}

thread_local! {
    static PENDING: RefCell<VecDeque<(String, String)>> = const { RefCell::new(VecDeque::new()) };
}

/// Queues a message box for the window procedure to show once the failing
/// action has returned
pub struct MessageBoxNotifier {
    handle: WindowHandle,
}

impl MessageBoxNotifier {
    pub fn new(handle: WindowHandle) -> Self {
        Self { handle }
    }
}

impl Notifier for MessageBoxNotifier {
    fn show_error(&mut self, title: &str, message: &str) {
        PENDING.with(|queue| {
            queue
                .borrow_mut()
                .push_back((title.to_string(), message.to_string()))
        });
        unsafe {
            let _ = PostMessageW(to_hwnd(self.handle), WM_MENUBAR_NOTIFY, WPARAM(0), LPARAM(0));
        }
    }
}

/// Show every queued message box
pub fn show_pending_notifications(hwnd: HWND) {
    while let Some((title, message)) = PENDING.with(|queue| queue.borrow_mut().pop_front()) {
        let title = to_wide_string(&title);
        let message = to_wide_string(&message);
        unsafe {
            let _ = MessageBoxW(hwnd, to_pcwstr(&message), to_pcwstr(&title), MB_OK | MB_ICONERROR);
        }
    }
}

/// OK/Cancel message box owned by the bar window
pub struct MessageBoxConfirmer {
    handle: WindowHandle,
}

impl MessageBoxConfirmer {
    pub fn new(handle: WindowHandle) -> Self {
        Self { handle }
    }
}

impl Confirmer for MessageBoxConfirmer {
    fn confirm(&mut self, prompt: &Confirmation) -> bool {
        let title = to_wide_string(prompt.title);
        let message = to_wide_string(prompt.message);
        let choice = unsafe {
            MessageBoxW(
                to_hwnd(self.handle),
                to_pcwstr(&message),
                to_pcwstr(&title),
                MB_OKCANCEL | MB_ICONWARNING,
            )
        };
        choice == IDOK
    }
}

/// Sleep through the power manager, everything else through `ExitWindowsEx`
#[derive(Default)]
pub struct Win32Session;

impl Win32Session {
    pub fn new() -> Self {
        Self
    }
}

impl SessionControl for Win32Session {
    fn request(&mut self, action: SessionAction) -> bool {
        let result = match action {
            SessionAction::Sleep => suspend(),
            SessionAction::LogOff => exit_windows(EWX_LOGOFF),
            SessionAction::Restart => {
                enable_shutdown_privilege().and_then(|_| exit_windows(EWX_REBOOT))
            }
            SessionAction::ShutDown => enable_shutdown_privilege()
                .and_then(|_| exit_windows(EWX_SHUTDOWN | EWX_POWEROFF)),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("{:?} failed: {}", action, e);
                false
            }
        }
    }
}

fn suspend() -> windows::core::Result<()> {
    if unsafe { SetSuspendState(BOOLEAN(0), BOOLEAN(0), BOOLEAN(0)) }.as_bool() {
        Ok(())
    } else {
        Err(windows::core::Error::from_win32())
    }
}

fn exit_windows(flags: EXIT_WINDOWS_FLAGS) -> windows::core::Result<()> {
    unsafe {
        ExitWindowsEx(
            flags,
            SHTDN_REASON_MAJOR_OTHER | SHTDN_REASON_MINOR_OTHER | SHTDN_REASON_FLAG_PLANNED,
        )
    }
}

/// Restart and shut down need SeShutdownPrivilege on the process token
fn enable_shutdown_privilege() -> windows::core::Result<()> {
    unsafe {
        let mut token = HANDLE::default();
        OpenProcessToken(GetCurrentProcess(), TOKEN_ADJUST_PRIVILEGES | TOKEN_QUERY, &mut token)?;

        let mut luid = LUID::default();
        let adjusted = LookupPrivilegeValueW(PCWSTR::null(), SE_SHUTDOWN_NAME, &mut luid)
            .and_then(|_| {
                let privileges = TOKEN_PRIVILEGES {
                    PrivilegeCount: 1,
                    Privileges: [LUID_AND_ATTRIBUTES {
                        Luid: luid,
                        Attributes: SE_PRIVILEGE_ENABLED,
                    }],
                };
                AdjustTokenPrivileges(token, BOOL(0), Some(&privileges), 0, None, None)
            });

        let _ = CloseHandle(token);
        adjusted
    }
}

/// Closes the bar window, which runs the normal closing sequence
pub struct WindowLifecycle {
    handle: WindowHandle,
}

impl WindowLifecycle {
    pub fn new(handle: WindowHandle) -> Self {
        Self { handle }
    }
}

impl LifecycleController for WindowLifecycle {
    fn request_shutdown(&mut self) {
        unsafe {
            if let Err(e) = PostMessageW(to_hwnd(self.handle), WM_CLOSE, WPARAM(0), LPARAM(0)) {
                warn!("Failed to request shutdown: {}", e);
            }
        }
    }
}
