//! Window procedure for handling Windows messages
//!
//! Shell messages go through the bar's dispatcher; the rest are the bar's own
//! lifecycle, timers, painting and mouse input.

use log::{debug, info};
use windows::Win32::Foundation::{COLORREF, HWND, LPARAM, LRESULT, POINT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BeginPaint, ClientToScreen, DrawTextW, EndPaint, FillRect, GetSysColorBrush, InvalidateRect,
    SetBkMode, SetTextColor, COLOR_MENU, DT_RIGHT, DT_SINGLELINE, DT_VCENTER, PAINTSTRUCT,
    TRANSPARENT,
};
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::actions::BarAction;
use crate::service::TimerId;
use crate::shell::dispatch::{BusyRoute, WM_ACTIVATE, WM_DISPLAYCHANGE, WM_WINDOWPOSCHANGED};
use crate::shell::{MessageDispatcher, MessageId, RawMessage, ShellAppBar, WindowHandle};

use super::menus::show_context_menu;
use super::services::show_pending_notifications;
use super::shell::Win32AppBar;
use super::state::{appbar_message, defer, is_busy, set_appbar_message, with_bar};

/// Custom window messages
pub const WM_MENUBAR_TRAY: u32 = WM_USER + 3;
pub const WM_MENUBAR_NOTIFY: u32 = WM_USER + 4;

/// Right padding of the clock text, in device pixels
const CLOCK_PADDING: i32 = 10;

/// Window procedure for handling Windows messages
pub unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if appbar_message() == Some(msg)
        || matches!(msg, WM_ACTIVATE | WM_WINDOWPOSCHANGED | WM_DISPLAYCHANGE)
    {
        return dispatch_shell_message(hwnd, msg, wparam, lparam);
    }

    match msg {
        WM_CREATE => {
            debug!("Window created");
            LRESULT(0)
        }

        WM_PAINT => {
            paint_clock(hwnd);
            LRESULT(0)
        }

        WM_TIMER => {
            if with_bar(|bar| bar.on_timer(TimerId(wparam.0))) == Some(true) {
                let _ = InvalidateRect(hwnd, None, false);
            }
            LRESULT(0)
        }

        WM_MOVE => {
            with_bar(|bar| bar.on_location_changed());
            LRESULT(0)
        }

        WM_LBUTTONUP => {
            with_bar(|bar| bar.perform(&BarAction::OpenDateTime));
            LRESULT(0)
        }

        WM_RBUTTONUP => {
            let x = (lparam.0 & 0xFFFF) as i16 as i32;
            let y = ((lparam.0 >> 16) & 0xFFFF) as i16 as i32;

            let mut pt = POINT { x, y };
            let _ = ClientToScreen(hwnd, &mut pt);
            show_context_menu(hwnd, pt.x, pt.y);
            LRESULT(0)
        }

        WM_MENUBAR_TRAY => {
            let event = (lparam.0 & 0xFFFF) as u32;
            if event == WM_RBUTTONUP || event == WM_CONTEXTMENU {
                let mut pt = POINT::default();
                let _ = GetCursorPos(&mut pt);
                show_context_menu(hwnd, pt.x, pt.y);
            }
            LRESULT(0)
        }

        WM_MENUBAR_NOTIFY => {
            show_pending_notifications(hwnd);
            LRESULT(0)
        }

        WM_CLOSE => {
            with_bar(|bar| bar.on_closing());
            // Unregistered now; stop forwarding position changes to the shell
            set_appbar_message(None);
            DestroyWindow(hwnd).ok();
            LRESULT(0)
        }

        WM_DESTROY => {
            info!("Window destroyed, quitting application");
            PostQuitMessage(0);
            LRESULT(0)
        }

        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

unsafe fn dispatch_shell_message(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    let raw = RawMessage::new(msg, wparam.0, lparam.0);
    match with_bar(|bar| bar.handle_message(raw)) {
        Some(true) => LRESULT(0),
        Some(false) => DefWindowProcW(hwnd, msg, wparam, lparam),
        None if is_busy() => {
            let registered = appbar_message().map(MessageId);
            let handle = WindowHandle(hwnd.0 as isize);
            match MessageDispatcher::new().route_while_busy(msg, registered) {
                BusyRoute::Defer => {
                    // Arrived re-entrantly from inside a handler; handle it once that returns
                    debug!("Deferring AppBar notification {}", wparam.0);
                    defer(raw);
                    LRESULT(0)
                }
                BusyRoute::Activate => {
                    Win32AppBar::new().activate(handle);
                    DefWindowProcW(hwnd, msg, wparam, lparam)
                }
                BusyRoute::WindowPosChanged => {
                    Win32AppBar::new().window_pos_changed(handle);
                    DefWindowProcW(hwnd, msg, wparam, lparam)
                }
                BusyRoute::Default => DefWindowProcW(hwnd, msg, wparam, lparam),
            }
        }
        None => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

unsafe fn paint_clock(hwnd: HWND) {
    let text = with_bar(|bar| bar.clock_text().text.clone()).unwrap_or_default();

    let mut ps = PAINTSTRUCT::default();
    let hdc = BeginPaint(hwnd, &mut ps);

    let mut client = RECT::default();
    let _ = GetClientRect(hwnd, &mut client);
    FillRect(hdc, &client, GetSysColorBrush(COLOR_MENU));

    SetBkMode(hdc, TRANSPARENT);
    SetTextColor(hdc, COLORREF(0x0000_0000));
    client.right -= CLOCK_PADDING;
    let mut wide: Vec<u16> = text.encode_utf16().collect();
    DrawTextW(hdc, &mut wide, &mut client, DT_RIGHT | DT_VCENTER | DT_SINGLELINE);

    let _ = EndPaint(hwnd, &ps);
}
