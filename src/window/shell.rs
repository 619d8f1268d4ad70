//! AppBar protocol on top of `SHAppBarMessage`

use log::debug;
use std::ffi::c_void;
use windows::core::w;
use windows::Win32::Foundation::{HWND, LPARAM, RECT};
use windows::Win32::UI::Shell::{
    SHAppBarMessage, ABM_ACTIVATE, ABM_NEW, ABM_QUERYPOS, ABM_REMOVE, ABM_SETPOS,
    ABM_WINDOWPOSCHANGED, APPBARDATA,
};
use windows::Win32::UI::WindowsAndMessaging::{
    RegisterWindowMessageW, SystemParametersInfoW, SPIF_SENDWININICHANGE, SPIF_UPDATEINIFILE,
    SPI_SETWORKAREA,
};

use crate::error::{BarError, BarResult};
use crate::geometry::{Rect, Size};
use crate::shell::{Edge, MessageId, ShellAppBar, WindowHandle};
use crate::utils::{get_screen_size, rect_from_win32, rect_to_win32};

pub fn to_hwnd(handle: WindowHandle) -> HWND {
    HWND(handle.0 as *mut c_void)
}

fn appbar_data(handle: WindowHandle) -> APPBARDATA {
    APPBARDATA {
        cbSize: std::mem::size_of::<APPBARDATA>() as u32,
        hWnd: to_hwnd(handle),
        uCallbackMessage: 0,
        uEdge: 0,
        rc: RECT::default(),
        lParam: LPARAM(0),
    }
}

/// The real shell, reached through `SHAppBarMessage`
#[derive(Default)]
pub struct Win32AppBar;

impl Win32AppBar {
    pub fn new() -> Self {
        Self
    }
}

impl ShellAppBar for Win32AppBar {
    fn register(&mut self, handle: WindowHandle, edge: Edge) -> BarResult<MessageId> {
        let id = unsafe { RegisterWindowMessageW(w!("AppBarMessage")) };
        if id == 0 {
            return Err(BarError::Registration(
                "could not allocate the AppBar callback message".into(),
            ));
        }

        let mut abd = appbar_data(handle);
        abd.uCallbackMessage = id;
        abd.uEdge = edge.code();

        let accepted = unsafe { SHAppBarMessage(ABM_NEW, &mut abd) };
        if accepted == 0 {
            return Err(BarError::Registration("shell refused ABM_NEW".into()));
        }
        Ok(MessageId(id))
    }

    fn unregister(&mut self, handle: WindowHandle) -> BarResult<()> {
        let mut abd = appbar_data(handle);
        unsafe {
            SHAppBarMessage(ABM_REMOVE, &mut abd);
        }
        Ok(())
    }

    fn set_position(&mut self, handle: WindowHandle, size: Size, edge: Edge) -> BarResult<Rect> {
        let screen = get_screen_size();
        let mut abd = appbar_data(handle);
        abd.uEdge = edge.code();
        abd.rc = rect_to_win32(&edge.requested_rect(size, screen));

        unsafe {
            SHAppBarMessage(ABM_QUERYPOS, &mut abd);
        }

        // The shell may have moved the docked edge; keep our thickness from there
        match edge {
            Edge::Top => abd.rc.bottom = abd.rc.top + size.height,
            Edge::Bottom => abd.rc.top = abd.rc.bottom - size.height,
            Edge::Left => abd.rc.right = abd.rc.left + size.width,
            Edge::Right => abd.rc.left = abd.rc.right - size.width,
        }

        unsafe {
            SHAppBarMessage(ABM_SETPOS, &mut abd);
        }

        let granted = rect_from_win32(&abd.rc);
        debug!("Shell granted AppBar rect {:?}", granted);
        Ok(granted)
    }

    fn reset_work_area(&mut self) -> BarResult<()> {
        let screen = get_screen_size();
        let mut rect = RECT {
            left: 0,
            top: 0,
            right: screen.width,
            bottom: screen.height,
        };
        unsafe {
            SystemParametersInfoW(
                SPI_SETWORKAREA,
                0,
                Some(&mut rect as *mut _ as *mut _),
                SPIF_UPDATEINIFILE | SPIF_SENDWININICHANGE,
            )?;
        }
        Ok(())
    }

    fn activate(&mut self, handle: WindowHandle) {
        let mut abd = appbar_data(handle);
        unsafe {
            SHAppBarMessage(ABM_ACTIVATE, &mut abd);
        }
    }

    fn window_pos_changed(&mut self, handle: WindowHandle) {
        let mut abd = appbar_data(handle);
        unsafe {
            SHAppBarMessage(ABM_WINDOWPOSCHANGED, &mut abd);
        }
    }
}
