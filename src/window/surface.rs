//! The bar's native window as seen by the shell components

use windows::Win32::Foundation::{HWND, RECT};
use windows::Win32::UI::HiDpi::GetDpiForWindow;
use windows::Win32::UI::WindowsAndMessaging::{
    GetWindowLongW, GetWindowRect, SetWindowPos, ShowWindow, GWL_EXSTYLE, HWND_BOTTOM,
    HWND_NOTOPMOST, HWND_TOP, HWND_TOPMOST, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE, SWP_NOZORDER,
    SW_HIDE, SW_SHOWNOACTIVATE, WS_EX_TOPMOST,
};

use crate::geometry::{DpiContext, Rect};
use crate::shell::{BarSurface, StackedWindow, WindowHandle, ZOrder};
use crate::utils::rect_from_win32;

use super::shell::to_hwnd;

pub struct Win32Surface {
    handle: WindowHandle,
}

impl Win32Surface {
    pub fn new(handle: WindowHandle) -> Self {
        Self { handle }
    }

    fn hwnd(&self) -> HWND {
        to_hwnd(self.handle)
    }

    fn dpi_context(&self) -> DpiContext {
        DpiContext::new(self.dpi())
    }

    fn insert_after(&self, after: HWND) {
        unsafe {
            let _ = SetWindowPos(
                self.hwnd(),
                after,
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
            );
        }
    }
}

impl StackedWindow for Win32Surface {
    fn is_topmost(&self) -> bool {
        let ex_style = unsafe { GetWindowLongW(self.hwnd(), GWL_EXSTYLE) } as u32;
        ex_style & WS_EX_TOPMOST.0 != 0
    }

    fn set_topmost(&mut self, topmost: bool) {
        self.insert_after(if topmost { HWND_TOPMOST } else { HWND_NOTOPMOST });
    }

    fn place(&mut self, order: ZOrder) {
        let after = match order {
            ZOrder::TopMost => HWND_TOPMOST,
            ZOrder::Top => HWND_TOP,
            ZOrder::Bottom => HWND_BOTTOM,
        };
        self.insert_after(after);
    }
}

impl BarSurface for Win32Surface {
    fn handle(&self) -> WindowHandle {
        self.handle
    }

    fn dpi(&self) -> u32 {
        unsafe { GetDpiForWindow(self.hwnd()) }
    }

    fn bounds(&self) -> Rect {
        let mut rect = RECT::default();
        if unsafe { GetWindowRect(self.hwnd(), &mut rect) }.is_err() {
            return Rect::default();
        }
        self.dpi_context().rect_to_logical(&rect_from_win32(&rect))
    }

    fn set_bounds(&mut self, bounds: Rect) {
        let device = self.dpi_context().rect_to_device(&bounds);
        unsafe {
            let _ = SetWindowPos(
                self.hwnd(),
                HWND::default(),
                device.x,
                device.y,
                device.width,
                device.height,
                SWP_NOZORDER | SWP_NOACTIVATE,
            );
        }
    }

    fn set_visible(&mut self, visible: bool) {
        unsafe {
            let _ = ShowWindow(self.hwnd(), if visible { SW_SHOWNOACTIVATE } else { SW_HIDE });
        }
    }
}
