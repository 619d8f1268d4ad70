//! Drop shadow under the bar
//!
//! A click-through, semi-transparent strip that follows the bar's bottom edge.

use anyhow::Result;
use log::debug;
use windows::Win32::Foundation::{COLORREF, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::Graphics::Gdi::{GetStockObject, BLACK_BRUSH, HBRUSH};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::HiDpi::GetDpiForWindow;
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::error::BarError;
use crate::geometry::{DpiContext, Rect};
use crate::shell::{CompanionWindow, WindowHandle};
use crate::utils::{to_pcwstr, to_wide_string};

use super::shell::to_hwnd;

const SHADOW_CLASS: &str = "MenuBarShadowClass";

/// Shadow depth in logical units
const SHADOW_DEPTH: i32 = 4;
const SHADOW_ALPHA: u8 = 60;

unsafe extern "system" fn shadow_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        // Clicks fall through to whatever is underneath
        WM_NCHITTEST => LRESULT(HTTRANSPARENT as isize),
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

pub struct ShadowWindow {
    handle: WindowHandle,
    bar: WindowHandle,
}

impl ShadowWindow {
    /// Create the shadow for the bar window `bar`
    pub fn create(bar: WindowHandle) -> Result<Self> {
        let class_name = to_wide_string(SHADOW_CLASS);

        unsafe {
            let hinstance = GetModuleHandleW(None)?;

            let wc = WNDCLASSEXW {
                cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
                lpfnWndProc: Some(shadow_proc),
                hInstance: hinstance.into(),
                lpszClassName: to_pcwstr(&class_name),
                hbrBackground: HBRUSH(GetStockObject(BLACK_BRUSH).0),
                ..Default::default()
            };
            if RegisterClassExW(&wc) == 0 {
                return Err(BarError::WindowCreation("shadow window class".into()).into());
            }

            let ex_style = WS_EX_TOPMOST
                | WS_EX_TOOLWINDOW
                | WS_EX_LAYERED
                | WS_EX_TRANSPARENT
                | WS_EX_NOACTIVATE;
            let hwnd = CreateWindowExW(
                ex_style,
                to_pcwstr(&class_name),
                to_pcwstr(&class_name),
                WS_POPUP,
                0,
                0,
                0,
                0,
                None,
                None,
                hinstance,
                None,
            )?;

            SetLayeredWindowAttributes(hwnd, COLORREF(0), SHADOW_ALPHA, LWA_ALPHA)?;

            Ok(Self {
                handle: WindowHandle(hwnd.0 as isize),
                bar,
            })
        }
    }
}

impl CompanionWindow for ShadowWindow {
    fn set_position(&mut self, bar: &Rect) {
        let dpi = DpiContext::new(unsafe { GetDpiForWindow(to_hwnd(self.bar)) });
        let strip = dpi.rect_to_device(&Rect::new(bar.x, bar.bottom(), bar.width, SHADOW_DEPTH));
        debug!("Moving shadow to {:?}", strip);

        // A collapsed bar takes its shadow with it
        let flags = if bar.height > 0 {
            SWP_NOACTIVATE | SWP_SHOWWINDOW
        } else {
            SWP_NOACTIVATE | SWP_HIDEWINDOW
        };
        unsafe {
            let _ = SetWindowPos(
                to_hwnd(self.handle),
                HWND_TOPMOST,
                strip.x,
                strip.y,
                strip.width,
                strip.height,
                flags,
            );
        }
    }
}

impl Drop for ShadowWindow {
    fn drop(&mut self) {
        unsafe {
            let _ = DestroyWindow(to_hwnd(self.handle));
        }
    }
}
