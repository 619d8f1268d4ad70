//! Context menu for the bar and its tray icon

use log::debug;
use windows::core::PCWSTR;
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::actions::{BarAction, Place, SessionAction};

use super::state::with_bar;

/// Helper to display a popup menu and return the selected command ID (or 0 if none)
pub fn show_popup_menu(hwnd: HWND, x: i32, y: i32, build_menu: impl FnOnce(HMENU)) -> u32 {
    unsafe {
        let menu = CreatePopupMenu().unwrap_or_default();
        if menu.is_invalid() {
            return 0;
        }

        build_menu(menu);

        let _ = SetForegroundWindow(hwnd);
        let cmd = TrackPopupMenu(
            menu,
            TPM_RIGHTBUTTON | TPM_LEFTALIGN | TPM_TOPALIGN | TPM_RETURNCMD,
            x,
            y,
            0,
            hwnd,
            None,
        );
        DestroyMenu(menu).ok();
        cmd.0 as u32
    }
}

/// Show the bar menu at screen coordinates and run the chosen action
pub fn show_context_menu(hwnd: HWND, x: i32, y: i32) {
    // The menu runs a modal loop, so read what it needs and let go of the bar first
    let (date, search_ready) =
        with_bar(|bar| (bar.clock_text().tooltip.clone(), bar.search_available()))
            .unwrap_or_default();

    let cmd = show_popup_menu(hwnd, x, y, |menu| unsafe {
        append_item(menu, MF_STRING | MF_GRAYED, 0, &date);
        append_separator(menu);

        if let Ok(places) = CreatePopupMenu() {
            for place in Place::ALL {
                append_action(places, &BarAction::OpenPlace(place), place.label());
            }
            append_item(menu, MF_POPUP, places.0 as usize, "Places");
        }
        let search_flags = if search_ready { MF_STRING } else { MF_STRING | MF_GRAYED };
        if let Some(id) = BarAction::Search(String::new()).command_id() {
            append_item(menu, search_flags, id as usize, "Search...");
        }
        append_separator(menu);

        append_action(menu, &BarAction::OpenControlPanel, "Control Panel");
        append_action(menu, &BarAction::OpenTaskManager, "Task Manager");
        append_action(menu, &BarAction::OpenDateTime, "Date and Time Settings");
        append_action(menu, &BarAction::OpenRunDialog, "Run...");
        append_separator(menu);

        for session in SessionAction::ALL {
            append_action(menu, &BarAction::Session(session), session.label());
        }
        append_separator(menu);
        append_action(menu, &BarAction::ExitShell, "Exit MenuBar");
    });

    match BarAction::from_command(cmd) {
        Some(action) => {
            with_bar(|bar| bar.perform(&action));
        }
        None if cmd != 0 => debug!("Unknown menu command {}", cmd),
        None => {}
    }
}

fn append_action(menu: HMENU, action: &BarAction, text: &str) {
    if let Some(id) = action.command_id() {
        append_item(menu, MF_STRING, id as usize, text);
    }
}

fn append_item(menu: HMENU, flags: MENU_ITEM_FLAGS, id: usize, text: &str) {
    unsafe {
        let wide: Vec<u16> = text.encode_utf16().chain(std::iter::once(0)).collect();
        AppendMenuW(menu, flags, id, PCWSTR(wide.as_ptr())).ok();
    }
}

fn append_separator(menu: HMENU) {
    unsafe {
        AppendMenuW(menu, MF_SEPARATOR, 0, PCWSTR::null()).ok();
    }
}
