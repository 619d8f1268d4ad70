//! Actions offered by the bar
//!
//! Every "open X" entry and every session command ends up here. Launch
//! failures are reported to the user once and never propagate.

use log::{debug, info, warn};
use std::path::PathBuf;

/// Starts external programs and documents
pub trait ProcessLauncher {
    /// Fire-and-forget launch; returns whether the OS accepted it
    fn start_process(&mut self, target: &str, args: Option<&str>) -> bool;
}

/// Shows one-shot messages to the user
pub trait Notifier {
    fn show_error(&mut self, title: &str, message: &str);
}

/// Asks the user before a disruptive action goes ahead
pub trait Confirmer {
    /// Returns true when the user accepted
    fn confirm(&mut self, prompt: &Confirmation) -> bool;
}

/// Suspends or ends the user's session
pub trait SessionControl {
    /// Returns whether the OS accepted the request
    fn request(&mut self, action: SessionAction) -> bool;
}

/// Ends the bar's process in an orderly way
pub trait LifecycleController {
    fn request_shutdown(&mut self);
}

const MY_COMPUTER: &str = "::{20D04FE0-3AEA-1069-A2D8-08002B30309D}";
const RECYCLE_BIN: &str = "::{645FF040-5081-101B-9F08-00AA002F954E}";

/// rundll32 entry point of the shell's Run dialog
const RUN_DIALOG: &str = "shell32.dll,#61";

const LAUNCH_FAILED: &str = "Oops!";

/// Folders reachable from the Places menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Place {
    Documents,
    Pictures,
    Music,
    Downloads,
    Computer,
    UserProfile,
    ProgramFiles,
    RecycleBin,
}

impl Place {
    pub const ALL: [Place; 8] = [
        Place::Documents,
        Place::Pictures,
        Place::Music,
        Place::Downloads,
        Place::Computer,
        Place::UserProfile,
        Place::ProgramFiles,
        Place::RecycleBin,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Place::Documents => "Documents",
            Place::Pictures => "Pictures",
            Place::Music => "Music",
            Place::Downloads => "Downloads",
            Place::Computer => "Computer",
            Place::UserProfile => "User Folder",
            Place::ProgramFiles => "Program Files",
            Place::RecycleBin => "Recycle Bin",
        }
    }

    /// Argument handed to the file manager
    pub fn target(self) -> Option<String> {
        let path: Option<PathBuf> = match self {
            Place::Documents => dirs::document_dir(),
            Place::Pictures => dirs::picture_dir(),
            Place::Music => dirs::audio_dir(),
            Place::Downloads => dirs::download_dir(),
            Place::UserProfile => dirs::home_dir(),
            Place::ProgramFiles => std::env::var_os("ProgramFiles").map(PathBuf::from),
            Place::Computer => return Some(MY_COMPUTER.to_string()),
            Place::RecycleBin => return Some(RECYCLE_BIN.to_string()),
        };
        path.map(|p| p.to_string_lossy().into_owned())
    }
}

/// Session commands of the bar menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Sleep,
    LogOff,
    Restart,
    ShutDown,
}

impl SessionAction {
    pub const ALL: [SessionAction; 4] = [
        SessionAction::Sleep,
        SessionAction::LogOff,
        SessionAction::Restart,
        SessionAction::ShutDown,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SessionAction::Sleep => "Sleep",
            SessionAction::LogOff => "Log Off...",
            SessionAction::Restart => "Restart...",
            SessionAction::ShutDown => "Shut Down...",
        }
    }

    fn failure(self) -> &'static str {
        match self {
            SessionAction::Sleep => "The computer could not be put to sleep.",
            SessionAction::LogOff => "You could not be logged off.",
            SessionAction::Restart => "The computer could not be restarted.",
            SessionAction::ShutDown => "The computer could not be shut down.",
        }
    }
}

/// Text of a confirmation prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub title: &'static str,
    pub message: &'static str,
}

/// Something the user asked the bar to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BarAction {
    OpenControlPanel,
    OpenTaskManager,
    OpenDateTime,
    OpenRunDialog,
    OpenPlace(Place),
    /// Shell search; an empty query opens the search window
    Search(String),
    Session(SessionAction),
    ExitShell,
}

impl BarAction {
    /// Context-menu command id for the actions the menu offers
    pub fn command_id(&self) -> Option<u32> {
        let id = match self {
            BarAction::OpenControlPanel => 100,
            BarAction::OpenTaskManager => 101,
            BarAction::OpenDateTime => 102,
            BarAction::OpenRunDialog => 103,
            BarAction::Search(query) if query.is_empty() => 104,
            BarAction::Search(_) => return None,
            BarAction::Session(session) => {
                110 + SessionAction::ALL.iter().position(|s| s == session)? as u32
            }
            BarAction::ExitShell => 199,
            BarAction::OpenPlace(place) => {
                200 + Place::ALL.iter().position(|p| p == place)? as u32
            }
        };
        Some(id)
    }

    /// Inverse of [`BarAction::command_id`]
    pub fn from_command(id: u32) -> Option<Self> {
        match id {
            100 => Some(BarAction::OpenControlPanel),
            101 => Some(BarAction::OpenTaskManager),
            102 => Some(BarAction::OpenDateTime),
            103 => Some(BarAction::OpenRunDialog),
            104 => Some(BarAction::Search(String::new())),
            110..=119 => SessionAction::ALL
                .get((id - 110) as usize)
                .map(|session| BarAction::Session(*session)),
            199 => Some(BarAction::ExitShell),
            200..=299 => Place::ALL
                .get((id - 200) as usize)
                .map(|place| BarAction::OpenPlace(*place)),
            _ => None,
        }
    }

    /// Prompt the user has to accept before the action runs
    pub fn confirmation(&self) -> Option<Confirmation> {
        let (title, message) = match self {
            BarAction::Session(SessionAction::LogOff) => (
                "Are you sure you want to log off now?",
                "You will lose all unsaved documents and be logged off.",
            ),
            BarAction::Session(SessionAction::Restart) => (
                "Are you sure you want to restart now?",
                "You will lose all unsaved documents and your computer will restart.",
            ),
            BarAction::Session(SessionAction::ShutDown) => (
                "Are you sure you want to shut down now?",
                "You will lose all unsaved documents and your computer will turn off.",
            ),
            BarAction::ExitShell => (
                "Are you sure you want to exit MenuBar?",
                "You will need to start MenuBar again to get the bar back.",
            ),
            _ => return None,
        };
        Some(Confirmation { title, message })
    }
}

/// Collaborators an action needs
pub struct ActionContext<'a> {
    pub launcher: &'a mut dyn ProcessLauncher,
    pub notifier: &'a mut dyn Notifier,
    pub confirmer: &'a mut dyn Confirmer,
    pub session: &'a mut dyn SessionControl,
    pub lifecycle: &'a mut dyn LifecycleController,
    pub file_manager: &'a str,
}

/// Carry out `action`. Returns whether it went through.
pub fn perform(action: &BarAction, ctx: &mut ActionContext<'_>) -> bool {
    if let Some(prompt) = action.confirmation() {
        if !ctx.confirmer.confirm(&prompt) {
            debug!("{:?} cancelled by the user", action);
            return false;
        }
    }

    info!("Performing action {:?}", action);
    match action {
        BarAction::OpenControlPanel => launch(ctx, "control.exe", None),
        BarAction::OpenTaskManager => launch(ctx, "taskmgr.exe", None),
        BarAction::OpenDateTime => launch(ctx, "timedate.cpl", None),
        BarAction::OpenRunDialog => launch(ctx, "rundll32.exe", Some(RUN_DIALOG)),
        BarAction::OpenPlace(place) => match place.target() {
            Some(target) => {
                let file_manager = ctx.file_manager;
                launch(ctx, file_manager, Some(&target))
            }
            None => {
                warn!("No folder known for {:?}", place);
                false
            }
        },
        BarAction::Search(query) => launch(ctx, &format!("search:query={}", query), None),
        BarAction::Session(session) => {
            if ctx.session.request(*session) {
                return true;
            }
            warn!("{:?} was refused", session);
            ctx.notifier.show_error(LAUNCH_FAILED, session.failure());
            false
        }
        BarAction::ExitShell => {
            ctx.lifecycle.request_shutdown();
            true
        }
    }
}

fn launch(ctx: &mut ActionContext<'_>, target: &str, args: Option<&str>) -> bool {
    if ctx.launcher.start_process(target, args) {
        return true;
    }
    warn!("Failed to launch {}", target);
    let message = format!("{} could not be started.", target);
    ctx.notifier.show_error(LAUNCH_FAILED, &message);
    false
}
