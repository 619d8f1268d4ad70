//! Recording fakes for the shell, window and service traits

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use crate::actions::{
    Confirmation, Confirmer, LifecycleController, Notifier, ProcessLauncher, SessionAction,
    SessionControl,
};
use crate::error::{BarError, BarResult};
use crate::geometry::{Rect, Size};
use crate::service::{Scheduler, ServiceQuery, ServiceState, TimerId};
use crate::shell::{
    BarSurface, CompanionWindow, Edge, MessageId, ShellAppBar, StackedWindow, WindowHandle, ZOrder,
};
use crate::tray::TraySubsystem;

/// Shared, ordered record of everything the fakes were asked to do
#[derive(Clone, Default)]
pub struct EventLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Number of entries matching `pattern`.
    ///
    /// An entry matches when it equals the pattern, continues it after a
    /// space, or when the pattern ends in `.` and prefixes it.
    pub fn count(&self, pattern: &str) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|entry| matches(entry, pattern))
            .count()
    }

    /// Index of the first entry matching `pattern`
    pub fn position(&self, pattern: &str) -> Option<usize> {
        self.entries
            .lock()
            .iter()
            .position(|entry| matches(entry, pattern))
    }
}

fn matches(entry: &str, pattern: &str) -> bool {
    if pattern.ends_with('.') {
        return entry.starts_with(pattern);
    }
    entry == pattern
        || entry
            .strip_prefix(pattern)
            .is_some_and(|rest| rest.starts_with(' '))
}

/// In-memory docked-bar protocol
pub struct FakeShell {
    log: EventLog,
    refuse_registration: bool,
    refuse_position: bool,
    granted_width: Option<i32>,
}

impl FakeShell {
    pub const MESSAGE_ID: MessageId = MessageId(0xC0DE);

    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            refuse_registration: false,
            refuse_position: false,
            granted_width: None,
        }
    }

    pub fn refusing_registration(mut self) -> Self {
        self.refuse_registration = true;
        self
    }

    pub fn refusing_position(mut self) -> Self {
        self.refuse_position = true;
        self
    }

    /// Grant this width instead of the requested one
    pub fn granting_width(mut self, width: i32) -> Self {
        self.granted_width = Some(width);
        self
    }
}

impl ShellAppBar for FakeShell {
    fn register(&mut self, _handle: WindowHandle, _edge: Edge) -> BarResult<MessageId> {
        self.log.push("shell.register");
        if self.refuse_registration {
            return Err(BarError::Registration("shell unavailable".into()));
        }
        Ok(Self::MESSAGE_ID)
    }

    fn unregister(&mut self, _handle: WindowHandle) -> BarResult<()> {
        self.log.push("shell.unregister");
        Ok(())
    }

    fn set_position(&mut self, _handle: WindowHandle, size: Size, edge: Edge) -> BarResult<Rect> {
        self.log
            .push(format!("shell.set_position {}x{} {:?}", size.width, size.height, edge));
        if self.refuse_position {
            return Err(BarError::Registration("position refused".into()));
        }
        let width = self.granted_width.unwrap_or(size.width);
        Ok(Rect::new(0, 0, width, size.height))
    }

    fn reset_work_area(&mut self) -> BarResult<()> {
        self.log.push("shell.reset_work_area");
        Ok(())
    }

    fn activate(&mut self, _handle: WindowHandle) {
        self.log.push("shell.activate");
    }

    fn window_pos_changed(&mut self, _handle: WindowHandle) {
        self.log.push("shell.window_pos_changed");
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SurfaceState {
    pub bounds: Rect,
    pub dpi: u32,
    pub visible: bool,
    pub topmost: bool,
}

/// Bar window whose state can still be inspected after it was boxed
pub struct FakeSurface {
    log: EventLog,
    state: Arc<Mutex<SurfaceState>>,
}

impl FakeSurface {
    pub fn new(log: EventLog, bounds: Rect, dpi: u32) -> Self {
        Self {
            log,
            state: Arc::new(Mutex::new(SurfaceState {
                bounds,
                dpi,
                visible: true,
                topmost: true,
            })),
        }
    }

    /// Handle onto the surface state that outlives moving the surface
    pub fn state_handle(&self) -> Arc<Mutex<SurfaceState>> {
        self.state.clone()
    }
}

impl StackedWindow for FakeSurface {
    fn is_topmost(&self) -> bool {
        self.state.lock().topmost
    }

    fn set_topmost(&mut self, topmost: bool) {
        self.log.push(format!("bar.set_topmost {}", topmost));
        self.state.lock().topmost = topmost;
    }

    fn place(&mut self, order: ZOrder) {
        self.log.push(format!("bar.place {:?}", order));
    }
}

impl BarSurface for FakeSurface {
    fn handle(&self) -> WindowHandle {
        WindowHandle(0x42)
    }

    fn dpi(&self) -> u32 {
        self.state.lock().dpi
    }

    fn bounds(&self) -> Rect {
        self.state.lock().bounds
    }

    fn set_bounds(&mut self, bounds: Rect) {
        self.log.push(format!(
            "bar.set_bounds {},{},{},{}",
            bounds.x, bounds.y, bounds.width, bounds.height
        ));
        self.state.lock().bounds = bounds;
    }

    fn set_visible(&mut self, visible: bool) {
        self.log.push(format!("bar.set_visible {}", visible));
        self.state.lock().visible = visible;
    }
}

/// Shadow-like companion that remembers where it was last put
pub struct FakeCompanion {
    name: &'static str,
    log: EventLog,
    last_position: Option<Rect>,
}

impl FakeCompanion {
    pub fn new(name: &'static str, log: EventLog) -> Self {
        Self {
            name,
            log,
            last_position: None,
        }
    }

    pub fn last_position(&self) -> Option<Rect> {
        self.last_position
    }
}

impl CompanionWindow for FakeCompanion {
    fn set_position(&mut self, bar: &Rect) {
        self.log.push(format!(
            "{}.set_position {},{},{},{}",
            self.name, bar.x, bar.y, bar.width, bar.height
        ));
        self.last_position = Some(*bar);
    }
}

/// Taskbar companion with an always-on-top flag
pub struct FakeTaskbar {
    log: EventLog,
    topmost: bool,
}

impl FakeTaskbar {
    pub fn new(log: EventLog) -> Self {
        Self { log, topmost: true }
    }
}

impl CompanionWindow for FakeTaskbar {
    fn set_position(&mut self, _bar: &Rect) {
        self.log.push("taskbar.set_position");
    }
}

impl StackedWindow for FakeTaskbar {
    fn is_topmost(&self) -> bool {
        self.topmost
    }

    fn set_topmost(&mut self, topmost: bool) {
        self.log.push(format!("taskbar.set_topmost {}", topmost));
        self.topmost = topmost;
    }

    fn place(&mut self, order: ZOrder) {
        self.log.push(format!("taskbar.place {:?}", order));
    }
}

/// Service status query answering from a script, then repeating the last answer
pub struct ScriptedService {
    log: EventLog,
    script: VecDeque<ServiceState>,
    last: ServiceState,
}

impl ScriptedService {
    pub fn new(log: EventLog, script: &[ServiceState]) -> Self {
        Self {
            log,
            script: script.iter().copied().collect(),
            last: ServiceState::Unknown,
        }
    }
}

impl ServiceQuery for ScriptedService {
    fn query_status(&mut self, service: &str) -> BarResult<ServiceState> {
        self.log.push(format!("service.query {}", service));
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        Ok(self.last)
    }
}

/// Service query that always fails
pub struct BrokenService;

impl ServiceQuery for BrokenService {
    fn query_status(&mut self, service: &str) -> BarResult<ServiceState> {
        Err(BarError::ServiceQuery {
            service: service.to_string(),
            reason: "access denied".into(),
        })
    }
}

pub struct FakeScheduler {
    log: EventLog,
}

impl FakeScheduler {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl Scheduler for FakeScheduler {
    fn schedule(&mut self, timer: TimerId, interval: Duration) {
        self.log
            .push(format!("timer.schedule {} {}ms", timer.0, interval.as_millis()));
    }

    fn cancel(&mut self, timer: TimerId) {
        self.log.push(format!("timer.cancel {}", timer.0));
    }
}

pub struct FakeTray {
    log: EventLog,
    fail: bool,
}

impl FakeTray {
    pub fn new(log: EventLog) -> Self {
        Self { log, fail: false }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl TraySubsystem for FakeTray {
    fn initialize(&mut self) -> BarResult<()> {
        self.log.push("tray.initialize");
        if self.fail {
            return Err(BarError::TrayIcon("notification area unavailable".into()));
        }
        Ok(())
    }

    fn destroy(&mut self) {
        self.log.push("tray.destroy");
    }
}

pub struct FakeLauncher {
    log: EventLog,
    succeed: bool,
}

impl FakeLauncher {
    pub fn new(log: EventLog) -> Self {
        Self { log, succeed: true }
    }

    pub fn failing(mut self) -> Self {
        self.succeed = false;
        self
    }
}

impl ProcessLauncher for FakeLauncher {
    fn start_process(&mut self, target: &str, args: Option<&str>) -> bool {
        match args {
            Some(args) => self.log.push(format!("launch {} {}", target, args)),
            None => self.log.push(format!("launch {}", target)),
        }
        self.succeed
    }
}

pub struct FakeNotifier {
    log: EventLog,
}

impl FakeNotifier {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl Notifier for FakeNotifier {
    fn show_error(&mut self, title: &str, _message: &str) {
        self.log.push(format!("notify {}", title));
    }
}

pub struct FakeConfirmer {
    log: EventLog,
    accept: bool,
}

impl FakeConfirmer {
    pub fn new(log: EventLog) -> Self {
        Self { log, accept: true }
    }

    pub fn declining(mut self) -> Self {
        self.accept = false;
        self
    }
}

impl Confirmer for FakeConfirmer {
    fn confirm(&mut self, prompt: &Confirmation) -> bool {
        self.log.push(format!("confirm {}", prompt.title));
        self.accept
    }
}

pub struct FakeSession {
    log: EventLog,
    accept: bool,
}

impl FakeSession {
    pub fn new(log: EventLog) -> Self {
        Self { log, accept: true }
    }

    pub fn refusing(mut self) -> Self {
        self.accept = false;
        self
    }
}

impl SessionControl for FakeSession {
    fn request(&mut self, action: SessionAction) -> bool {
        self.log.push(format!("session {:?}", action));
        self.accept
    }
}

pub struct FakeLifecycle {
    log: EventLog,
}

impl FakeLifecycle {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl LifecycleController for FakeLifecycle {
    fn request_shutdown(&mut self) {
        self.log.push("lifecycle.shutdown");
    }
}
