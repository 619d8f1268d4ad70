//! The bar itself
//!
//! `Bar` wires the shell components, the tray, the search watchdog and the
//! clock to the collaborators the platform layer hands in, and reacts to the
//! bar window's lifecycle. All handling runs on the UI thread.

use log::{debug, info};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use crate::actions::{
    self, ActionContext, BarAction, Confirmer, LifecycleController, Notifier, ProcessLauncher,
    SessionControl,
};
use crate::clock::{Clock, ClockText, CLOCK_INTERVAL_MS};
use crate::config::Config;
use crate::geometry::{DpiContext, Rect};
use crate::service::{
    Scheduler, ServiceQuery, ServiceReadinessMonitor, TimerId, CLOCK_TIMER, SEARCH_POLL_TIMER,
};
use crate::shell::{
    BarEventHandler, BarRegistrar, BarSurface, Companions, Edge, FullScreenModeController,
    MessageDispatcher, MessageId, PositionCoordinator, RawMessage, ShellAppBar,
};
use crate::tray::{TrayLifecycleManager, TraySubsystem};

#[cfg(test)]
use crate::service::Readiness;
#[cfg(test)]
use crate::shell::fullscreen::FullScreenState;
#[cfg(test)]
use crate::tray::TraySubsystemState;

/// Platform collaborators handed to [`Bar::new`]
pub struct BarServices {
    pub shell: Box<dyn ShellAppBar>,
    pub surface: Box<dyn BarSurface>,
    pub companions: Companions,
    pub tray: Box<dyn TraySubsystem>,
    pub search_query: Box<dyn ServiceQuery>,
    pub scheduler: Box<dyn Scheduler>,
    pub launcher: Box<dyn ProcessLauncher>,
    pub notifier: Box<dyn Notifier>,
    pub confirmer: Box<dyn Confirmer>,
    pub session: Box<dyn SessionControl>,
    pub lifecycle: Box<dyn LifecycleController>,
}

pub struct Bar {
    config: Arc<Config>,
    surface: Box<dyn BarSurface>,
    companions: Companions,
    registrar: BarRegistrar,
    dispatcher: MessageDispatcher,
    position: PositionCoordinator,
    full_screen: FullScreenModeController,
    tray: TrayLifecycleManager,
    search: ServiceReadinessMonitor,
    search_ready: Rc<Cell<bool>>,
    scheduler: Box<dyn Scheduler>,
    launcher: Box<dyn ProcessLauncher>,
    notifier: Box<dyn Notifier>,
    confirmer: Box<dyn Confirmer>,
    session: Box<dyn SessionControl>,
    lifecycle: Box<dyn LifecycleController>,
    clock: Clock,
    closed: bool,
}

impl Bar {
    pub fn new(config: Arc<Config>, services: BarServices) -> Self {
        let search_ready = Rc::new(Cell::new(false));
        let ready_flag = search_ready.clone();
        let mut search = ServiceReadinessMonitor::new(
            config.search.service_name.clone(),
            Duration::from_secs(config.search.poll_interval_secs),
            services.search_query,
            Box::new(move || ready_flag.set(true)),
        );
        let mut scheduler = services.scheduler;
        // A service that is already running activates search right away
        search.start(scheduler.as_mut());

        Self {
            position: PositionCoordinator::new(services.surface.bounds()),
            full_screen: FullScreenModeController::new(config.features.enable_taskbar),
            registrar: BarRegistrar::new(services.shell),
            dispatcher: MessageDispatcher::new(),
            tray: TrayLifecycleManager::new(services.tray),
            clock: Clock::new(&config.clock),
            surface: services.surface,
            companions: services.companions,
            search,
            search_ready,
            scheduler,
            launcher: services.launcher,
            notifier: services.notifier,
            confirmer: services.confirmer,
            session: services.session,
            lifecycle: services.lifecycle,
            config,
            closed: false,
        }
    }

    /// Native window exists: dock at the top edge and size to the screen.
    ///
    /// `screen_width`/`screen_height` are the primary screen size in device pixels.
    pub fn on_source_initialized(
        &mut self,
        screen_width: u32,
        screen_height: u32,
    ) -> Option<MessageId> {
        let dpi = DpiContext::new(self.surface.dpi());
        let mut size = dpi.size_to_device(self.position.geometry().size());
        size.width = screen_width as i32;

        let message_id = self.registrar.register(self.surface.handle(), size, Edge::Top);
        self.position.apply_geometry(
            screen_width,
            screen_height,
            dpi,
            self.surface.as_mut(),
            &self.companions,
        );
        message_id
    }

    /// Window finished loading: start the tray and the clock
    pub fn on_loaded(&mut self) {
        self.tray.on_loaded(self.config.features.enable_sys_tray);
        self.scheduler
            .schedule(CLOCK_TIMER, Duration::from_millis(CLOCK_INTERVAL_MS));
        info!("Bar loaded");
    }

    /// Route a window message. Returns true when default processing should be skipped.
    pub fn handle_message(&mut self, message: RawMessage) -> bool {
        let dispatcher = self.dispatcher;
        let registered = self.registrar.message_id();
        dispatcher.dispatch(message, registered, self)
    }

    /// The bar window moved
    pub fn on_location_changed(&mut self) -> bool {
        self.position
            .on_location_changed(self.surface.as_mut(), &self.companions)
    }

    /// Timer fired. Returns true when the bar needs repainting.
    pub fn on_timer(&mut self, timer: TimerId) -> bool {
        match timer {
            CLOCK_TIMER => self.clock.tick(),
            SEARCH_POLL_TIMER => self.search.on_tick(self.scheduler.as_mut()),
            other => {
                debug!("Ignoring unknown timer {}", other.0);
                false
            }
        }
    }

    pub fn perform(&mut self, action: &BarAction) -> bool {
        if matches!(action, BarAction::Search(_)) && !self.search_ready.get() {
            debug!("Search is not available yet");
            return false;
        }

        let mut ctx = ActionContext {
            launcher: self.launcher.as_mut(),
            notifier: self.notifier.as_mut(),
            confirmer: self.confirmer.as_mut(),
            session: self.session.as_mut(),
            lifecycle: self.lifecycle.as_mut(),
            file_manager: &self.config.general.file_manager,
        };
        actions::perform(action, &mut ctx)
    }

    /// Window is closing: give the screen space back and stop everything
    pub fn on_closing(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        info!("Bar closing");

        let collapsed = Rect {
            height: 0,
            ..self.position.geometry()
        };
        self.surface.set_bounds(collapsed);
        self.companions.sync_shadow(&collapsed);

        self.registrar.unregister();
        self.tray.on_closing();
        self.search.stop(self.scheduler.as_mut());
        self.scheduler.cancel(CLOCK_TIMER);

        if self.config.general.user_shell {
            info!("Restarting Explorer as the user shell");
            self.launcher.start_process("explorer.exe", None);
        }
    }

    pub fn clock_text(&self) -> &ClockText {
        self.clock.current()
    }

    pub fn geometry(&self) -> Rect {
        self.position.geometry()
    }

    pub fn message_id(&self) -> Option<MessageId> {
        self.registrar.message_id()
    }

    /// Whether the search service has come up and search can be offered
    pub fn search_available(&self) -> bool {
        self.search_ready.get()
    }

    #[cfg(test)]
    pub fn search_readiness(&self) -> Readiness {
        self.search.readiness()
    }

    #[cfg(test)]
    pub fn full_screen_state(&self) -> FullScreenState {
        self.full_screen.state()
    }

    #[cfg(test)]
    pub fn tray_state(&self) -> TraySubsystemState {
        self.tray.state()
    }
}

impl BarEventHandler for Bar {
    fn on_position_changed(&mut self) {
        self.position.on_position_changed(
            &mut self.registrar,
            self.surface.as_mut(),
            &self.companions,
        );
    }

    fn on_full_screen_app(&mut self, entering: bool) {
        self.full_screen
            .on_full_screen_app(entering, self.surface.as_mut(), &self.companions);
    }

    fn on_window_arrange(&mut self, begin: bool) {
        // No timeout: a begin without its end leaves the bar hidden
        self.surface.set_visible(!begin);
    }

    fn on_activate(&mut self) {
        self.registrar.on_activate();
    }

    fn on_window_pos_changed(&mut self) {
        self.registrar.on_window_pos_changed();
    }

    fn on_display_change(&mut self, width: u32, height: u32) {
        let dpi = DpiContext::new(self.surface.dpi());
        self.position.apply_geometry(
            width,
            height,
            dpi,
            self.surface.as_mut(),
            &self.companions,
        );
    }
}

impl Drop for Bar {
    fn drop(&mut self) {
        self.registrar.unregister();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Place, SessionAction};
    use crate::service::ServiceState;
    use crate::shell::dispatch::{
        ABN_FULLSCREENAPP, ABN_POSCHANGED, ABN_STATECHANGE, ABN_WINDOWARRANGE, WM_ACTIVATE,
        WM_DISPLAYCHANGE,
    };
    use crate::shell::{CompanionWindow, TaskbarWindow};
    use crate::testing::{
        EventLog, FakeCompanion, FakeConfirmer, FakeLauncher, FakeLifecycle, FakeNotifier,
        FakeScheduler, FakeSession, FakeShell, FakeSurface, FakeTaskbar, FakeTray, ScriptedService,
        SurfaceState,
    };
    use parking_lot::Mutex;

    struct Harness {
        bar: Bar,
        log: EventLog,
        surface: Arc<Mutex<SurfaceState>>,
        shadow: Arc<Mutex<FakeCompanion>>,
        // Keeps the companions alive for the bar's weak references
        _shadow_dyn: Arc<Mutex<dyn CompanionWindow>>,
        _taskbar: Arc<Mutex<dyn TaskbarWindow>>,
    }

    struct Setup {
        config: Config,
        shell: FakeShell,
        launcher_fails: bool,
        search: Vec<ServiceState>,
        dpi: u32,
    }

    impl Default for Setup {
        fn default() -> Self {
            let mut config = Config::default();
            config.clock.time_format = "%H:%M".into();
            Self {
                config,
                shell: FakeShell::new(EventLog::default()),
                launcher_fails: false,
                search: vec![ServiceState::Running],
                dpi: 96,
            }
        }
    }

    fn harness_with(log: EventLog, setup: Setup) -> Harness {
        let surface = FakeSurface::new(log.clone(), Rect::new(0, 0, 1920, 40), setup.dpi);
        let surface_state = surface.state_handle();

        let shadow = Arc::new(Mutex::new(FakeCompanion::new("shadow", log.clone())));
        let shadow_dyn: Arc<Mutex<dyn CompanionWindow>> = shadow.clone();
        let taskbar: Arc<Mutex<dyn TaskbarWindow>> =
            Arc::new(Mutex::new(FakeTaskbar::new(log.clone())));

        let launcher = if setup.launcher_fails {
            FakeLauncher::new(log.clone()).failing()
        } else {
            FakeLauncher::new(log.clone())
        };

        let services = BarServices {
            shell: Box::new(setup.shell),
            surface: Box::new(surface),
            companions: Companions::new()
                .with_shadow(&shadow_dyn)
                .with_taskbar(&taskbar),
            tray: Box::new(FakeTray::new(log.clone())),
            search_query: Box::new(ScriptedService::new(log.clone(), &setup.search)),
            scheduler: Box::new(FakeScheduler::new(log.clone())),
            launcher: Box::new(launcher),
            notifier: Box::new(FakeNotifier::new(log.clone())),
            confirmer: Box::new(FakeConfirmer::new(log.clone())),
            session: Box::new(FakeSession::new(log.clone())),
            lifecycle: Box::new(FakeLifecycle::new(log.clone())),
        };

        Harness {
            bar: Bar::new(Arc::new(setup.config), services),
            log,
            surface: surface_state,
            shadow,
            _shadow_dyn: shadow_dyn,
            _taskbar: taskbar,
        }
    }

    fn harness() -> Harness {
        let log = EventLog::default();
        let setup = Setup {
            shell: FakeShell::new(log.clone()),
            ..Setup::default()
        };
        harness_with(log, setup)
    }

    fn notification(id: MessageId, kind: usize, lparam: isize) -> RawMessage {
        RawMessage::new(id.0, kind, lparam)
    }

    #[test]
    fn register_then_position_changed_pins_top_and_syncs_shadow() {
        let mut h = harness();
        let id = h.bar.on_source_initialized(1920, 1080).expect("registered");
        assert_eq!(id, FakeShell::MESSAGE_ID);

        // Something pushed the bar down before the shell notification arrives
        h.surface.lock().bounds = Rect::new(0, 57, 1920, 40);
        let before = h.log.entries().len();

        assert!(h.bar.handle_message(notification(id, ABN_POSCHANGED, 0)));

        let pass = h.log.entries()[before..].to_vec();
        assert_eq!(
            pass,
            vec![
                "shell.set_position 1920x40 Top",
                "bar.set_bounds 0,0,1920,40",
                "shadow.set_position 0,0,1920,40",
            ]
        );
        assert_eq!(h.bar.geometry().y, 0);
        assert_eq!(h.shadow.lock().last_position(), Some(h.bar.geometry()));
    }

    #[test]
    fn display_change_rescales_width_in_one_pass() {
        let log = EventLog::default();
        let mut h = harness_with(
            log.clone(),
            Setup {
                shell: FakeShell::new(log),
                dpi: 120,
                ..Setup::default()
            },
        );
        let lparam = ((1440u32 << 16) | 2560u32) as isize;

        assert!(h.bar.handle_message(RawMessage::new(WM_DISPLAYCHANGE, 32, lparam)));

        assert_eq!(h.bar.geometry(), Rect::new(0, 0, 2048, 40));
        assert_eq!(h.shadow.lock().last_position(), Some(h.bar.geometry()));
    }

    #[test]
    fn full_screen_enter_and_exit_restore_flags() {
        let mut h = harness();
        let id = h.bar.on_source_initialized(1920, 1080).unwrap();

        h.bar.handle_message(notification(id, ABN_FULLSCREENAPP, 1));
        h.bar.handle_message(notification(id, ABN_FULLSCREENAPP, 1));
        assert!(!h.surface.lock().topmost);
        assert_eq!(h.log.count("bar.place Bottom"), 1);
        // Taskbar companion is disabled by default
        assert_eq!(h.log.count("taskbar.set_topmost"), 0);

        h.bar.handle_message(notification(id, ABN_FULLSCREENAPP, 0));
        assert!(h.surface.lock().topmost);
        assert_eq!(h.bar.full_screen_state(), FullScreenState::Normal);
    }

    #[test]
    fn full_screen_lowers_enabled_taskbar() {
        let log = EventLog::default();
        let mut config = Config::default();
        config.features.enable_taskbar = true;
        let mut h = harness_with(
            log.clone(),
            Setup {
                config,
                shell: FakeShell::new(log),
                ..Setup::default()
            },
        );
        let id = h.bar.on_source_initialized(1920, 1080).unwrap();

        h.bar.handle_message(notification(id, ABN_FULLSCREENAPP, 1));
        h.bar.handle_message(notification(id, ABN_FULLSCREENAPP, 0));

        assert_eq!(h.log.count("taskbar.place Bottom"), 1);
        assert_eq!(h.log.count("taskbar.place TopMost"), 1);
    }

    #[test]
    fn window_arrange_hides_and_shows() {
        let mut h = harness();
        let id = h.bar.on_source_initialized(1920, 1080).unwrap();

        h.bar.handle_message(notification(id, ABN_WINDOWARRANGE, 1));
        assert!(!h.surface.lock().visible);

        h.bar.handle_message(notification(id, ABN_WINDOWARRANGE, 0));
        assert!(h.surface.lock().visible);
    }

    #[test]
    fn unmatched_arrange_begin_leaves_bar_hidden() {
        let mut h = harness();
        let id = h.bar.on_source_initialized(1920, 1080).unwrap();

        h.bar.handle_message(notification(id, ABN_WINDOWARRANGE, 1));
        h.bar.handle_message(notification(id, ABN_POSCHANGED, 0));
        h.bar.on_timer(CLOCK_TIMER);

        assert!(!h.surface.lock().visible);
    }

    #[test]
    fn state_change_notification_is_handled_without_effects() {
        let mut h = harness();
        let id = h.bar.on_source_initialized(1920, 1080).unwrap();
        let before = h.log.entries().len();

        assert!(h.bar.handle_message(notification(id, ABN_STATECHANGE, 0)));
        assert_eq!(h.log.entries().len(), before);
    }

    #[test]
    fn failed_registration_leaves_messages_unhandled() {
        let log = EventLog::default();
        let mut h = harness_with(
            log.clone(),
            Setup {
                shell: FakeShell::new(log).refusing_registration(),
                ..Setup::default()
            },
        );

        assert_eq!(h.bar.on_source_initialized(1920, 1080), None);
        // Geometry still follows the screen
        assert_eq!(h.bar.geometry(), Rect::new(0, 0, 1920, 40));

        let stray = RawMessage::new(FakeShell::MESSAGE_ID.0, ABN_POSCHANGED, 0);
        assert!(!h.bar.handle_message(stray));
        assert!(!h.bar.handle_message(RawMessage::new(WM_ACTIVATE, 1, 0)));
        assert_eq!(h.log.count("shell.activate"), 0);
    }

    #[test]
    fn activation_is_forwarded_but_not_handled() {
        let mut h = harness();
        h.bar.on_source_initialized(1920, 1080);

        assert!(!h.bar.handle_message(RawMessage::new(WM_ACTIVATE, 1, 0)));
        assert_eq!(h.log.count("shell.activate"), 1);
    }

    #[test]
    fn location_change_pins_bar_back_to_top() {
        let mut h = harness();
        h.bar.on_source_initialized(1920, 1080);

        assert!(!h.bar.on_location_changed());

        h.surface.lock().bounds = Rect::new(0, 300, 1920, 40);
        assert!(h.bar.on_location_changed());
        assert_eq!(h.surface.lock().bounds.y, 0);
        assert_eq!(h.shadow.lock().last_position().map(|r| r.y), Some(0));
    }

    #[test]
    fn running_search_service_is_available_before_load() {
        let h = harness();

        assert!(h.bar.search_available());
        assert_eq!(h.bar.search_readiness(), Readiness::Ready);
        assert_eq!(h.log.count("service.query"), 1);
        assert_eq!(h.log.count("timer.schedule 2"), 0);
        assert_eq!(h.bar.tray_state(), TraySubsystemState::NotStarted);
    }

    #[test]
    fn load_starts_tray_and_clock() {
        let mut h = harness();
        h.bar.on_source_initialized(1920, 1080);
        h.bar.on_loaded();

        assert_eq!(h.bar.tray_state(), TraySubsystemState::Started);
        assert!(h.bar.search_available());
        assert_eq!(h.log.count("timer.schedule 1 500ms"), 1);
        assert_eq!(h.log.count("timer.schedule 2"), 0);
        assert_eq!(h.log.count("service.query"), 1);
    }

    #[test]
    fn search_becomes_available_once_service_runs() {
        let log = EventLog::default();
        let mut h = harness_with(
            log.clone(),
            Setup {
                shell: FakeShell::new(log),
                search: vec![ServiceState::Stopped, ServiceState::Running],
                ..Setup::default()
            },
        );
        assert!(!h.bar.search_available());
        assert_eq!(h.log.count("timer.schedule 2"), 1);
        assert!(!h.bar.perform(&BarAction::Search("notes".into())));
        assert_eq!(h.log.count("launch"), 0);

        assert!(h.bar.on_timer(SEARCH_POLL_TIMER));
        assert!(h.bar.search_available());
        assert_eq!(h.bar.search_readiness(), Readiness::Ready);
        assert!(h.bar.perform(&BarAction::Search("notes".into())));
        assert_eq!(h.log.count("launch search:query=notes"), 1);
    }

    #[test]
    fn launch_failure_shows_one_message() {
        let log = EventLog::default();
        let mut h = harness_with(
            log.clone(),
            Setup {
                shell: FakeShell::new(log),
                launcher_fails: true,
                ..Setup::default()
            },
        );
        h.bar.on_loaded();

        assert!(!h.bar.perform(&BarAction::OpenControlPanel));
        assert_eq!(h.log.count("notify Oops!"), 1);
    }

    #[test]
    fn places_use_configured_file_manager() {
        let log = EventLog::default();
        let mut config = Config::default();
        config.general.file_manager = "files.exe".into();
        let mut h = harness_with(
            log.clone(),
            Setup {
                config,
                shell: FakeShell::new(log),
                ..Setup::default()
            },
        );

        h.bar.perform(&BarAction::OpenPlace(Place::Computer));
        assert_eq!(h.log.count("launch files.exe"), 1);
    }

    #[test]
    fn closing_releases_everything_once() {
        let mut h = harness();
        h.bar.on_source_initialized(1920, 1080);
        h.bar.on_loaded();

        h.bar.on_closing();
        h.bar.on_closing();

        assert_eq!(h.surface.lock().bounds.height, 0);
        assert_eq!(h.shadow.lock().last_position().map(|r| r.height), Some(0));
        assert_eq!(h.log.count("shell.reset_work_area"), 1);
        assert_eq!(h.log.count("shell.unregister"), 1);
        assert_eq!(h.log.count("tray.destroy"), 1);
        assert_eq!(h.log.count("timer.cancel 1"), 1);
        assert_eq!(h.log.count("launch explorer.exe"), 0);
        assert!(h.log.position("shell.unregister") < h.log.position("tray.destroy"));

        drop(h.bar);
        assert_eq!(h.log.count("shell.unregister"), 1);
    }

    #[test]
    fn closing_as_user_shell_restarts_explorer() {
        let log = EventLog::default();
        let mut config = Config::default();
        config.general.user_shell = true;
        let mut h = harness_with(
            log.clone(),
            Setup {
                config,
                shell: FakeShell::new(log),
                ..Setup::default()
            },
        );

        h.bar.on_closing();
        assert_eq!(h.log.count("launch explorer.exe"), 1);
    }

    #[test]
    fn dropping_a_registered_bar_unregisters() {
        let h = harness();
        let log = h.log.clone();
        let mut bar = h.bar;
        bar.on_source_initialized(1920, 1080);

        drop(bar);
        assert_eq!(log.count("shell.unregister"), 1);
    }

    #[test]
    fn exit_action_requests_shutdown() {
        let mut h = harness();
        assert!(h.bar.perform(&BarAction::ExitShell));
        assert_eq!(h.log.count("lifecycle.shutdown"), 1);
    }

    #[test]
    fn session_actions_reach_the_session_control() {
        let mut h = harness();
        assert!(h.bar.perform(&BarAction::Session(SessionAction::ShutDown)));
        assert!(h.log.position("confirm") < h.log.position("session ShutDown"));
    }

    #[test]
    fn clock_timer_refreshes_text() {
        let mut h = harness();
        assert!(!h.bar.clock_text().text.is_empty());
        assert!(!h.bar.on_timer(TimerId(99)));
        h.bar.on_timer(CLOCK_TIMER);
        assert_eq!(h.bar.clock_text().text.len(), 5);
    }
}
