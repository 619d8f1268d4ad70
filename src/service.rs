//! Readiness watchdog for the external search service
//!
//! The search menu only makes sense once the indexing service is running.
//! The monitor polls its status on a timer until it comes up, activates the
//! feature once, and then cancels its own timer.

use log::{debug, info, warn};
use std::time::Duration;

use crate::error::BarResult;

/// Run state of an external service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Unknown,
    Stopped,
    Running,
}

/// Looks up the run state of a named service
pub trait ServiceQuery {
    fn query_status(&mut self, service: &str) -> BarResult<ServiceState>;
}

/// Identifier of a timer on the bar's message loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub usize);

/// Clock refresh timer
pub const CLOCK_TIMER: TimerId = TimerId(1);
/// Search service readiness poll
pub const SEARCH_POLL_TIMER: TimerId = TimerId(2);

/// Repeating timers delivered on the bar's own thread
pub trait Scheduler {
    fn schedule(&mut self, timer: TimerId, interval: Duration);
    fn cancel(&mut self, timer: TimerId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Not started yet
    Idle,
    Polling,
    Ready,
}

/// Polls a service until it runs, then activates a feature exactly once
pub struct ServiceReadinessMonitor {
    service: String,
    interval: Duration,
    timer: TimerId,
    query: Box<dyn ServiceQuery>,
    on_ready: Option<Box<dyn FnOnce()>>,
    readiness: Readiness,
}

impl ServiceReadinessMonitor {
    pub fn new(
        service: impl Into<String>,
        interval: Duration,
        query: Box<dyn ServiceQuery>,
        on_ready: Box<dyn FnOnce()>,
    ) -> Self {
        Self {
            service: service.into(),
            interval,
            timer: SEARCH_POLL_TIMER,
            query,
            on_ready: Some(on_ready),
            readiness: Readiness::Idle,
        }
    }

    #[cfg(test)]
    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    #[cfg(test)]
    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }

    /// Check once; activate right away or start polling
    pub fn start(&mut self, scheduler: &mut dyn Scheduler) {
        if self.readiness != Readiness::Idle {
            return;
        }

        if self.poll() == ServiceState::Running {
            self.activate();
            return;
        }

        info!(
            "Service {} not running yet, polling every {:?}",
            self.service, self.interval
        );
        scheduler.schedule(self.timer, self.interval);
        self.readiness = Readiness::Polling;
    }

    /// Handle a poll timer tick. Returns true on the tick that activated.
    pub fn on_tick(&mut self, scheduler: &mut dyn Scheduler) -> bool {
        if self.readiness != Readiness::Polling {
            // Late tick queued before the timer was cancelled
            return false;
        }

        if self.poll() != ServiceState::Running {
            return false;
        }

        scheduler.cancel(self.timer);
        self.activate();
        true
    }

    /// Stop polling without activating (bar is closing)
    pub fn stop(&mut self, scheduler: &mut dyn Scheduler) {
        if self.readiness == Readiness::Polling {
            scheduler.cancel(self.timer);
            self.readiness = Readiness::Idle;
            debug!("Stopped polling service {}", self.service);
        }
    }

    fn poll(&mut self) -> ServiceState {
        match self.query.query_status(&self.service) {
            Ok(state) => {
                debug!("Service {} is {:?}", self.service, state);
                state
            }
            Err(e) => {
                warn!("Could not query service {}: {}", self.service, e);
                ServiceState::Unknown
            }
        }
    }

    fn activate(&mut self) {
        info!("Service {} is running, activating dependent feature", self.service);
        self.readiness = Readiness::Ready;
        if let Some(on_ready) = self.on_ready.take() {
            on_ready();
        }
    }
}
