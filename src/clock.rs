//! Clock text for the bar

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, TimeZone};
use log::warn;

use crate::config::ClockConfig;

/// Long time pattern used when no format is configured
pub const DEFAULT_TIME_FORMAT: &str = "%-I:%M:%S %p";
/// Long date pattern used when no format is configured
pub const DEFAULT_DATE_FORMAT: &str = "%A, %B %-d, %Y";

/// Refresh period of the clock timer
pub const CLOCK_INTERVAL_MS: u64 = 500;

/// Formatted clock shown in the bar
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClockText {
    pub text: String,
    pub tooltip: String,
}

/// Formats the current time with the configured patterns
pub struct Clock {
    time_format: String,
    date_format: String,
    current: ClockText,
}

impl Clock {
    pub fn new(config: &ClockConfig) -> Self {
        let mut clock = Self {
            time_format: pattern_or(&config.time_format, DEFAULT_TIME_FORMAT),
            date_format: pattern_or(&config.date_format, DEFAULT_DATE_FORMAT),
            current: ClockText::default(),
        };
        clock.tick();
        clock
    }

    /// Refresh from the local time. Returns true if the text changed.
    pub fn tick(&mut self) -> bool {
        self.tick_at(&Local::now())
    }

    pub fn tick_at<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> bool
    where
        Tz::Offset: std::fmt::Display,
    {
        let next = ClockText {
            text: now.format(&self.time_format).to_string(),
            tooltip: now.format(&self.date_format).to_string(),
        };
        let changed = next != self.current;
        self.current = next;
        changed
    }

    pub fn current(&self) -> &ClockText {
        &self.current
    }
}

/// The configured pattern, or `fallback` when it is blank or not valid strftime
fn pattern_or(configured: &str, fallback: &str) -> String {
    if configured.trim().is_empty() {
        return fallback.to_string();
    }
    if StrftimeItems::new(configured).any(|item| matches!(item, Item::Error)) {
        warn!("Invalid clock format {:?}, using {:?}", configured, fallback);
        return fallback.to_string();
    }
    configured.to_string()
}
