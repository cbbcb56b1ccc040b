//! Core module - session loop, timer, event bus and presentation state

mod session;
mod scheduler;
mod event_bus;
mod rolling_log;

pub use session::{CycleOutcome, Session};
pub use scheduler::Scheduler;
pub use event_bus::{next_event, EventBus, Event, EventPayload, EventType};
pub use rolling_log::{format_entry, RollingLog, MAX_LOG_ENTRIES};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::assessment::RiskAssessment;
use crate::places::SafePlace;
use crate::sensors::Coordinates;

/// Everything the rendering layer displays
#[derive(Debug, Clone, Serialize)]
pub struct PresentationState {
    pub monitoring: bool,
    pub assessment: RiskAssessment,
    pub log: RollingLog,
    /// Cycle id of the assessment currently shown
    pub displayed_cycle: u64,
    pub location: Option<Coordinates>,
    pub places: Vec<SafePlace>,
    pub report: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(skip)]
    max_visible_places: usize,
}

impl PresentationState {
    pub fn new(log_capacity: usize, max_visible_places: usize) -> Self {
        Self {
            monitoring: false,
            assessment: RiskAssessment::standby(),
            log: RollingLog::new(log_capacity),
            displayed_cycle: 0,
            location: None,
            places: Vec::new(),
            report: None,
            last_updated: None,
            max_visible_places,
        }
    }

    /// Places to render, capped for display
    pub fn visible_places(&self) -> &[SafePlace] {
        let n = self.places.len().min(self.max_visible_places);
        &self.places[..n]
    }
}

impl Default for PresentationState {
    fn default() -> Self {
        Self::new(20, 3)
    }
}
