// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/safewalk-rs

//! Assessment session loop - start/stop, periodic cycles, result fencing

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use anyhow::Result;
use chrono::{Local, Utc};
use parking_lot::RwLock as SyncRwLock;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{format_entry, Event, EventBus, PresentationState, Scheduler};
use crate::assessment::{RiskAssessment, RiskLevel};
use crate::config::Config;
use crate::places::find_safe_places;
use crate::report::{self, REPORT_PENDING};
use crate::sensors::{location_context, Coordinates, LocationProvider, SensorManager};
use crate::service::{GeminiClient, Services, SimulatedService};

/// What happened to one dispatched cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Session was not monitoring
    Idle,
    /// No location known, nothing was sent
    NoLocation,
    /// Result replaced the displayed assessment
    Applied { cycle: u64, level: RiskLevel },
    /// Result arrived after a newer cycle or after stop and was dropped
    Stale { cycle: u64 },
}

/// State shared between the session handle, the timer and in-flight cycles
struct Shared {
    services: Services,
    sensors: SensorManager,
    events: Arc<EventBus>,
    state: RwLock<PresentationState>,
    coords: SyncRwLock<Option<Coordinates>>,
    monitoring: AtomicBool,
    /// Bumped on every start and stop; cycles from an older epoch are dropped
    epoch: AtomicU64,
    issued_cycles: AtomicU64,
    issued_reports: AtomicU64,
    places_query: String,
}

impl Shared {
    async fn run_cycle(&self) -> CycleOutcome {
        if !self.monitoring.load(Ordering::SeqCst) {
            return CycleOutcome::Idle;
        }
        let coords = *self.coords.read();
        let Some(coords) = coords else {
            debug!("No location yet, skipping assessment cycle");
            return CycleOutcome::NoLocation;
        };

        let epoch = self.epoch.load(Ordering::SeqCst);
        let cycle = self.issued_cycles.fetch_add(1, Ordering::SeqCst) + 1;

        let snapshot = self
            .sensors
            .snapshot(location_context(coords, Local::now()))
            .await;
        debug!(
            cycle,
            image = snapshot.image_base64.is_some(),
            audio = snapshot.audio_base64.is_some(),
            "Dispatching assessment"
        );

        let assessment = match self.services.assessor.assess(&snapshot).await {
            Ok(assessment) => assessment,
            Err(e) => {
                warn!(cycle, "Assessment failed, using fallback: {}", e);
                RiskAssessment::fallback()
            }
        };

        self.apply(epoch, cycle, assessment).await
    }

    async fn apply(&self, epoch: u64, cycle: u64, assessment: RiskAssessment) -> CycleOutcome {
        let line = {
            let mut state = self.state.write().await;
            if epoch != self.epoch.load(Ordering::SeqCst)
                || !state.monitoring
                || cycle <= state.displayed_cycle
            {
                debug!(cycle, displayed = state.displayed_cycle, "Discarding stale assessment");
                return CycleOutcome::Stale { cycle };
            }

            let line = format_entry(Local::now(), &assessment);
            state.displayed_cycle = cycle;
            state.assessment = assessment.clone();
            state.log.push(line.clone());
            state.last_updated = Some(Utc::now());
            line
        };

        info!(cycle, score = assessment.score, "{}", line);
        let level = assessment.risk_level;

        if level.is_alarming() {
            let message = format!("{} - {}", assessment.reason, assessment.recommended_action);
            warn!("⚠ {} risk: {}", level, message);
            self.events.publish_alert(level, &message);
        }
        self.events.publish_log(&line);
        self.events.publish_assessment(cycle, assessment);

        CycleOutcome::Applied { cycle, level }
    }

    async fn refresh_places(&self, at: Coordinates) {
        let places = find_safe_places(self.services.places.as_ref(), at, &self.places_query).await;

        let current = *self.coords.read();
        if current != Some(at) {
            debug!("Location moved during place lookup, dropping result");
            return;
        }

        self.state.write().await.places = places.clone();
        info!("{} safe places near {}", places.len(), at);
        self.events.publish_places(places);
    }
}

/// Personal-safety monitoring session
pub struct Session {
    id: Uuid,
    shared: Arc<Shared>,
    scheduler: Scheduler,
    period: Duration,
    locator: Box<dyn LocationProvider>,
    location_resolved: AtomicBool,
    transition: Mutex<()>,
}

impl Session {
    pub fn new(
        config: &Config,
        services: Services,
        sensors: SensorManager,
        locator: Box<dyn LocationProvider>,
    ) -> Self {
        let session = &config.session;

        Self {
            id: Uuid::new_v4(),
            shared: Arc::new(Shared {
                services,
                sensors,
                events: Arc::new(EventBus::new(session.event_capacity)),
                state: RwLock::new(PresentationState::new(session.log_capacity, session.max_visible_places)),
                coords: SyncRwLock::new(None),
                monitoring: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
                issued_cycles: AtomicU64::new(0),
                issued_reports: AtomicU64::new(0),
                places_query: config.service.places_query.clone(),
            }),
            scheduler: Scheduler::new(),
            period: Duration::from_secs(session.interval_secs.max(1)),
            locator,
            location_resolved: AtomicBool::new(false),
            transition: Mutex::new(()),
        }
    }

    /// Wire devices, collaborators and location source from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let services = if config.demo_mode {
            info!("Using simulated assessment service");
            Services::from_single(Arc::new(SimulatedService::new()))
        } else {
            Services::from_single(Arc::new(GeminiClient::new(config.service.clone())?))
        };

        Ok(Self::new(
            config,
            services,
            SensorManager::new(&config.sensors),
            config.location.provider(),
        ))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_monitoring(&self) -> bool {
        self.shared.monitoring.load(Ordering::SeqCst)
    }

    /// Whether the repeating cycle timer is live
    pub fn timer_active(&self) -> bool {
        self.scheduler.is_active()
    }

    pub fn location(&self) -> Option<Coordinates> {
        *self.shared.coords.read()
    }

    pub fn events(&self) -> Arc<EventBus> {
        self.shared.events.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.events.subscribe()
    }

    pub fn sensors(&self) -> &SensorManager {
        &self.shared.sensors
    }

    /// Snapshot of what the rendering layer shows
    pub async fn state(&self) -> PresentationState {
        self.shared.state.read().await.clone()
    }

    /// Idle -> Monitoring: acquire devices, run one cycle now, then every period.
    /// Returns false if already monitoring.
    pub async fn start(&self) -> bool {
        let _transition = self.transition.lock().await;
        self.start_locked().await
    }

    async fn start_locked(&self) -> bool {
        if self.is_monitoring() {
            return false;
        }

        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        self.shared.sensors.acquire().await;
        {
            let mut state = self.shared.state.write().await;
            state.monitoring = true;
        }
        self.shared.monitoring.store(true, Ordering::SeqCst);
        info!(session = %self.id, "Monitoring started (every {:?})", self.period);
        self.shared.events.publish_monitoring(true);

        self.dispatch_cycle();

        let shared = self.shared.clone();
        self.scheduler.start("assessment-cycle", self.period, move || {
            let shared = shared.clone();
            async move {
                shared.run_cycle().await;
            }
        });

        true
    }

    /// Monitoring -> Idle: cancel the timer, reset to the paused baseline and release devices.
    /// Results of cycles still in flight are discarded. Returns false if already idle.
    pub async fn stop(&self) -> bool {
        let _transition = self.transition.lock().await;
        self.stop_locked().await
    }

    async fn stop_locked(&self) -> bool {
        if !self.shared.monitoring.swap(false, Ordering::SeqCst) {
            return false;
        }

        self.scheduler.stop();
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        {
            let mut state = self.shared.state.write().await;
            state.monitoring = false;
            state.displayed_cycle = self.shared.issued_cycles.load(Ordering::SeqCst);
            state.assessment = RiskAssessment::paused();
            state.last_updated = Some(Utc::now());
        }
        self.shared.sensors.release().await;

        info!(session = %self.id, "Monitoring stopped");
        self.shared.events.publish_monitoring(false);
        true
    }

    /// Flip between monitoring and idle. Returns whether the session is now monitoring.
    pub async fn toggle(&self) -> bool {
        let _transition = self.transition.lock().await;
        if self.is_monitoring() {
            self.stop_locked().await;
            false
        } else {
            self.start_locked().await;
            true
        }
    }

    /// Run one cycle immediately and wait for it
    pub async fn run_cycle(&self) -> CycleOutcome {
        self.shared.run_cycle().await
    }

    fn dispatch_cycle(&self) {
        let shared = self.shared.clone();
        tokio::spawn(async move {
            shared.run_cycle().await;
        });
    }

    /// Fetch coordinates from the configured provider. Attempted once per session.
    pub async fn resolve_location(&self) -> Option<Coordinates> {
        if self.location_resolved.swap(true, Ordering::SeqCst) {
            return self.location();
        }

        match self.locator.locate().await {
            Ok(Some(coords)) => {
                self.set_location(coords).await;
                Some(coords)
            }
            Ok(None) => {
                warn!("No location fix available; assessments and place lookups are disabled");
                None
            }
            Err(e) => {
                warn!("Location lookup failed ({}); assessments and place lookups are disabled", e);
                None
            }
        }
    }

    /// Record a new position. Triggers a place lookup, and a cycle when monitoring.
    pub async fn set_location(&self, coords: Coordinates) {
        if !coords.is_valid() {
            warn!("Ignoring invalid coordinates {}", coords);
            return;
        }

        let previous = self.shared.coords.write().replace(coords);
        if previous == Some(coords) {
            return;
        }
        info!("Location set to {}", coords);
        self.shared.state.write().await.location = Some(coords);

        let shared = self.shared.clone();
        tokio::spawn(async move {
            shared.refresh_places(coords).await;
        });

        if self.is_monitoring() {
            self.dispatch_cycle();
        }
    }

    /// Build an incident report from the rolling log and a fresh frame.
    ///
    /// The displayed report switches to a pending placeholder at once; only the newest
    /// request writes its final text.
    pub async fn generate_report(&self) -> String {
        let request = self.shared.issued_reports.fetch_add(1, Ordering::SeqCst) + 1;

        let log = {
            let mut state = self.shared.state.write().await;
            state.report = Some(REPORT_PENDING.to_string());
            state.log.to_vec()
        };
        self.shared.events.publish_report(REPORT_PENDING);

        let frame = self.shared.sensors.capture_fresh_frame().await;
        let text = report::generate_report(self.shared.services.reporter.as_ref(), &log, frame.as_ref()).await;

        {
            let mut state = self.shared.state.write().await;
            if request == self.shared.issued_reports.load(Ordering::SeqCst) {
                state.report = Some(text.clone());
            } else {
                debug!(request, "Report superseded by a newer request");
                return text;
            }
        }
        self.shared.events.publish_report(&text);
        text
    }
}
