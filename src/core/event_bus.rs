// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/safewalk-rs

//! Event bus for the rendering layer and local alerting

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::assessment::{RiskAssessment, RiskLevel};
use crate::places::SafePlace;

/// Event types in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    Assessment,
    Alert,
    LogEntry,
    Monitoring,
    Places,
    Report,
}

/// Generic event wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    Assessment { cycle: u64, assessment: RiskAssessment },
    Alert { level: RiskLevel, message: String },
    LogEntry(String),
    Monitoring { active: bool },
    Places(Vec<SafePlace>),
    Report(String),
}

/// Central event bus for pub/sub communication
pub struct EventBus {
    event_tx: broadcast::Sender<Event>,
    event_counter: AtomicU64,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity.max(1));

        Self {
            event_tx,
            event_counter: AtomicU64::new(0),
        }
    }

    pub fn publish_assessment(&self, cycle: u64, assessment: RiskAssessment) {
        self.publish_event(EventType::Assessment, EventPayload::Assessment { cycle, assessment });
    }

    pub fn publish_alert(&self, level: RiskLevel, message: &str) {
        self.publish_event(
            EventType::Alert,
            EventPayload::Alert {
                level,
                message: message.to_string(),
            },
        );
    }

    pub fn publish_log(&self, line: &str) {
        self.publish_event(EventType::LogEntry, EventPayload::LogEntry(line.to_string()));
    }

    pub fn publish_monitoring(&self, active: bool) {
        self.publish_event(EventType::Monitoring, EventPayload::Monitoring { active });
    }

    pub fn publish_places(&self, places: Vec<SafePlace>) {
        self.publish_event(EventType::Places, EventPayload::Places(places));
    }

    pub fn publish_report(&self, text: &str) {
        self.publish_event(EventType::Report, EventPayload::Report(text.to_string()));
    }

    fn publish_event(&self, event_type: EventType, payload: EventPayload) {
        let id = self.event_counter.fetch_add(1, Ordering::Relaxed);
        let event = Event {
            id,
            event_type,
            timestamp: Utc::now(),
            payload,
        };
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Total events published so far
    pub fn published(&self) -> u64 {
        self.event_counter.load(Ordering::Relaxed)
    }
}

/// Next event for a subscriber. Overflowed events are skipped; None once the bus is gone.
pub async fn next_event(rx: &mut broadcast::Receiver<Event>) -> Option<Event> {
    loop {
        match rx.recv().await {
            Ok(event) => return Some(event),
            Err(RecvError::Lagged(skipped)) => {
                warn!("Subscriber fell behind, skipped {} events", skipped);
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_in_order() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish_monitoring(true);
        bus.publish_alert(RiskLevel::Critical, "help");

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.event_type, EventType::Monitoring);
        assert_eq!(second.event_type, EventType::Alert);
        assert!(first.id < second.id);
    }

    #[tokio::test]
    async fn test_lagged_subscriber_keeps_receiving() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();

        for i in 0..5 {
            bus.publish_log(&format!("line {}", i));
        }
        bus.publish_alert(RiskLevel::Dangerous, "late alert");

        let event = next_event(&mut rx).await.unwrap();
        assert_eq!(event.event_type, EventType::LogEntry);
        let event = next_event(&mut rx).await.unwrap();
        assert_eq!(event.event_type, EventType::Alert);

        drop(bus);
        assert!(next_event(&mut rx).await.is_none());
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new(4);
        bus.publish_log("line");
        assert_eq!(bus.published(), 1);
    }
}
