// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/safewalk-rs

//! Bounded rolling display log

use std::collections::VecDeque;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::assessment::RiskAssessment;

/// Upper bound on retained log lines
pub const MAX_LOG_ENTRIES: usize = 20;

/// Format one log line: `[HH:MM:SS] Risk: <LEVEL> - <reason>`
pub fn format_entry(at: DateTime<Local>, assessment: &RiskAssessment) -> String {
    format!(
        "[{}] Risk: {} - {}",
        at.format("%H:%M:%S"),
        assessment.risk_level,
        assessment.reason
    )
}

/// FIFO log that never holds more than `capacity` lines, capped at [`MAX_LOG_ENTRIES`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingLog {
    entries: VecDeque<String>,
    capacity: usize,
}

impl RollingLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_LOG_ENTRIES);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: String) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.entries.iter()
    }

    /// Oldest-first copy of every entry
    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_capacity_never_exceeded() {
        let mut log = RollingLog::new(20);
        for i in 0..57 {
            log.push(format!("entry {}", i));
            assert!(log.len() <= 20);
        }
        assert_eq!(log.len(), 20);
    }

    #[test]
    fn test_capacity_clamped_to_max() {
        let mut log = RollingLog::new(50);
        assert_eq!(log.capacity(), MAX_LOG_ENTRIES);
        for i in 0..30 {
            log.push(format!("entry {}", i));
        }
        assert_eq!(log.len(), MAX_LOG_ENTRIES);
    }

    #[test]
    fn test_oldest_evicted_first() {
        let mut log = RollingLog::new(3);
        for i in 0..5 {
            log.push(format!("entry {}", i));
        }
        assert_eq!(log.to_vec(), vec!["entry 2", "entry 3", "entry 4"]);
    }

    #[test]
    fn test_entry_format() {
        let at = Local.with_ymd_and_hms(2026, 5, 1, 23, 4, 9).unwrap();
        let line = format_entry(at, &RiskAssessment::fallback());
        assert_eq!(line, "[23:04:09] Risk: UNCERTAIN - Risk assessment service unavailable");
    }
}
