// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/safewalk-rs

//! Repeating timer for the assessment cycle

use std::future::Future;
use std::time::Duration;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Holds at most one live repeating timer.
///
/// Each tick spawns the task on its own, so a slow task never delays the next tick.
pub struct Scheduler {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            handle: Mutex::new(None),
        }
    }

    /// Start the timer; the first tick fires one `period` from now.
    /// Replaces any timer already running.
    pub fn start<F, Fut>(&self, name: &str, period: Duration, task: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.to_string();
        debug!("Scheduled task '{}' with interval {:?}", name, period);

        let timer = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                debug!("Timer '{}' fired", name);
                tokio::spawn(task());
            }
        });

        if let Some(previous) = self.handle.lock().replace(timer) {
            previous.abort();
        }
    }

    /// Cancel the timer. Tasks already spawned keep running.
    pub fn stop(&self) -> bool {
        match self.handle.lock().take() {
            Some(timer) => {
                timer.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.lock().is_some()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
