// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/safewalk-rs

//! SafeWalk - Personal Safety Companion
//!
//! Continuously samples camera, microphone and location, forwards each snapshot
//! to an external multimodal risk-assessment service, and keeps the latest
//! risk level, recommended action and a rolling log ready for display.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        SafeWalk Session                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────┐   ┌──────────┐   ┌───────────┐   ┌───────────┐  │
//! │  │ Sensors │ → │ Snapshot │ → │  Service  │ → │  Present- │  │
//! │  │ Manager │   │ + context│   │ (assess)  │   │  ation    │  │
//! │  └─────────┘   └──────────┘   └───────────┘   └───────────┘  │
//! │       ↑              ↑                              ↓        │
//! │  ┌─────────┐   ┌──────────┐                  ┌───────────┐   │
//! │  │Scheduler│   │ Location │                  │ Event Bus │   │
//! │  └─────────┘   └──────────┘                  └───────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod core;
pub mod sensors;
pub mod assessment;
pub mod service;
pub mod places;
pub mod report;
pub mod config;

// Re-exports for convenience
pub use config::Config;
pub use core::{EventBus, PresentationState, Session};
pub use sensors::{Coordinates, SensorManager, SensorSnapshot};
pub use assessment::{RiskAssessment, RiskLevel};
pub use places::SafePlace;
pub use service::{GeminiClient, Services, SimulatedService};

/// SafeWalk version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// SafeWalk name
pub const NAME: &str = "SafeWalk";

/// Build info
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: VERSION.to_string(),
        target: std::env::consts::ARCH.to_string(),
        os: std::env::consts::OS.to_string(),
        features: enabled_features(),
    }
}

/// Build information
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Version string
    pub version: String,
    /// Target architecture
    pub target: String,
    /// Operating system
    pub os: String,
    /// Enabled features
    pub features: Vec<String>,
}

#[allow(unused_mut)]
fn enabled_features() -> Vec<String> {
    let mut features = vec![];

    #[cfg(feature = "audio")]
    features.push("audio".to_string());

    features
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_info_features() {
        let info = build_info();
        assert_eq!(info.version, VERSION);
        assert_eq!(info.features.contains(&"audio".to_string()), cfg!(feature = "audio"));
    }
}
