// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/safewalk-rs

//! Configuration module

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::MAX_LOG_ENTRIES;
use crate::sensors::{CameraFacing, LocationConfig};
use crate::service::ServiceConfig;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application name
    pub app_name: String,

    /// Application version
    pub version: String,

    /// Log level
    pub log_level: String,

    /// Enable demo mode (simulated devices and service)
    pub demo_mode: bool,

    /// Session loop configuration
    pub session: SessionConfig,

    /// Sensor configuration
    pub sensors: SensorConfig,

    /// Location configuration
    pub location: LocationConfig,

    /// External service configuration
    pub service: ServiceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "SafeWalk".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "info".to_string(),
            demo_mode: false,
            session: SessionConfig::default(),
            sensors: SensorConfig::default(),
            location: LocationConfig::default(),
            service: ServiceConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            // Create parent directories
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Reject values the session loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.session.interval_secs == 0 {
            return Err(anyhow!("session.interval_secs must be at least 1"));
        }
        if !(1..=MAX_LOG_ENTRIES).contains(&self.session.log_capacity) {
            return Err(anyhow!("session.log_capacity must be between 1 and {}", MAX_LOG_ENTRIES));
        }
        if self.sensors.audio_window_chunks == 0 || self.sensors.audio_chunk_ms == 0 {
            return Err(anyhow!("audio window and chunk duration must be non-zero"));
        }
        if self.location.latitude.is_some() != self.location.longitude.is_some() {
            return Err(anyhow!("location.latitude and location.longitude must be set together"));
        }
        Ok(())
    }

    /// Switch every device and collaborator to its simulated variant
    pub fn apply_demo_mode(&mut self) {
        self.demo_mode = true;
        self.sensors.camera = CameraSource::Simulated;
        self.sensors.microphone = MicrophoneSource::Simulated;
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("safewalk"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

/// Session loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds between assessment cycles
    pub interval_secs: u64,

    /// Rolling log capacity
    pub log_capacity: usize,

    /// Safe places shown at once
    pub max_visible_places: usize,

    /// Event bus channel capacity
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            interval_secs: 6,
            log_capacity: 20,
            max_visible_places: 3,
            event_capacity: 256,
        }
    }
}

/// Sensor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Preferred camera
    pub camera_facing: CameraFacing,

    /// Microphone backend
    pub microphone: MicrophoneSource,

    /// Audio sample rate for simulated capture
    pub sample_rate: u32,

    /// Duration of one audio chunk in milliseconds
    pub audio_chunk_ms: u64,

    /// Chunks kept in the rolling audio window
    pub audio_window_chunks: usize,

    /// Camera backend
    pub camera: CameraSource,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            camera_facing: CameraFacing::Rear,
            microphone: MicrophoneSource::Device,
            sample_rate: 16_000,
            audio_chunk_ms: 1_000,
            audio_window_chunks: 5,
            camera: CameraSource::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CameraSource {
    None,
    Simulated,
    /// Still image refreshed by an external grabber
    Still { path: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MicrophoneSource {
    None,
    Simulated,
    /// Default system input (requires the `audio` feature)
    Device,
}
