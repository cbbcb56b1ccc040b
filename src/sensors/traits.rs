// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/safewalk-rs

//! Sensor traits and common types

use std::fmt;
use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use anyhow::Result;

use super::audio::AudioBuffer;

/// Sensor operational status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorStatus {
    Disconnected,
    Connecting,
    Active,
    /// Acquisition failed (permission denied or device absent)
    Unavailable,
}

/// Which camera to prefer when several exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    Rear,
    Front,
}

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// One encoded still from the camera
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl CapturedFrame {
    pub fn new(mime_type: &str, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            data,
        }
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

/// Sensor state captured for one assessment cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSnapshot {
    pub image_base64: Option<String>,
    pub image_mime: Option<String>,
    pub audio_base64: Option<String>,
    pub audio_mime: Option<String>,
    pub location_context: String,
}

impl SensorSnapshot {
    pub fn has_media(&self) -> bool {
        self.image_base64.is_some() || self.audio_base64.is_some()
    }
}

/// Location and time context sent with every assessment
pub fn location_context(at: Coordinates, now: DateTime<Local>) -> String {
    format!(
        "Location: {} (lat/lng). Local time: {}.",
        at,
        now.format("%Y-%m-%d %H:%M")
    )
}

/// Camera frame grabber
#[async_trait]
pub trait Camera: Send + Sync {
    fn id(&self) -> &str;

    fn status(&self) -> SensorStatus;

    /// Acquire the device
    async fn open(&mut self, facing: CameraFacing) -> Result<()>;

    /// Release the device
    async fn close(&mut self) -> Result<()>;

    /// Current frame, or None without an active stream
    async fn grab_frame(&self) -> Option<CapturedFrame>;
}

/// Microphone feeding fixed-duration chunks into a rolling buffer
#[async_trait]
pub trait Microphone: Send + Sync {
    fn id(&self) -> &str;

    fn status(&self) -> SensorStatus;

    /// Acquire the device and start pushing chunks into `sink`
    async fn start(&mut self, sink: AudioBuffer) -> Result<()>;

    /// Stop capture and release the device
    async fn stop(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_location_context_format() {
        let now = Local.with_ymd_and_hms(2026, 3, 14, 22, 5, 0).unwrap();
        let context = location_context(Coordinates::new(51.5074, -0.1278), now);
        assert_eq!(context, "Location: 51.507400, -0.127800 (lat/lng). Local time: 2026-03-14 22:05.");
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinates::new(45.0, 170.0).is_valid());
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
        assert!(!Coordinates::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_frame_base64() {
        let frame = CapturedFrame::new("image/jpeg", b"hello".to_vec());
        assert_eq!(frame.to_base64(), "aGVsbG8=");
    }
}
