// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/safewalk-rs

//! Sensor manager - acquires devices and produces per-cycle snapshots

use std::time::Duration;
use base64::Engine;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn, debug};

use super::audio::{AudioBuffer, AUDIO_MIME};
use super::camera::StillImageCamera;
use super::simulator::{SimulatedCamera, SimulatedMicrophone};
use super::{Camera, CameraFacing, CapturedFrame, Microphone, SensorSnapshot, SensorStatus};
use crate::config::{CameraSource, MicrophoneSource, SensorConfig};

/// Device status summary
#[derive(Debug, Clone, Serialize)]
pub struct SensorHealth {
    pub sensor_id: String,
    pub kind: &'static str,
    pub status: SensorStatus,
}

/// Owns the camera, microphone and rolling audio window
pub struct SensorManager {
    camera: RwLock<Option<Box<dyn Camera>>>,
    microphone: RwLock<Option<Box<dyn Microphone>>>,
    audio: AudioBuffer,
    facing: CameraFacing,
}

impl SensorManager {
    /// Build devices from configuration
    pub fn new(config: &SensorConfig) -> Self {
        let chunk = Duration::from_millis(config.audio_chunk_ms);

        let camera: Option<Box<dyn Camera>> = match &config.camera {
            CameraSource::None => None,
            CameraSource::Simulated => Some(Box::new(SimulatedCamera::new("camera-sim"))),
            CameraSource::Still { path } => Some(Box::new(StillImageCamera::new("camera-still", path))),
        };

        let microphone: Option<Box<dyn Microphone>> = match &config.microphone {
            MicrophoneSource::None => None,
            MicrophoneSource::Simulated => Some(Box::new(SimulatedMicrophone::new(
                "mic-sim",
                config.sample_rate,
                chunk,
            ))),
            #[cfg(feature = "audio")]
            MicrophoneSource::Device => Some(Box::new(super::audio::DeviceMicrophone::new("mic-default", chunk))),
            #[cfg(not(feature = "audio"))]
            MicrophoneSource::Device => {
                warn!("Microphone device requested but built without the `audio` feature");
                None
            }
        };

        Self::with_devices(camera, microphone, config.audio_window_chunks, config.camera_facing)
    }

    pub fn with_devices(
        camera: Option<Box<dyn Camera>>,
        microphone: Option<Box<dyn Microphone>>,
        window_chunks: usize,
        facing: CameraFacing,
    ) -> Self {
        Self {
            camera: RwLock::new(camera),
            microphone: RwLock::new(microphone),
            audio: AudioBuffer::new(window_chunks),
            facing,
        }
    }

    /// Handle to the rolling audio window
    pub fn audio_buffer(&self) -> AudioBuffer {
        self.audio.clone()
    }

    /// Acquire capture devices. Failures are logged and leave that device producing nothing.
    pub async fn acquire(&self) {
        if let Some(camera) = self.camera.write().await.as_mut() {
            match camera.open(self.facing).await {
                Ok(()) => info!("Camera {} acquired ({:?})", camera.id(), self.facing),
                Err(e) => warn!("Camera {} unavailable, continuing without video: {}", camera.id(), e),
            }
        }

        if let Some(mic) = self.microphone.write().await.as_mut() {
            match mic.start(self.audio.clone()).await {
                Ok(()) => info!("Microphone {} acquired", mic.id()),
                Err(e) => warn!("Microphone {} unavailable, continuing without audio: {}", mic.id(), e),
            }
        }
    }

    /// Stop capture and release devices
    pub async fn release(&self) {
        if let Some(camera) = self.camera.write().await.as_mut() {
            if let Err(e) = camera.close().await {
                warn!("Error releasing camera {}: {}", camera.id(), e);
            }
        }

        if let Some(mic) = self.microphone.write().await.as_mut() {
            if let Err(e) = mic.stop().await {
                warn!("Error releasing microphone {}: {}", mic.id(), e);
            }
        }

        self.audio.clear();
        debug!("Capture devices released");
    }

    /// Current camera frame, None without an active stream
    pub async fn capture_frame(&self) -> Option<CapturedFrame> {
        let camera = self.camera.read().await;
        camera.as_ref()?.grab_frame().await
    }

    /// One frame on demand. An idle camera is opened for the grab and closed again.
    pub async fn capture_fresh_frame(&self) -> Option<CapturedFrame> {
        let mut guard = self.camera.write().await;
        let camera = guard.as_mut()?;
        if camera.status() == SensorStatus::Active {
            return camera.grab_frame().await;
        }

        if let Err(e) = camera.open(self.facing).await {
            debug!("Camera {} unavailable for a single frame: {}", camera.id(), e);
            return None;
        }
        let frame = camera.grab_frame().await;
        if let Err(e) = camera.close().await {
            warn!("Error releasing camera {}: {}", camera.id(), e);
        }
        frame
    }

    /// Drain the rolling audio window (consume-once)
    pub fn read_audio(&self) -> Option<Vec<u8>> {
        self.audio.drain()
    }

    /// Capture image and audio for one assessment cycle
    pub async fn snapshot(&self, location_context: String) -> SensorSnapshot {
        let engine = &base64::engine::general_purpose::STANDARD;
        let frame = self.capture_frame().await;
        let audio = self.read_audio();

        SensorSnapshot {
            image_mime: frame.as_ref().map(|f| f.mime_type.clone()),
            image_base64: frame.map(|f| engine.encode(&f.data)),
            audio_mime: audio.as_ref().map(|_| AUDIO_MIME.to_string()),
            audio_base64: audio.map(|a| engine.encode(a)),
            location_context,
        }
    }

    pub async fn health(&self) -> Vec<SensorHealth> {
        let mut health = Vec::new();
        if let Some(camera) = self.camera.read().await.as_ref() {
            health.push(SensorHealth {
                sensor_id: camera.id().to_string(),
                kind: "camera",
                status: camera.status(),
            });
        }
        if let Some(mic) = self.microphone.read().await.as_ref() {
            health.push(SensorHealth {
                sensor_id: mic.id().to_string(),
                kind: "microphone",
                status: mic.status(),
            });
        }
        health
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::audio::AudioChunk;

    fn simulated() -> SensorManager {
        SensorManager::with_devices(
            Some(Box::new(SimulatedCamera::new("cam"))),
            Some(Box::new(SimulatedMicrophone::new("mic", 8_000, Duration::from_secs(1)))),
            5,
            CameraFacing::Rear,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_after_acquire() {
        let manager = simulated();
        manager.acquire().await;
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        let snapshot = manager.snapshot("ctx".to_string()).await;
        assert!(snapshot.image_base64.is_some());
        assert_eq!(snapshot.audio_mime.as_deref(), Some(AUDIO_MIME));
        assert_eq!(snapshot.location_context, "ctx");

        // audio was consumed by the snapshot
        assert!(manager.read_audio().is_none());
        manager.release().await;
    }

    #[tokio::test]
    async fn test_fresh_frame_from_idle_camera() {
        let manager = simulated();
        assert!(manager.capture_frame().await.is_none());
        assert!(manager.capture_fresh_frame().await.is_some());

        // camera closed again afterwards
        assert!(manager.capture_frame().await.is_none());
        let health = manager.health().await;
        assert_eq!(health[0].status, SensorStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_fresh_frame_from_denied_camera() {
        let manager = SensorManager::with_devices(Some(Box::new(SimulatedCamera::denied("cam"))), None, 5, CameraFacing::Rear);
        assert!(manager.capture_fresh_frame().await.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_before_acquire_is_empty() {
        let manager = simulated();
        let snapshot = manager.snapshot("ctx".to_string()).await;
        assert!(!snapshot.has_media());
    }

    #[tokio::test]
    async fn test_denied_devices_degrade() {
        let manager = SensorManager::with_devices(
            Some(Box::new(SimulatedCamera::denied("cam"))),
            Some(Box::new(SimulatedMicrophone::denied("mic"))),
            5,
            CameraFacing::Rear,
        );
        manager.acquire().await;

        let health = manager.health().await;
        assert!(health.iter().all(|h| h.status == SensorStatus::Unavailable));
        assert!(!manager.snapshot("ctx".to_string()).await.has_media());
    }

    #[tokio::test]
    async fn test_release_clears_audio() {
        let manager = SensorManager::with_devices(None, None, 5, CameraFacing::Rear);
        manager.audio_buffer().push_chunk(AudioChunk::new(8_000, vec![1, 2]));
        manager.release().await;
        assert!(manager.read_audio().is_none());
    }
}
