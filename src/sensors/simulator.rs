// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/safewalk-rs

//! Simulated camera and microphone for demo/testing

use std::f64::consts::PI;
use std::time::Duration;
use async_trait::async_trait;
use anyhow::Result;
use parking_lot::Mutex;
use rand::prelude::*;
use tokio::task::JoinHandle;

use super::audio::{AudioBuffer, AudioChunk};
use super::{Camera, CameraFacing, CapturedFrame, Microphone, SensorStatus};

const FRAME_WIDTH: usize = 32;
const FRAME_HEIGHT: usize = 24;

/// Generates small noisy PPM frames
pub struct SimulatedCamera {
    id: String,
    status: SensorStatus,
    rng: Mutex<StdRng>,
    fail_open: bool,
}

impl SimulatedCamera {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            status: SensorStatus::Disconnected,
            rng: Mutex::new(StdRng::from_entropy()),
            fail_open: false,
        }
    }

    /// Behaves like a camera whose permission was denied
    pub fn denied(id: &str) -> Self {
        Self {
            fail_open: true,
            ..Self::new(id)
        }
    }

    fn render(&self) -> Vec<u8> {
        let mut rng = self.rng.lock();
        let header = format!("P6\n{} {}\n255\n", FRAME_WIDTH, FRAME_HEIGHT);
        let mut data = header.into_bytes();

        // Dim street scene: dark gradient plus sensor noise
        for y in 0..FRAME_HEIGHT {
            let base = 20 + (y * 40 / FRAME_HEIGHT) as i32;
            for _ in 0..FRAME_WIDTH {
                let noise: i32 = rng.gen_range(-8..=8);
                let v = (base + noise).clamp(0, 255) as u8;
                data.extend_from_slice(&[v, v, v.saturating_add(10)]);
            }
        }
        data
    }
}

#[async_trait]
impl Camera for SimulatedCamera {
    fn id(&self) -> &str { &self.id }
    fn status(&self) -> SensorStatus { self.status }

    async fn open(&mut self, _facing: CameraFacing) -> Result<()> {
        if self.fail_open {
            self.status = SensorStatus::Unavailable;
            anyhow::bail!("camera permission denied");
        }
        self.status = SensorStatus::Active;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.status = SensorStatus::Disconnected;
        Ok(())
    }

    async fn grab_frame(&self) -> Option<CapturedFrame> {
        if self.status != SensorStatus::Active {
            return None;
        }
        Some(CapturedFrame::new("image/x-portable-pixmap", self.render()))
    }
}

/// Pushes synthetic street noise into the rolling buffer at a fixed chunk rate
pub struct SimulatedMicrophone {
    id: String,
    status: SensorStatus,
    sample_rate: u32,
    chunk_duration: Duration,
    task: Option<JoinHandle<()>>,
    fail_start: bool,
}

impl SimulatedMicrophone {
    pub fn new(id: &str, sample_rate: u32, chunk_duration: Duration) -> Self {
        Self {
            id: id.to_string(),
            status: SensorStatus::Disconnected,
            sample_rate,
            chunk_duration,
            task: None,
            fail_start: false,
        }
    }

    /// Behaves like a microphone whose permission was denied
    pub fn denied(id: &str) -> Self {
        Self {
            fail_start: true,
            ..Self::new(id, 16_000, Duration::from_secs(1))
        }
    }
}

/// One chunk of low hum plus hiss
fn synth_chunk(rng: &mut StdRng, sample_rate: u32, len: usize, phase: &mut f64) -> Vec<i16> {
    let step = 2.0 * PI * 120.0 / sample_rate as f64;
    (0..len)
        .map(|_| {
            *phase = (*phase + step) % (2.0 * PI);
            let hum = phase.sin() * 1500.0;
            let hiss = rng.gen_range(-400.0..400.0);
            (hum + hiss) as i16
        })
        .collect()
}

#[async_trait]
impl Microphone for SimulatedMicrophone {
    fn id(&self) -> &str { &self.id }
    fn status(&self) -> SensorStatus { self.status }

    async fn start(&mut self, sink: AudioBuffer) -> Result<()> {
        if self.fail_start {
            self.status = SensorStatus::Unavailable;
            anyhow::bail!("microphone permission denied");
        }
        if self.task.is_some() {
            return Ok(());
        }

        let sample_rate = self.sample_rate;
        let chunk_duration = self.chunk_duration;
        let chunk_len = ((sample_rate as f64 * chunk_duration.as_secs_f64()) as usize).max(1);

        self.task = Some(tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            let mut phase = 0.0;
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + chunk_duration, chunk_duration);
            loop {
                ticker.tick().await;
                let samples = synth_chunk(&mut rng, sample_rate, chunk_len, &mut phase);
                sink.push_chunk(AudioChunk::new(sample_rate, samples));
            }
        }));
        self.status = SensorStatus::Active;
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.status = SensorStatus::Disconnected;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_camera_frames_only_while_open() {
        let mut camera = SimulatedCamera::new("cam-1");
        assert!(camera.grab_frame().await.is_none());

        camera.open(CameraFacing::Rear).await.unwrap();
        let frame = camera.grab_frame().await.unwrap();
        assert!(frame.data.starts_with(b"P6\n32 24\n255\n"));
        assert_eq!(frame.data.len(), "P6\n32 24\n255\n".len() + FRAME_WIDTH * FRAME_HEIGHT * 3);

        camera.close().await.unwrap();
        assert!(camera.grab_frame().await.is_none());
    }

    #[tokio::test]
    async fn test_denied_camera() {
        let mut camera = SimulatedCamera::denied("cam-2");
        assert!(camera.open(CameraFacing::Rear).await.is_err());
        assert_eq!(camera.status(), SensorStatus::Unavailable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_microphone_fills_buffer_per_chunk() {
        let buffer = AudioBuffer::new(5);
        let mut mic = SimulatedMicrophone::new("mic-1", 8_000, Duration::from_secs(1));

        mic.start(buffer.clone()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(buffer.len(), 3);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(buffer.len(), 5);

        mic.stop().await.unwrap();
        buffer.clear();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(buffer.is_empty());
    }
}
