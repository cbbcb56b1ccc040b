// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/safewalk-rs

//! Audio capture - rolling chunk buffer and microphone adapters

use std::collections::VecDeque;
use std::sync::Arc;
use parking_lot::Mutex;

/// MIME type of a drained clip
pub const AUDIO_MIME: &str = "audio/wav";

/// Fixed-duration block of mono 16-bit PCM
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    pub sample_rate: u32,
    pub samples: Vec<i16>,
}

impl AudioChunk {
    pub fn new(sample_rate: u32, samples: Vec<i16>) -> Self {
        Self { sample_rate, samples }
    }
}

/// Bounded rolling window of audio chunks with consume-once reads.
///
/// Cloning yields another handle to the same window.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    chunks: Arc<Mutex<VecDeque<AudioChunk>>>,
    capacity: usize,
}

impl AudioBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            chunks: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a chunk, evicting the oldest when full
    pub fn push_chunk(&self, chunk: AudioChunk) {
        if chunk.samples.is_empty() {
            return;
        }
        let mut chunks = self.chunks.lock();
        while chunks.len() >= self.capacity {
            chunks.pop_front();
        }
        chunks.push_back(chunk);
    }

    pub fn len(&self) -> usize {
        self.chunks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.lock().is_empty()
    }

    pub fn clear(&self) {
        self.chunks.lock().clear();
    }

    /// Take everything buffered as one WAV clip and clear the window.
    /// Returns None when nothing was buffered.
    pub fn drain(&self) -> Option<Vec<u8>> {
        let taken: Vec<AudioChunk> = {
            let mut chunks = self.chunks.lock();
            chunks.drain(..).collect()
        };

        let sample_rate = taken.first()?.sample_rate;
        let samples: Vec<i16> = taken
            .into_iter()
            .filter(|c| c.sample_rate == sample_rate)
            .flat_map(|c| c.samples)
            .collect();

        Some(encode_wav(sample_rate, &samples))
    }
}

/// Encode mono 16-bit PCM as a RIFF/WAVE byte stream
pub fn encode_wav(sample_rate: u32, samples: &[i16]) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let byte_rate = sample_rate * 2;
    let mut out = Vec::with_capacity(44 + data_len as usize);

    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes()); // block align
    out.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }

    out
}

#[cfg(feature = "audio")]
pub use device::DeviceMicrophone;

#[cfg(feature = "audio")]
mod device {
    use std::sync::mpsc;
    use std::thread::JoinHandle;
    use std::time::Duration;
    use anyhow::{anyhow, bail, Result};
    use async_trait::async_trait;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use tracing::{info, warn};

    use super::{AudioBuffer, AudioChunk};
    use crate::sensors::{Microphone, SensorStatus};

    /// Default system input device via cpal
    pub struct DeviceMicrophone {
        id: String,
        status: SensorStatus,
        chunk_duration: Duration,
        worker: Option<(JoinHandle<()>, mpsc::Sender<()>)>,
    }

    impl DeviceMicrophone {
        pub fn new(id: &str, chunk_duration: Duration) -> Self {
            Self {
                id: id.to_string(),
                status: SensorStatus::Disconnected,
                chunk_duration,
                worker: None,
            }
        }
    }

    fn log_stream_error(e: cpal::StreamError) {
        warn!("Audio stream error: {}", e);
    }

    fn to_i16(sample: f32) -> i16 {
        (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
    }

    // cpal streams are not Send, so the stream lives on its own thread
    fn open_stream(sink: AudioBuffer, chunk_duration: Duration) -> Result<cpal::Stream> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow!("no input device available"))?;
        let supported = device.default_input_config()?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();

        let channels = config.channels.max(1) as usize;
        let sample_rate = config.sample_rate.0;
        let chunk_len = ((sample_rate as f64 * chunk_duration.as_secs_f64()) as usize).max(1);
        let mut pending: Vec<i16> = Vec::with_capacity(chunk_len);

        let stream = match sample_format {
            cpal::SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    for frame in data.chunks(channels) {
                        pending.push(to_i16(frame[0]));
                        if pending.len() >= chunk_len {
                            sink.push_chunk(AudioChunk::new(sample_rate, std::mem::take(&mut pending)));
                        }
                    }
                },
                log_stream_error,
                None,
            )?,
            cpal::SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    for frame in data.chunks(channels) {
                        pending.push(frame[0]);
                        if pending.len() >= chunk_len {
                            sink.push_chunk(AudioChunk::new(sample_rate, std::mem::take(&mut pending)));
                        }
                    }
                },
                log_stream_error,
                None,
            )?,
            other => bail!("unsupported sample format {:?}", other),
        };

        stream.play()?;
        Ok(stream)
    }

    #[async_trait]
    impl Microphone for DeviceMicrophone {
        fn id(&self) -> &str { &self.id }
        fn status(&self) -> SensorStatus { self.status }

        async fn start(&mut self, sink: AudioBuffer) -> Result<()> {
            if self.worker.is_some() {
                return Ok(());
            }
            self.status = SensorStatus::Connecting;

            let (stop_tx, stop_rx) = mpsc::channel::<()>();
            let (ready_tx, ready_rx) = tokio::sync::oneshot::channel::<Result<()>>();
            let chunk_duration = self.chunk_duration;

            let handle = std::thread::spawn(move || match open_stream(sink, chunk_duration) {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    let _ = stop_rx.recv();
                    drop(stream);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            });

            let opened = ready_rx
                .await
                .map_err(|_| anyhow!("audio thread exited before opening the stream"))
                .and_then(|r| r);

            match opened {
                Ok(()) => {
                    self.worker = Some((handle, stop_tx));
                    self.status = SensorStatus::Active;
                    info!("Microphone {} capturing", self.id);
                    Ok(())
                }
                Err(e) => {
                    self.status = SensorStatus::Unavailable;
                    Err(e)
                }
            }
        }

        async fn stop(&mut self) -> Result<()> {
            if let Some((handle, stop_tx)) = self.worker.take() {
                let _ = stop_tx.send(());
                tokio::task::spawn_blocking(move || handle.join())
                    .await?
                    .map_err(|_| anyhow!("audio thread panicked"))?;
            }
            self.status = SensorStatus::Disconnected;
            Ok(())
        }
    }
}
