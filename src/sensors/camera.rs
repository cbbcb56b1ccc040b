// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/safewalk-rs

//! Camera adapters

use std::path::{Path, PathBuf};
use async_trait::async_trait;
use anyhow::{Result, bail};
use tracing::debug;

use super::{Camera, CameraFacing, CapturedFrame, SensorStatus};

/// Guess an image MIME type from a file extension
pub fn image_mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "image/jpeg",
    }
}

/// Reads the latest still written by an external grabber (e.g. `fswebcam`, `libcamera-still`)
pub struct StillImageCamera {
    id: String,
    status: SensorStatus,
    path: PathBuf,
    facing: CameraFacing,
}

impl StillImageCamera {
    pub fn new(id: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.to_string(),
            status: SensorStatus::Disconnected,
            path: path.into(),
            facing: CameraFacing::Rear,
        }
    }

    pub fn facing(&self) -> CameraFacing {
        self.facing
    }
}

#[async_trait]
impl Camera for StillImageCamera {
    fn id(&self) -> &str { &self.id }
    fn status(&self) -> SensorStatus { self.status }

    async fn open(&mut self, facing: CameraFacing) -> Result<()> {
        self.status = SensorStatus::Connecting;
        if tokio::fs::metadata(&self.path).await.is_err() {
            self.status = SensorStatus::Unavailable;
            bail!("still image source {:?} not found", self.path);
        }
        self.facing = facing;
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
        match tokio::fs::read(&self.path).await {
            Ok(data) if !data.is_empty() => Some(CapturedFrame::new(image_mime_for(&self.path), data)),
            Ok(_) => None,
            Err(e) => {
                debug!("Frame read from {:?} failed: {}", self.path, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(image_mime_for(Path::new("/tmp/a.PNG")), "image/png");
        assert_eq!(image_mime_for(Path::new("/tmp/a.jpg")), "image/jpeg");
        assert_eq!(image_mime_for(Path::new("/tmp/noext")), "image/jpeg");
    }

    #[tokio::test]
    async fn test_still_camera_lifecycle() {
        let path = std::env::temp_dir().join(format!("safewalk-still-{}.jpg", uuid::Uuid::new_v4()));
        std::fs::write(&path, [0xFF, 0xD8, 0xFF]).unwrap();

        let mut camera = StillImageCamera::new("still-1", &path);
        assert!(camera.grab_frame().await.is_none());

        camera.open(CameraFacing::Rear).await.unwrap();
        let frame = camera.grab_frame().await.unwrap();
        assert_eq!(frame.mime_type, "image/jpeg");
        assert_eq!(frame.data, vec![0xFF, 0xD8, 0xFF]);

        camera.close().await.unwrap();
        assert!(camera.grab_frame().await.is_none());

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_missing_source_is_unavailable() {
        let mut camera = StillImageCamera::new("still-2", "/nonexistent/safewalk/frame.jpg");
        assert!(camera.open(CameraFacing::Front).await.is_err());
        assert_eq!(camera.status(), SensorStatus::Unavailable);
        assert!(camera.grab_frame().await.is_none());
    }
}
