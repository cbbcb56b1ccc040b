//! Sensor module - capture adapters, rolling audio window, location

mod manager;
mod traits;
mod audio;
mod camera;
mod location;
mod simulator;

pub use manager::{SensorManager, SensorHealth};
pub use traits::{
    location_context, Camera, CameraFacing, CapturedFrame, Coordinates, Microphone, SensorSnapshot,
    SensorStatus,
};
pub use audio::{encode_wav, AudioBuffer, AudioChunk, AUDIO_MIME};
#[cfg(feature = "audio")]
pub use audio::DeviceMicrophone;
pub use camera::{image_mime_for, StillImageCamera};
pub use location::{FixedLocation, IpLocation, LocationConfig, LocationProvider};
pub use simulator::{SimulatedCamera, SimulatedMicrophone};
