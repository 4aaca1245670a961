//! Capture device adapter
//!
//! This module abstracts the camera/microphone pair behind a single trait:
//! - CaptureDevice trait for acquiring the stream and producing clips
//! - SimulatedDevice for tests, demos, and headless environments

pub mod simulated;
pub mod traits;

pub use simulated::SimulatedDevice;
pub use traits::{CaptureDevice, Clip, DeviceError, DeviceInfo, PreviewFrame};
