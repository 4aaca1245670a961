//! Capture device trait definitions
//!
//! Backend-agnostic contract for the camera/microphone stream that feeds
//! the per-question recorders.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

/// Information about a capture device
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    /// Unique device ID
    pub id: String,

    /// Human-readable device label
    pub label: String,

    /// Whether the device provides a video track
    pub has_video: bool,

    /// Whether the device provides an audio track
    pub has_audio: bool,
}

/// A single live preview frame (RGBA pixels)
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Raw RGBA pixel data (width * height * 4 bytes)
    pub data: Vec<u8>,

    /// When the frame was captured
    pub captured_at: DateTime<Utc>,
}

/// A finite recorded clip, produced by stopping a recording
#[derive(Debug, Clone)]
pub struct Clip {
    /// Encoded container bytes
    pub data: Vec<u8>,

    /// Container MIME type (e.g. "video/webm")
    pub mime_type: String,

    /// Measured capture length
    pub duration: Duration,
}

impl Clip {
    /// Clip length in whole seconds (fractions are dropped)
    pub fn duration_secs(&self) -> u32 {
        self.duration.as_secs() as u32
    }

    /// Size of the encoded clip in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

/// Errors that can occur talking to a capture device
#[derive(Debug, Clone, Error)]
pub enum DeviceError {
    /// The user (or OS) denied access to camera/microphone
    #[error("device access denied: {0}")]
    AccessDenied(String),

    /// The device disappeared or the backend failed
    #[error("device unavailable: {0}")]
    Unavailable(String),

    /// Another recording already owns the stream
    #[error("device is busy with another recording")]
    Busy,

    /// The stream has not been acquired (or was released)
    #[error("device is not active")]
    NotActive,

    /// Stop was requested but nothing is recording
    #[error("device is not recording")]
    NotRecording,
}

/// A camera/microphone pair that can record finite clips
///
/// The device is acquired once per interview session and released when the
/// session ends. Only one recording may be in flight at a time; starting a
/// second one fails with [`DeviceError::Busy`].
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Identifying information for this device
    fn info(&self) -> DeviceInfo;

    /// Acquire the stream for exclusive use
    ///
    /// Idempotent: activating an already-active device is a no-op.
    async fn activate(&self) -> Result<(), DeviceError>;

    /// Whether the stream is currently acquired
    fn is_active(&self) -> bool;

    /// Live preview frames; `None` while the device is inactive
    fn preview(&self) -> watch::Receiver<Option<PreviewFrame>>;

    /// Begin capturing a clip
    async fn start_recording(&self) -> Result<(), DeviceError>;

    /// Finish the in-flight capture and return the finished clip
    async fn stop_recording(&self) -> Result<Clip, DeviceError>;

    /// Release the stream
    ///
    /// Idempotent: releasing an inactive device is a no-op. Any in-flight
    /// recording is discarded.
    async fn release(&self);
}
