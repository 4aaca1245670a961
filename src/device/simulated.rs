//! Simulated capture device
//!
//! A deterministic in-process device for tests, demos, and headless
//! environments. It honours the same acquisition and exclusivity rules as a
//! real camera and synthesizes WebM-shaped clip bytes on stop.

use super::traits::{CaptureDevice, Clip, DeviceError, DeviceInfo, PreviewFrame};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// EBML header magic that opens every WebM container
const WEBM_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

/// Preview frame dimensions (tiny on purpose)
const PREVIEW_WIDTH: u32 = 16;
const PREVIEW_HEIGHT: u32 = 9;

struct DeviceState {
    active: bool,
    recording_since: Option<Instant>,
    frame_seq: u64,
}

/// In-process stand-in for a real camera/microphone pair
pub struct SimulatedDevice {
    info: DeviceInfo,
    state: Mutex<DeviceState>,
    preview_tx: watch::Sender<Option<PreviewFrame>>,
    deny_reason: Option<String>,
    fixed_clip_duration: Option<Duration>,
}

impl SimulatedDevice {
    /// Create a device that grants access normally
    pub fn new() -> Self {
        let (preview_tx, _) = watch::channel(None);
        Self {
            info: DeviceInfo {
                id: "simulated-0".to_string(),
                label: "Simulated Camera".to_string(),
                has_video: true,
                has_audio: true,
            },
            state: Mutex::new(DeviceState {
                active: false,
                recording_since: None,
                frame_seq: 0,
            }),
            preview_tx,
            deny_reason: None,
            fixed_clip_duration: None,
        }
    }

    /// Create a device whose activation always fails with `AccessDenied`
    pub fn access_denied(reason: impl Into<String>) -> Self {
        let mut device = Self::new();
        device.deny_reason = Some(reason.into());
        device
    }

    /// Force every clip to report the given duration instead of wall time
    pub fn with_clip_duration(mut self, duration: Duration) -> Self {
        self.fixed_clip_duration = Some(duration);
        self
    }

    fn publish_frame(&self, seq: u64) {
        let mut data = vec![0u8; (PREVIEW_WIDTH * PREVIEW_HEIGHT * 4) as usize];
        for (i, px) in data.chunks_exact_mut(4).enumerate() {
            px[0] = ((i as u64 + seq) % 256) as u8;
            px[1] = ((i as u64 * 3 + seq) % 256) as u8;
            px[2] = ((i as u64 * 7) % 256) as u8;
            px[3] = 0xFF;
        }
        let _ = self.preview_tx.send(Some(PreviewFrame {
            width: PREVIEW_WIDTH,
            height: PREVIEW_HEIGHT,
            data,
            captured_at: Utc::now(),
        }));
    }

    fn synthesize_clip(&self, duration: Duration) -> Clip {
        // Header plus a payload that scales with clip length, so longer
        // recordings produce visibly larger objects.
        let payload_len = 256 + (duration.as_millis() as usize) / 2;
        let mut data = Vec::with_capacity(4 + payload_len);
        data.extend_from_slice(&WEBM_MAGIC);
        data.extend((0..payload_len).map(|i| (i % 251) as u8));
        Clip {
            data,
            mime_type: "video/webm".to_string(),
            duration,
        }
    }
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureDevice for SimulatedDevice {
    fn info(&self) -> DeviceInfo {
        self.info.clone()
    }

    async fn activate(&self) -> Result<(), DeviceError> {
        if let Some(reason) = &self.deny_reason {
            return Err(DeviceError::AccessDenied(reason.clone()));
        }

        let seq = {
            let mut state = self.state.lock();
            if state.active {
                return Ok(());
            }
            state.active = true;
            state.frame_seq += 1;
            state.frame_seq
        };

        tracing::debug!("Simulated device activated: {}", self.info.label);
        self.publish_frame(seq);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.state.lock().active
    }

    fn preview(&self) -> watch::Receiver<Option<PreviewFrame>> {
        self.preview_tx.subscribe()
    }

    async fn start_recording(&self) -> Result<(), DeviceError> {
        let seq = {
            let mut state = self.state.lock();
            if !state.active {
                return Err(DeviceError::NotActive);
            }
            if state.recording_since.is_some() {
                return Err(DeviceError::Busy);
            }
            state.recording_since = Some(Instant::now());
            state.frame_seq += 1;
            state.frame_seq
        };

        tracing::debug!("Simulated device recording started");
        self.publish_frame(seq);
        Ok(())
    }

    async fn stop_recording(&self) -> Result<Clip, DeviceError> {
        let started = {
            let mut state = self.state.lock();
            if !state.active {
                return Err(DeviceError::NotActive);
            }
            match state.recording_since.take() {
                Some(started) => started,
                None => return Err(DeviceError::NotRecording),
            }
        };

        let duration = self.fixed_clip_duration.unwrap_or_else(|| started.elapsed());
        let clip = self.synthesize_clip(duration);
        tracing::debug!(
            "Simulated device recording stopped ({} bytes, {:?})",
            clip.size_bytes(),
            duration
        );
        Ok(clip)
    }

    async fn release(&self) {
        let was_active = {
            let mut state = self.state.lock();
            let was_active = state.active;
            state.active = false;
            state.recording_since = None;
            was_active
        };

        if was_active {
            let _ = self.preview_tx.send(None);
            tracing::debug!("Simulated device released");
        }
    }
}
