//! Per-question recorder
//!
//! Drives a single question's answer through its state machine against the
//! shared capture device. The device itself enforces that only one question
//! records at a time; the recorder enforces everything else.

use super::state::{PendingClip, ResponseState};
use crate::device::{CaptureDevice, DeviceError};
use crate::ledger::InterviewQuestion;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Errors from driving a question's recorder
#[derive(Debug, Error)]
pub enum RecorderError {
    /// The capture device rejected the operation
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// Start was requested while this question is already recording
    #[error("already recording this question")]
    AlreadyRecording,

    /// Stop was requested but this question is not recording
    #[error("not recording this question")]
    NotRecording,

    /// Start was requested while an unsent clip exists
    #[error("a recorded clip is pending; discard it before recording again")]
    ClipPending,

    /// Submit or retake was requested with no recorded clip
    #[error("no recorded clip for this question")]
    NothingRecorded,

    /// A submission for this question is already in flight
    #[error("submission already in progress")]
    SubmitInProgress,

    /// The question's answer was already durably accepted
    #[error("this question was already submitted")]
    AlreadySubmitted,
}

struct RecorderInner {
    state: ResponseState,
    pending: Option<PendingClip>,
    recording_started: Option<Instant>,
    last_recorded_secs: u32,
}

/// State machine for one question's answer
///
/// All methods take `&self`; the recorder can be shared across tasks so
/// other questions' submissions can proceed while this one records.
pub struct QuestionRecorder {
    question: InterviewQuestion,
    device: Arc<dyn CaptureDevice>,
    inner: Mutex<RecorderInner>,
}

impl QuestionRecorder {
    /// Create an idle recorder for a question
    pub fn new(question: InterviewQuestion, device: Arc<dyn CaptureDevice>) -> Self {
        Self {
            question,
            device,
            inner: Mutex::new(RecorderInner {
                state: ResponseState::Idle,
                pending: None,
                recording_started: None,
                last_recorded_secs: 0,
            }),
        }
    }

    /// The question this recorder answers
    pub fn question(&self) -> &InterviewQuestion {
        &self.question
    }

    /// Current state of this question's answer
    pub fn state(&self) -> ResponseState {
        self.inner.lock().state
    }

    /// Seconds on the timer: live while recording, clip length afterwards
    pub fn elapsed_secs(&self) -> u64 {
        let inner = self.inner.lock();
        match inner.state {
            ResponseState::Recording => inner
                .recording_started
                .map(|t| t.elapsed().as_secs())
                .unwrap_or(0),
            _ => inner.last_recorded_secs as u64,
        }
    }

    /// Begin capturing an answer
    ///
    /// Only valid from `Idle`. The device arbitrates cross-question
    /// exclusivity: if another question is recording, this fails with
    /// `DeviceError::Busy`.
    pub async fn start(&self) -> Result<(), RecorderError> {
        {
            let inner = self.inner.lock();
            match inner.state {
                ResponseState::Idle => {}
                ResponseState::Recording => return Err(RecorderError::AlreadyRecording),
                ResponseState::Recorded => return Err(RecorderError::ClipPending),
                ResponseState::Submitting => return Err(RecorderError::SubmitInProgress),
                ResponseState::Submitted => return Err(RecorderError::AlreadySubmitted),
            }
        }

        self.device.start_recording().await?;

        let mut inner = self.inner.lock();
        inner.state = ResponseState::Recording;
        inner.recording_started = Some(Instant::now());
        tracing::info!("Recording started for question {}", self.question.order_index);
        Ok(())
    }

    /// Finish capturing; holds the clip in memory and returns its length
    pub async fn stop(&self) -> Result<u32, RecorderError> {
        {
            let inner = self.inner.lock();
            if inner.state != ResponseState::Recording {
                return Err(RecorderError::NotRecording);
            }
        }

        let clip = self.device.stop_recording().await?;
        let duration_secs = clip.duration_secs();

        let mut inner = self.inner.lock();
        inner.state = ResponseState::Recorded;
        inner.recording_started = None;
        inner.last_recorded_secs = duration_secs;
        inner.pending = Some(PendingClip {
            clip,
            recorded_at: Utc::now(),
        });
        tracing::info!(
            "Recording stopped for question {} ({}s)",
            self.question.order_index,
            duration_secs
        );
        Ok(duration_secs)
    }

    /// Discard the unsent clip and return to `Idle`
    ///
    /// Touches nothing outside this process: no storage object, no ledger
    /// row.
    pub fn retake(&self) -> Result<(), RecorderError> {
        let mut inner = self.inner.lock();
        match inner.state {
            ResponseState::Recorded => {}
            ResponseState::Submitting => return Err(RecorderError::SubmitInProgress),
            ResponseState::Submitted => return Err(RecorderError::AlreadySubmitted),
            _ => return Err(RecorderError::NothingRecorded),
        }
        inner.pending = None;
        inner.state = ResponseState::Idle;
        inner.last_recorded_secs = 0;
        tracing::info!("Clip discarded for question {}", self.question.order_index);
        Ok(())
    }

    /// Claim the pending clip for submission, flipping to `Submitting`
    ///
    /// The clip stays held so a failed submission can be retried without
    /// re-recording. A concurrent second claim fails with
    /// `SubmitInProgress`.
    pub(crate) fn begin_submit(&self) -> Result<PendingClip, RecorderError> {
        let mut inner = self.inner.lock();
        match inner.state {
            ResponseState::Recorded => {}
            ResponseState::Submitting => return Err(RecorderError::SubmitInProgress),
            ResponseState::Submitted => return Err(RecorderError::AlreadySubmitted),
            _ => return Err(RecorderError::NothingRecorded),
        }
        let pending = match inner.pending.clone() {
            Some(pending) => pending,
            None => return Err(RecorderError::NothingRecorded),
        };
        inner.state = ResponseState::Submitting;
        Ok(pending)
    }

    /// Mark the in-flight submission durably accepted (terminal)
    pub(crate) fn mark_submitted(&self) {
        let mut inner = self.inner.lock();
        inner.state = ResponseState::Submitted;
        inner.pending = None;
    }

    /// Return a failed submission to `Recorded`, keeping the clip
    pub(crate) fn mark_submit_failed(&self) {
        let mut inner = self.inner.lock();
        if inner.state == ResponseState::Submitting {
            inner.state = ResponseState::Recorded;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::SimulatedDevice;
    use std::time::Duration;
    use uuid::Uuid;

    fn recorder() -> (QuestionRecorder, Arc<SimulatedDevice>) {
        let device = Arc::new(
            SimulatedDevice::new().with_clip_duration(Duration::from_secs(9)),
        );
        let question = InterviewQuestion::new(Uuid::new_v4(), "Tell us about yourself.", 0);
        (QuestionRecorder::new(question, device.clone()), device)
    }

    #[tokio::test]
    async fn test_record_stop_holds_pending_clip() {
        let (recorder, device) = recorder();
        device.activate().await.unwrap();

        assert_eq!(recorder.state(), ResponseState::Idle);
        recorder.start().await.unwrap();
        assert_eq!(recorder.state(), ResponseState::Recording);

        let secs = recorder.stop().await.unwrap();
        assert_eq!(secs, 9);
        assert_eq!(recorder.state(), ResponseState::Recorded);
        assert_eq!(recorder.elapsed_secs(), 9);
    }

    #[tokio::test]
    async fn test_start_is_rejected_outside_idle() {
        let (recorder, device) = recorder();
        device.activate().await.unwrap();

        recorder.start().await.unwrap();
        assert!(matches!(
            recorder.start().await.unwrap_err(),
            RecorderError::AlreadyRecording
        ));

        recorder.stop().await.unwrap();
        assert!(matches!(
            recorder.start().await.unwrap_err(),
            RecorderError::ClipPending
        ));
    }

    #[tokio::test]
    async fn test_stop_without_recording() {
        let (recorder, device) = recorder();
        device.activate().await.unwrap();
        assert!(matches!(
            recorder.stop().await.unwrap_err(),
            RecorderError::NotRecording
        ));
    }

    #[tokio::test]
    async fn test_retake_resets_to_idle() {
        let (recorder, device) = recorder();
        device.activate().await.unwrap();

        recorder.start().await.unwrap();
        recorder.stop().await.unwrap();
        recorder.retake().unwrap();

        assert_eq!(recorder.state(), ResponseState::Idle);
        assert_eq!(recorder.elapsed_secs(), 0);

        // A fresh take goes through normally
        recorder.start().await.unwrap();
        recorder.stop().await.unwrap();
        assert_eq!(recorder.state(), ResponseState::Recorded);
    }

    #[tokio::test]
    async fn test_retake_requires_a_clip() {
        let (recorder, device) = recorder();
        device.activate().await.unwrap();
        assert!(matches!(
            recorder.retake().unwrap_err(),
            RecorderError::NothingRecorded
        ));
    }

    #[tokio::test]
    async fn test_begin_submit_claims_exclusively() {
        let (recorder, device) = recorder();
        device.activate().await.unwrap();
        recorder.start().await.unwrap();
        recorder.stop().await.unwrap();

        let pending = recorder.begin_submit().unwrap();
        assert_eq!(pending.clip.duration_secs(), 9);
        assert_eq!(recorder.state(), ResponseState::Submitting);

        assert!(matches!(
            recorder.begin_submit().unwrap_err(),
            RecorderError::SubmitInProgress
        ));
        assert!(matches!(
            recorder.retake().unwrap_err(),
            RecorderError::SubmitInProgress
        ));
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_clip_for_retry() {
        let (recorder, device) = recorder();
        device.activate().await.unwrap();
        recorder.start().await.unwrap();
        recorder.stop().await.unwrap();

        recorder.begin_submit().unwrap();
        recorder.mark_submit_failed();
        assert_eq!(recorder.state(), ResponseState::Recorded);

        // The same clip can be claimed again without re-recording
        let pending = recorder.begin_submit().unwrap();
        assert_eq!(pending.clip.duration_secs(), 9);
    }

    #[tokio::test]
    async fn test_submitted_is_terminal() {
        let (recorder, device) = recorder();
        device.activate().await.unwrap();
        recorder.start().await.unwrap();
        recorder.stop().await.unwrap();

        recorder.begin_submit().unwrap();
        recorder.mark_submitted();
        assert_eq!(recorder.state(), ResponseState::Submitted);

        assert!(matches!(
            recorder.start().await.unwrap_err(),
            RecorderError::AlreadySubmitted
        ));
        assert!(matches!(
            recorder.retake().unwrap_err(),
            RecorderError::AlreadySubmitted
        ));
        assert!(matches!(
            recorder.begin_submit().unwrap_err(),
            RecorderError::AlreadySubmitted
        ));
    }

    #[tokio::test]
    async fn test_device_busy_surfaces_through_start() {
        let device = Arc::new(SimulatedDevice::new());
        device.activate().await.unwrap();
        let q0 = QuestionRecorder::new(
            InterviewQuestion::new(Uuid::new_v4(), "First question", 0),
            device.clone(),
        );
        let q1 = QuestionRecorder::new(
            InterviewQuestion::new(Uuid::new_v4(), "Second question", 1),
            device.clone(),
        );

        q0.start().await.unwrap();
        assert!(matches!(
            q1.start().await.unwrap_err(),
            RecorderError::Device(DeviceError::Busy)
        ));
        // The losing question's state is untouched
        assert_eq!(q1.state(), ResponseState::Idle);
    }
}
