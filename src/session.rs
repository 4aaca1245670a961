//! Interview session
//!
//! The candidate-facing entry point. Opening a session resolves the entry
//! link, loads the job's questions, acquires the capture device once, and
//! hands out per-question recording and submission operations. Questions
//! are independent: one may be recording while another's submission is
//! still in flight.

use crate::analysis::{AnalysisCapability, AnalysisInvoker};
use crate::completion::{CompletionEvaluator, CompletionOutcome};
use crate::device::{CaptureDevice, DeviceError, PreviewFrame};
use crate::error::{SessionError, SessionResult};
use crate::ledger::{Interview, InterviewQuestion, InterviewStatus, QuestionProvider, ResponseLedger};
use crate::pipeline::{SubmissionOutcome, SubmissionPipeline};
use crate::recorder::{QuestionRecorder, ResponseState};
use crate::storage::{ClipStore, UploadGateway};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use uuid::Uuid;

/// Events emitted while a candidate works through an interview
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Session resolved and ready
    Opened { interview_id: Uuid },
    /// A question started recording
    RecordingStarted { question_index: usize },
    /// A question stopped recording
    RecordingStopped {
        question_index: usize,
        duration_secs: u32,
    },
    /// An unsent clip was discarded for a retake
    ClipDiscarded { question_index: usize },
    /// A question's submission pipeline started
    Submitting { question_index: usize },
    /// A question's answer was durably accepted
    Submitted { question_index: usize },
    /// A submission failed; the clip is retained for retry
    SubmitFailed {
        question_index: usize,
        reason: String,
    },
    /// Every question is analyzed; the interview is finalized
    InterviewCompleted { overall_score: i32 },
    /// The session ended
    Closed,
}

/// Candidate-facing status of one question
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionProgress {
    pub question_index: usize,
    pub question_id: Uuid,
    pub question: String,
    pub state: ResponseState,
    pub elapsed_secs: u64,
}

/// One candidate's live walk through an interview
pub struct InterviewSession {
    interview: Interview,
    device: Arc<dyn CaptureDevice>,
    /// Activation failure captured at open; recording is refused while set
    device_error: Option<DeviceError>,
    recorders: Vec<QuestionRecorder>,
    pipeline: SubmissionPipeline,
    event_tx: broadcast::Sender<SessionEvent>,
    closed: AtomicBool,
}

impl std::fmt::Debug for InterviewSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterviewSession")
            .field("interview", &self.interview)
            .field("device_error", &self.device_error)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl InterviewSession {
    /// Open a session from a candidate's entry link
    ///
    /// Fails with `InterviewNotFound` when the link resolves to nothing or
    /// the job has no questions. A device activation failure does NOT fail
    /// the open: the candidate can still see the questions, and the error
    /// is surfaced through [`InterviewSession::device_error`] and every
    /// recording attempt.
    pub async fn open(
        link: &str,
        device: Arc<dyn CaptureDevice>,
        store: Arc<dyn ClipStore>,
        capability: Arc<dyn AnalysisCapability>,
        ledger: Arc<dyn ResponseLedger>,
        questions: Arc<dyn QuestionProvider>,
    ) -> SessionResult<Self> {
        // 1. Resolve the link to an interview.
        let mut interview = ledger
            .resolve_by_link(link)
            .await?
            .ok_or_else(|| SessionError::InterviewNotFound(link.to_string()))?;

        // 2. Load the job's ordered question list. No questions means
        //    there is nothing to run; treat it like a dead link.
        let mut question_list = questions.questions_for_job(interview.job_id).await?;
        if question_list.is_empty() {
            tracing::warn!("Interview {} has no questions for its job", interview.id);
            return Err(SessionError::InterviewNotFound(link.to_string()));
        }
        question_list.sort_by_key(|q| q.order_index);

        // 3. Mark a fresh interview in progress (never moves backwards).
        ledger.mark_in_progress(interview.id).await?;
        if interview.status == InterviewStatus::Pending {
            interview.status = InterviewStatus::InProgress;
        }

        // 4. Acquire the device once for the whole session.
        let device_error = match device.activate().await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!("Capture device unavailable for interview {}: {}", interview.id, e);
                Some(e)
            }
        };

        let total_questions = question_list.len();
        let recorders = question_list
            .iter()
            .map(|q| QuestionRecorder::new(q.clone(), device.clone()))
            .collect();

        let pipeline = SubmissionPipeline::new(
            UploadGateway::new(store),
            AnalysisInvoker::new(capability),
            ledger.clone(),
            CompletionEvaluator::new(ledger, total_questions),
        );

        let (event_tx, _) = broadcast::channel(100);
        let session = Self {
            interview,
            device,
            device_error,
            recorders,
            pipeline,
            event_tx,
            closed: AtomicBool::new(false),
        };

        tracing::info!(
            "Session opened for interview {} ({} questions)",
            session.interview.id,
            total_questions
        );
        let _ = session.event_tx.send(SessionEvent::Opened {
            interview_id: session.interview.id,
        });
        Ok(session)
    }

    /// The interview as resolved at open
    pub fn interview(&self) -> &Interview {
        &self.interview
    }

    /// The ordered question list
    pub fn questions(&self) -> Vec<&InterviewQuestion> {
        self.recorders.iter().map(|r| r.question()).collect()
    }

    /// Whether the capture device was acquired
    pub fn device_ready(&self) -> bool {
        self.device_error.is_none()
    }

    /// The activation failure, if the device could not be acquired
    pub fn device_error(&self) -> Option<&DeviceError> {
        self.device_error.as_ref()
    }

    /// Live camera preview frames
    pub fn preview(&self) -> watch::Receiver<Option<PreviewFrame>> {
        self.device.preview()
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Per-question progress snapshot
    pub fn progress(&self) -> Vec<QuestionProgress> {
        self.recorders
            .iter()
            .enumerate()
            .map(|(index, recorder)| QuestionProgress {
                question_index: index,
                question_id: recorder.question().id,
                question: recorder.question().question.clone(),
                state: recorder.state(),
                elapsed_secs: recorder.elapsed_secs(),
            })
            .collect()
    }

    /// Whether every question has been durably accepted
    pub fn is_all_submitted(&self) -> bool {
        self.recorders
            .iter()
            .all(|r| r.state() == ResponseState::Submitted)
    }

    fn recorder(&self, question_index: usize) -> SessionResult<&QuestionRecorder> {
        self.recorders
            .get(question_index)
            .ok_or(SessionError::UnknownQuestion(question_index))
    }

    /// Start recording an answer for a question
    pub async fn start_recording(&self, question_index: usize) -> SessionResult<()> {
        let recorder = self.recorder(question_index)?;
        if let Some(e) = &self.device_error {
            return Err(SessionError::Device(e.clone()));
        }

        recorder.start().await?;
        let _ = self
            .event_tx
            .send(SessionEvent::RecordingStarted { question_index });
        Ok(())
    }

    /// Stop recording; the clip is held in memory until submit or retake
    pub async fn stop_recording(&self, question_index: usize) -> SessionResult<u32> {
        let recorder = self.recorder(question_index)?;
        let duration_secs = recorder.stop().await?;
        let _ = self.event_tx.send(SessionEvent::RecordingStopped {
            question_index,
            duration_secs,
        });
        Ok(duration_secs)
    }

    /// Discard the question's unsent clip
    pub fn retake(&self, question_index: usize) -> SessionResult<()> {
        let recorder = self.recorder(question_index)?;
        recorder.retake()?;
        let _ = self
            .event_tx
            .send(SessionEvent::ClipDiscarded { question_index });
        Ok(())
    }

    /// Submit the question's recorded clip
    ///
    /// On failure the clip is retained and the question drops back to
    /// `Recorded` for a retry. On the final successful submission the
    /// interview is finalized and the device released.
    pub async fn submit(&self, question_index: usize) -> SessionResult<SubmissionOutcome> {
        let recorder = self.recorder(question_index)?;
        let pending = recorder.begin_submit()?;
        let _ = self.event_tx.send(SessionEvent::Submitting { question_index });

        match self
            .pipeline
            .submit(&self.interview, recorder.question(), &pending.clip)
            .await
        {
            Ok(outcome) => {
                recorder.mark_submitted();
                let _ = self.event_tx.send(SessionEvent::Submitted { question_index });

                if let Some(CompletionOutcome::Completed { overall_score }) = outcome.completion {
                    let _ = self
                        .event_tx
                        .send(SessionEvent::InterviewCompleted { overall_score });
                    // The candidate is done; give the camera back early
                    self.device.release().await;
                }
                Ok(outcome)
            }
            Err(e) => {
                recorder.mark_submit_failed();
                tracing::warn!(
                    "Submission failed for question {} of interview {}: {}",
                    question_index,
                    self.interview.id,
                    e
                );
                let _ = self.event_tx.send(SessionEvent::SubmitFailed {
                    question_index,
                    reason: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// End the session and release the device
    ///
    /// Unsent clips die with the session; nothing about them was ever
    /// persisted. Idempotent.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.device.release().await;
        let _ = self.event_tx.send(SessionEvent::Closed);
        tracing::info!("Session closed for interview {}", self.interview.id);
    }
}
