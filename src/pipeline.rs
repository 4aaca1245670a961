//! Submission pipeline orchestration
//!
//! This module coordinates a single question's submission: upload, ledger
//! write, analysis, analysis write, and the completion re-check. Per
//! question the steps run strictly in order; across questions submissions
//! run freely in parallel.

use crate::analysis::AnalysisInvoker;
use crate::completion::{CompletionEvaluator, CompletionOutcome};
use crate::device::Clip;
use crate::ledger::{AiAnalysis, Interview, InterviewQuestion, LedgerError, ResponseLedger, VideoResponse};
use crate::storage::{StorageError, UploadGateway};
use std::sync::Arc;
use thiserror::Error;

/// Submission-related errors
///
/// Analysis never appears here: a broken capability degrades the recorded
/// evaluation instead of failing the submission.
#[derive(Error, Debug)]
pub enum SubmitError {
    /// Clip upload failed; nothing was written anywhere
    #[error("upload failed: {0}")]
    Upload(#[from] StorageError),

    /// A ledger write failed after the clip was uploaded
    #[error("ledger write failed: {0}")]
    Ledger(#[from] LedgerError),
}

/// Everything a successful submission produced
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    /// The durable response row (fresh or replaced)
    pub response: VideoResponse,

    /// The evaluation attached to it (real or fallback)
    pub analysis: AiAnalysis,

    /// Completion state after this submission; `None` when the check
    /// itself failed and will be retried on the next submission
    pub completion: Option<CompletionOutcome>,
}

/// Runs the upload-record-analyze-evaluate sequence for one clip
pub struct SubmissionPipeline {
    gateway: UploadGateway,
    invoker: AnalysisInvoker,
    ledger: Arc<dyn ResponseLedger>,
    evaluator: CompletionEvaluator,
}

impl SubmissionPipeline {
    /// Create a pipeline over the session's collaborators
    pub fn new(
        gateway: UploadGateway,
        invoker: AnalysisInvoker,
        ledger: Arc<dyn ResponseLedger>,
        evaluator: CompletionEvaluator,
    ) -> Self {
        Self {
            gateway,
            invoker,
            ledger,
            evaluator,
        }
    }

    /// Submit one recorded clip
    ///
    /// An `Err` before the response row exists leaves the ledger untouched;
    /// the caller keeps the clip and may retry.
    pub async fn submit(
        &self,
        interview: &Interview,
        question: &InterviewQuestion,
        clip: &Clip,
    ) -> Result<SubmissionOutcome, SubmitError> {
        tracing::info!(
            "Submitting question {} for interview {}",
            question.order_index,
            interview.id
        );

        // 1. Upload the clip. On failure nothing has been recorded and the
        //    whole submission is retryable.
        let video_url = self
            .gateway
            .upload(interview.id, question.id, clip)
            .await?;

        // 2. Record the response row, upserting on (interview, question).
        let response = match self
            .ledger
            .record_response(interview.id, question.id, &video_url, clip.duration_secs())
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    "Response write failed after upload; object {} has no ledger row and needs reconciliation: {}",
                    video_url,
                    e
                );
                return Err(e.into());
            }
        };

        // 3. Analyze the uploaded clip. Infallible: failures come back as
        //    the fallback result.
        let result = self
            .invoker
            .analyze(&video_url, &question.question, &interview.candidate_name)
            .await;

        // 4. Attach the evaluation to the response.
        let analysis = match self.ledger.record_analysis(response.id, &result).await {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::error!(
                    "Analysis write failed for response {}; object {} is recorded but unevaluated: {}",
                    response.id,
                    video_url,
                    e
                );
                return Err(e.into());
            }
        };

        // 5. Re-check completion. A failure here never undoes the accepted
        //    submission; the next submission re-runs the check.
        let completion = match self.evaluator.evaluate(interview.id).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::warn!(
                    "Completion check failed for interview {} (will re-run on next submission): {}",
                    interview.id,
                    e
                );
                None
            }
        };

        Ok(SubmissionOutcome {
            response,
            analysis,
            completion,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisBody, AnalysisCallError, AnalysisCapability, AnalysisRequest};
    use crate::ledger::{Interview, InterviewQuestion, MemoryLedger};
    use crate::storage::MemoryClipStore;
    use async_trait::async_trait;
    use std::time::Duration;
    use uuid::Uuid;

    struct FixedCapability {
        score: i64,
    }

    #[async_trait]
    impl AnalysisCapability for FixedCapability {
        async fn analyze(
            &self,
            _request: &AnalysisRequest,
        ) -> Result<AnalysisBody, AnalysisCallError> {
            Ok(AnalysisBody {
                transcript: Some("answer".to_string()),
                sentiment: Some("positive".to_string()),
                tone: Some("warm".to_string()),
                score: Some(self.score),
                feedback: Some("good".to_string()),
                has_inappropriate_language: Some(false),
            })
        }
    }

    fn clip() -> Clip {
        Clip {
            data: vec![0x1A, 0x45, 0xDF, 0xA3, 0, 1, 2],
            mime_type: "video/webm".to_string(),
            duration: Duration::from_secs(6),
        }
    }

    fn build(
        store: Arc<MemoryClipStore>,
        ledger: Arc<MemoryLedger>,
        total_questions: usize,
    ) -> SubmissionPipeline {
        SubmissionPipeline::new(
            UploadGateway::new(store),
            AnalysisInvoker::new(Arc::new(FixedCapability { score: 8 })),
            ledger.clone(),
            CompletionEvaluator::new(ledger, total_questions),
        )
    }

    #[tokio::test]
    async fn test_submit_records_response_and_analysis() {
        let store = Arc::new(MemoryClipStore::new());
        let ledger = Arc::new(MemoryLedger::new());
        let job_id = Uuid::new_v4();
        let interview = Interview::new(job_id, "Dana", "dana@example.com");
        let questions = vec![
            InterviewQuestion::new(job_id, "Q1", 0),
            InterviewQuestion::new(job_id, "Q2", 1),
        ];
        ledger.insert_interview(interview.clone());
        ledger.insert_questions(questions.clone());

        let pipeline = build(store.clone(), ledger.clone(), 2);
        let outcome = pipeline
            .submit(&interview, &questions[0], &clip())
            .await
            .unwrap();

        assert_eq!(outcome.response.duration_secs, 6);
        assert_eq!(outcome.analysis.score, 8);
        assert_eq!(
            outcome.completion,
            Some(CompletionOutcome::Pending {
                analyzed: 1,
                total: 2
            })
        );
        assert_eq!(store.object_count(), 1);
        // The recorded locator resolves to the uploaded object
        assert!(outcome.response.video_url.contains(&interview.id.to_string()));
    }

    #[tokio::test]
    async fn test_upload_failure_leaves_no_ledger_row() {
        let store = Arc::new(MemoryClipStore::new());
        store.set_unavailable(true);
        let ledger = Arc::new(MemoryLedger::new());
        let job_id = Uuid::new_v4();
        let interview = Interview::new(job_id, "Dana", "dana@example.com");
        let question = InterviewQuestion::new(job_id, "Q1", 0);
        ledger.insert_interview(interview.clone());
        ledger.insert_questions(vec![question.clone()]);

        let pipeline = build(store.clone(), ledger.clone(), 1);
        let err = pipeline.submit(&interview, &question, &clip()).await.unwrap_err();

        assert!(matches!(err, SubmitError::Upload(_)));
        assert_eq!(ledger.response_count(interview.id), 0);
        assert_eq!(store.object_count(), 0);
    }

    #[tokio::test]
    async fn test_final_submission_completes_interview() {
        let store = Arc::new(MemoryClipStore::new());
        let ledger = Arc::new(MemoryLedger::new());
        let job_id = Uuid::new_v4();
        let interview = Interview::new(job_id, "Dana", "dana@example.com");
        let question = InterviewQuestion::new(job_id, "Q1", 0);
        ledger.insert_interview(interview.clone());
        ledger.insert_questions(vec![question.clone()]);

        let pipeline = build(store, ledger.clone(), 1);
        let outcome = pipeline.submit(&interview, &question, &clip()).await.unwrap();

        assert_eq!(
            outcome.completion,
            Some(CompletionOutcome::Completed { overall_score: 8 })
        );
        let stored = ledger.interview(interview.id).await.unwrap().unwrap();
        assert!(stored.completed_at.is_some());
        assert_eq!(stored.overall_score, Some(8));
    }
}
