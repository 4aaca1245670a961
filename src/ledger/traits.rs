//! Ledger trait definitions
//!
//! Backend-agnostic contracts for the durable interview record. The
//! submission pipeline and completion evaluator only ever speak to these.

use super::models::{AiAnalysis, Interview, InterviewQuestion, VideoResponse};
use crate::analysis::AnalysisResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Ledger-related errors
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("interview not found: {0}")]
    InterviewNotFound(Uuid),

    #[error("response not found: {0}")]
    ResponseNotFound(Uuid),
}

/// Durable record of interviews, responses, and analyses
#[async_trait]
pub trait ResponseLedger: Send + Sync {
    /// Look up an interview by its opaque entry link
    async fn resolve_by_link(&self, link: &str) -> Result<Option<Interview>, LedgerError>;

    /// Look up an interview by id
    async fn interview(&self, interview_id: Uuid) -> Result<Option<Interview>, LedgerError>;

    /// Flip a pending interview to in-progress
    ///
    /// In-progress and completed interviews are left untouched; the status
    /// never moves backwards.
    async fn mark_in_progress(&self, interview_id: Uuid) -> Result<(), LedgerError>;

    /// Record an accepted answer, keyed on (interview, question)
    ///
    /// Upsert: a resubmission for the same question replaces the earlier
    /// row instead of adding a second one. Replacing a response discards
    /// any analysis already attached to it.
    async fn record_response(
        &self,
        interview_id: Uuid,
        question_id: Uuid,
        video_url: &str,
        duration_secs: u32,
    ) -> Result<VideoResponse, LedgerError>;

    /// Attach an evaluation to an existing response
    ///
    /// At most one analysis exists per response; recording again replaces
    /// it.
    async fn record_analysis(
        &self,
        response_id: Uuid,
        result: &AnalysisResult,
    ) -> Result<AiAnalysis, LedgerError>;

    /// Number of this interview's responses that carry an analysis
    async fn analyzed_count(&self, interview_id: Uuid) -> Result<usize, LedgerError>;

    /// Whether every question has an analyzed response
    async fn is_complete(
        &self,
        interview_id: Uuid,
        total_questions: usize,
    ) -> Result<bool, LedgerError> {
        Ok(total_questions > 0 && self.analyzed_count(interview_id).await? >= total_questions)
    }

    /// All responses for an interview, oldest first, with their analyses
    async fn responses(
        &self,
        interview_id: Uuid,
    ) -> Result<Vec<(VideoResponse, Option<AiAnalysis>)>, LedgerError>;

    /// One-shot completion write
    ///
    /// Sets status, completed_at, overall_score and summary together.
    /// Returns `false` without touching anything if the interview is
    /// already completed.
    async fn complete_interview(
        &self,
        interview_id: Uuid,
        overall_score: i32,
        summary: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, LedgerError>;
}

/// Source of a job's fixed question list
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// The job's questions in ascending `order_index`
    async fn questions_for_job(&self, job_id: Uuid) -> Result<Vec<InterviewQuestion>, LedgerError>;
}
