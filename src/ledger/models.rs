//! Ledger domain models
//!
//! These types are the durable shape of an interview: who is being
//! screened, what they are asked, what they answered, and how each answer
//! was evaluated.

use crate::analysis::{AnalysisResult, Sentiment};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Interview
// =============================================================================

/// Lifecycle status of an interview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    /// Created, candidate has not opened it
    Pending,
    /// Candidate opened the session; answers may exist
    InProgress,
    /// All questions analyzed; score and summary written
    Completed,
}

impl Default for InterviewStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl InterviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// One candidate's screening for one job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub id: Uuid,
    pub job_id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    pub status: InterviewStatus,
    /// Opaque token the candidate uses to enter the session
    pub interview_link: String,
    pub created_at: DateTime<Utc>,
    /// Set exactly once, together with `overall_score`, on completion
    pub completed_at: Option<DateTime<Utc>>,
    pub overall_score: Option<i32>,
    pub summary: Option<String>,
}

impl Interview {
    /// Create a pending interview with a fresh entry link
    pub fn new(
        job_id: Uuid,
        candidate_name: impl Into<String>,
        candidate_email: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            candidate_name: candidate_name.into(),
            candidate_email: candidate_email.into(),
            status: InterviewStatus::Pending,
            interview_link: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            completed_at: None,
            overall_score: None,
            summary: None,
        }
    }
}

// =============================================================================
// Interview Questions
// =============================================================================

/// One question in a job's fixed, ordered list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewQuestion {
    pub id: Uuid,
    pub job_id: Uuid,
    pub question: String,
    /// Zero-based position within the job's question list
    pub order_index: u32,
}

impl InterviewQuestion {
    pub fn new(job_id: Uuid, question: impl Into<String>, order_index: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            question: question.into(),
            order_index,
        }
    }
}

// =============================================================================
// Video Responses
// =============================================================================

/// A durably accepted answer to one question
///
/// At most one exists per (interview, question) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub question_id: Uuid,
    /// Locator of the uploaded clip
    pub video_url: String,
    /// Clip length in whole seconds
    pub duration_secs: u32,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// AI Analysis
// =============================================================================

/// Evaluation attached to a response
///
/// Exactly one exists per response once analysis has been invoked, real or
/// fallback. Manager feedback fields are filled later by a human reviewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    pub id: Uuid,
    pub response_id: Uuid,
    pub transcript: String,
    pub sentiment: Sentiment,
    pub tone: String,
    pub score: u8,
    pub feedback: String,
    pub has_inappropriate_language: bool,
    pub manager_feedback: Option<String>,
    pub manager_feedback_by: Option<String>,
    pub manager_feedback_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AiAnalysis {
    /// Build a fresh analysis row for a response
    pub fn from_result(response_id: Uuid, result: &AnalysisResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            response_id,
            transcript: result.transcript.clone(),
            sentiment: result.sentiment,
            tone: result.tone.clone(),
            score: result.score,
            feedback: result.feedback.clone(),
            has_inappropriate_language: result.has_inappropriate_language,
            manager_feedback: None,
            manager_feedback_by: None,
            manager_feedback_at: None,
            created_at: Utc::now(),
        }
    }
}
