//! In-memory ledger
//!
//! Backing ledger for tests and demos. Mirrors the SQLite ledger's
//! semantics exactly, including upsert-on-(interview, question) and the
//! one-shot completion write.

use super::models::{AiAnalysis, Interview, InterviewQuestion, InterviewStatus, VideoResponse};
use super::traits::{LedgerError, QuestionProvider, ResponseLedger};
use crate::analysis::AnalysisResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    interviews: HashMap<Uuid, Interview>,
    questions: Vec<InterviewQuestion>,
    /// Responses keyed on (interview, question); the upsert key
    responses: HashMap<(Uuid, Uuid), VideoResponse>,
    /// Analyses keyed on response id; at most one per response
    analyses: HashMap<Uuid, AiAnalysis>,
}

/// Ledger held entirely in memory
#[derive(Default)]
pub struct MemoryLedger {
    inner: RwLock<Inner>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an interview (test/demo setup)
    pub fn insert_interview(&self, interview: Interview) {
        self.inner.write().interviews.insert(interview.id, interview);
    }

    /// Seed a job's questions (test/demo setup)
    pub fn insert_questions(&self, questions: Vec<InterviewQuestion>) {
        self.inner.write().questions.extend(questions);
    }

    /// Number of response rows for an interview
    pub fn response_count(&self, interview_id: Uuid) -> usize {
        self.inner
            .read()
            .responses
            .values()
            .filter(|r| r.interview_id == interview_id)
            .count()
    }
}

#[async_trait]
impl ResponseLedger for MemoryLedger {
    async fn resolve_by_link(&self, link: &str) -> Result<Option<Interview>, LedgerError> {
        Ok(self
            .inner
            .read()
            .interviews
            .values()
            .find(|i| i.interview_link == link)
            .cloned())
    }

    async fn interview(&self, interview_id: Uuid) -> Result<Option<Interview>, LedgerError> {
        Ok(self.inner.read().interviews.get(&interview_id).cloned())
    }

    async fn mark_in_progress(&self, interview_id: Uuid) -> Result<(), LedgerError> {
        let mut inner = self.inner.write();
        let interview = inner
            .interviews
            .get_mut(&interview_id)
            .ok_or(LedgerError::InterviewNotFound(interview_id))?;
        if interview.status == InterviewStatus::Pending {
            interview.status = InterviewStatus::InProgress;
        }
        Ok(())
    }

    async fn record_response(
        &self,
        interview_id: Uuid,
        question_id: Uuid,
        video_url: &str,
        duration_secs: u32,
    ) -> Result<VideoResponse, LedgerError> {
        let mut inner = self.inner.write();
        if !inner.interviews.contains_key(&interview_id) {
            return Err(LedgerError::InterviewNotFound(interview_id));
        }

        let key = (interview_id, question_id);
        let response = match inner.responses.get(&key) {
            Some(existing) => {
                // Replacement keeps the row id but invalidates any
                // evaluation of the earlier clip
                let id = existing.id;
                inner.analyses.remove(&id);
                VideoResponse {
                    id,
                    interview_id,
                    question_id,
                    video_url: video_url.to_string(),
                    duration_secs,
                    created_at: Utc::now(),
                }
            }
            None => VideoResponse {
                id: Uuid::new_v4(),
                interview_id,
                question_id,
                video_url: video_url.to_string(),
                duration_secs,
                created_at: Utc::now(),
            },
        };
        inner.responses.insert(key, response.clone());
        Ok(response)
    }

    async fn record_analysis(
        &self,
        response_id: Uuid,
        result: &AnalysisResult,
    ) -> Result<AiAnalysis, LedgerError> {
        let mut inner = self.inner.write();
        if !inner.responses.values().any(|r| r.id == response_id) {
            return Err(LedgerError::ResponseNotFound(response_id));
        }

        let mut analysis = AiAnalysis::from_result(response_id, result);
        // Re-recording replaces the evaluation but keeps any manager
        // feedback already attached to the response
        if let Some(previous) = inner.analyses.get(&response_id) {
            analysis.manager_feedback = previous.manager_feedback.clone();
            analysis.manager_feedback_by = previous.manager_feedback_by.clone();
            analysis.manager_feedback_at = previous.manager_feedback_at;
        }
        inner.analyses.insert(response_id, analysis.clone());
        Ok(analysis)
    }

    async fn analyzed_count(&self, interview_id: Uuid) -> Result<usize, LedgerError> {
        let inner = self.inner.read();
        Ok(inner
            .responses
            .values()
            .filter(|r| r.interview_id == interview_id && inner.analyses.contains_key(&r.id))
            .count())
    }

    async fn responses(
        &self,
        interview_id: Uuid,
    ) -> Result<Vec<(VideoResponse, Option<AiAnalysis>)>, LedgerError> {
        let inner = self.inner.read();
        let mut rows: Vec<(VideoResponse, Option<AiAnalysis>)> = inner
            .responses
            .values()
            .filter(|r| r.interview_id == interview_id)
            .map(|r| (r.clone(), inner.analyses.get(&r.id).cloned()))
            .collect();
        rows.sort_by_key(|(r, _)| r.created_at);
        Ok(rows)
    }

    async fn complete_interview(
        &self,
        interview_id: Uuid,
        overall_score: i32,
        summary: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, LedgerError> {
        let mut inner = self.inner.write();
        let interview = inner
            .interviews
            .get_mut(&interview_id)
            .ok_or(LedgerError::InterviewNotFound(interview_id))?;

        if interview.status == InterviewStatus::Completed {
            return Ok(false);
        }

        interview.status = InterviewStatus::Completed;
        interview.completed_at = Some(completed_at);
        interview.overall_score = Some(overall_score);
        interview.summary = Some(summary.to_string());
        Ok(true)
    }
}

#[async_trait]
impl QuestionProvider for MemoryLedger {
    async fn questions_for_job(&self, job_id: Uuid) -> Result<Vec<InterviewQuestion>, LedgerError> {
        let mut questions: Vec<InterviewQuestion> = self
            .inner
            .read()
            .questions
            .iter()
            .filter(|q| q.job_id == job_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| q.order_index);
        Ok(questions)
    }
}
