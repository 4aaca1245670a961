//! Interview completion evaluation
//!
//! Decides, after each analyzed submission, whether the interview is done,
//! and performs the one-shot completion write (overall score, summary,
//! timestamp) when it is.

use crate::ledger::{LedgerError, ResponseLedger};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Result of a completion check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Not every question has an analyzed response yet
    Pending { analyzed: usize, total: usize },
    /// This check performed the completion write
    Completed { overall_score: i32 },
    /// The interview was already completed by an earlier check
    AlreadyCompleted,
}

/// Evaluates and finalizes interview completion
pub struct CompletionEvaluator {
    ledger: Arc<dyn ResponseLedger>,
    total_questions: usize,
}

impl CompletionEvaluator {
    /// Create an evaluator for an interview with a known question count
    pub fn new(ledger: Arc<dyn ResponseLedger>, total_questions: usize) -> Self {
        Self {
            ledger,
            total_questions,
        }
    }

    /// Check whether the interview is complete; finalize it if so
    ///
    /// Idempotent: once an interview is completed, every later call is a
    /// no-op reporting `AlreadyCompleted`. Safe to re-run after a failed
    /// check; nothing is cached between calls.
    pub async fn evaluate(&self, interview_id: Uuid) -> Result<CompletionOutcome, LedgerError> {
        let interview = self
            .ledger
            .interview(interview_id)
            .await?
            .ok_or(LedgerError::InterviewNotFound(interview_id))?;
        if interview.completed_at.is_some() {
            return Ok(CompletionOutcome::AlreadyCompleted);
        }

        let analyzed = self.ledger.analyzed_count(interview_id).await?;
        if self.total_questions == 0 || analyzed < self.total_questions {
            tracing::debug!(
                "Interview {} at {}/{} analyzed responses",
                interview_id,
                analyzed,
                self.total_questions
            );
            return Ok(CompletionOutcome::Pending {
                analyzed,
                total: self.total_questions,
            });
        }

        // Every question is answered and analyzed; compute the overall
        // score from what was actually recorded (fallbacks included)
        let responses = self.ledger.responses(interview_id).await?;
        let scores: Vec<i32> = responses
            .iter()
            .filter_map(|(_, analysis)| analysis.as_ref().map(|a| a.score as i32))
            .collect();
        let overall_score = round_mean(&scores);
        let summary = completion_summary(scores.len(), overall_score);

        let newly_completed = self
            .ledger
            .complete_interview(interview_id, overall_score, &summary, Utc::now())
            .await?;
        if newly_completed {
            tracing::info!(
                "Interview {} completed with overall score {}/10",
                interview_id,
                overall_score
            );
            Ok(CompletionOutcome::Completed { overall_score })
        } else {
            // A concurrent submission finished the interview first
            Ok(CompletionOutcome::AlreadyCompleted)
        }
    }
}

/// Mean of the scores, rounded half-up to the nearest integer
fn round_mean(scores: &[i32]) -> i32 {
    if scores.is_empty() {
        return 0;
    }
    let sum: i32 = scores.iter().sum();
    (sum as f64 / scores.len() as f64).round() as i32
}

/// Reviewer-facing summary line written at completion
fn completion_summary(response_count: usize, overall_score: i32) -> String {
    format!(
        "Interview completed with {} responses. Average score: {}/10.",
        response_count, overall_score
    )
}
