//! SQLite-backed ledger
//!
//! Durable ledger over a single SQLite file. The (interview, question)
//! uniqueness and the one-per-response analysis rule are enforced by the
//! schema itself, so they hold even against concurrent writers.

use super::models::{AiAnalysis, Interview, InterviewQuestion, InterviewStatus, VideoResponse};
use super::traits::{LedgerError, QuestionProvider, ResponseLedger};
use crate::analysis::{AnalysisResult, Sentiment};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::fs;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS interviews (
    id TEXT PRIMARY KEY,
    job_id TEXT NOT NULL,
    candidate_name TEXT NOT NULL,
    candidate_email TEXT NOT NULL,
    status TEXT NOT NULL,
    interview_link TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL,
    completed_at TEXT,
    overall_score INTEGER,
    summary TEXT
);

CREATE TABLE IF NOT EXISTS interview_questions (
    id TEXT PRIMARY KEY,
    job_id TEXT NOT NULL,
    question TEXT NOT NULL,
    order_index INTEGER NOT NULL,
    UNIQUE (job_id, order_index)
);

CREATE TABLE IF NOT EXISTS video_responses (
    id TEXT PRIMARY KEY,
    interview_id TEXT NOT NULL REFERENCES interviews(id) ON DELETE CASCADE,
    question_id TEXT NOT NULL,
    video_url TEXT NOT NULL,
    duration INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (interview_id, question_id)
);

CREATE TABLE IF NOT EXISTS ai_analysis (
    id TEXT PRIMARY KEY,
    response_id TEXT NOT NULL UNIQUE REFERENCES video_responses(id) ON DELETE CASCADE,
    transcript TEXT NOT NULL,
    sentiment TEXT NOT NULL,
    tone TEXT NOT NULL,
    score INTEGER NOT NULL,
    feedback TEXT NOT NULL,
    has_inappropriate_language INTEGER NOT NULL,
    manager_feedback TEXT,
    manager_feedback_by TEXT,
    manager_feedback_at TEXT,
    created_at TEXT NOT NULL
);
";

/// A stored value that no longer parses as its domain type
#[derive(Debug, Error)]
#[error("invalid stored value: {0}")]
struct InvalidColumn(String);

fn uuid_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let value: String = row.get(idx)?;
    Uuid::parse_str(&value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn status_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<InterviewStatus> {
    let value: String = row.get(idx)?;
    InterviewStatus::parse(&value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(InvalidColumn(value)))
    })
}

fn sentiment_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Sentiment> {
    let value: String = row.get(idx)?;
    Sentiment::parse(&value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(InvalidColumn(value)))
    })
}

fn map_interview(row: &Row<'_>) -> rusqlite::Result<Interview> {
    Ok(Interview {
        id: uuid_col(row, 0)?,
        job_id: uuid_col(row, 1)?,
        candidate_name: row.get(2)?,
        candidate_email: row.get(3)?,
        status: status_col(row, 4)?,
        interview_link: row.get(5)?,
        created_at: row.get(6)?,
        completed_at: row.get(7)?,
        overall_score: row.get(8)?,
        summary: row.get(9)?,
    })
}

fn map_question(row: &Row<'_>) -> rusqlite::Result<InterviewQuestion> {
    Ok(InterviewQuestion {
        id: uuid_col(row, 0)?,
        job_id: uuid_col(row, 1)?,
        question: row.get(2)?,
        order_index: row.get(3)?,
    })
}

fn map_response(row: &Row<'_>) -> rusqlite::Result<VideoResponse> {
    Ok(VideoResponse {
        id: uuid_col(row, 0)?,
        interview_id: uuid_col(row, 1)?,
        question_id: uuid_col(row, 2)?,
        video_url: row.get(3)?,
        duration_secs: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn map_analysis_at(row: &Row<'_>, base: usize) -> rusqlite::Result<AiAnalysis> {
    Ok(AiAnalysis {
        id: uuid_col(row, base)?,
        response_id: uuid_col(row, base + 1)?,
        transcript: row.get(base + 2)?,
        sentiment: sentiment_col(row, base + 3)?,
        tone: row.get(base + 4)?,
        score: row.get(base + 5)?,
        feedback: row.get(base + 6)?,
        has_inappropriate_language: row.get(base + 7)?,
        manager_feedback: row.get(base + 8)?,
        manager_feedback_by: row.get(base + 9)?,
        manager_feedback_at: row.get(base + 10)?,
        created_at: row.get(base + 11)?,
    })
}

/// Ledger persisted to a SQLite database file
pub struct SqliteLedger {
    conn: Mutex<Connection>,
}

impl SqliteLedger {
    /// Open (or create) the database at `path` and run migrations
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> Result<Self, LedgerError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, LedgerError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!("Ledger schema ready");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Seed an interview (setup/admin path)
    pub fn insert_interview(&self, interview: &Interview) -> Result<(), LedgerError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO interviews (id, job_id, candidate_name, candidate_email, status,
                                     interview_link, created_at, completed_at, overall_score, summary)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                interview.id.to_string(),
                interview.job_id.to_string(),
                interview.candidate_name,
                interview.candidate_email,
                interview.status.as_str(),
                interview.interview_link,
                interview.created_at,
                interview.completed_at,
                interview.overall_score,
                interview.summary,
            ],
        )?;
        Ok(())
    }

    /// Seed a job's questions (setup/admin path)
    pub fn insert_questions(&self, questions: &[InterviewQuestion]) -> Result<(), LedgerError> {
        let conn = self.conn.lock();
        for question in questions {
            conn.execute(
                "INSERT INTO interview_questions (id, job_id, question, order_index)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    question.id.to_string(),
                    question.job_id.to_string(),
                    question.question,
                    question.order_index,
                ],
            )?;
        }
        Ok(())
    }
}

#[async_trait]
impl ResponseLedger for SqliteLedger {
    async fn resolve_by_link(&self, link: &str) -> Result<Option<Interview>, LedgerError> {
        let conn = self.conn.lock();
        let interview = conn
            .query_row(
                "SELECT id, job_id, candidate_name, candidate_email, status, interview_link,
                        created_at, completed_at, overall_score, summary
                 FROM interviews WHERE interview_link = ?1",
                params![link],
                map_interview,
            )
            .optional()?;
        Ok(interview)
    }

    async fn interview(&self, interview_id: Uuid) -> Result<Option<Interview>, LedgerError> {
        let conn = self.conn.lock();
        let interview = conn
            .query_row(
                "SELECT id, job_id, candidate_name, candidate_email, status, interview_link,
                        created_at, completed_at, overall_score, summary
                 FROM interviews WHERE id = ?1",
                params![interview_id.to_string()],
                map_interview,
            )
            .optional()?;
        Ok(interview)
    }

    async fn mark_in_progress(&self, interview_id: Uuid) -> Result<(), LedgerError> {
        let conn = self.conn.lock();
        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM interviews WHERE id = ?1",
                params![interview_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(LedgerError::InterviewNotFound(interview_id));
        }

        conn.execute(
            "UPDATE interviews SET status = 'in_progress' WHERE id = ?1 AND status = 'pending'",
            params![interview_id.to_string()],
        )?;
        Ok(())
    }

    async fn record_response(
        &self,
        interview_id: Uuid,
        question_id: Uuid,
        video_url: &str,
        duration_secs: u32,
    ) -> Result<VideoResponse, LedgerError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let exists: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM interviews WHERE id = ?1",
                params![interview_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(LedgerError::InterviewNotFound(interview_id));
        }

        tx.execute(
            "INSERT INTO video_responses (id, interview_id, question_id, video_url, duration, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (interview_id, question_id)
             DO UPDATE SET video_url = excluded.video_url,
                           duration = excluded.duration,
                           created_at = excluded.created_at",
            params![
                Uuid::new_v4().to_string(),
                interview_id.to_string(),
                question_id.to_string(),
                video_url,
                duration_secs,
                Utc::now(),
            ],
        )?;

        // Read the canonical row; a replaced response keeps its original id
        let response = tx.query_row(
            "SELECT id, interview_id, question_id, video_url, duration, created_at
             FROM video_responses WHERE interview_id = ?1 AND question_id = ?2",
            params![interview_id.to_string(), question_id.to_string()],
            map_response,
        )?;

        // A replaced clip's evaluation no longer applies
        tx.execute(
            "DELETE FROM ai_analysis WHERE response_id = ?1",
            params![response.id.to_string()],
        )?;

        tx.commit()?;
        Ok(response)
    }

    async fn record_analysis(
        &self,
        response_id: Uuid,
        result: &AnalysisResult,
    ) -> Result<AiAnalysis, LedgerError> {
        let conn = self.conn.lock();
        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM video_responses WHERE id = ?1",
                params![response_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(LedgerError::ResponseNotFound(response_id));
        }

        let analysis = AiAnalysis::from_result(response_id, result);
        conn.execute(
            "INSERT INTO ai_analysis (id, response_id, transcript, sentiment, tone, score,
                                      feedback, has_inappropriate_language, manager_feedback,
                                      manager_feedback_by, manager_feedback_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT (response_id)
             DO UPDATE SET id = excluded.id,
                           transcript = excluded.transcript,
                           sentiment = excluded.sentiment,
                           tone = excluded.tone,
                           score = excluded.score,
                           feedback = excluded.feedback,
                           has_inappropriate_language = excluded.has_inappropriate_language,
                           created_at = excluded.created_at",
            params![
                analysis.id.to_string(),
                analysis.response_id.to_string(),
                analysis.transcript,
                analysis.sentiment.as_str(),
                analysis.tone,
                analysis.score,
                analysis.feedback,
                analysis.has_inappropriate_language,
                analysis.manager_feedback,
                analysis.manager_feedback_by,
                analysis.manager_feedback_at,
                analysis.created_at,
            ],
        )?;

        // Read the canonical row; re-recording preserves any manager feedback
        let stored = conn.query_row(
            "SELECT id, response_id, transcript, sentiment, tone, score, feedback,
                    has_inappropriate_language, manager_feedback, manager_feedback_by,
                    manager_feedback_at, created_at
             FROM ai_analysis WHERE response_id = ?1",
            params![response_id.to_string()],
            |row| map_analysis_at(row, 0),
        )?;
        Ok(stored)
    }

    async fn analyzed_count(&self, interview_id: Uuid) -> Result<usize, LedgerError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*)
             FROM video_responses vr
             JOIN ai_analysis aa ON aa.response_id = vr.id
             WHERE vr.interview_id = ?1",
            params![interview_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    async fn responses(
        &self,
        interview_id: Uuid,
    ) -> Result<Vec<(VideoResponse, Option<AiAnalysis>)>, LedgerError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT vr.id, vr.interview_id, vr.question_id, vr.video_url, vr.duration, vr.created_at,
                    aa.id, aa.response_id, aa.transcript, aa.sentiment, aa.tone, aa.score,
                    aa.feedback, aa.has_inappropriate_language, aa.manager_feedback,
                    aa.manager_feedback_by, aa.manager_feedback_at, aa.created_at
             FROM video_responses vr
             LEFT JOIN ai_analysis aa ON aa.response_id = vr.id
             WHERE vr.interview_id = ?1
             ORDER BY vr.created_at ASC",
        )?;

        let rows = stmt.query_map(params![interview_id.to_string()], |row| {
            let response = map_response(row)?;
            let analysis = match row.get::<_, Option<String>>(6)? {
                Some(_) => Some(map_analysis_at(row, 6)?),
                None => None,
            };
            Ok((response, analysis))
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    async fn complete_interview(
        &self,
        interview_id: Uuid,
        overall_score: i32,
        summary: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, LedgerError> {
        let conn = self.conn.lock();
        let status: Option<String> = conn
            .query_row(
                "SELECT status FROM interviews WHERE id = ?1",
                params![interview_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        match status.as_deref() {
            None => Err(LedgerError::InterviewNotFound(interview_id)),
            Some("completed") => Ok(false),
            Some(_) => {
                let updated = conn.execute(
                    "UPDATE interviews
                     SET status = 'completed', completed_at = ?2, overall_score = ?3, summary = ?4
                     WHERE id = ?1 AND status != 'completed'",
                    params![interview_id.to_string(), completed_at, overall_score, summary],
                )?;
                Ok(updated == 1)
            }
        }
    }
}

#[async_trait]
impl QuestionProvider for SqliteLedger {
    async fn questions_for_job(&self, job_id: Uuid) -> Result<Vec<InterviewQuestion>, LedgerError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, job_id, question, order_index
             FROM interview_questions WHERE job_id = ?1
             ORDER BY order_index ASC",
        )?;
        let rows = stmt.query_map(params![job_id.to_string()], map_question)?;

        let mut questions = Vec::new();
        for row in rows {
            questions.push(row?);
        }
        Ok(questions)
    }
}
