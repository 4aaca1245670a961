//! Durability scenarios over the SQLite-backed ledger.
//!
//! The in-module ledger tests cover single-connection behavior; these
//! exercise what survives a process restart (fresh connection on the
//! same file) and run the full submission pipeline against SQLite.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use vetscreen::analysis::{
    AnalysisBody, AnalysisCallError, AnalysisCapability, AnalysisRequest, AnalysisResult,
    Sentiment,
};
use vetscreen::device::SimulatedDevice;
use vetscreen::ledger::{
    Interview, InterviewQuestion, InterviewStatus, QuestionProvider, ResponseLedger, SqliteLedger,
};
use vetscreen::session::InterviewSession;
use vetscreen::storage::MemoryClipStore;

fn seeded(
    ledger: &SqliteLedger,
    question_texts: &[&str],
) -> (Interview, Vec<InterviewQuestion>) {
    let job_id = Uuid::new_v4();
    let questions: Vec<InterviewQuestion> = question_texts
        .iter()
        .enumerate()
        .map(|(i, text)| InterviewQuestion::new(job_id, *text, i as u32))
        .collect();
    let interview = Interview::new(job_id, "Priya Shah", "priya@example.com");
    ledger.insert_interview(&interview).expect("seed interview");
    ledger.insert_questions(&questions).expect("seed questions");
    (interview, questions)
}

fn scored(score: u8) -> AnalysisResult {
    AnalysisResult {
        transcript: "I would start by reproducing the failure.".to_string(),
        sentiment: Sentiment::Positive,
        tone: "confident".to_string(),
        score,
        feedback: "Clear and methodical.".to_string(),
        has_inappropriate_language: false,
    }
}

#[tokio::test]
async fn test_rows_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("interviews.db");

    let (interview, questions) = {
        let ledger = SqliteLedger::open(&path).unwrap();
        let (interview, questions) = seeded(&ledger, &["Q1", "Q2"]);
        ledger.mark_in_progress(interview.id).await.unwrap();
        let response = ledger
            .record_response(interview.id, questions[0].id, "mem://clips/a.webm", 42)
            .await
            .unwrap();
        ledger
            .record_analysis(response.id, &scored(9))
            .await
            .unwrap();
        (interview, questions)
    };

    // A fresh connection sees everything the first one wrote
    let reopened = SqliteLedger::open(&path).unwrap();
    let found = reopened
        .resolve_by_link(&interview.interview_link)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, interview.id);
    assert_eq!(found.status, InterviewStatus::InProgress);

    let loaded = reopened.questions_for_job(interview.job_id).await.unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].id, questions[0].id);

    assert_eq!(reopened.analyzed_count(interview.id).await.unwrap(), 1);
    let rows = reopened.responses(interview.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    let (response, analysis) = &rows[0];
    assert_eq!(response.video_url, "mem://clips/a.webm");
    assert_eq!(response.duration_secs, 42);
    let analysis = analysis.as_ref().unwrap();
    assert_eq!(analysis.score, 9);
    assert_eq!(analysis.sentiment, Sentiment::Positive);
}

#[tokio::test]
async fn test_replaced_response_reopens_without_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("interviews.db");

    let ledger = SqliteLedger::open(&path).unwrap();
    let (interview, questions) = seeded(&ledger, &["Q1"]);
    let first = ledger
        .record_response(interview.id, questions[0].id, "mem://clips/a.webm", 10)
        .await
        .unwrap();
    ledger
        .record_analysis(first.id, &scored(3))
        .await
        .unwrap();

    // Resubmitting the question replaces the row and orphans the analysis
    let second = ledger
        .record_response(interview.id, questions[0].id, "mem://clips/b.webm", 15)
        .await
        .unwrap();
    assert_eq!(second.id, first.id);
    drop(ledger);

    let reopened = SqliteLedger::open(&path).unwrap();
    let rows = reopened.responses(interview.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0.video_url, "mem://clips/b.webm");
    assert!(rows[0].1.is_none());
    assert_eq!(reopened.analyzed_count(interview.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_completion_is_one_shot_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("interviews.db");

    let ledger = SqliteLedger::open(&path).unwrap();
    let (interview, questions) = seeded(&ledger, &["Q1"]);
    let response = ledger
        .record_response(interview.id, questions[0].id, "mem://clips/a.webm", 30)
        .await
        .unwrap();
    ledger
        .record_analysis(response.id, &scored(8))
        .await
        .unwrap();
    let completed_at = chrono::Utc::now();
    assert!(ledger
        .complete_interview(interview.id, 8, "Done.", completed_at)
        .await
        .unwrap());

    // A second connection cannot complete it again or overwrite the record
    let other = SqliteLedger::open(&path).unwrap();
    assert!(!other
        .complete_interview(interview.id, 1, "Overwritten.", chrono::Utc::now())
        .await
        .unwrap());
    let row = other.interview(interview.id).await.unwrap().unwrap();
    assert_eq!(row.status, InterviewStatus::Completed);
    assert_eq!(row.overall_score, Some(8));
    assert_eq!(row.summary.as_deref(), Some("Done."));
    assert_eq!(
        row.completed_at.map(|t| t.timestamp()),
        Some(completed_at.timestamp())
    );
}

/// Scores a question by the digit in its text; "flaky" questions fail
struct DigitCapability;

#[async_trait]
impl AnalysisCapability for DigitCapability {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisBody, AnalysisCallError> {
        if request.question.contains("flaky") {
            let err = reqwest::Client::new()
                .get("http://127.0.0.1:9/analyze-response")
                .timeout(Duration::from_millis(300))
                .send()
                .await
                .unwrap_err();
            return Err(AnalysisCallError::Transport(err));
        }
        let score: i64 = request
            .question
            .chars()
            .find_map(|c| c.to_digit(10))
            .unwrap_or(5) as i64;
        Ok(AnalysisBody {
            transcript: Some("A full answer.".to_string()),
            sentiment: Some("neutral".to_string()),
            tone: Some("even".to_string()),
            score: Some(score),
            feedback: Some("Fine.".to_string()),
            has_inappropriate_language: Some(false),
        })
    }
}

#[tokio::test]
async fn test_full_interview_over_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("interviews.db");

    let ledger = Arc::new(SqliteLedger::open(&path).unwrap());
    let (interview, _) = seeded(&ledger, &["Score 8 please", "flaky one", "Score 9 please"]);

    let device = SimulatedDevice::new().with_clip_duration(Duration::from_secs(5));
    let session = InterviewSession::open(
        &interview.interview_link,
        Arc::new(device),
        Arc::new(MemoryClipStore::new()),
        Arc::new(DigitCapability),
        ledger.clone(),
        ledger.clone(),
    )
    .await
    .unwrap();

    for index in [2, 0, 1] {
        session.start_recording(index).await.unwrap();
        session.stop_recording(index).await.unwrap();
        session.submit(index).await.unwrap();
    }
    session.close().await;
    drop(session);
    drop(ledger);

    // (8 + 5 + 9) / 3 = 7.33 -> 7, durably recorded
    let reopened = SqliteLedger::open(&path).unwrap();
    let row = reopened.interview(interview.id).await.unwrap().unwrap();
    assert_eq!(row.status, InterviewStatus::Completed);
    assert_eq!(row.overall_score, Some(7));
    assert_eq!(
        row.summary.as_deref(),
        Some("Interview completed with 3 responses. Average score: 7/10.")
    );
    assert!(row.completed_at.is_some());

    let rows = reopened.responses(interview.id).await.unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|(r, _)| r.duration_secs == 5));
    let fallback = rows
        .iter()
        .find_map(|(_, a)| {
            a.as_ref()
                .filter(|analysis| analysis.transcript == "Analysis failed")
        })
        .expect("the flaky question fell back");
    assert_eq!(fallback.score, 5);
    assert_eq!(fallback.tone, "unclear");
}
