//! End-to-end walkthrough of an unattended interview over simulated
//! backends: in-memory ledger and clip store, simulated camera, and a
//! scripted analysis capability with one question's analysis failing.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use vetscreen::analysis::{AnalysisBody, AnalysisCallError, AnalysisCapability, AnalysisRequest};
use vetscreen::device::SimulatedDevice;
use vetscreen::error::ErrorResponse;
use vetscreen::ledger::{Interview, InterviewQuestion, MemoryLedger, ResponseLedger};
use vetscreen::recorder::format_time;
use vetscreen::session::InterviewSession;
use vetscreen::storage::MemoryClipStore;

/// Scores keyed by question text; a missing entry fails the call
struct ScriptedCapability {
    scores: HashMap<String, i64>,
}

#[async_trait]
impl AnalysisCapability for ScriptedCapability {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisBody, AnalysisCallError> {
        match self.scores.get(&request.question) {
            Some(&score) => Ok(AnalysisBody {
                transcript: Some(format!(
                    "{} gave a structured answer to \"{}\".",
                    request.candidate_name, request.question
                )),
                sentiment: Some("positive".to_string()),
                tone: Some("confident".to_string()),
                score: Some(score),
                feedback: Some("Clear, relevant and well paced.".to_string()),
                has_inappropriate_language: Some(false),
            }),
            None => {
                // A connect to the discard port fails immediately, which is
                // as close to a dead capability as a demo can get
                let err = reqwest::Client::new()
                    .get("http://127.0.0.1:9/analyze-response")
                    .timeout(Duration::from_millis(300))
                    .send()
                    .await
                    .unwrap_err();
                Err(AnalysisCallError::Transport(err))
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    vetscreen::init_tracing();

    // Seed the backing stores the way an employer-side tool would
    let ledger = Arc::new(MemoryLedger::new());
    let job_id = Uuid::new_v4();
    let questions = vec![
        InterviewQuestion::new(job_id, "Walk us through your most recent project.", 0),
        InterviewQuestion::new(job_id, "Describe a conflict you resolved on a team.", 1),
        InterviewQuestion::new(job_id, "Why do you want this role?", 2),
    ];
    let interview = Interview::new(job_id, "Jordan Alvarez", "jordan@example.com");
    let link = interview.interview_link.clone();
    ledger.insert_interview(interview);
    ledger.insert_questions(questions.clone());

    let store = Arc::new(MemoryClipStore::new());
    let device = Arc::new(SimulatedDevice::new());

    // The second question's analysis will fail and fall back
    let mut scores = HashMap::new();
    scores.insert(questions[0].question.clone(), 8);
    scores.insert(questions[2].question.clone(), 9);
    let capability = Arc::new(ScriptedCapability { scores });

    // A dead link never opens a session
    println!("Opening a dead link first...");
    match InterviewSession::open(
        "expired-link",
        device.clone(),
        store.clone(),
        capability.clone(),
        ledger.clone(),
        ledger.clone(),
    )
    .await
    {
        Ok(_) => println!("  unexpectedly opened"),
        Err(e) => {
            let response = ErrorResponse::from(e);
            println!("  rejected: [{}] {}", response.code, response.message);
        }
    }

    println!("\nOpening the real interview link...");
    let session = InterviewSession::open(
        &link,
        device,
        store.clone(),
        capability,
        ledger.clone(),
        ledger.clone(),
    )
    .await?;
    println!(
        "  candidate: {} | device ready: {}",
        session.interview().candidate_name,
        session.device_ready()
    );
    if let Some(frame) = session.preview().borrow().as_ref() {
        println!("  preview: {}x{} frame", frame.width, frame.height);
    }

    // Answer out of order: 2, then 1 (after a retake), then 3
    for &index in &[1usize, 0, 2] {
        let question = &questions[index];
        println!("\nQuestion {}: {}", index + 1, question.question);

        session.start_recording(index).await?;
        tokio::time::sleep(Duration::from_millis(1200)).await;
        let duration_secs = session.stop_recording(index).await?;
        println!("  recorded {} of answer", format_time(duration_secs as u64));

        if index == 0 {
            // One nervous retake for the first question
            session.retake(index)?;
            println!("  retake: clip discarded, recording again");
            session.start_recording(index).await?;
            tokio::time::sleep(Duration::from_millis(1500)).await;
            session.stop_recording(index).await?;
        }

        let outcome = session.submit(index).await?;
        println!(
            "  submitted: score {}/10 ({})",
            outcome.analysis.score,
            outcome.analysis.sentiment.as_str()
        );
        if let Some(completion) = &outcome.completion {
            println!("  completion: {:?}", completion);
        }
    }

    println!("\nPer-question progress:");
    for progress in session.progress() {
        println!(
            "  {}. {:?} ({})",
            progress.question_index + 1,
            progress.state,
            format_time(progress.elapsed_secs)
        );
    }
    println!("All submitted: {}", session.is_all_submitted());

    // The completion write happened on the last submission
    let (final_interview, responses) = {
        let stored = ledger
            .interview(session.interview().id)
            .await?
            .expect("interview row");
        let responses = ledger.responses(stored.id).await?;
        (stored, responses)
    };
    println!("\nFinal interview row:");
    println!("  status: {:?}", final_interview.status);
    println!("  overall score: {:?}", final_interview.overall_score);
    println!("  summary: {}", final_interview.summary.as_deref().unwrap_or("-"));
    println!("  stored objects: {}", store.object_count());
    println!("  responses:");
    for (response, analysis) in &responses {
        let score = analysis.as_ref().map(|a| a.score).unwrap_or(0);
        println!(
            "    {}s clip -> {} (score {}/10)",
            response.duration_secs, response.video_url, score
        );
    }

    session.close().await;
    Ok(())
}
