//! Analysis invocation
//!
//! The invoker calls the remote analysis capability for an uploaded clip
//! and absorbs every possible failure into the deterministic fallback
//! result. Analysis can degrade an evaluation; it can never block a
//! submission.

use super::types::{AnalysisBody, AnalysisResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

fn default_timeout_secs() -> u64 {
    30
}

/// Configuration for the remote analysis capability
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// Endpoint that scores a single response
    pub endpoint: String,

    /// Bearer token sent with each request (if the capability needs one)
    pub bearer_token: Option<String>,

    /// Per-request timeout; a hung capability must not hang a submission
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl AnalysisConfig {
    /// Configuration for an endpoint with the default timeout
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            bearer_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Request sent to the analysis capability
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// Locator of the uploaded clip
    pub video_url: String,

    /// The question the candidate was answering
    pub question: String,

    /// Candidate name, for transcript context
    pub candidate_name: String,
}

/// A single capability call that failed outright
#[derive(Debug, Error)]
pub enum AnalysisCallError {
    #[error("analysis request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("analysis reply was not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One attempt against the remote scorer
///
/// Implementations report transport-level failure through `Err`; a reply
/// that arrived but is unusable is the invoker's problem to detect.
#[async_trait]
pub trait AnalysisCapability: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisBody, AnalysisCallError>;
}

/// HTTP client for the analysis capability
pub struct HttpAnalysisClient {
    client: reqwest::Client,
    config: AnalysisConfig,
}

impl HttpAnalysisClient {
    /// Build a client with bounded request and connect timeouts
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisCallError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl AnalysisCapability for HttpAnalysisClient {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisBody, AnalysisCallError> {
        let mut call = self.client.post(&self.config.endpoint).json(request);
        if let Some(token) = &self.config.bearer_token {
            call = call.bearer_auth(token);
        }

        let response = call.send().await?;
        let status = response.status();
        if !status.is_success() {
            // Some capabilities return a usable body alongside an error
            // status; let validation decide instead of bailing here.
            tracing::warn!("Analysis capability returned {}, still reading body", status);
        }

        let text = response.text().await?;
        let body = serde_json::from_str::<AnalysisBody>(&text)?;
        Ok(body)
    }
}

/// Invokes analysis for uploaded clips; never fails
pub struct AnalysisInvoker {
    capability: Arc<dyn AnalysisCapability>,
}

impl AnalysisInvoker {
    pub fn new(capability: Arc<dyn AnalysisCapability>) -> Self {
        Self { capability }
    }

    /// Analyze one uploaded clip
    ///
    /// Always returns a result: a failed call, an undecodable reply, or a
    /// reply missing required fields all collapse to
    /// [`AnalysisResult::fallback`].
    pub async fn analyze(
        &self,
        video_url: &str,
        question: &str,
        candidate_name: &str,
    ) -> AnalysisResult {
        let request = AnalysisRequest {
            video_url: video_url.to_string(),
            question: question.to_string(),
            candidate_name: candidate_name.to_string(),
        };

        match self.capability.analyze(&request).await {
            Ok(body) => match body.into_result() {
                Some(result) => {
                    tracing::debug!("Analysis scored {}/10 for {}", result.score, video_url);
                    result
                }
                None => {
                    tracing::warn!(
                        "Analysis reply for {} missing required fields, recording fallback",
                        video_url
                    );
                    AnalysisResult::fallback()
                }
            },
            Err(e) => {
                tracing::warn!("Analysis call for {} failed ({}), recording fallback", video_url, e);
                AnalysisResult::fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::{FALLBACK_SCORE, FALLBACK_TRANSCRIPT};
    use parking_lot::Mutex;

    enum Scripted {
        Reply(AnalysisBody),
        Fail,
    }

    struct ScriptedCapability {
        replies: Mutex<Vec<Scripted>>,
        calls: Mutex<Vec<AnalysisRequest>>,
    }

    impl ScriptedCapability {
        fn new(replies: Vec<Scripted>) -> Self {
            Self {
                replies: Mutex::new(replies),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AnalysisCapability for ScriptedCapability {
        async fn analyze(
            &self,
            request: &AnalysisRequest,
        ) -> Result<AnalysisBody, AnalysisCallError> {
            self.calls.lock().push(request.clone());
            let scripted = self.replies.lock().remove(0);
            match scripted {
                Scripted::Reply(body) => Ok(body),
                // A refused connection is the simplest honest transport error
                Scripted::Fail => {
                    let err = reqwest::Client::new()
                        .get("http://127.0.0.1:1/unreachable")
                        .send()
                        .await
                        .unwrap_err();
                    Err(AnalysisCallError::Transport(err))
                }
            }
        }
    }

    fn scored_body(score: i64) -> AnalysisBody {
        AnalysisBody {
            transcript: Some("A fine answer.".to_string()),
            sentiment: Some("neutral".to_string()),
            tone: Some("calm".to_string()),
            score: Some(score),
            feedback: Some("Adequate depth.".to_string()),
            has_inappropriate_language: Some(false),
        }
    }

    #[tokio::test]
    async fn test_valid_reply_passes_through() {
        let capability = Arc::new(ScriptedCapability::new(vec![Scripted::Reply(scored_body(7))]));
        let invoker = AnalysisInvoker::new(capability.clone());

        let result = invoker.analyze("mem://clip", "Why us?", "Dana").await;
        assert_eq!(result.score, 7);
        assert_eq!(result.transcript, "A fine answer.");

        let calls = capability.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].video_url, "mem://clip");
        assert_eq!(calls[0].candidate_name, "Dana");
    }

    #[tokio::test]
    async fn test_failed_call_becomes_fallback() {
        let capability = Arc::new(ScriptedCapability::new(vec![Scripted::Fail]));
        let invoker = AnalysisInvoker::new(capability);

        let result = invoker.analyze("mem://clip", "Why us?", "Dana").await;
        assert_eq!(result.score, FALLBACK_SCORE);
        assert_eq!(result.transcript, FALLBACK_TRANSCRIPT);
    }

    #[tokio::test]
    async fn test_incomplete_reply_becomes_fallback() {
        let body = AnalysisBody {
            transcript: Some("Partial.".to_string()),
            ..Default::default()
        };
        let capability = Arc::new(ScriptedCapability::new(vec![Scripted::Reply(body)]));
        let invoker = AnalysisInvoker::new(capability);

        let result = invoker.analyze("mem://clip", "Why us?", "Dana").await;
        assert_eq!(result.score, FALLBACK_SCORE);
        // The partial transcript is discarded, not mixed into the fallback
        assert_eq!(result.transcript, FALLBACK_TRANSCRIPT);
    }

    #[tokio::test]
    async fn test_out_of_range_score_becomes_fallback() {
        let capability =
            Arc::new(ScriptedCapability::new(vec![Scripted::Reply(scored_body(42))]));
        let invoker = AnalysisInvoker::new(capability);

        let result = invoker.analyze("mem://clip", "Why us?", "Dana").await;
        assert_eq!(result.score, FALLBACK_SCORE);
    }

    #[test]
    fn test_non_json_reply_maps_to_decode_error() {
        let err = serde_json::from_str::<AnalysisBody>("<html>service down</html>")
            .map_err(AnalysisCallError::from)
            .unwrap_err();
        assert!(matches!(err, AnalysisCallError::Decode(_)));
    }
}
