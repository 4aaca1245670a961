//! Analysis result types
//!
//! Defines the evaluation attached to each response and the validation of
//! untrusted capability replies into that shape.

use serde::{Deserialize, Serialize};

/// Score assigned when analysis cannot produce a real one
pub const FALLBACK_SCORE: u8 = 5;

/// Tone recorded on a fallback result
pub const FALLBACK_TONE: &str = "unclear";

/// Transcript placeholder recorded on a fallback result
pub const FALLBACK_TRANSCRIPT: &str = "Analysis failed";

/// Reviewer-facing note recorded on a fallback result
pub const FALLBACK_FEEDBACK: &str = "Automatic analysis failed. Manual review may be required.";

/// Overall sentiment of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }

    /// Lenient parse of a capability-supplied sentiment string
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("positive") {
            Some(Self::Positive)
        } else if value.eq_ignore_ascii_case("neutral") {
            Some(Self::Neutral)
        } else if value.eq_ignore_ascii_case("negative") {
            Some(Self::Negative)
        } else {
            None
        }
    }
}

/// Evaluation of a single recorded response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Transcribed answer text
    pub transcript: String,

    /// Overall sentiment
    pub sentiment: Sentiment,

    /// Free-form tone description (e.g. "confident", "hesitant")
    pub tone: String,

    /// Score from 1 to 10
    pub score: u8,

    /// Reviewer-facing evaluation notes
    pub feedback: String,

    /// Whether inappropriate language was detected
    pub has_inappropriate_language: bool,
}

impl AnalysisResult {
    /// The deterministic result recorded when analysis fails
    ///
    /// Keeps the interview moving: a broken capability still yields a row,
    /// flagged for manual review, and never blocks completion.
    pub fn fallback() -> Self {
        Self {
            transcript: FALLBACK_TRANSCRIPT.to_string(),
            sentiment: Sentiment::Neutral,
            tone: FALLBACK_TONE.to_string(),
            score: FALLBACK_SCORE,
            feedback: FALLBACK_FEEDBACK.to_string(),
            has_inappropriate_language: false,
        }
    }
}

/// Raw reply body from the analysis capability, before validation
///
/// Field names are the reply's wire names: the capability answers in
/// snake_case (`has_inappropriate_language`), unlike the camelCase
/// request it accepts. Every field is optional: the capability is remote
/// and untrusted, and a reply missing required fields is treated the
/// same as no reply at all.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisBody {
    #[serde(default)]
    pub transcript: Option<String>,

    #[serde(default)]
    pub sentiment: Option<String>,

    #[serde(default)]
    pub tone: Option<String>,

    #[serde(default)]
    pub score: Option<i64>,

    #[serde(default)]
    pub feedback: Option<String>,

    #[serde(default)]
    pub has_inappropriate_language: Option<bool>,
}

impl AnalysisBody {
    /// Validate into a domain result
    ///
    /// Required: non-empty transcript, tone and feedback, a known
    /// sentiment, and a score within 1..=10. Returns `None` when any of
    /// them is missing or out of range; the inappropriate-language flag
    /// alone defaults to false.
    pub fn into_result(self) -> Option<AnalysisResult> {
        let transcript = self.transcript.filter(|s| !s.trim().is_empty())?;
        let sentiment = Sentiment::parse(self.sentiment.as_deref()?)?;
        let tone = self.tone.filter(|s| !s.trim().is_empty())?;
        let score = match self.score {
            Some(score) if (1..=10).contains(&score) => score as u8,
            _ => return None,
        };
        let feedback = self.feedback.filter(|s| !s.trim().is_empty())?;

        Some(AnalysisResult {
            transcript,
            sentiment,
            tone,
            score,
            feedback,
            has_inappropriate_language: self.has_inappropriate_language.unwrap_or(false),
        })
    }
}
