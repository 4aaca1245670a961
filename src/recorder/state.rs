//! Response state management
//!
//! Defines the per-question answer state machine and the transient clip
//! held between stopping a recording and submitting it.

use crate::device::Clip;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a single question's answer
///
/// Every question moves through its own copy of this machine, independent
/// of the others. `Submitted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseState {
    /// No clip exists for this question
    Idle,
    /// Currently capturing an answer
    Recording,
    /// A clip is held in memory, awaiting submit or retake
    Recorded,
    /// Submission pipeline is running
    Submitting,
    /// Durably accepted; no further transitions
    Submitted,
}

impl Default for ResponseState {
    fn default() -> Self {
        Self::Idle
    }
}

impl ResponseState {
    /// Whether this state permits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Submitted)
    }
}

/// A recorded answer that has not been submitted yet
///
/// Lives only in memory. Dropping it (retake, session end) leaves no trace
/// anywhere.
#[derive(Debug, Clone)]
pub struct PendingClip {
    /// The captured clip bytes
    pub clip: Clip,

    /// When the recording was stopped
    pub recorded_at: DateTime<Utc>,
}

/// Format a second count as "M:SS" for timer display
pub fn format_time(total_secs: u64) -> String {
    let mins = total_secs / 60;
    let secs = total_secs % 60;
    format!("{}:{:02}", mins, secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_idle() {
        assert_eq!(ResponseState::default(), ResponseState::Idle);
        assert!(!ResponseState::Idle.is_terminal());
        assert!(ResponseState::Submitted.is_terminal());
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(7), "0:07");
        assert_eq!(format_time(65), "1:05");
        assert_eq!(format_time(600), "10:00");
    }
}
