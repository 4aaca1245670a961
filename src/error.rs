//! Error types and handling
//!
//! Session-level error type aggregating the module errors, plus the
//! code/message shape handed to host UIs.

use crate::device::DeviceError;
use crate::ledger::LedgerError;
use crate::pipeline::SubmitError;
use crate::recorder::RecorderError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session-wide error type
#[derive(Error, Debug)]
pub enum SessionError {
    /// The entry link resolves to no usable interview
    #[error("interview not found: {0}")]
    InterviewNotFound(String),

    /// A question index outside the interview's question list
    #[error("unknown question index: {0}")]
    UnknownQuestion(usize),

    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    #[error("recorder error: {0}")]
    Recorder(#[from] RecorderError),

    #[error("submission error: {0}")]
    Submit(#[from] SubmitError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Error response for host UIs
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<SessionError> for ErrorResponse {
    fn from(error: SessionError) -> Self {
        let code = match &error {
            SessionError::InterviewNotFound(_) => "INTERVIEW_NOT_FOUND",
            SessionError::UnknownQuestion(_) => "UNKNOWN_QUESTION",
            SessionError::Device(_) => "DEVICE_ERROR",
            SessionError::Recorder(_) => "RECORDER_ERROR",
            SessionError::Submit(_) => "SUBMIT_ERROR",
            SessionError::Ledger(_) => "LEDGER_ERROR",
        };

        ErrorResponse {
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

/// Result type alias using SessionError
pub type SessionResult<T> = Result<T, SessionError>;
