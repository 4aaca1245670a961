//! Response recording module
//!
//! This module implements per-question answer recording:
//! - ResponseState machine for a single question's lifecycle
//! - QuestionRecorder driving one question against the capture device

pub mod question;
pub mod state;

pub use question::{QuestionRecorder, RecorderError};
pub use state::{format_time, PendingClip, ResponseState};
