//! Interview response ledger
//!
//! This module is the durable record of an interview:
//! - Domain models (interviews, questions, responses, analyses)
//! - ResponseLedger and QuestionProvider traits
//! - MemoryLedger for tests and demos
//! - SqliteLedger for real persistence

pub mod memory;
pub mod models;
pub mod sqlite;
pub mod traits;

pub use memory::MemoryLedger;
pub use models::{AiAnalysis, Interview, InterviewQuestion, InterviewStatus, VideoResponse};
pub use sqlite::SqliteLedger;
pub use traits::{LedgerError, QuestionProvider, ResponseLedger};
