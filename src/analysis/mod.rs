//! Response analysis module
//!
//! This module turns uploaded clips into per-response evaluations:
//! - AnalysisResult and Sentiment domain types
//! - AnalysisBody, the untrusted wire shape returned by the capability
//! - HttpAnalysisClient speaking to the remote capability over HTTP
//! - AnalysisInvoker, which never fails: every breakage becomes a fallback

pub mod invoker;
pub mod types;

pub use invoker::{
    AnalysisCallError, AnalysisCapability, AnalysisConfig, AnalysisInvoker, AnalysisRequest,
    HttpAnalysisClient,
};
pub use types::{AnalysisBody, AnalysisResult, Sentiment};
