//! Vetscreen - Unattended video interview capture and scoring, made simple.
//!
//! This is the main library crate for the Vetscreen screening pipeline.
//! A candidate opens an interview by link, records an answer per question,
//! and submits each one independently; every accepted answer is uploaded,
//! durably recorded, and scored, and the interview finalizes itself once
//! the last answer is analyzed.

pub mod analysis;
pub mod completion;
pub mod device;
pub mod error;
pub mod ledger;
pub mod pipeline;
pub mod recorder;
pub mod session;
pub mod storage;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging
///
/// Honours `RUST_LOG`; defaults to debug-level output for this crate.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vetscreen=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
