//! Clip storage and upload gateway
//!
//! This module owns getting recorded clips into durable object storage:
//! - ClipStore trait over the storage backend
//! - UploadGateway computing deterministic per-question object keys
//! - LocalClipStore writing objects to a directory on disk
//! - MemoryClipStore for tests and demos

pub mod local;
pub mod memory;

pub use local::LocalClipStore;
pub use memory::MemoryClipStore;

use crate::device::Clip;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Storage-related errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Configuration for the local clip store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    /// Directory that holds uploaded objects
    pub root: PathBuf,

    /// Base URL prepended to object keys when building locators
    ///
    /// When unset, locators are plain filesystem paths.
    pub public_base_url: Option<String>,
}

impl StorageConfig {
    /// Configuration rooted at a directory, with path locators
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            public_base_url: None,
        }
    }
}

/// Durable object storage for recorded clips
///
/// `put` must overwrite an existing object under the same key; repeated
/// uploads of the same question land on the same object.
#[async_trait]
pub trait ClipStore: Send + Sync {
    /// Store `data` under `key`, returning a resolvable locator
    async fn put(&self, key: &str, content_type: &str, data: &[u8]) -> Result<String, StorageError>;

    /// Whether an object exists under `key`
    async fn exists(&self, key: &str) -> bool;
}

/// Uploads clips under deterministic per-question keys
pub struct UploadGateway {
    store: Arc<dyn ClipStore>,
}

impl UploadGateway {
    /// Create a gateway over a storage backend
    pub fn new(store: Arc<dyn ClipStore>) -> Self {
        Self { store }
    }

    /// The object key for an (interview, question) pair
    ///
    /// Deterministic, so a retried or replaced submission overwrites the
    /// previous object instead of orphaning it.
    pub fn object_key(interview_id: Uuid, question_id: Uuid) -> String {
        format!("interview-{}-question-{}.webm", interview_id, question_id)
    }

    /// Upload a clip, returning the locator to persist in the ledger
    pub async fn upload(
        &self,
        interview_id: Uuid,
        question_id: Uuid,
        clip: &Clip,
    ) -> Result<String, StorageError> {
        let key = Self::object_key(interview_id, question_id);
        let locator = self.store.put(&key, &clip.mime_type, &clip.data).await?;
        tracing::info!(
            "Uploaded clip {} ({} bytes) -> {}",
            key,
            clip.size_bytes(),
            locator
        );
        Ok(locator)
    }
}
