//! Local filesystem clip store
//!
//! Stores objects as files under a root directory. Writes go through a
//! temp file and an atomic rename, so a crashed upload never leaves a
//! half-written object under a real key.

use super::{ClipStore, StorageConfig, StorageError};
use async_trait::async_trait;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// Clip store backed by a directory on disk
pub struct LocalClipStore {
    config: StorageConfig,
}

impl LocalClipStore {
    /// Create a store; the root directory is created on first write
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.config.root.join(key)
    }

    fn locator_for(&self, key: &str) -> String {
        match &self.config.public_base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => self.object_path(key).to_string_lossy().to_string(),
        }
    }
}

#[async_trait]
impl ClipStore for LocalClipStore {
    async fn put(&self, key: &str, content_type: &str, data: &[u8]) -> Result<String, StorageError> {
        fs::create_dir_all(&self.config.root)?;

        let mut tmp = NamedTempFile::new_in(&self.config.root)?;
        tmp.write_all(data)?;
        tmp.flush()?;
        tmp.persist(self.object_path(key)).map_err(|e| e.error)?;

        tracing::debug!(
            "Wrote object {} ({} bytes, {}) under {:?}",
            key,
            data.len(),
            content_type,
            self.config.root
        );
        Ok(self.locator_for(key))
    }

    async fn exists(&self, key: &str) -> bool {
        self.object_path(key).exists()
    }
}
