//! In-memory clip store
//!
//! Backing store for tests and demos. Can be switched into an unavailable
//! state to exercise upload-failure paths.

use super::{ClipStore, StorageError};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

struct StoredObject {
    content_type: String,
    data: Vec<u8>,
}

/// Clip store held entirely in memory
#[derive(Default)]
pub struct MemoryClipStore {
    objects: RwLock<HashMap<String, StoredObject>>,
    unavailable: AtomicBool,
}

impl MemoryClipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `put` fail until switched back
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored objects
    pub fn object_count(&self) -> usize {
        self.objects.read().len()
    }

    /// Bytes stored under a key, if any
    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().get(key).map(|o| o.data.clone())
    }

    /// Content type stored under a key, if any
    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects.read().get(key).map(|o| o.content_type.clone())
    }
}

#[async_trait]
impl ClipStore for MemoryClipStore {
    async fn put(&self, key: &str, content_type: &str, data: &[u8]) -> Result<String, StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "simulated storage outage".to_string(),
            ));
        }

        self.objects.write().insert(
            key.to_string(),
            StoredObject {
                content_type: content_type.to_string(),
                data: data.to_vec(),
            },
        );
        Ok(format!("mem://interview-videos/{}", key))
    }

    async fn exists(&self, key: &str) -> bool {
        self.objects.read().contains_key(key)
    }
}
