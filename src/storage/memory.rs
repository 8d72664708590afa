//! In-memory storage backend.
//!
//! Objects are held in a `tokio::sync::RwLock<HashMap<...>>` keyed by
//! `(bucket, key)`.  Used by tests and the local development server.

use bytes::Bytes;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use super::backend::{StorageBackend, StoredObject};

type ObjectKey = (String, String);

/// In-memory storage backend.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    /// (bucket, key) -> (data, content_type).
    objects: tokio::sync::RwLock<HashMap<ObjectKey, (Bytes, String)>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<StoredObject>> + Send + '_>> {
        let object_key = (bucket.to_string(), key.to_string());
        Box::pin(async move {
            let objects = self.objects.read().await;
            match objects.get(&object_key) {
                Some((data, content_type)) => Ok(StoredObject {
                    data: data.clone(),
                    content_length: data.len() as u64,
                    content_type: Some(content_type.clone()),
                }),
                None => anyhow::bail!(
                    "Object not found: bucket={} key={}",
                    object_key.0,
                    object_key.1
                ),
            }
        })
    }

    fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        let object_key = (bucket.to_string(), key.to_string());
        let content_type = content_type.to_string();
        Box::pin(async move {
            let mut objects = self.objects.write().await;
            objects.insert(object_key, (data, content_type));
            Ok(())
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
