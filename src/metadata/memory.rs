//! In-memory metadata store.
//!
//! Stores all records in memory with no persistence. Useful for testing
//! and local development. Uses `RwLock` for thread-safe access and keeps
//! insertion order so scans are deterministic.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::RwLock;

use super::store::{MetadataRecord, MetadataStore};

#[derive(Debug, Default)]
struct Inner {
    /// object_key -> position in `records`.
    index: HashMap<String, usize>,
    records: Vec<MetadataRecord>,
}

#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    inner: RwLock<Inner>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.inner.read().expect("rwlock poisoned").records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetadataStore for MemoryMetadataStore {
    fn put_record(
        &self,
        record: MetadataRecord,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        Box::pin(async move {
            let mut inner = self.inner.write().expect("rwlock poisoned");
            match inner.index.get(&record.object_key).copied() {
                Some(pos) => inner.records[pos] = record,
                None => {
                    let pos = inner.records.len();
                    inner.index.insert(record.object_key.clone(), pos);
                    inner.records.push(record);
                }
            }
            Ok(())
        })
    }

    fn get_record(
        &self,
        object_key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<MetadataRecord>>> + Send + '_>> {
        let object_key = object_key.to_string();
        Box::pin(async move {
            let inner = self.inner.read().expect("rwlock poisoned");
            Ok(inner
                .index
                .get(&object_key)
                .map(|&pos| inner.records[pos].clone()))
        })
    }

    fn scan_records(
        &self,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<MetadataRecord>>> + Send + '_>> {
        Box::pin(async move {
            let inner = self.inner.read().expect("rwlock poisoned");
            Ok(inner.records.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(key: &str, size: u64) -> MetadataRecord {
        MetadataRecord {
            object_key: key.to_string(),
            width: 10,
            height: 20,
            format: Some("PNG".to_string()),
            size,
        }
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MemoryMetadataStore::new();
        store.put_record(make_record("a.png", 5)).await.unwrap();

        let got = store.get_record("a.png").await.unwrap().unwrap();
        assert_eq!(got, make_record("a.png", 5));
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = MemoryMetadataStore::new();
        assert!(store.get_record("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_is_upsert() {
        let store = MemoryMetadataStore::new();
        store.put_record(make_record("a.png", 5)).await.unwrap();
        store.put_record(make_record("a.png", 9)).await.unwrap();

        assert_eq!(store.len(), 1);
        let got = store.get_record("a.png").await.unwrap().unwrap();
        assert_eq!(got.size, 9);
    }

    #[tokio::test]
    async fn test_same_record_twice_is_idempotent() {
        let store = MemoryMetadataStore::new();
        store.put_record(make_record("a.png", 5)).await.unwrap();
        let first = store.get_record("a.png").await.unwrap();
        store.put_record(make_record("a.png", 5)).await.unwrap();
        let second = store.get_record("a.png").await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_scan_keeps_insertion_order() {
        let store = MemoryMetadataStore::new();
        for key in ["c", "a", "b"] {
            store.put_record(make_record(key, 1)).await.unwrap();
        }
        // Overwriting keeps the original position.
        store.put_record(make_record("c", 2)).await.unwrap();

        let keys: Vec<String> = store
            .scan_records()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.object_key)
            .collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }
}
