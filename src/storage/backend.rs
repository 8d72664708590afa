//! Abstract storage backend trait.
//!
//! Every storage backend must implement [`StorageBackend`].  Objects are
//! addressed by bucket and key, exactly as they appear in upload
//! notifications.

use bytes::Bytes;
use std::future::Future;
use std::pin::Pin;

/// A stored object's data plus the attributes the store reports with it.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Raw bytes of the object.
    pub data: Bytes,
    /// Byte length as reported by the store.
    pub content_length: u64,
    /// Declared MIME type, if the store has one.
    pub content_type: Option<String>,
}

/// Async object storage contract.
pub trait StorageBackend: Send + Sync + 'static {
    /// Read the full object at `bucket`/`key`.
    ///
    /// Fails when the object is absent or the store errors.
    fn get(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<StoredObject>> + Send + '_>>;

    /// Write `data` to `bucket`/`key` with a declared content type.
    fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>>;
}
