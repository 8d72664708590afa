//! Abstract metadata store trait.
//!
//! Any metadata backend must implement [`MetadataStore`].  The trait
//! uses `async_trait`-style methods (manual desugaring with pinned
//! futures) so handlers can hold an `Arc<dyn MetadataStore>` and tests
//! can substitute the in-memory store for DynamoDB.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

// ── Record types ───────────────────────────────────────────────────

/// Derived metadata for one uploaded image.
///
/// Serialized field names match the table's attribute names, so the
/// same shape is used in DynamoDB items and in JSON responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Object key with the upload prefix stripped. Primary key.
    #[serde(rename = "s3objectkey")]
    pub object_key: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Image format tag (e.g. `PNG`, `JPEG`), if known.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Byte length reported by the object store at fetch time.
    pub size: u64,
}

// ── Trait ───────────────────────────────────────────────────────────

/// Async metadata store contract.
///
/// Writes are upserts keyed by `object_key`: the last write wins and no
/// version check is made.
pub trait MetadataStore: Send + Sync + 'static {
    /// Insert or overwrite the record for `record.object_key`.
    fn put_record(
        &self,
        record: MetadataRecord,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>>;

    /// Get a single record. `Ok(None)` means the lookup succeeded but no
    /// item exists for the key.
    fn get_record(
        &self,
        object_key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<MetadataRecord>>> + Send + '_>>;

    /// Read every record, in the store's scan order.
    fn scan_records(
        &self,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<MetadataRecord>>> + Send + '_>>;
}
