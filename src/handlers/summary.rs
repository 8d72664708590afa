//! Summary responder.
//!
//! Reads every metadata record and reports the smallest and largest object,
//! a count per image type and the distinct types in first-seen order.
//! Ties on size go to the record scanned first.

use axum::http::StatusCode;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use crate::envelope::ResponseEnvelope;
use crate::metadata::store::MetadataRecord;
use crate::{metrics, AppState};

/// Per-type counts, serialized as a JSON object in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Occurrence(Vec<(String, u64)>);

impl Occurrence {
    fn bump(&mut self, tag: &str) {
        match self.0.iter_mut().find(|(t, _)| t == tag) {
            Some((_, count)) => *count += 1,
            None => self.0.push((tag.to_string(), 1)),
        }
    }

    #[cfg(test)]
    fn get(&self, tag: &str) -> Option<u64> {
        self.0.iter().find(|(t, _)| t == tag).map(|(_, c)| *c)
    }

    fn tags(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(t, _)| t.as_str())
    }
}

impl Serialize for Occurrence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (tag, count) in &self.0 {
            map.serialize_entry(tag, count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Key of the smallest object, `None` when there are no records.
    pub smaller: Option<String>,
    /// Key of the largest object.
    pub larger: Option<String>,
    pub occurrence: Occurrence,
    pub types: Vec<String>,
}

/// Fold records into a [`Summary`]. Records without a type still count
/// toward size extremes.
pub fn summarize(records: &[MetadataRecord]) -> Summary {
    let mut smallest: Option<&MetadataRecord> = None;
    let mut largest: Option<&MetadataRecord> = None;
    let mut occurrence = Occurrence::default();

    for record in records {
        if smallest.map_or(true, |s| record.size < s.size) {
            smallest = Some(record);
        }
        if largest.map_or(true, |l| record.size > l.size) {
            largest = Some(record);
        }
        if let Some(tag) = &record.format {
            occurrence.bump(tag);
        }
    }

    let types = occurrence.tags().map(str::to_string).collect();
    Summary {
        smaller: smallest.map(|r| r.object_key.clone()),
        larger: largest.map(|r| r.object_key.clone()),
        occurrence,
        types,
    }
}

pub async fn summary(state: &AppState) -> ResponseEnvelope {
    let envelope = match state.metadata.scan_records().await {
        Ok(records) => {
            let summary = summarize(&records);
            info!(
                records = records.len(),
                types = summary.types.len(),
                "Summary computed"
            );
            match serde_json::to_value(&summary) {
                Ok(body) => ResponseEnvelope::json(StatusCode::OK, &body),
                Err(e) => {
                    error!("Summary serialization failed: {e}");
                    read_failure()
                }
            }
        }
        Err(e) => {
            error!("Metadata scan failed: {e:#}");
            read_failure()
        }
    };

    metrics::record_response("summary", envelope.status_code);
    envelope
}

fn read_failure() -> ResponseEnvelope {
    ResponseEnvelope::json(
        StatusCode::INTERNAL_SERVER_ERROR,
        &json!({ "success": false, "message": "Unable to read metadata" }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::store::MetadataStore;
    use crate::testing::memory_state;
    use crate::AppState;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;

    fn record(key: &str, size: u64, format: Option<&str>) -> MetadataRecord {
        MetadataRecord {
            object_key: key.to_string(),
            width: 1,
            height: 1,
            format: format.map(str::to_string),
            size,
        }
    }

    #[test]
    fn test_summarize_fixture() {
        let records = vec![
            record("a", 10, Some("PNG")),
            record("b", 50, Some("PNG")),
            record("c", 5, Some("JPEG")),
        ];
        let summary = summarize(&records);
        assert_eq!(summary.smaller.as_deref(), Some("c"));
        assert_eq!(summary.larger.as_deref(), Some("b"));
        assert_eq!(summary.occurrence.get("PNG"), Some(2));
        assert_eq!(summary.occurrence.get("JPEG"), Some(1));
        assert_eq!(summary.types, vec!["PNG", "JPEG"]);

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            value,
            json!({
                "smaller": "c",
                "larger": "b",
                "occurrence": { "PNG": 2, "JPEG": 1 },
                "types": ["PNG", "JPEG"]
            })
        );
    }

    #[test]
    fn test_summarize_ties_keep_first_seen() {
        let records = vec![
            record("first", 7, Some("GIF")),
            record("second", 7, Some("GIF")),
        ];
        let summary = summarize(&records);
        assert_eq!(summary.smaller.as_deref(), Some("first"));
        assert_eq!(summary.larger.as_deref(), Some("first"));
    }

    #[test]
    fn test_summarize_single_record() {
        let summary = summarize(&[record("only", 3, Some("BMP"))]);
        assert_eq!(summary.smaller, summary.larger);
        assert_eq!(summary.types, vec!["BMP"]);
    }

    #[test]
    fn test_summarize_untyped_records() {
        let records = vec![record("x", 1, None), record("y", 9, Some("PNG"))];
        let summary = summarize(&records);
        assert_eq!(summary.smaller.as_deref(), Some("x"));
        assert_eq!(summary.larger.as_deref(), Some("y"));
        assert_eq!(summary.occurrence.get("PNG"), Some(1));
        assert_eq!(summary.types, vec!["PNG"]);
    }

    #[test]
    fn test_summarize_empty() {
        let value = serde_json::to_value(summarize(&[])).unwrap();
        assert_eq!(
            value,
            json!({ "smaller": null, "larger": null, "occurrence": {}, "types": [] })
        );
    }

    #[tokio::test]
    async fn test_summary_handler() {
        let (state, metadata, _) = memory_state();
        metadata.put_record(record("a.png", 10, Some("PNG"))).await.unwrap();
        metadata.put_record(record("c.jpg", 5, Some("JPEG"))).await.unwrap();

        let envelope = summary(&state).await;
        assert_eq!(envelope.status_code, 200);
        let body: serde_json::Value = serde_json::from_str(&envelope.body).unwrap();
        assert_eq!(body["smaller"], "c.jpg");
        assert_eq!(body["larger"], "a.png");
        assert_eq!(body["types"], json!(["PNG", "JPEG"]));
    }

    #[tokio::test]
    async fn test_summary_handler_empty_table() {
        let (state, _, _) = memory_state();
        let envelope = summary(&state).await;
        assert_eq!(envelope.status_code, 200);
        let body: serde_json::Value = serde_json::from_str(&envelope.body).unwrap();
        assert!(body["smaller"].is_null());
        assert_eq!(body["occurrence"], json!({}));
    }

    struct UnreadableStore;

    impl MetadataStore for UnreadableStore {
        fn put_record(
            &self,
            _record: MetadataRecord,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
            Box::pin(async { Ok::<_, anyhow::Error>(()) })
        }

        fn get_record(
            &self,
            _object_key: &str,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<MetadataRecord>>> + Send + '_>>
        {
            Box::pin(async { Ok::<_, anyhow::Error>(None) })
        }

        fn scan_records(
            &self,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<MetadataRecord>>> + Send + '_>>
        {
            Box::pin(async {
                Err::<Vec<MetadataRecord>, _>(anyhow::anyhow!("AccessDeniedException"))
            })
        }
    }

    #[tokio::test]
    async fn test_summary_scan_failure() {
        let (state, _, _) = memory_state();
        let state = AppState::new(
            state.config.clone(),
            Arc::new(UnreadableStore),
            state.storage.clone(),
        );
        let envelope = summary(&state).await;
        assert_eq!(envelope.status_code, 500);
        let body: serde_json::Value = serde_json::from_str(&envelope.body).unwrap();
        assert_eq!(
            body,
            json!({ "success": false, "message": "Unable to read metadata" })
        );
    }
}
