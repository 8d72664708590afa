//! Trigger payloads and key handling.
//!
//! Upload notifications arrive as standard S3 event JSON; responder
//! requests arrive as API Gateway proxy requests carrying the object key
//! in the `s3objectkey` path parameter.

use aws_lambda_events::event::apigw::ApiGatewayProxyRequest;
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::PipelineError;

/// Path parameter naming the object in responder requests.
pub const OBJECT_KEY_PARAM: &str = "s3objectkey";

/// One object-created notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEntry {
    pub bucket: Option<String>,
    /// Object key, already percent-decoded.
    pub key: Option<String>,
}

impl NotificationEntry {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: Some(bucket.into()),
            key: Some(key.into()),
        }
    }

    /// Key for logs, even when the entry is incomplete.
    pub fn display_key(&self) -> &str {
        self.key.as_deref().unwrap_or("<missing>")
    }

    /// Bucket and key, or the reason the entry cannot be processed.
    pub fn location(&self) -> Result<(&str, &str), PipelineError> {
        let bucket = self
            .bucket
            .as_deref()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| PipelineError::MalformedEntry {
                reason: "bucket name is missing".to_string(),
            })?;
        let key = self
            .key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| PipelineError::MalformedEntry {
                reason: "object key is missing".to_string(),
            })?;
        Ok((bucket, key))
    }
}

/// An ordered batch of notifications delivered in one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationBatch {
    pub entries: Vec<NotificationEntry>,
}

/// Envelope of an S3 notification. Records stay raw so that one
/// malformed record cannot reject its siblings.
#[derive(Debug, Deserialize)]
struct RawNotification {
    #[serde(rename = "Records")]
    records: Vec<Value>,
}

impl NotificationBatch {
    /// Parse a raw trigger payload.
    ///
    /// Fails only when `Records` is absent or not an array.  Each record
    /// contributes `s3.bucket.name` and `s3.object.key` when they are
    /// strings; anything else becomes an incomplete entry that fails on
    /// its own.
    pub fn from_json(payload: Value) -> anyhow::Result<Self> {
        let notification: RawNotification = serde_json::from_value(payload)
            .map_err(|e| anyhow::anyhow!("payload is not an S3 notification: {e}"))?;
        let entries = notification.records.iter().map(entry_from_record).collect();
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn entry_from_record(record: &Value) -> NotificationEntry {
    let text = |pointer: &str| record.pointer(pointer).and_then(Value::as_str);
    NotificationEntry {
        bucket: text("/s3/bucket/name").map(str::to_string),
        key: text("/s3/object/key").map(decode_key),
    }
}

/// Decode an S3 notification key: `+` is a space, then percent-decoding.
pub fn decode_key(raw: &str) -> String {
    let plus_decoded = raw.replace('+', " ");
    percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}

/// Remove the first occurrence of `prefix` from `key`.
pub fn strip_upload_prefix(key: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        return key.to_string();
    }
    key.replacen(prefix, "", 1)
}

/// Storage key for an object key as seen by clients.
pub fn storage_key(prefix: &str, object_key: &str) -> String {
    format!("{prefix}{object_key}")
}

/// Extract the object key path parameter from a proxy request.
pub fn object_key_param(request: &ApiGatewayProxyRequest) -> Result<String, PipelineError> {
    request
        .path_parameters
        .get(OBJECT_KEY_PARAM)
        .filter(|k| !k.is_empty())
        .cloned()
        .ok_or_else(|| PipelineError::MissingParameter {
            name: OBJECT_KEY_PARAM.to_string(),
        })
}

#[cfg(test)]
pub(crate) fn sample_s3_event(records: &[(&str, &str)]) -> serde_json::Value {
    let records: Vec<serde_json::Value> = records
        .iter()
        .map(|(bucket, key)| {
            serde_json::json!({
                "eventVersion": "2.1",
                "eventSource": "aws:s3",
                "awsRegion": "us-east-1",
                "eventTime": "2026-10-18T12:00:00.000Z",
                "eventName": "ObjectCreated:Put",
                "userIdentity": {"principalId": "EXAMPLE"},
                "requestParameters": {"sourceIPAddress": "127.0.0.1"},
                "responseElements": {
                    "x-amz-request-id": "EXAMPLE123456789",
                    "x-amz-id-2": "EXAMPLE123/5678abcdefghijklambdaisawesome/mnopqrstuvwxyzABCDEFGH"
                },
                "s3": {
                    "s3SchemaVersion": "1.0",
                    "configurationId": "upload-notification",
                    "bucket": {
                        "name": bucket,
                        "ownerIdentity": {"principalId": "EXAMPLE"},
                        "arn": format!("arn:aws:s3:::{bucket}")
                    },
                    "object": {
                        "key": key,
                        "size": 1024,
                        "eTag": "0123456789abcdef0123456789abcdef",
                        "sequencer": "0A1B2C3D4E5F678901"
                    }
                }
            })
        })
        .collect();
    serde_json::json!({ "Records": records })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_key() {
        assert_eq!(decode_key("uploads/my+cat.png"), "uploads/my cat.png");
        assert_eq!(decode_key("uploads/caf%C3%A9.jpg"), "uploads/café.jpg");
        assert_eq!(decode_key("uploads/a%2Bb.png"), "uploads/a+b.png");
        assert_eq!(decode_key("plain.gif"), "plain.gif");
    }

    #[test]
    fn test_strip_prefix_once() {
        assert_eq!(strip_upload_prefix("uploads/cat.png", "uploads/"), "cat.png");
        assert_eq!(
            strip_upload_prefix("uploads/uploads/cat.png", "uploads/"),
            "uploads/cat.png"
        );
        assert_eq!(strip_upload_prefix("other/cat.png", "uploads/"), "other/cat.png");
        assert_eq!(strip_upload_prefix("cat.png", ""), "cat.png");
    }

    #[test]
    fn test_storage_key() {
        assert_eq!(storage_key("uploads/", "cat.png"), "uploads/cat.png");
    }

    #[test]
    fn test_batch_from_json() {
        let payload = sample_s3_event(&[
            ("photos", "uploads/a.png"),
            ("photos", "uploads/holiday+pic%21.jpg"),
        ]);
        let batch = NotificationBatch::from_json(payload).unwrap();
        assert_eq!(
            batch.entries,
            vec![
                NotificationEntry::new("photos", "uploads/a.png"),
                NotificationEntry::new("photos", "uploads/holiday pic!.jpg"),
            ]
        );
    }

    #[test]
    fn test_batch_from_json_empty() {
        let batch = NotificationBatch::from_json(serde_json::json!({"Records": []})).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_batch_from_json_malformed() {
        assert!(NotificationBatch::from_json(serde_json::json!({"Records": "nope"})).is_err());
        assert!(NotificationBatch::from_json(serde_json::json!(42)).is_err());
        assert!(NotificationBatch::from_json(serde_json::json!({})).is_err());
    }

    #[test]
    fn test_batch_from_json_lenient_records() {
        let mut payload = sample_s3_event(&[("photos", "uploads/full.png")]);
        let records = payload["Records"].as_array_mut().unwrap();
        records.push(serde_json::json!({
            "s3": {"bucket": {"name": "photos"}, "object": {"key": "uploads/bare+one.png"}}
        }));
        records.push(serde_json::json!({"s3": {"bucket": {"name": 7}}}));
        records.push(serde_json::json!("not a record"));

        let batch = NotificationBatch::from_json(payload).unwrap();
        assert_eq!(
            batch.entries,
            vec![
                NotificationEntry::new("photos", "uploads/full.png"),
                NotificationEntry::new("photos", "uploads/bare one.png"),
                NotificationEntry {
                    bucket: None,
                    key: None
                },
                NotificationEntry {
                    bucket: None,
                    key: None
                },
            ]
        );
    }

    #[test]
    fn test_entry_location() {
        let entry = NotificationEntry::new("b", "k");
        assert_eq!(entry.location().unwrap(), ("b", "k"));

        let entry = NotificationEntry {
            bucket: Some("b".into()),
            key: None,
        };
        assert!(matches!(
            entry.location(),
            Err(PipelineError::MalformedEntry { .. })
        ));
        assert_eq!(entry.display_key(), "<missing>");
    }

    #[test]
    fn test_object_key_param() {
        let mut request = ApiGatewayProxyRequest::default();
        assert!(matches!(
            object_key_param(&request),
            Err(PipelineError::MissingParameter { .. })
        ));

        request
            .path_parameters
            .insert(OBJECT_KEY_PARAM.to_string(), "cat.png".to_string());
        assert_eq!(object_key_param(&request).unwrap(), "cat.png");
    }
}
