//! Response envelope returned to the request router.
//!
//! Serializes to the API Gateway proxy-integration response shape:
//! `{"statusCode", "headers", "body", "isBase64Encoded"}`.  Binary bodies
//! travel as base64 text and the router decodes them before they reach
//! the client.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_DISPOSITION: &str = "Content-Disposition";
pub const APPLICATION_JSON: &str = "application/json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status_code: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl ResponseEnvelope {
    /// Text envelope with no headers.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            headers: BTreeMap::new(),
            body: body.into(),
            is_base64_encoded: false,
        }
    }

    /// JSON envelope from pre-rendered text.
    pub fn json_text(status: StatusCode, body: impl Into<String>) -> Self {
        Self::new(status, body).with_header(CONTENT_TYPE, APPLICATION_JSON)
    }

    /// JSON envelope from a value.
    pub fn json(status: StatusCode, body: &serde_json::Value) -> Self {
        Self::json_text(status, body.to_string())
    }

    /// Binary envelope: `data` is base64-encoded and flagged as such.
    pub fn binary(status: StatusCode, data: &[u8]) -> Self {
        Self {
            status_code: status.as_u16(),
            headers: BTreeMap::new(),
            body: STANDARD.encode(data),
            is_base64_encoded: true,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_string(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Status as an HTTP code; out-of-range values become 500.
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Body bytes as the client will receive them (base64 decoded when flagged).
    pub fn decoded_body(&self) -> anyhow::Result<Vec<u8>> {
        if self.is_base64_encoded {
            Ok(STANDARD.decode(&self.body)?)
        } else {
            Ok(self.body.clone().into_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_proxy_shape() {
        let envelope = ResponseEnvelope::json_text(StatusCode::OK, r#"{"ok":true}"#);
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "statusCode": 200,
                "headers": {"Content-Type": "application/json"},
                "body": "{\"ok\":true}",
                "isBase64Encoded": false
            })
        );
    }

    #[test]
    fn test_binary_body_is_base64() {
        let envelope = ResponseEnvelope::binary(StatusCode::OK, &[0xff, 0x00, 0x10]);
        assert!(envelope.is_base64_encoded);
        assert_eq!(envelope.body, "/wAQ");
        assert_eq!(envelope.decoded_body().unwrap(), vec![0xff, 0x00, 0x10]);
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let envelope =
            ResponseEnvelope::new(StatusCode::OK, "").with_header(CONTENT_TYPE, "image/png");
        assert_eq!(envelope.header("content-type"), Some("image/png"));
        assert_eq!(envelope.header("x-missing"), None);
    }
}
