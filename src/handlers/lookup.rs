//! Metadata lookup responder.
//!
//! Absent records and store failures are kept apart: the former is a 404,
//! the latter a 500 whose detail only goes to the log.

use aws_lambda_events::event::apigw::ApiGatewayProxyRequest;
use axum::http::StatusCode;
use serde_json::json;
use tracing::{debug, error};

use crate::envelope::ResponseEnvelope;
use crate::events::object_key_param;
use crate::{metrics, AppState};

/// Handle a proxy request carrying the `s3objectkey` path parameter.
pub async fn handle(state: &AppState, request: &ApiGatewayProxyRequest) -> ResponseEnvelope {
    match object_key_param(request) {
        Ok(object_key) => lookup(state, &object_key).await,
        Err(err) => {
            let envelope = err.into_envelope();
            metrics::record_response("lookup", envelope.status_code);
            envelope
        }
    }
}

pub async fn lookup(state: &AppState, object_key: &str) -> ResponseEnvelope {
    let envelope = match state.metadata.get_record(object_key).await {
        Ok(Some(record)) => ResponseEnvelope::json(
            StatusCode::OK,
            &json!({ "success": true, "data": record }),
        ),
        Ok(None) => {
            debug!(key = object_key, "Metadata record not found");
            ResponseEnvelope::json(
                StatusCode::NOT_FOUND,
                &json!({ "success": false, "data": null }),
            )
        }
        Err(e) => {
            error!(key = object_key, "Metadata lookup failed: {e:#}");
            ResponseEnvelope::json(
                StatusCode::INTERNAL_SERVER_ERROR,
                &json!({ "success": false, "data": null }),
            )
        }
    };

    metrics::record_response("lookup", envelope.status_code);
    envelope
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NotificationEntry;
    use crate::handlers::extract::extract_one;
    use crate::metadata::store::{MetadataRecord, MetadataStore};
    use crate::probe::encode_test_image;
    use crate::storage::backend::StorageBackend;
    use crate::testing::memory_state;
    use crate::AppState;
    use bytes::Bytes;
    use image::ImageFormat;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;

    fn body(envelope: &ResponseEnvelope) -> serde_json::Value {
        serde_json::from_str(&envelope.body).unwrap()
    }

    #[tokio::test]
    async fn test_lookup_present_record() {
        let (state, metadata, _) = memory_state();
        let record = MetadataRecord {
            object_key: "cat.png".to_string(),
            width: 640,
            height: 480,
            format: Some("PNG".to_string()),
            size: 5120,
        };
        metadata.put_record(record).await.unwrap();

        let envelope = lookup(&state, "cat.png").await;
        assert_eq!(envelope.status_code, 200);
        assert_eq!(envelope.header("Content-Type"), Some("application/json"));
        assert_eq!(
            body(&envelope),
            json!({
                "success": true,
                "data": {
                    "s3objectkey": "cat.png",
                    "width": 640,
                    "height": 480,
                    "type": "PNG",
                    "size": 5120
                }
            })
        );
    }

    #[tokio::test]
    async fn test_lookup_absent_record() {
        let (state, _, _) = memory_state();
        let envelope = lookup(&state, "ghost.png").await;
        assert_eq!(envelope.status_code, 404);
        assert_eq!(body(&envelope), json!({ "success": false, "data": null }));
    }

    struct BrokenStore;

    impl MetadataStore for BrokenStore {
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
            Box::pin(async {
                Err::<Option<MetadataRecord>, _>(anyhow::anyhow!(
                    "ResourceNotFoundException: table serverless-challenge-dev"
                ))
            })
        }

        fn scan_records(
            &self,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<MetadataRecord>>> + Send + '_>>
        {
            Box::pin(async { Ok::<_, anyhow::Error>(Vec::new()) })
        }
    }

    #[tokio::test]
    async fn test_lookup_store_failure_is_500_without_detail() {
        let (state, _, _) = memory_state();
        let state = AppState::new(
            state.config.clone(),
            Arc::new(BrokenStore),
            state.storage.clone(),
        );

        let envelope = lookup(&state, "cat.png").await;
        assert_eq!(envelope.status_code, 500);
        assert_eq!(body(&envelope), json!({ "success": false, "data": null }));
        assert!(!envelope.body.contains("ResourceNotFound"));
    }

    #[tokio::test]
    async fn test_extract_then_lookup_roundtrip() {
        let (state, _, storage) = memory_state();
        let png = encode_test_image(300, 200, ImageFormat::Png);
        let size = png.len() as u64;
        storage
            .put("photos", "uploads/sunset.png", Bytes::from(png), "image/png")
            .await
            .unwrap();

        let written = extract_one(&state, &NotificationEntry::new("photos", "uploads/sunset.png"))
            .await
            .unwrap();

        let envelope = lookup(&state, "sunset.png").await;
        assert_eq!(envelope.status_code, 200);
        let data: MetadataRecord =
            serde_json::from_value(body(&envelope)["data"].clone()).unwrap();
        assert_eq!(data, written);
        assert_eq!(data.size, size);
        assert_eq!((data.width, data.height), (300, 200));
    }
}
