//! Download responder.
//!
//! Returns the stored image as a base64 attachment.  Every storage
//! failure, absent object or otherwise, is answered with the same 404.

use aws_lambda_events::event::apigw::ApiGatewayProxyRequest;
use axum::http::StatusCode;
use tracing::warn;

use crate::envelope::{ResponseEnvelope, CONTENT_DISPOSITION, CONTENT_TYPE};
use crate::events::{object_key_param, storage_key};
use crate::{metrics, AppState};

/// Body returned when the object cannot be fetched.
pub const NOT_FOUND_BODY: &str = r#"{"success": false, "message": "Object not found!!"}"#;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Handle a proxy request carrying the `s3objectkey` path parameter.
pub async fn handle(state: &AppState, request: &ApiGatewayProxyRequest) -> ResponseEnvelope {
    match object_key_param(request) {
        Ok(object_key) => download(state, &object_key).await,
        Err(err) => {
            let envelope = err.into_envelope();
            metrics::record_response("download", envelope.status_code);
            envelope
        }
    }
}

pub async fn download(state: &AppState, object_key: &str) -> ResponseEnvelope {
    let key = storage_key(&state.config.pipeline.upload_prefix, object_key);

    let envelope = match state.storage.get(&state.config.storage.bucket, &key).await {
        Ok(object) => ResponseEnvelope::binary(StatusCode::OK, &object.data)
            .with_header(
                CONTENT_TYPE,
                object
                    .content_type
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            )
            .with_header(
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{object_key}\""),
            ),
        Err(e) => {
            warn!(key = %key, "Download failed: {e:#}");
            ResponseEnvelope::json_text(StatusCode::NOT_FOUND, NOT_FOUND_BODY)
        }
    };

    metrics::record_response("download", envelope.status_code);
    envelope
}
