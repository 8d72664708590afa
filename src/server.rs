//! Axum router for running the handlers locally.
//!
//! Mirrors the API Gateway wiring: each responder gets one route, and the
//! fan-out accepts a raw notification payload on `POST /events`.  Handler
//! envelopes are converted into plain HTTP responses, with base64 bodies
//! decoded back to bytes.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::envelope::ResponseEnvelope;
use crate::handlers::{download, extract, lookup, summary};
use crate::metrics::{metrics_handler, metrics_middleware};
use crate::AppState;

/// Build the axum [`Router`] with every handler route.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/events", post(handle_events))
        // Wildcards so keys containing `/` reach the handler intact.
        .route("/download/*s3objectkey", get(handle_download))
        .route("/images/*s3objectkey", get(handle_lookup))
        .route("/summary", get(handle_summary))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(metrics_middleware))
}

async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "application/json")],
        r#"{"status":"ok"}"#,
    )
}

async fn handle_events(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<serde_json::Value>,
) -> Json<extract::ExtractionReport> {
    Json(extract::extract_metadata(state, payload).await)
}

async fn handle_download(
    State(state): State<Arc<AppState>>,
    Path(object_key): Path<String>,
) -> ResponseEnvelope {
    download::download(&state, &object_key).await
}

async fn handle_lookup(
    State(state): State<Arc<AppState>>,
    Path(object_key): Path<String>,
) -> ResponseEnvelope {
    lookup::lookup(&state, &object_key).await
}

async fn handle_summary(State(state): State<Arc<AppState>>) -> ResponseEnvelope {
    summary::summary(&state).await
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = if self.is_base64_encoded {
            match self.decoded_body() {
                Ok(bytes) => Body::from(bytes),
                Err(e) => {
                    warn!("Envelope body is not valid base64: {e:#}");
                    return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                }
            }
        } else {
            Body::from(self.body)
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().insert(name, value);
                }
                _ => warn!("Dropping invalid response header: {name}"),
            }
        }
        response
    }
}
