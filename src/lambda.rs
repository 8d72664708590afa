//! Lambda runtime entry points.
//!
//! One deployed function runs one handler; [`HandlerKind`] picks which.
//! Responders receive API Gateway proxy events and answer with the
//! serialized [`crate::envelope::ResponseEnvelope`].

use std::sync::Arc;

use aws_lambda_events::event::apigw::ApiGatewayProxyRequest;
use clap::ValueEnum;
use lambda_runtime::{service_fn, Error as LambdaError, LambdaEvent};
use serde_json::Value;
use tracing::info;

use crate::envelope::ResponseEnvelope;
use crate::handlers::extract::ExtractionReport;
use crate::handlers::{download, extract, lookup, summary};
use crate::AppState;

/// Which handler this process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HandlerKind {
    /// Upload notification fan-out.
    Extract,
    /// Image download responder.
    Download,
    /// Metadata lookup responder.
    Metadata,
    /// Dataset summary responder.
    Summary,
}

impl HandlerKind {
    pub fn name(self) -> &'static str {
        match self {
            HandlerKind::Extract => "extract",
            HandlerKind::Download => "download",
            HandlerKind::Metadata => "metadata",
            HandlerKind::Summary => "summary",
        }
    }
}

/// Run the Lambda event loop for `kind` until the runtime shuts down.
pub async fn run(state: Arc<AppState>, kind: HandlerKind) -> Result<(), LambdaError> {
    info!(handler = kind.name(), "Starting Lambda runtime");

    match kind {
        HandlerKind::Extract => {
            lambda_runtime::run(service_fn(|event: LambdaEvent<Value>| {
                let state = Arc::clone(&state);
                async move { handle_extract(state, event).await }
            }))
            .await
        }
        HandlerKind::Download => {
            lambda_runtime::run(service_fn(|event: LambdaEvent<ApiGatewayProxyRequest>| {
                let state = Arc::clone(&state);
                async move {
                    Ok::<ResponseEnvelope, LambdaError>(
                        download::handle(&state, &event.payload).await,
                    )
                }
            }))
            .await
        }
        HandlerKind::Metadata => {
            lambda_runtime::run(service_fn(|event: LambdaEvent<ApiGatewayProxyRequest>| {
                let state = Arc::clone(&state);
                async move {
                    Ok::<ResponseEnvelope, LambdaError>(
                        lookup::handle(&state, &event.payload).await,
                    )
                }
            }))
            .await
        }
        HandlerKind::Summary => {
            lambda_runtime::run(service_fn(|_event: LambdaEvent<Value>| {
                let state = Arc::clone(&state);
                async move { Ok::<ResponseEnvelope, LambdaError>(summary::summary(&state).await) }
            }))
            .await
        }
    }
}

async fn handle_extract(
    state: Arc<AppState>,
    event: LambdaEvent<Value>,
) -> Result<ExtractionReport, LambdaError> {
    info!(request_id = %event.context.request_id, "Received upload notification");
    let report = extract::extract_metadata(state, event.payload).await;
    info!(
        processed = report.processed,
        failed = report.failed.len(),
        "Notification batch finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_kind_parses_from_cli_names() {
        assert_eq!(
            HandlerKind::from_str("extract", true).unwrap(),
            HandlerKind::Extract
        );
        assert_eq!(
            HandlerKind::from_str("metadata", true).unwrap(),
            HandlerKind::Metadata
        );
        assert!(HandlerKind::from_str("upload", true).is_err());
    }

    #[test]
    fn test_handler_kind_names_match_value_enum() {
        for kind in HandlerKind::value_variants() {
            let parsed = HandlerKind::from_str(kind.name(), false).unwrap();
            assert_eq!(parsed, *kind);
        }
    }
}
