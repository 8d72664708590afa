//! AWS S3 storage backend.
//!
//! Reads uploaded images straight from the bucket named in each request.
//! Credentials are resolved via the standard AWS credential chain
//! (env vars, `~/.aws/credentials`, the Lambda execution role, etc.).

use aws_sdk_s3::Client;
use bytes::Bytes;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, info};

use super::backend::{StorageBackend, StoredObject};
use crate::config::AwsStorageConfig;

/// Backend that forwards operations to AWS S3.
pub struct S3Backend {
    /// AWS S3 SDK client.
    client: Client,
}

impl S3Backend {
    /// Create a new S3 backend from the default credential chain.
    pub async fn new(config: &AwsStorageConfig) -> anyhow::Result<Self> {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = &config.region {
            config_loader = config_loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint_url {
            config_loader = config_loader.endpoint_url(endpoint);
        }

        let sdk_config = config_loader.load().await;

        let s3_config_builder = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.use_path_style);

        let client = Client::from_conf(s3_config_builder.build());

        info!(
            "S3 backend initialized: endpoint={} path_style={}",
            config.endpoint_url.as_deref().unwrap_or("default"),
            config.use_path_style
        );

        Ok(Self { client })
    }

    /// Map an AWS SDK error to an anyhow error with context.
    fn map_sdk_error(context: &str, err: impl std::fmt::Display) -> anyhow::Error {
        anyhow::anyhow!("AWS S3 {context}: {err}")
    }
}

impl StorageBackend for S3Backend {
    fn get(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<StoredObject>> + Send + '_>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            debug!("AWS get_object: bucket={} key={}", bucket, key);

            let resp = self
                .client
                .get_object()
                .bucket(&bucket)
                .key(&key)
                .send()
                .await
                .map_err(|e| {
                    let service_err = e.into_service_error();
                    if service_err.is_no_such_key() {
                        anyhow::anyhow!("Object not found: bucket={bucket} key={key}")
                    } else {
                        Self::map_sdk_error("get_object", service_err)
                    }
                })?;

            let content_type = resp.content_type().map(str::to_string);
            let reported_length = resp.content_length();

            let data = resp
                .body
                .collect()
                .await
                .map_err(|e| Self::map_sdk_error("get_object body", e))?
                .into_bytes();

            let content_length = reported_length
                .and_then(|n| u64::try_from(n).ok())
                .unwrap_or(data.len() as u64);

            Ok(StoredObject {
                data,
                content_length,
                content_type,
            })
        })
    }

    fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        let content_type = content_type.to_string();
        Box::pin(async move {
            debug!("AWS put_object: bucket={} key={}", bucket, key);

            self.client
                .put_object()
                .bucket(&bucket)
                .key(&key)
                .content_type(content_type)
                .body(aws_sdk_s3::primitives::ByteStream::from(data))
                .send()
                .await
                .map_err(|e| Self::map_sdk_error("put_object", e))?;

            Ok(())
        })
    }
}
