//! pixelstash library: serverless image metadata pipeline.
//!
//! This crate provides four independent handlers over an object store
//! and a metadata table: metadata extraction on upload, image download,
//! metadata lookup, and a dataset summary.  Handlers run behind the AWS
//! Lambda runtime or, for local development, an axum server.

use std::sync::Arc;

use tracing::info;

pub mod config;
pub mod envelope;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod lambda;
pub mod metadata;
pub mod metrics;
pub mod probe;
pub mod server;
pub mod storage;

use crate::config::Config;
use crate::metadata::store::MetadataStore;
use crate::storage::backend::StorageBackend;

/// Shared state handed to every handler.
///
/// Clients are built once per process (Lambda cold start) and injected,
/// so tests can swap in the in-memory backends.
pub struct AppState {
    /// Resolved configuration.
    pub config: Config,
    /// Metadata table.
    pub metadata: Arc<dyn MetadataStore>,
    /// Object storage backend.
    pub storage: Arc<dyn StorageBackend>,
}

impl AppState {
    pub fn new(
        config: Config,
        metadata: Arc<dyn MetadataStore>,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            config,
            metadata,
            storage,
        }
    }

    /// Build the backends named by `config`.
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let metadata: Arc<dyn MetadataStore> = match config.metadata.engine.as_str() {
            "dynamodb" => {
                let store =
                    metadata::dynamodb::DynamoDbMetadataStore::new(&config.metadata.dynamodb)
                        .await?;
                info!(
                    "DynamoDB metadata store initialized: table={}",
                    config.metadata.dynamodb.table
                );
                Arc::new(store)
            }
            "memory" => {
                info!("In-memory metadata store initialized");
                Arc::new(metadata::memory::MemoryMetadataStore::new())
            }
            other => anyhow::bail!(
                "unknown metadata.engine '{other}' (expected 'dynamodb' or 'memory')"
            ),
        };

        let storage: Arc<dyn StorageBackend> = match config.storage.backend.as_str() {
            "aws" => Arc::new(storage::aws::S3Backend::new(&config.storage.aws).await?),
            "memory" => {
                info!("In-memory storage backend initialized");
                Arc::new(storage::memory::MemoryBackend::new())
            }
            other => {
                anyhow::bail!("unknown storage.backend '{other}' (expected 'aws' or 'memory')")
            }
        };

        Ok(Self::new(config, metadata, storage))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_config_memory_backends() {
        let mut config = Config::default();
        config.metadata.engine = "memory".to_string();
        config.storage.backend = "memory".to_string();
        let state = AppState::from_config(config).await.unwrap();
        assert!(state.metadata.scan_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_from_config_rejects_unknown_backend() {
        let mut config = Config::default();
        config.metadata.engine = "memory".to_string();
        config.storage.backend = "floppy".to_string();
        assert!(AppState::from_config(config).await.is_err());
    }
}
