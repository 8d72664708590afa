//! Configuration loading and types for pixelstash.
//!
//! Configuration is read from an optional YAML file and deserialized into
//! the [`Config`] struct, then overridden from `PIXELSTASH_*` environment
//! variables (Lambda functions are configured through their environment).
//! Each subsection governs a different part of the system: the upload
//! pipeline, object storage, the metadata table, logging, and the local
//! development server.

use serde::Deserialize;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Upload pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Object storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Metadata store settings.
    #[serde(default)]
    pub metadata: MetadataConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Observability settings.
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Local development server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Upload pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Key prefix under which uploads land in the bucket.
    #[serde(default = "default_upload_prefix")]
    pub upload_prefix: String,

    /// Maximum number of notification entries processed concurrently.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            upload_prefix: default_upload_prefix(),
            max_workers: default_max_workers(),
        }
    }
}

/// Object storage backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Backend type: `aws` or `memory`.
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// Bucket the download handler reads from.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// AWS S3 settings.
    #[serde(default)]
    pub aws: AwsStorageConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            bucket: default_bucket(),
            aws: AwsStorageConfig::default(),
        }
    }
}

/// AWS S3 client configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AwsStorageConfig {
    /// AWS region (falls back to the default provider chain).
    #[serde(default)]
    pub region: Option<String>,
    /// Custom S3-compatible endpoint (e.g. MinIO, LocalStack).
    #[serde(default)]
    pub endpoint_url: Option<String>,
    /// Force path-style URL addressing.
    #[serde(default)]
    pub use_path_style: bool,
}

/// Metadata store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataConfig {
    /// Backend type: `dynamodb` or `memory`.
    #[serde(default = "default_metadata_engine")]
    pub engine: String,

    /// DynamoDB-specific configuration.
    #[serde(default)]
    pub dynamodb: DynamoDbMetaConfig,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            engine: default_metadata_engine(),
            dynamodb: DynamoDbMetaConfig::default(),
        }
    }
}

/// DynamoDB table configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DynamoDbMetaConfig {
    /// Table holding one item per image, keyed by `s3objectkey`.
    #[serde(default = "default_table")]
    pub table: String,
    /// AWS region (falls back to the default provider chain).
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint (e.g. DynamoDB Local).
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl Default for DynamoDbMetaConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            region: None,
            endpoint_url: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: text or json.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    /// Install the Prometheus recorder (exposed at `/metrics` by the local server).
    #[serde(default = "default_true")]
    pub metrics: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { metrics: true }
    }
}

/// Local development server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind host address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// -- Defaults ----------------------------------------------------------------

fn default_true() -> bool {
    true
}

fn default_upload_prefix() -> String {
    "uploads/".to_string()
}

fn default_max_workers() -> usize {
    100
}

fn default_storage_backend() -> String {
    "aws".to_string()
}

fn default_bucket() -> String {
    "kalingcket".to_string()
}

fn default_metadata_engine() -> String {
    "dynamodb".to_string()
}

fn default_table() -> String {
    "serverless-challenge-dev".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9300
}

// -- Loader ------------------------------------------------------------------

/// Load and parse configuration from a YAML file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let config: Config = serde_yaml::from_str(&contents)?;
    Ok(config)
}

/// Load configuration for a Lambda cold start or local run.
///
/// A missing file is not an error: defaults apply. Environment overrides
/// are applied last in both cases.
pub fn resolve_config<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let mut config = if path.as_ref().exists() {
        load_config(path)?
    } else {
        Config::default()
    };
    config.apply_overrides(|name| std::env::var(name).ok())?;
    Ok(config)
}

impl Config {
    /// Apply `PIXELSTASH_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(prefix) = lookup("PIXELSTASH_UPLOAD_PREFIX") {
            self.pipeline.upload_prefix = prefix;
        }
        if let Some(workers) = lookup("PIXELSTASH_MAX_WORKERS") {
            self.pipeline.max_workers = workers.parse().map_err(|e| {
                anyhow::anyhow!("PIXELSTASH_MAX_WORKERS must be a positive integer: {e}")
            })?;
        }
        if let Some(bucket) = lookup("PIXELSTASH_BUCKET") {
            self.storage.bucket = bucket;
        }
        if let Some(backend) = lookup("PIXELSTASH_STORAGE_BACKEND") {
            self.storage.backend = backend;
        }
        if let Some(table) = lookup("PIXELSTASH_TABLE") {
            self.metadata.dynamodb.table = table;
        }
        if let Some(engine) = lookup("PIXELSTASH_METADATA_ENGINE") {
            self.metadata.engine = engine;
        }
        if let Some(level) = lookup("PIXELSTASH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("PIXELSTASH_LOG_FORMAT") {
            self.logging.format = format;
        }

        if self.pipeline.max_workers == 0 {
            anyhow::bail!("pipeline.max_workers must be at least 1");
        }
        Ok(())
    }
}
