//! AWS DynamoDB metadata store backend.
//!
//! One item per image, hash key `s3objectkey`:
//! - `s3objectkey` S
//! - `width`, `height`, `size` N
//! - `type` S (omitted when unknown)
//!
//! DynamoDB transports every number as a decimal string.  Those strings
//! are normalized here, at the adapter boundary, into plain integers or
//! finite floats; a value that has no plain-number representation fails
//! the read instead of leaking a decimal into the record.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use tracing::debug;

use super::store::{MetadataRecord, MetadataStore};
use crate::config::DynamoDbMetaConfig;

const ATTR_KEY: &str = "s3objectkey";
const ATTR_WIDTH: &str = "width";
const ATTR_HEIGHT: &str = "height";
const ATTR_TYPE: &str = "type";
const ATTR_SIZE: &str = "size";

/// Convert a DynamoDB `N` string into a JSON number.
///
/// Integers stay integers; anything else must parse as a finite `f64`.
pub fn normalize_number(raw: &str) -> anyhow::Result<serde_json::Number> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u64>() {
        return Ok(n.into());
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Ok(n.into());
    }
    raw.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .ok_or_else(|| {
            anyhow::anyhow!("numeric attribute {raw:?} is not representable as a number")
        })
}

fn number_attr(item: &HashMap<String, AttributeValue>, name: &str) -> anyhow::Result<u64> {
    let raw = match item.get(name) {
        Some(AttributeValue::N(n)) => n,
        Some(other) => anyhow::bail!("attribute {name} is not a number: {other:?}"),
        None => anyhow::bail!("attribute {name} is missing"),
    };
    let number = normalize_number(raw)?;
    if let Some(n) = number.as_u64() {
        return Ok(n);
    }
    match number.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
        _ => anyhow::bail!("attribute {name}={raw} is not a non-negative integer"),
    }
}

fn dimension_attr(item: &HashMap<String, AttributeValue>, name: &str) -> anyhow::Result<u32> {
    let n = number_attr(item, name)?;
    u32::try_from(n).map_err(|_| anyhow::anyhow!("attribute {name}={n} is out of range"))
}

/// Build a typed record from a raw DynamoDB item.
pub fn item_to_record(item: &HashMap<String, AttributeValue>) -> anyhow::Result<MetadataRecord> {
    let object_key = match item.get(ATTR_KEY) {
        Some(AttributeValue::S(s)) => s.clone(),
        _ => anyhow::bail!("item has no string {ATTR_KEY} attribute"),
    };
    let format = match item.get(ATTR_TYPE) {
        Some(AttributeValue::S(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    };

    Ok(MetadataRecord {
        width: dimension_attr(item, ATTR_WIDTH)?,
        height: dimension_attr(item, ATTR_HEIGHT)?,
        size: number_attr(item, ATTR_SIZE)?,
        format,
        object_key,
    })
}

/// Build a DynamoDB item from a typed record.
pub fn record_to_item(record: MetadataRecord) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::new();
    item.insert(ATTR_KEY.to_string(), AttributeValue::S(record.object_key));
    item.insert(
        ATTR_WIDTH.to_string(),
        AttributeValue::N(record.width.to_string()),
    );
    item.insert(
        ATTR_HEIGHT.to_string(),
        AttributeValue::N(record.height.to_string()),
    );
    item.insert(
        ATTR_SIZE.to_string(),
        AttributeValue::N(record.size.to_string()),
    );
    if let Some(format) = record.format {
        item.insert(ATTR_TYPE.to_string(), AttributeValue::S(format));
    }
    item
}

pub struct DynamoDbMetadataStore {
    client: Client,
    table_name: String,
}

impl DynamoDbMetadataStore {
    pub async fn new(config: &DynamoDbMetaConfig) -> anyhow::Result<Self> {
        let mut builder = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = &config.region {
            builder = builder.region(aws_config::Region::new(region.clone()));
        }

        if let Some(endpoint_url) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint_url);
        }

        let cfg = builder.load().await;
        let client = Client::new(&cfg);

        Ok(Self {
            client,
            table_name: config.table.clone(),
        })
    }
}

impl MetadataStore for DynamoDbMetadataStore {
    fn put_record(
        &self,
        record: MetadataRecord,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        Box::pin(async move {
            debug!(
                "DynamoDB put_item: table={} key={}",
                self.table_name, record.object_key
            );

            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(record_to_item(record)))
                .send()
                .await?;

            Ok(())
        })
    }

    fn get_record(
        &self,
        object_key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<MetadataRecord>>> + Send + '_>> {
        let object_key = object_key.to_string();
        Box::pin(async move {
            debug!(
                "DynamoDB get_item: table={} key={}",
                self.table_name, object_key
            );

            let result = self
                .client
                .get_item()
                .table_name(&self.table_name)
                .key(ATTR_KEY, AttributeValue::S(object_key))
                .send()
                .await?;

            result.item().map(item_to_record).transpose()
        })
    }

    fn scan_records(
        &self,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<MetadataRecord>>> + Send + '_>> {
        Box::pin(async move {
            let mut records = Vec::new();
            let mut exclusive_start_key: Option<HashMap<String, AttributeValue>> = None;

            loop {
                let mut query = self.client.scan().table_name(&self.table_name);

                if let Some(key) = &exclusive_start_key {
                    query = query.set_exclusive_start_key(Some(key.clone()));
                }

                let result = query.send().await?;

                for item in result.items() {
                    records.push(item_to_record(item)?);
                }

                if result.last_evaluated_key().is_none() {
                    break;
                }
                exclusive_start_key = result.last_evaluated_key().cloned();
            }

            debug!(
                "DynamoDB scan: table={} items={}",
                self.table_name,
                records.len()
            );
            Ok(records)
        })
    }
}
