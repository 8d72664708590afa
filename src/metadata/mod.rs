//! Metadata storage layer.
//!
//! The metadata store keeps one [`store::MetadataRecord`] per uploaded
//! image.  The [`store::MetadataStore`] trait defines the interface;
//! [`dynamodb::DynamoDbMetadataStore`] is the production implementation
//! and [`memory::MemoryMetadataStore`] backs tests and local runs.

pub mod dynamodb;
pub mod memory;
pub mod store;
