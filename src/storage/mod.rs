//! Object storage backends.
//!
//! The [`backend::StorageBackend`] trait abstracts over where image bytes
//! live: AWS S3 in production, an in-memory map for tests and local runs.

pub mod aws;
pub mod backend;
pub mod memory;
