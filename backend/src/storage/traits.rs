//! # Storage Traits
//!
//! The key-value abstraction every repository is written against, plus the
//! `Record` trait that lets a single generic repository serve each entity
//! collection.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Failures raised inside the storage layer.
///
/// Repositories surface these through their `try_*` methods; the plain
/// methods log them and degrade to an empty read or a dropped write.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend failure: {0}")]
    Backend(#[from] sqlx::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage quota exceeded writing '{key}' ({needed} bytes needed, {available} available)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    #[error("value stored under '{key}' is malformed: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize value for '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A string-keyed store of string values.
///
/// Every value is replaced wholesale on write, so one key's entire value is
/// the unit of atomicity.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`, `None` when the key is absent
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the value stored under `key`
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`, returning whether it existed
    async fn remove(&self, key: &str) -> Result<bool, StorageError>;

    /// List every key currently present
    async fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// An entity persisted as one element of a JSON array stored under `KEY`
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Store key holding the whole collection
    const KEY: &'static str;

    fn id(&self) -> &str;
}
