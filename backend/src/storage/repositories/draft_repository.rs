//! Per-form draft snapshots.
//!
//! One key per form name, each holding an arbitrary JSON document that is
//! overwritten in full on every save. Drafts are a convenience, so a broken
//! one simply reads as absent.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::storage::keys::draft_key;
use crate::storage::traits::{KeyValueStore, StorageError};

#[derive(Clone)]
pub struct DraftRepository {
    store: Arc<dyn KeyValueStore>,
}

impl DraftRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn try_save_value(&self, form: &str, data: &Value) -> Result<(), StorageError> {
        let key = draft_key(form);
        let raw = serde_json::to_string(data).map_err(|source| StorageError::Serialize {
            key: key.clone(),
            source,
        })?;
        debug!("Saving draft for form '{}'", form);
        self.store.set(&key, &raw).await
    }

    pub async fn save_value(&self, form: &str, data: &Value) {
        if let Err(e) = self.try_save_value(form, data).await {
            error!("Error saving draft for form '{}', write dropped: {}", form, e);
        }
    }

    pub async fn try_load_value(&self, form: &str) -> Result<Option<Value>, StorageError> {
        let key = draft_key(form);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Corrupt { key, source })
    }

    /// Load a draft; unreadable or malformed drafts are treated as absent
    pub async fn load_value(&self, form: &str) -> Option<Value> {
        match self.try_load_value(form).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Ignoring draft for form '{}': {}", form, e);
                None
            }
        }
    }

    /// Serialize `draft` and save it under `form`
    pub async fn save<T: Serialize>(&self, form: &str, draft: &T) {
        match serde_json::to_value(draft) {
            Ok(value) => self.save_value(form, &value).await,
            Err(e) => error!("Error serializing draft for form '{}': {}", form, e),
        }
    }

    /// Load the draft for `form` as `T`. A stored draft that doesn't fit `T`
    /// reads as absent.
    pub async fn load<T: DeserializeOwned>(&self, form: &str) -> Option<T> {
        let value = self.load_value(form).await?;
        match serde_json::from_value(value) {
            Ok(draft) => Some(draft),
            Err(e) => {
                warn!("Ignoring draft for form '{}': {}", form, e);
                None
            }
        }
    }

    pub async fn try_clear(&self, form: &str) -> Result<(), StorageError> {
        self.store.remove(&draft_key(form)).await?;
        Ok(())
    }

    pub async fn clear(&self, form: &str) {
        if let Err(e) = self.try_clear(form).await {
            error!("Error clearing draft for form '{}': {}", form, e);
        }
    }
}
