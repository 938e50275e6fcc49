//! Generic JSON-array repository.
//!
//! Each entity collection lives under a single store key as a JSON array.
//! Every mutation is a full read-modify-write of that key, serialized through
//! a per-repository lock so that two writers sharing one repository never
//! interleave.
//!
//! Elements are decoded one at a time. An element that is valid JSON but not
//! a valid record is left out of reads and written back exactly as stored, so
//! one bad record never costs the rest of the collection.

use serde_json::value::{to_raw_value, RawValue};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, warn};

use crate::storage::traits::{KeyValueStore, Record, StorageError};

/// One element of a stored collection
enum Slot<T> {
    Decoded(T),
    /// Valid JSON that doesn't decode as a record, kept verbatim
    Opaque {
        id: Option<String>,
        raw: Box<RawValue>,
    },
}

impl<T: Record> Slot<T> {
    fn id(&self) -> Option<&str> {
        match self {
            Slot::Decoded(item) => Some(item.id()),
            Slot::Opaque { id, .. } => id.as_deref(),
        }
    }
}

/// String `id` of an undecodable element, if it has one
fn opaque_id(raw: &RawValue) -> Option<String> {
    match serde_json::from_str::<Value>(raw.get()) {
        Ok(Value::Object(fields)) => fields.get("id").and_then(Value::as_str).map(str::to_owned),
        _ => None,
    }
}

fn decoded<T>(slots: Vec<Slot<T>>) -> Vec<T> {
    slots
        .into_iter()
        .filter_map(|slot| match slot {
            Slot::Decoded(item) => Some(item),
            Slot::Opaque { .. } => None,
        })
        .collect()
}

pub struct CollectionRepository<T> {
    store: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for CollectionRepository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            write_lock: Arc::clone(&self.write_lock),
            _marker: PhantomData,
        }
    }
}

impl<T: Record> CollectionRepository<T> {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
            _marker: PhantomData,
        }
    }

    /// Hold the write lock until the guard is dropped. Upserts, deletes and
    /// seeding on this repository (and its clones) wait for it.
    pub async fn lock_writes(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.write_lock).lock_owned().await
    }

    /// Load the collection, distinguishing an absent key (`None`) from a
    /// present but empty one. Undecodable elements are skipped.
    pub async fn try_load(&self) -> Result<Option<Vec<T>>, StorageError> {
        Ok(self.try_load_slots().await?.map(decoded))
    }

    pub async fn try_list(&self) -> Result<Vec<T>, StorageError> {
        Ok(self.try_load().await?.unwrap_or_default())
    }

    /// List all decodable records; unreadable or non-JSON data reads as empty
    pub async fn list(&self) -> Vec<T> {
        match self.try_list().await {
            Ok(items) => items,
            Err(e) => {
                warn!("Error reading {}: {}", T::KEY, e);
                Vec::new()
            }
        }
    }

    /// Replace the record with the same id in place, or append it
    pub async fn try_upsert(&self, item: T) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut slots = self.load_for_write().await?;
        match slots.iter().position(|slot| slot.id() == Some(item.id())) {
            Some(index) => slots[index] = Slot::Decoded(item),
            None => slots.push(Slot::Decoded(item)),
        }

        self.write(&slots).await
    }

    pub async fn upsert(&self, item: T) {
        let id = item.id().to_string();
        if let Err(e) = self.try_upsert(item).await {
            error!("Error saving {} record {}, write dropped: {}", T::KEY, id, e);
        }
    }

    /// Remove the record with `id`. Returns whether anything was removed;
    /// nothing is written when the id is absent.
    pub async fn try_delete(&self, id: &str) -> Result<bool, StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut slots = self.load_for_write().await?;
        let before = slots.len();
        slots.retain(|slot| slot.id() != Some(id));

        if slots.len() == before {
            debug!("No {} record with id {}, nothing to delete", T::KEY, id);
            return Ok(false);
        }

        self.write(&slots).await?;
        Ok(true)
    }

    pub async fn delete(&self, id: &str) {
        if let Err(e) = self.try_delete(id).await {
            error!("Error deleting {} record {}, write dropped: {}", T::KEY, id, e);
        }
    }

    /// Return the stored collection, or initialize the key from `seed` when it
    /// has never been written. A failed seed write still returns the seed.
    pub async fn try_load_or_seed<F>(&self, seed: F) -> Result<Vec<T>, StorageError>
    where
        F: FnOnce() -> Vec<T>,
    {
        let _guard = self.write_lock.lock().await;

        if let Some(items) = self.try_load().await? {
            return Ok(items);
        }

        let items = seed();
        let slots: Vec<Slot<T>> = items.iter().cloned().map(Slot::Decoded).collect();
        if let Err(e) = self.write(&slots).await {
            error!("Error saving initial {}: {}", T::KEY, e);
        }
        Ok(items)
    }

    async fn try_load_slots(&self) -> Result<Option<Vec<Slot<T>>>, StorageError> {
        let Some(raw) = self.store.get(T::KEY).await? else {
            return Ok(None);
        };

        let elements: Vec<Box<RawValue>> =
            serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
                key: T::KEY.to_string(),
                source,
            })?;

        let slots = elements
            .into_iter()
            .enumerate()
            .map(|(index, raw)| match serde_json::from_str::<T>(raw.get()) {
                Ok(item) => Slot::Decoded(item),
                Err(e) => {
                    warn!("Skipping unreadable {} record at index {}: {}", T::KEY, index, e);
                    Slot::Opaque {
                        id: opaque_id(&raw),
                        raw,
                    }
                }
            })
            .collect();
        Ok(Some(slots))
    }

    /// Text that isn't a JSON array is treated as an empty collection so that
    /// a write can still go through; backend failures abort the write.
    async fn load_for_write(&self) -> Result<Vec<Slot<T>>, StorageError> {
        match self.try_load_slots().await {
            Ok(slots) => Ok(slots.unwrap_or_default()),
            Err(e @ StorageError::Corrupt { .. }) => {
                warn!("Overwriting malformed {}: {}", T::KEY, e);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn write(&self, slots: &[Slot<T>]) -> Result<(), StorageError> {
        let serialize_error = |source| StorageError::Serialize {
            key: T::KEY.to_string(),
            source,
        };

        let elements = slots
            .iter()
            .map(|slot| match slot {
                Slot::Decoded(item) => to_raw_value(item),
                Slot::Opaque { raw, .. } => Ok(raw.clone()),
            })
            .collect::<Result<Vec<Box<RawValue>>, serde_json::Error>>()
            .map_err(serialize_error)?;
        let raw = serde_json::to_string(&elements).map_err(serialize_error)?;
        self.store.set(T::KEY, &raw).await
    }
}
