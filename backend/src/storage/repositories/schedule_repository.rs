//! Schedule repository with on-read migration of the legacy record shape.
//!
//! Older records referenced a single TCF through `tcfId`; current records
//! carry a `tcfIds` list. Records are decoded into [`StoredSchedule`] and
//! normalized on every read. The stored shape only changes when that
//! particular schedule is saved again.

use serde::{Deserialize, Serialize};
use shared::{RepeatStatus, RunType, Schedule};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

use super::collection::CollectionRepository;
use crate::storage::keys;
use crate::storage::traits::{KeyValueStore, Record, StorageError};

/// A schedule as it sits in the store.
///
/// Variants are tried in order: a record with `tcfIds` is modern even if it
/// also carries a stray `tcfId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredSchedule {
    Modern(Schedule),
    Legacy(LegacySchedule),
    /// Neither TCF field present; passed through for form validation to catch
    Bare(BareSchedule),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySchedule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub member_id: String,
    pub tcf_id: String,
    #[serde(default)]
    pub start_date_time: String,
    #[serde(default)]
    pub repeat_status: RepeatStatus,
    #[serde(default)]
    pub run_type: RunType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BareSchedule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub member_id: String,
    #[serde(default)]
    pub start_date_time: String,
    #[serde(default)]
    pub repeat_status: RepeatStatus,
    #[serde(default)]
    pub run_type: RunType,
}

impl StoredSchedule {
    /// Normalize into the current shape
    pub fn into_schedule(self) -> Schedule {
        match self {
            StoredSchedule::Modern(schedule) => schedule,
            StoredSchedule::Legacy(legacy) => {
                let tcf_ids = if legacy.tcf_id.is_empty() {
                    Vec::new()
                } else {
                    vec![legacy.tcf_id]
                };
                Schedule {
                    id: legacy.id,
                    member_id: legacy.member_id,
                    tcf_ids,
                    start_date_time: legacy.start_date_time,
                    repeat_status: legacy.repeat_status,
                    run_type: legacy.run_type,
                }
            }
            StoredSchedule::Bare(bare) => Schedule {
                id: bare.id,
                member_id: bare.member_id,
                tcf_ids: Vec::new(),
                start_date_time: bare.start_date_time,
                repeat_status: bare.repeat_status,
                run_type: bare.run_type,
            },
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, StoredSchedule::Legacy(_))
    }
}

impl Record for StoredSchedule {
    const KEY: &'static str = keys::SCHEDULES;

    fn id(&self) -> &str {
        match self {
            StoredSchedule::Modern(s) => &s.id,
            StoredSchedule::Legacy(s) => &s.id,
            StoredSchedule::Bare(s) => &s.id,
        }
    }
}

#[derive(Clone)]
pub struct ScheduleRepository {
    collection: CollectionRepository<StoredSchedule>,
}

impl ScheduleRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            collection: CollectionRepository::new(store),
        }
    }

    pub async fn lock_writes(&self) -> OwnedMutexGuard<()> {
        self.collection.lock_writes().await
    }

    pub async fn try_list(&self) -> Result<Vec<Schedule>, StorageError> {
        let stored = self.collection.try_list().await?;
        Ok(stored.into_iter().map(StoredSchedule::into_schedule).collect())
    }

    /// List schedules in the current shape
    pub async fn list(&self) -> Vec<Schedule> {
        self.collection
            .list()
            .await
            .into_iter()
            .map(StoredSchedule::into_schedule)
            .collect()
    }

    /// Records exactly as stored, before migration
    pub async fn list_stored(&self) -> Vec<StoredSchedule> {
        self.collection.list().await
    }

    /// Save a schedule in the current shape; other records keep their stored shape
    pub async fn upsert(&self, schedule: Schedule) {
        self.collection.upsert(StoredSchedule::Modern(schedule)).await
    }

    pub async fn try_upsert(&self, schedule: Schedule) -> Result<(), StorageError> {
        self.collection
            .try_upsert(StoredSchedule::Modern(schedule))
            .await
    }

    pub async fn delete(&self, id: &str) {
        self.collection.delete(id).await
    }

    pub async fn try_delete(&self, id: &str) -> Result<bool, StorageError> {
        self.collection.try_delete(id).await
    }
}
