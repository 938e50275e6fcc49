//! # Backup Service
//!
//! Exports every persisted key except drafts into one JSON document and
//! restores such a document.
//!
//! ## Document Format
//!
//! ```json
//! {
//!   "members": "[...]",
//!   "tcfs": "[...]",
//!   "schedules": "[...]",
//!   "reports": "[...]",
//!   "auth": "{...}",
//!   "lang": "fa",
//!   "version": "1.0"
//! }
//! ```
//!
//! Each entry is the raw string stored under its key (JSON text itself) or
//! `null` when the key was never written. Entries are restored verbatim
//! while the collection repositories' write locks are held, so no upsert or
//! delete straddles a restore.

use serde_json::{Map, Value};
use shared::{BackupDocument, BACKUP_FORMAT_VERSION};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::storage::keys;
use crate::storage::repositories::Repositories;
use crate::storage::traits::{KeyValueStore, StorageError};

/// Document field and the store key it carries
const BUNDLED_KEYS: [(&str, &str); 6] = [
    ("members", keys::MEMBERS),
    ("tcfs", keys::TCFS),
    ("schedules", keys::SCHEDULES),
    ("reports", keys::REPORTS),
    ("auth", keys::AUTH),
    ("lang", keys::LANGUAGE),
];

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("backup is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("backup must be a JSON object")]
    NotAnObject,
    #[error("backup field '{0}' must be a string or null")]
    InvalidField(&'static str),
    #[error("restore failed and was rolled back: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Clone)]
pub struct BackupService {
    store: Arc<dyn KeyValueStore>,
    repositories: Repositories,
}

impl BackupService {
    /// `repositories` must be built over the same `store`
    pub fn new(store: Arc<dyn KeyValueStore>, repositories: Repositories) -> Self {
        Self { store, repositories }
    }

    /// Snapshot the persisted state. Fails rather than produce a partial
    /// backup when a key can't be read.
    pub async fn export_data(&self) -> Result<String, StorageError> {
        let document = BackupDocument {
            members: self.store.get(keys::MEMBERS).await?,
            tcfs: self.store.get(keys::TCFS).await?,
            schedules: self.store.get(keys::SCHEDULES).await?,
            reports: self.store.get(keys::REPORTS).await?,
            auth: self.store.get(keys::AUTH).await?,
            lang: self.store.get(keys::LANGUAGE).await?,
            version: Some(BACKUP_FORMAT_VERSION.to_string()),
        };

        info!("Exported backup");
        serde_json::to_string(&document).map_err(|source| StorageError::Serialize {
            key: "backup".to_string(),
            source,
        })
    }

    /// Restore a backup, returning whether it was applied
    pub async fn import_data(&self, text: &str) -> bool {
        match self.try_import(text).await {
            Ok(restored) => {
                info!("Restored {} key(s) from backup", restored);
                true
            }
            Err(e) => {
                warn!("Backup import rejected: {}", e);
                false
            }
        }
    }

    /// Restore a backup, returning how many keys were written.
    ///
    /// The document is fully validated before anything is written. Non-empty
    /// string entries overwrite their key; missing, null or empty entries leave
    /// it alone. If a write fails, keys already written are put back.
    pub async fn try_import(&self, text: &str) -> Result<usize, ImportError> {
        let document: Value = serde_json::from_str(text)?;
        let Value::Object(fields) = document else {
            return Err(ImportError::NotAnObject);
        };
        let entries = Self::entries(&fields)?;

        // Always taken in this order
        let _locks = (
            self.repositories.members.lock_writes().await,
            self.repositories.tcfs.lock_writes().await,
            self.repositories.schedules.lock_writes().await,
            self.repositories.reports.lock_writes().await,
        );

        let mut previous: Vec<(&str, Option<String>)> = Vec::with_capacity(entries.len());
        for &(key, ref value) in &entries {
            let result = match self.store.get(key).await {
                Ok(old) => {
                    previous.push((key, old));
                    self.store.set(key, value).await
                }
                Err(e) => Err(e),
            };

            if let Err(e) = result {
                self.roll_back(previous).await;
                return Err(e.into());
            }
        }

        Ok(entries.len())
    }

    fn entries(fields: &Map<String, Value>) -> Result<Vec<(&'static str, String)>, ImportError> {
        let mut entries = Vec::new();
        for (field, key) in BUNDLED_KEYS {
            match fields.get(field) {
                None | Some(Value::Null) => {}
                Some(Value::String(raw)) if raw.is_empty() => {}
                Some(Value::String(raw)) => entries.push((key, raw.clone())),
                Some(_) => return Err(ImportError::InvalidField(field)),
            }
        }
        Ok(entries)
    }

    async fn roll_back(&self, previous: Vec<(&str, Option<String>)>) {
        for (key, old) in previous.into_iter().rev() {
            let result = match old {
                Some(raw) => self.store.set(key, &raw).await,
                None => self.store.remove(key).await.map(|_| ()),
            };
            if let Err(e) = result {
                error!("Error restoring '{}' after failed import: {}", key, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;
    use serde_json::json;

    fn service_for(store: &Arc<MemoryStore>) -> BackupService {
        let store = store.clone() as Arc<dyn KeyValueStore>;
        BackupService::new(store.clone(), Repositories::new(store))
    }

    fn setup() -> (Arc<MemoryStore>, BackupService) {
        let store = Arc::new(MemoryStore::new());
        let service = service_for(&store);
        (store, service)
    }

    #[tokio::test]
    async fn test_export_uses_raw_values_and_nulls() {
        let (store, service) = setup();
        store.set(keys::MEMBERS, r#"[{"id":"m1","name":"John"}]"#).await.unwrap();
        store.set(keys::LANGUAGE, "fa").await.unwrap();
        store.set("tcf_app_drafts_member", "{}").await.unwrap();

        let exported: Value = serde_json::from_str(&service.export_data().await.unwrap()).unwrap();
        assert_eq!(
            exported,
            json!({
                "members": r#"[{"id":"m1","name":"John"}]"#,
                "tcfs": null,
                "schedules": null,
                "reports": null,
                "auth": null,
                "lang": "fa",
                "version": "1.0"
            })
        );
    }

    #[tokio::test]
    async fn test_import_writes_present_fields_verbatim() {
        let (store, service) = setup();
        store.set(keys::REPORTS, "[\"keep\"]").await.unwrap();

        let backup = json!({
            "members": "[]",
            "tcfs": "[{\"id\":\"t1\",\"name\":\"X\"}]",
            "reports": null,
            "auth": "",
            "lang": "fa",
            "version": "1.0"
        })
        .to_string();

        assert!(service.import_data(&backup).await);
        assert_eq!(store.raw(keys::MEMBERS).as_deref(), Some("[]"));
        assert_eq!(store.raw(keys::TCFS).as_deref(), Some("[{\"id\":\"t1\",\"name\":\"X\"}]"));
        assert_eq!(store.raw(keys::REPORTS).as_deref(), Some("[\"keep\"]"));
        assert!(store.raw(keys::AUTH).is_none());
        assert!(store.raw(keys::SCHEDULES).is_none());
        assert_eq!(store.raw(keys::LANGUAGE).as_deref(), Some("fa"));
    }

    #[tokio::test]
    async fn test_rejected_documents_write_nothing() {
        let (store, service) = setup();
        store.set(keys::MEMBERS, "[]").await.unwrap();

        for text in [
            "not json",
            "null",
            "[1, 2]",
            "\"members\"",
            r#"{"members": "[]", "tcfs": 42}"#,
            r#"{"members": ["inline"]}"#,
        ] {
            assert!(!service.import_data(text).await, "accepted {}", text);
        }

        assert_eq!(store.write_count(keys::MEMBERS), 1);
        assert!(store.raw(keys::TCFS).is_none());
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back() {
        let store = Arc::new(MemoryStore::with_quota(200));
        let service = service_for(&store);
        store.set(keys::MEMBERS, "[\"old\"]").await.unwrap();

        let backup = json!({
            "members": "[\"new\"]",
            "tcfs": "[]",
            "reports": "x".repeat(300),
        })
        .to_string();

        assert!(!service.import_data(&backup).await);
        assert_eq!(store.raw(keys::MEMBERS).as_deref(), Some("[\"old\"]"));
        assert!(store.raw(keys::TCFS).is_none());
        assert!(store.raw(keys::REPORTS).is_none());
    }

    #[tokio::test]
    async fn test_round_trip_restores_state() {
        let (source, exporter) = setup();
        source.set(keys::MEMBERS, r#"[{"id":"m1","name":"John"}]"#).await.unwrap();
        source.set(keys::TCFS, "[]").await.unwrap();
        source.set(keys::AUTH, r#"{"username":"a","password":"b"}"#).await.unwrap();
        let backup = exporter.export_data().await.unwrap();

        let (target, importer) = setup();
        assert!(importer.import_data(&backup).await);
        for key in [keys::MEMBERS, keys::TCFS, keys::AUTH, keys::SCHEDULES] {
            assert_eq!(target.raw(key), source.raw(key));
        }
    }

    #[tokio::test]
    async fn test_import_waits_for_in_flight_collection_writes() {
        let (store, service) = setup();
        let guard = service.repositories.schedules.lock_writes().await;

        let importer = service.clone();
        let handle = tokio::spawn(async move {
            importer
                .import_data(&json!({ "members": "[]", "schedules": "[]" }).to_string())
                .await
        });
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(store.raw(keys::MEMBERS).is_none());

        drop(guard);
        assert!(handle.await.unwrap());
        assert_eq!(store.raw(keys::MEMBERS).as_deref(), Some("[]"));
        assert_eq!(store.raw(keys::SCHEDULES).as_deref(), Some("[]"));
    }
}
