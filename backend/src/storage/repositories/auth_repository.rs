//! Credentials record for the local authentication gate.
//!
//! Stored as a single JSON object under its own key. The default pair is
//! written the first time the key is found absent.

use shared::Credentials;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::storage::keys;
use crate::storage::traits::{KeyValueStore, StorageError};

#[derive(Clone)]
pub struct AuthRepository {
    store: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl AuthRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Stored credentials, persisting the default pair when none exist yet
    pub async fn try_get(&self) -> Result<Credentials, StorageError> {
        let _guard = self.write_lock.lock().await;

        match self.store.get(keys::AUTH).await? {
            Some(raw) => serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
                key: keys::AUTH.to_string(),
                source,
            }),
            None => {
                let defaults = Credentials::default();
                info!("No stored credentials, writing defaults");
                self.write(&defaults).await?;
                Ok(defaults)
            }
        }
    }

    /// Like [`try_get`](Self::try_get), but an unreadable record or failed
    /// write yields the default pair
    pub async fn get(&self) -> Credentials {
        match self.try_get().await {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!("Error reading credentials, using defaults: {}", e);
                Credentials::default()
            }
        }
    }

    pub async fn try_save(&self, credentials: &Credentials) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        self.write(credentials).await
    }

    pub async fn save(&self, credentials: &Credentials) {
        if let Err(e) = self.try_save(credentials).await {
            error!("Error saving credentials, write dropped: {}", e);
        }
    }

    async fn write(&self, credentials: &Credentials) -> Result<(), StorageError> {
        let raw = serde_json::to_string(credentials).map_err(|source| StorageError::Serialize {
            key: keys::AUTH.to_string(),
            source,
        })?;
        self.store.set(keys::AUTH, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;

    fn setup() -> (Arc<MemoryStore>, AuthRepository) {
        let store = Arc::new(MemoryStore::new());
        let repo = AuthRepository::new(store.clone() as Arc<dyn KeyValueStore>);
        (store, repo)
    }

    #[tokio::test]
    async fn test_absent_credentials_are_persisted_as_default() {
        let (store, repo) = setup();

        let credentials = repo.get().await;
        assert_eq!(credentials, Credentials::default());

        let raw = store.raw(keys::AUTH).unwrap();
        let stored: Credentials = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored.username, "test");
        assert_eq!(stored.password, "test");

        // Later reads don't rewrite
        repo.get().await;
        assert_eq!(store.write_count(keys::AUTH), 1);
    }

    #[tokio::test]
    async fn test_save_then_get() {
        let (_store, repo) = setup();
        let credentials = Credentials {
            username: "admin".to_string(),
            password: "s3cret".to_string(),
        };

        repo.save(&credentials).await;
        assert_eq!(repo.get().await, credentials);
    }

    #[tokio::test]
    async fn test_unreadable_credentials_fall_back_without_persisting() {
        let (store, repo) = setup();
        store.set(keys::AUTH, "not json").await.unwrap();

        assert_eq!(repo.get().await, Credentials::default());
        assert_eq!(store.raw(keys::AUTH).as_deref(), Some("not json"));
        assert!(matches!(
            repo.try_get().await,
            Err(StorageError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn test_unavailable_store_returns_default() {
        let (store, repo) = setup();
        store.set_unavailable(true);

        assert_eq!(repo.get().await, Credentials::default());
        store.set_unavailable(false);
        assert!(store.raw(keys::AUTH).is_none());
    }
}
