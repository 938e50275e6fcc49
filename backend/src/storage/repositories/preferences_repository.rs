use shared::Language;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::storage::keys;
use crate::storage::traits::{KeyValueStore, StorageError};

/// UI preferences. The language tag is stored as a bare string, not JSON.
#[derive(Clone)]
pub struct PreferencesRepository {
    store: Arc<dyn KeyValueStore>,
}

impl PreferencesRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn try_get_language(&self) -> Result<Language, StorageError> {
        let Some(tag) = self.store.get(keys::LANGUAGE).await? else {
            return Ok(Language::default());
        };

        Ok(Language::from_tag(&tag).unwrap_or_else(|| {
            debug!("Unrecognized language tag {:?}, using default", tag);
            Language::default()
        }))
    }

    pub async fn get_language(&self) -> Language {
        match self.try_get_language().await {
            Ok(language) => language,
            Err(e) => {
                warn!("Error reading language preference: {}", e);
                Language::default()
            }
        }
    }

    pub async fn try_set_language(&self, language: Language) -> Result<(), StorageError> {
        self.store.set(keys::LANGUAGE, language.as_tag()).await
    }

    pub async fn set_language(&self, language: Language) {
        if let Err(e) = self.try_set_language(language).await {
            error!("Error saving language preference, write dropped: {}", e);
        }
    }
}
