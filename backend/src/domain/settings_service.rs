//! Credentials, login check and language preference.

use anyhow::Result;
use shared::{Credentials, Language, UsernameDraft};
use tracing::{info, warn};

use super::models::{FormKind, ValidationError};
use crate::storage::repositories::{AuthRepository, DraftRepository, PreferencesRepository};

#[derive(Clone)]
pub struct SettingsService {
    auth: AuthRepository,
    preferences: PreferencesRepository,
    drafts: DraftRepository,
}

impl SettingsService {
    pub fn new(auth: AuthRepository, preferences: PreferencesRepository, drafts: DraftRepository) -> Self {
        Self {
            auth,
            preferences,
            drafts,
        }
    }

    pub async fn credentials(&self) -> Credentials {
        self.auth.get().await
    }

    /// Check a login attempt against the stored credentials
    pub async fn login(&self, username: &str, password: &str) -> bool {
        let credentials = self.auth.get().await;
        let accepted = credentials.username == username && credentials.password == password;
        if !accepted {
            warn!("Rejected login attempt for user '{}'", username);
        }
        accepted
    }

    /// Replace the stored credentials and discard the username draft
    pub async fn update_credentials(&self, username: &str, password: &str, confirm: &str) -> Result<()> {
        if !password.is_empty() && password != confirm {
            return Err(ValidationError::PasswordMismatch.into());
        }
        if username.is_empty() || password.is_empty() {
            return Err(ValidationError::MissingCredentials.into());
        }

        info!("Updating credentials for user '{}'", username);
        self.auth
            .save(&Credentials {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await;
        self.drafts.clear(FormKind::SettingsUsername.draft_name()).await;
        Ok(())
    }

    /// Username to show when the settings form opens: an unsaved edit wins
    /// over the stored value
    pub async fn initial_username(&self) -> String {
        let stored = self.auth.get().await.username;
        let draft = self
            .drafts
            .load::<UsernameDraft>(FormKind::SettingsUsername.draft_name())
            .await
            .and_then(|d| d.username)
            .filter(|name| !name.is_empty() && *name != stored);

        draft.unwrap_or(stored)
    }

    /// Persist an in-progress username edit right away; blank values are ignored
    pub async fn remember_username_edit(&self, username: &str) {
        if username.is_empty() {
            return;
        }
        let draft = UsernameDraft {
            username: Some(username.to_string()),
        };
        self.drafts
            .save(FormKind::SettingsUsername.draft_name(), &draft)
            .await;
    }

    pub async fn language(&self) -> Language {
        self.preferences.get_language().await
    }

    pub async fn set_language(&self, language: Language) {
        info!("Switching language to {}", language);
        self.preferences.set_language(language).await;
    }
}
