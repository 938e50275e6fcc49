use anyhow::Result;
use shared::{generate_id, Tcf, TcfDraft};
use tracing::info;

use super::models::{filled, ValidationError};
use crate::storage::repositories::TcfRepository;

/// Service for the TCF catalog
#[derive(Clone)]
pub struct TcfService {
    tcfs: TcfRepository,
}

impl TcfService {
    pub fn new(tcfs: TcfRepository) -> Self {
        Self { tcfs }
    }

    /// The catalog, seeded with the default entries on first use
    pub async fn list_tcfs(&self) -> Vec<Tcf> {
        self.tcfs.list().await
    }

    pub async fn save_tcf(&self, draft: &TcfDraft) -> Result<Tcf> {
        let name = filled(&draft.name).ok_or(ValidationError::EmptyName)?;

        let tcf = Tcf {
            id: filled(&draft.id).map(str::to_string).unwrap_or_else(generate_id),
            name: name.to_string(),
            description: Some(draft.description.clone().unwrap_or_default()),
        };

        info!("Saving TCF: {} ({})", tcf.name, tcf.id);
        self.tcfs.upsert(tcf.clone()).await;
        Ok(tcf)
    }

    /// Delete a TCF. Schedules and reports that reference it are kept.
    pub async fn delete_tcf(&self, id: &str) {
        info!("Deleting TCF: {}", id);
        self.tcfs.delete(id).await;
    }
}
