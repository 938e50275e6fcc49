use anyhow::Result;
use chrono::Utc;
use shared::{generate_id, Member, MemberDraft};
use tracing::info;

use super::models::{filled, ValidationError};
use crate::storage::repositories::MemberRepository;

/// Service for managing members
#[derive(Clone)]
pub struct MemberService {
    members: MemberRepository,
}

impl MemberService {
    pub fn new(members: MemberRepository) -> Self {
        Self { members }
    }

    pub async fn list_members(&self) -> Vec<Member> {
        self.members.list().await
    }

    pub async fn get_member(&self, id: &str) -> Option<Member> {
        self.members.list().await.into_iter().find(|m| m.id == id)
    }

    /// Create a member from the form, or update it when the form carries an id.
    ///
    /// New members get a fresh id and today's date (UTC) as start date; blank
    /// optional fields are stored as empty strings.
    pub async fn save_member(&self, draft: &MemberDraft) -> Result<Member> {
        let name = filled(&draft.name).ok_or(ValidationError::EmptyName)?;

        let member = Member {
            id: filled(&draft.id).map(str::to_string).unwrap_or_else(generate_id),
            name: name.to_string(),
            start_date: filled(&draft.start_date)
                .map(str::to_string)
                .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string()),
            phone_number: Some(draft.phone_number.clone().unwrap_or_default()),
            age: Some(draft.age.clone().unwrap_or_default()),
            description: Some(draft.description.clone().unwrap_or_default()),
        };

        info!("Saving member: {} ({})", member.name, member.id);
        self.members.upsert(member.clone()).await;
        Ok(member)
    }

    /// Delete a member. Schedules and reports that reference it are kept.
    pub async fn delete_member(&self, id: &str) {
        info!("Deleting member: {}", id);
        self.members.delete(id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;
    use crate::storage::traits::KeyValueStore;
    use std::sync::Arc;

    fn setup() -> MemberService {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        MemberService::new(MemberRepository::new(store))
    }

    #[tokio::test]
    async fn test_create_member_fills_defaults() {
        let service = setup();
        let draft = MemberDraft {
            name: Some("  John Doe ".to_string()),
            age: Some("30".to_string()),
            ..MemberDraft::default()
        };

        let member = service.save_member(&draft).await.unwrap();
        assert_eq!(member.name, "John Doe");
        assert!(!member.id.is_empty());
        assert_eq!(member.start_date, Utc::now().format("%Y-%m-%d").to_string());
        assert_eq!(member.phone_number.as_deref(), Some(""));
        assert_eq!(member.description.as_deref(), Some(""));
        assert_eq!(service.list_members().await, vec![member]);
    }

    #[tokio::test]
    async fn test_update_keeps_id_and_position() {
        let service = setup();
        let first = service
            .save_member(&MemberDraft {
                name: Some("First".to_string()),
                ..MemberDraft::default()
            })
            .await
            .unwrap();
        service
            .save_member(&MemberDraft {
                name: Some("Second".to_string()),
                ..MemberDraft::default()
            })
            .await
            .unwrap();

        let mut edit = MemberDraft::from(&first);
        edit.name = Some("First Renamed".to_string());
        let updated = service.save_member(&edit).await.unwrap();

        assert_eq!(updated.id, first.id);
        assert_eq!(updated.start_date, first.start_date);
        let names: Vec<String> = service.list_members().await.into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["First Renamed", "Second"]);
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let service = setup();
        let err = service
            .save_member(&MemberDraft {
                name: Some("   ".to_string()),
                ..MemberDraft::default()
            })
            .await
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::EmptyName)
        );
        assert!(service.list_members().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_member() {
        let service = setup();
        let member = service
            .save_member(&MemberDraft {
                name: Some("Gone".to_string()),
                ..MemberDraft::default()
            })
            .await
            .unwrap();

        service.delete_member(&member.id).await;
        assert!(service.get_member(&member.id).await.is_none());
    }
}
