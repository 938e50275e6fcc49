use anyhow::Result;
use shared::{generate_id, Schedule, ScheduleDraft};
use tracing::info;

use super::models::{filled, ValidationError};
use crate::storage::repositories::ScheduleRepository;

/// Service for assigning TCFs to members
#[derive(Clone)]
pub struct ScheduleService {
    schedules: ScheduleRepository,
}

impl ScheduleService {
    pub fn new(schedules: ScheduleRepository) -> Self {
        Self { schedules }
    }

    /// All schedules in the current shape, legacy records included
    pub async fn list_schedules(&self) -> Vec<Schedule> {
        self.schedules.list().await
    }

    pub async fn schedules_for_member(&self, member_id: &str) -> Vec<Schedule> {
        self.schedules
            .list()
            .await
            .into_iter()
            .filter(|s| s.member_id == member_id)
            .collect()
    }

    /// Create or update a schedule. Saving always writes the current shape,
    /// so editing a legacy record migrates it.
    pub async fn save_schedule(&self, draft: &ScheduleDraft) -> Result<Schedule> {
        let member_id = filled(&draft.member_id).ok_or(ValidationError::MissingMember)?;
        if draft.tcf_ids.is_empty() {
            return Err(ValidationError::NoTcfSelected.into());
        }
        let start_date_time =
            filled(&draft.start_date_time).ok_or(ValidationError::MissingStartDateTime)?;

        let schedule = Schedule {
            id: filled(&draft.id).map(str::to_string).unwrap_or_else(generate_id),
            member_id: member_id.to_string(),
            tcf_ids: draft.tcf_ids.clone(),
            start_date_time: start_date_time.to_string(),
            repeat_status: draft.repeat_status.unwrap_or_default(),
            run_type: draft.run_type.unwrap_or_default(),
        };

        info!(
            "Saving schedule {} for member {} with {} TCF(s)",
            schedule.id,
            schedule.member_id,
            schedule.tcf_ids.len()
        );
        self.schedules.upsert(schedule.clone()).await;
        Ok(schedule)
    }

    pub async fn delete_schedule(&self, id: &str) {
        info!("Deleting schedule: {}", id);
        self.schedules.delete(id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::keys;
    use crate::storage::memory::MemoryStore;
    use crate::storage::repositories::StoredSchedule;
    use crate::storage::traits::KeyValueStore;
    use shared::{RepeatStatus, RunType};
    use std::sync::Arc;

    fn setup() -> (Arc<MemoryStore>, ScheduleService) {
        let store = Arc::new(MemoryStore::new());
        let repo = ScheduleRepository::new(store.clone() as Arc<dyn KeyValueStore>);
        (store, ScheduleService::new(repo))
    }

    fn valid_draft() -> ScheduleDraft {
        let mut draft = ScheduleDraft::with_defaults();
        draft.member_id = Some("m1".to_string());
        draft.start_date_time = Some("2024-05-01T09:30".to_string());
        draft.toggle_tcf("t1");
        draft
    }

    #[tokio::test]
    async fn test_create_schedule_with_defaults() {
        let (_store, service) = setup();

        let schedule = service.save_schedule(&valid_draft()).await.unwrap();
        assert_eq!(schedule.tcf_ids, vec!["t1".to_string()]);
        assert_eq!(schedule.repeat_status, RepeatStatus::None);
        assert_eq!(schedule.run_type, RunType::SingleDirection);
        assert_eq!(service.schedules_for_member("m1").await, vec![schedule]);
        assert!(service.schedules_for_member("m2").await.is_empty());
    }

    #[tokio::test]
    async fn test_validation_failures() {
        let (store, service) = setup();

        let mut no_member = valid_draft();
        no_member.member_id = None;
        let mut no_tcfs = valid_draft();
        no_tcfs.toggle_tcf("t1");
        let mut no_start = valid_draft();
        no_start.start_date_time = Some(String::new());

        let cases = [
            (no_member, ValidationError::MissingMember),
            (no_tcfs, ValidationError::NoTcfSelected),
            (no_start, ValidationError::MissingStartDateTime),
        ];
        for (draft, expected) in cases {
            let err = service.save_schedule(&draft).await.unwrap_err();
            assert_eq!(err.downcast_ref::<ValidationError>(), Some(&expected));
        }
        assert!(store.raw(keys::SCHEDULES).is_none());
    }

    #[tokio::test]
    async fn test_editing_legacy_schedule_migrates_it() {
        let (store, service) = setup();
        store
            .set(
                keys::SCHEDULES,
                r#"[{"id":"s1","memberId":"m1","tcfId":"t1","startDateTime":"2024-05-01T09:30","repeatStatus":"Daily","runType":"Bidirectional"}]"#,
            )
            .await
            .unwrap();

        let existing = service.list_schedules().await.remove(0);
        let mut draft = ScheduleDraft::from(&existing);
        draft.toggle_tcf("t2");
        service.save_schedule(&draft).await.unwrap();

        let repo = ScheduleRepository::new(store.clone() as Arc<dyn KeyValueStore>);
        let stored = repo.list_stored().await;
        assert_eq!(stored.len(), 1);
        match &stored[0] {
            StoredSchedule::Modern(s) => {
                assert_eq!(s.tcf_ids, vec!["t1".to_string(), "t2".to_string()]);
                assert_eq!(s.repeat_status, RepeatStatus::Daily);
            }
            other => panic!("expected modern record, got {:?}", other),
        }
    }
}
