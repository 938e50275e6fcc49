use shared::Report;

use super::collection::CollectionRepository;
use crate::storage::keys;
use crate::storage::traits::Record;

impl Record for Report {
    const KEY: &'static str = keys::REPORTS;

    fn id(&self) -> &str {
        &self.id
    }
}

pub type ReportRepository = CollectionRepository<Report>;

impl CollectionRepository<Report> {
    /// Reports ordered by creation time, most recent first
    pub async fn list_newest_first(&self) -> Vec<Report> {
        let mut reports = self.list().await;
        reports.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;
    use crate::storage::traits::KeyValueStore;
    use std::sync::Arc;

    fn report(id: &str, timestamp: i64) -> Report {
        Report {
            id: id.to_string(),
            member_id: "m1".to_string(),
            tcf_id: "t1".to_string(),
            start_time: None,
            description: None,
            timestamp,
            audio_note: None,
        }
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let repo = ReportRepository::new(store);

        repo.upsert(report("old", 1_000)).await;
        repo.upsert(report("new", 3_000)).await;
        repo.upsert(report("mid", 2_000)).await;

        let ids: Vec<String> = repo
            .list_newest_first()
            .await
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);

        // Stored order is insertion order
        let stored: Vec<String> = repo.list().await.into_iter().map(|r| r.id).collect();
        assert_eq!(stored, vec!["old", "new", "mid"]);
    }
}
