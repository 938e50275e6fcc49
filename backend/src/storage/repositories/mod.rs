// Repository modules
pub mod collection;
pub mod member_repository;
pub mod tcf_repository;
pub mod schedule_repository;
pub mod report_repository;
pub mod auth_repository;
pub mod preferences_repository;
pub mod draft_repository;

// Re-export repository types
pub use collection::CollectionRepository;
pub use member_repository::MemberRepository;
pub use tcf_repository::{TcfRepository, DEFAULT_TCF_NAMES};
pub use schedule_repository::{ScheduleRepository, StoredSchedule};
pub use report_repository::ReportRepository;
pub use auth_repository::AuthRepository;
pub use preferences_repository::PreferencesRepository;
pub use draft_repository::DraftRepository;

use std::sync::Arc;

use crate::storage::traits::KeyValueStore;

/// Every repository, sharing one underlying store.
///
/// Build this once per store: the write locks that serialize
/// read-modify-write cycles live in the repositories and are shared by clones.
#[derive(Clone)]
pub struct Repositories {
    pub members: MemberRepository,
    pub tcfs: TcfRepository,
    pub schedules: ScheduleRepository,
    pub reports: ReportRepository,
    pub auth: AuthRepository,
    pub preferences: PreferencesRepository,
    pub drafts: DraftRepository,
}

impl Repositories {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            members: MemberRepository::new(store.clone()),
            tcfs: TcfRepository::new(store.clone()),
            schedules: ScheduleRepository::new(store.clone()),
            reports: ReportRepository::new(store.clone()),
            auth: AuthRepository::new(store.clone()),
            preferences: PreferencesRepository::new(store.clone()),
            drafts: DraftRepository::new(store),
        }
    }
}
