use shared::Member;

use super::collection::CollectionRepository;
use crate::storage::keys;
use crate::storage::traits::Record;

impl Record for Member {
    const KEY: &'static str = keys::MEMBERS;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Members are plain CRUD over the shared collection repository
pub type MemberRepository = CollectionRepository<Member>;
