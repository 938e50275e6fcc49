//! TCF repository with first-run catalog seeding.
//!
//! The catalog is written exactly once: when the TCF key has never been
//! persisted. Any stored value, including an empty list left behind by
//! deletions, means the catalog is never recreated.

use shared::{generate_id, Tcf};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::{info, warn};

use super::collection::CollectionRepository;
use crate::storage::keys;
use crate::storage::traits::{KeyValueStore, Record, StorageError};

/// Default TCF catalog, in display order
pub const DEFAULT_TCF_NAMES: [&str; 41] = [
    "فرادرمانی",
    "اسکن دوگانگی",
    "همفازی کیهانی",
    "همفازی کالبدی",
    "همفازی با زمان",
    "کنترل ذهن",
    "کنترل دشارژ بیرونی",
    "کنترل دشارژ درونی",
    "کنترل تشعشعات منفی",
    "طلب خیرها",
    "تزکیه تشعشعاتی",
    "وحدت",
    "من معنوی",
    "بارش",
    "ذهن بی ذهنی",
    "قونیه یک",
    "قونیه دو",
    "شارز یونی والکترونی",
    "پاکسازی چاکرا",
    "اعوذوا",
    "گستردگی",
    "آشتی با مرگ",
    "بینام ترم ۷ (رسیدن به درک چرخه)",
    "پیوند",
    "قنوت",
    "قیام",
    "رکوع",
    "سجده",
    "سلام",
    "تعمید روح",
    "قرارگیری در لاتضادی",
    "بینام ترم‌۸ (درک دوره ۸ )",
    "اصلاح طبایع در بنیاد",
    "حلقه ترک عادت",
    "اصلاح الگوی خواب",
    "ارتباط اصلاح چرخه های نرم افزاری معیوب در ناخودآگاهی - اعتیاد",
    "ارتباط اسکن نرم افزاری کلی چیدمان وجود",
    "ارتباط تنظیم و اصلاح مبدلهای انرژی پنهان",
    "ارتباط تغذیه چاکرایی",
    "حلقه درک حضور",
    "اعلام حلقه کل برای دیگران",
];

impl Record for Tcf {
    const KEY: &'static str = keys::TCFS;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Clone)]
pub struct TcfRepository {
    collection: CollectionRepository<Tcf>,
}

impl TcfRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            collection: CollectionRepository::new(store),
        }
    }

    /// Build a fresh catalog with new ids and empty descriptions
    pub fn default_catalog() -> Vec<Tcf> {
        DEFAULT_TCF_NAMES
            .iter()
            .map(|name| Tcf {
                id: generate_id(),
                name: name.to_string(),
                description: Some(String::new()),
            })
            .collect()
    }

    pub async fn lock_writes(&self) -> OwnedMutexGuard<()> {
        self.collection.lock_writes().await
    }

    pub async fn try_list(&self) -> Result<Vec<Tcf>, StorageError> {
        self.collection
            .try_load_or_seed(|| {
                info!("No TCFs stored yet, seeding {} defaults", DEFAULT_TCF_NAMES.len());
                Self::default_catalog()
            })
            .await
    }

    /// List TCFs, seeding the default catalog on the very first read
    pub async fn list(&self) -> Vec<Tcf> {
        match self.try_list().await {
            Ok(items) => items,
            Err(e) => {
                warn!("Error reading {}: {}", keys::TCFS, e);
                Vec::new()
            }
        }
    }

    pub async fn upsert(&self, tcf: Tcf) {
        self.collection.upsert(tcf).await
    }

    pub async fn try_upsert(&self, tcf: Tcf) -> Result<(), StorageError> {
        self.collection.try_upsert(tcf).await
    }

    pub async fn delete(&self, id: &str) {
        self.collection.delete(id).await
    }

    pub async fn try_delete(&self, id: &str) -> Result<bool, StorageError> {
        self.collection.try_delete(id).await
    }
}
