//! # Storage Module
//!
//! Persistence for the tracker. Every value lives under a string key in a
//! [`KeyValueStore`]: entity collections as JSON arrays, the credentials
//! record as a JSON object, drafts as arbitrary JSON and the language tag as
//! a bare string.
//!
//! ## Backends
//!
//! - [`SqliteStore`]: a `key_values(key, value)` table in a local SQLite file
//! - [`MemoryStore`]: process-local, with an optional byte quota
//!
//! ## Key Layout
//!
//! ```text
//! tcf_app_members          [Member, ...]
//! tcf_app_tcfs             [Tcf, ...]
//! tcf_app_schedules        [Schedule | legacy schedule, ...]
//! tcf_app_reports          [Report, ...]
//! tcf_app_auth             {"username": ..., "password": ...}
//! tcf_app_lang             en | fa
//! tcf_app_drafts_<form>    { ...partial form... }
//! ```

pub mod db;
pub mod keys;
pub mod memory;
pub mod repositories;
pub mod traits;

pub use db::SqliteStore;
pub use memory::MemoryStore;
pub use repositories::Repositories;
pub use traits::{KeyValueStore, Record, StorageError};
