//! # TCF Tracker Backend
//!
//! Local-first persistence and domain core for tracking members, task-class
//! definitions (TCFs), schedules and execution reports. Everything is kept in
//! a single key-value store; there is no server.
//!
//! - [`storage`]: key-value backends and the per-collection repositories
//! - [`domain`]: validation, drafts, eligibility, backups and analysis
//! - [`config`]: layered settings

use anyhow::Result;
use shared::{ReportDraft, ScheduleDraft};
use std::sync::Arc;
use tracing::info;

pub mod config;
pub mod domain;
pub mod storage;

use config::AppConfig;
use domain::{
    AnalysisService, BackupService, DraftAutosaver, FormDraft, FormSession, MemberService,
    ReportService, ScheduleService, SettingsService, TcfService,
};
use storage::{KeyValueStore, Repositories, SqliteStore};

/// Every service, wired to one shared store
#[derive(Clone)]
pub struct Backend {
    pub repositories: Repositories,
    pub member_service: MemberService,
    pub tcf_service: TcfService,
    pub schedule_service: ScheduleService,
    pub report_service: ReportService,
    pub settings_service: SettingsService,
    pub backup_service: BackupService,
    pub analysis_service: AnalysisService,
    pub autosaver: DraftAutosaver,
}

/// Record counts after startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupSummary {
    pub members: usize,
    pub tcfs: usize,
    pub schedules: usize,
    pub reports: usize,
}

impl Backend {
    /// Open the SQLite store configured in `config`
    pub async fn open(config: &AppConfig) -> Result<Self> {
        let store = SqliteStore::open(&config.database_path()).await?;
        Ok(Self::with_store(Arc::new(store), config))
    }

    pub fn with_store(store: Arc<dyn KeyValueStore>, config: &AppConfig) -> Self {
        let repositories = Repositories::new(store.clone());
        let autosaver = DraftAutosaver::new(repositories.drafts.clone(), config.draft_debounce());

        Self {
            member_service: MemberService::new(repositories.members.clone()),
            tcf_service: TcfService::new(repositories.tcfs.clone()),
            schedule_service: ScheduleService::new(repositories.schedules.clone()),
            report_service: ReportService::new(
                repositories.reports.clone(),
                repositories.schedules.clone(),
                repositories.tcfs.clone(),
            ),
            settings_service: SettingsService::new(
                repositories.auth.clone(),
                repositories.preferences.clone(),
                repositories.drafts.clone(),
            ),
            backup_service: BackupService::new(store, repositories.clone()),
            analysis_service: AnalysisService::from_config(&config.analysis),
            autosaver,
            repositories,
        }
    }

    /// First-run initialization: seeds the TCF catalog and the default
    /// credentials when they have never been stored
    pub async fn initialize(&self) -> StartupSummary {
        let tcfs = self.tcf_service.list_tcfs().await;
        self.settings_service.credentials().await;

        let summary = StartupSummary {
            members: self.member_service.list_members().await.len(),
            tcfs: tcfs.len(),
            schedules: self.schedule_service.list_schedules().await.len(),
            reports: self.report_service.list_reports().await.len(),
        };
        info!(
            "Loaded {} member(s), {} TCF(s), {} schedule(s), {} report(s)",
            summary.members, summary.tcfs, summary.schedules, summary.reports
        );
        summary
    }

    /// Open a blank create form, restoring its draft
    pub async fn new_form<D: FormDraft>(&self) -> FormSession<D> {
        FormSession::open_new(self.repositories.drafts.clone(), self.autosaver.clone()).await
    }

    /// Open the schedule create form with its starting values
    pub async fn new_schedule_form(&self) -> FormSession<ScheduleDraft> {
        FormSession::open_with(
            self.repositories.drafts.clone(),
            self.autosaver.clone(),
            ScheduleDraft::with_defaults(),
        )
        .await
    }

    /// Open the report form with a member already picked; the stored draft is
    /// not loaded
    pub fn new_report_form_for(&self, member_id: &str) -> FormSession<ReportDraft> {
        let mut draft = ReportDraft::default();
        draft.select_member(member_id);
        FormSession::open_prefilled(self.repositories.drafts.clone(), self.autosaver.clone(), draft)
    }

    /// Open an edit form for an existing record
    pub fn edit_form<D: FormDraft>(&self, existing: D) -> FormSession<D> {
        FormSession::open_edit(self.repositories.drafts.clone(), self.autosaver.clone(), existing)
    }
}
