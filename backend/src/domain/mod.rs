//! # Domain Module
//!
//! Business rules on top of the storage layer. Services validate form input
//! before anything is written, and the draft machinery ([`FormSession`],
//! [`DraftAutosaver`]) keeps unsaved create forms across restarts.
//!
//! Store failures never surface here as errors: repositories log them and
//! degrade. Service results carry [`ValidationError`]s only.

pub mod analysis_service;
pub mod audio;
pub mod backup_service;
pub mod directory;
pub mod draft_autosave;
pub mod eligibility;
pub mod form_session;
pub mod member_service;
pub mod models;
pub mod report_service;
pub mod schedule_service;
pub mod settings_service;
pub mod tcf_service;

pub use analysis_service::{AnalysisService, GeminiAnalyzer, ReportAnalyzer};
pub use audio::{AudioCapture, AudioNote, CaptureError, VoiceRecorder};
pub use backup_service::{BackupService, ImportError};
pub use directory::Directory;
pub use draft_autosave::DraftAutosaver;
pub use eligibility::{eligible_tcfs, EligibilityView};
pub use form_session::{FormDraft, FormMode, FormSession};
pub use member_service::MemberService;
pub use models::{FormKind, ValidationError};
pub use report_service::ReportService;
pub use schedule_service::ScheduleService;
pub use settings_service::SettingsService;
pub use tcf_service::TcfService;
