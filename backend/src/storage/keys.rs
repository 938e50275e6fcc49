//! Store keys shared by every persisted value.

pub const MEMBERS: &str = "tcf_app_members";
pub const TCFS: &str = "tcf_app_tcfs";
pub const SCHEDULES: &str = "tcf_app_schedules";
pub const REPORTS: &str = "tcf_app_reports";
pub const AUTH: &str = "tcf_app_auth";
pub const LANGUAGE: &str = "tcf_app_lang";

/// Prefix for per-form draft keys; the form name is appended verbatim
pub const DRAFT_PREFIX: &str = "tcf_app_drafts_";

pub fn draft_key(form_name: &str) -> String {
    format!("{}{}", DRAFT_PREFIX, form_name)
}
