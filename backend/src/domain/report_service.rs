use anyhow::Result;
use shared::{generate_id, now_millis, Report, ReportDraft, Tcf};
use tracing::info;

use super::eligibility::eligible_tcfs;
use super::models::{filled, ValidationError};
use crate::storage::repositories::{ReportRepository, ScheduleRepository, TcfRepository};

/// Service for logging TCF executions.
///
/// Reports are only ever created or deleted, never edited.
#[derive(Clone)]
pub struct ReportService {
    reports: ReportRepository,
    schedules: ScheduleRepository,
    tcfs: TcfRepository,
}

impl ReportService {
    pub fn new(reports: ReportRepository, schedules: ScheduleRepository, tcfs: TcfRepository) -> Self {
        Self {
            reports,
            schedules,
            tcfs,
        }
    }

    /// Reports, most recent first
    pub async fn list_reports(&self) -> Vec<Report> {
        self.reports.list_newest_first().await
    }

    /// TCFs the member is scheduled for, in catalog order
    pub async fn eligible_tcfs(&self, member_id: Option<&str>) -> Vec<Tcf> {
        let schedules = self.schedules.list().await;
        let tcfs = self.tcfs.list().await;
        eligible_tcfs(member_id, &schedules, &tcfs)
    }

    /// Log a new report stamped with the current time. The TCF is not checked
    /// against the member's schedules here.
    pub async fn submit_report(&self, draft: &ReportDraft) -> Result<Report> {
        let member_id = filled(&draft.member_id).ok_or(ValidationError::MissingMember)?;
        let tcf_id = filled(&draft.tcf_id).ok_or(ValidationError::MissingTcf)?;

        let report = Report {
            id: generate_id(),
            member_id: member_id.to_string(),
            tcf_id: tcf_id.to_string(),
            start_time: draft.start_time.clone(),
            description: draft.description.clone(),
            timestamp: now_millis(),
            audio_note: draft.audio_note.clone(),
        };

        info!(
            "Logging report {} for member {} and TCF {}",
            report.id, report.member_id, report.tcf_id
        );
        self.reports.upsert(report.clone()).await;
        Ok(report)
    }

    pub async fn delete_report(&self, id: &str) {
        info!("Deleting report: {}", id);
        self.reports.delete(id).await;
    }
}
