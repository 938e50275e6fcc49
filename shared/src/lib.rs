use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Placeholder shown wherever a member or TCF reference no longer resolves
pub const UNKNOWN_NAME: &str = "Unknown";

/// Version tag written into every backup document
pub const BACKUP_FORMAT_VERSION: &str = "1.0";

/// A person whose task executions are tracked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    /// Date the member was added (YYYY-MM-DD)
    #[serde(default)]
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Older records store the age as a number, newer ones as text
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A task-class definition (TCF)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tcf {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// How often a schedule repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RepeatStatus {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

/// Direction in which a scheduled TCF is run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RunType {
    #[default]
    #[serde(rename = "Single Direction")]
    SingleDirection,
    Bidirectional,
}

/// Assignment of one or more TCFs to a member.
///
/// `tcf_ids` is required when decoding: records that only carry the legacy
/// singular `tcfId` field are handled by the storage layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub member_id: String,
    pub tcf_ids: Vec<String>,
    /// Local date-time the schedule starts (e.g. `2024-05-01T09:30`)
    #[serde(default)]
    pub start_date_time: String,
    #[serde(default)]
    pub repeat_status: RepeatStatus,
    #[serde(default)]
    pub run_type: RunType,
}

/// A logged execution of one TCF for one member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub member_id: String,
    pub tcf_id: String,
    /// Free-form start time, usually a clock time such as `14:05`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation time in epoch milliseconds, used for ordering
    pub timestamp: i64,
    /// Voice note as a `data:` URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_note: Option<String>,
}

/// Login credentials for the local authentication gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: "test".to_string(),
            password: "test".to_string(),
        }
    }
}

/// UI language preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fa,
}

impl Language {
    pub fn as_tag(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fa => "fa",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            "en" => Some(Language::En),
            "fa" => Some(Language::Fa),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

// ---------------------------------------------------------------------------
// Form drafts
//
// Partial snapshots of in-progress forms. Every field is optional so that a
// half-filled form can be persisted and restored as-is.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&Member> for MemberDraft {
    fn from(member: &Member) -> Self {
        Self {
            id: Some(member.id.clone()),
            name: Some(member.name.clone()),
            start_date: Some(member.start_date.clone()),
            phone_number: member.phone_number.clone(),
            age: member.age.clone(),
            description: member.description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcfDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&Tcf> for TcfDraft {
    fn from(tcf: &Tcf) -> Self {
        Self {
            id: Some(tcf.id.clone()),
            name: Some(tcf.name.clone()),
            description: tcf.description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    #[serde(default)]
    pub tcf_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_status: Option<RepeatStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_type: Option<RunType>,
}

impl ScheduleDraft {
    /// Starting values for a brand-new schedule form
    pub fn with_defaults() -> Self {
        Self {
            repeat_status: Some(RepeatStatus::None),
            run_type: Some(RunType::SingleDirection),
            ..Self::default()
        }
    }

    /// Select or deselect a TCF, keeping the selection free of duplicates
    pub fn toggle_tcf(&mut self, tcf_id: &str) {
        if let Some(pos) = self.tcf_ids.iter().position(|id| id == tcf_id) {
            self.tcf_ids.remove(pos);
        } else {
            self.tcf_ids.push(tcf_id.to_string());
        }
    }
}

impl From<&Schedule> for ScheduleDraft {
    fn from(schedule: &Schedule) -> Self {
        Self {
            id: Some(schedule.id.clone()),
            member_id: Some(schedule.member_id.clone()),
            tcf_ids: schedule.tcf_ids.clone(),
            start_date_time: Some(schedule.start_date_time.clone()),
            repeat_status: Some(schedule.repeat_status),
            run_type: Some(schedule.run_type),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcf_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_note: Option<String>,
}

impl ReportDraft {
    /// Pick a member; any previously chosen TCF may not be eligible anymore
    pub fn select_member(&mut self, member_id: &str) {
        self.member_id = Some(member_id.to_string());
        self.tcf_id = None;
    }
}

/// Username being edited on the settings screen
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UsernameDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

// ---------------------------------------------------------------------------
// Backup
// ---------------------------------------------------------------------------

/// Full snapshot of the persisted state.
///
/// Each entry holds the raw stored string for its key (or `null` when the key
/// was never written); the entries are passed through verbatim on restore.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BackupDocument {
    #[serde(default)]
    pub members: Option<String>,
    #[serde(default)]
    pub tcfs: Option<String>,
    #[serde(default)]
    pub schedules: Option<String>,
    #[serde(default)]
    pub reports: Option<String>,
    #[serde(default)]
    pub auth: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Integer(i64),
    Float(f64),
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<StringOrNumber>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        StringOrNumber::Text(s) => s,
        StringOrNumber::Integer(n) => n.to_string(),
        StringOrNumber::Float(n) => n.to_string(),
    }))
}

/// Generate a fresh opaque record id
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current time in epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
