use std::fmt;

/// Form-level validation failures, raised before anything reaches the store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Name cannot be empty")]
    EmptyName,
    #[error("A member must be selected")]
    MissingMember,
    #[error("At least one TCF must be selected")]
    NoTcfSelected,
    #[error("A TCF must be selected")]
    MissingTcf,
    #[error("Start date and time is required")]
    MissingStartDateTime,
    #[error("Username and password are required")]
    MissingCredentials,
    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// Forms that keep an autosaved draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormKind {
    Member,
    Tcf,
    Schedule,
    Report,
    SettingsUsername,
}

impl FormKind {
    /// Name used in the draft's store key
    pub fn draft_name(&self) -> &'static str {
        match self {
            FormKind::Member => "member",
            FormKind::Tcf => "tcf",
            FormKind::Schedule => "schedule",
            FormKind::Report => "report",
            FormKind::SettingsUsername => "settings_username",
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.draft_name())
    }
}

/// Treat a missing or blank form value as absent
pub(crate) fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
