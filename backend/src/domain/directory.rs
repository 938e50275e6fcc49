use shared::{Member, Tcf, UNKNOWN_NAME};

/// Display names for soft references. A reference that no longer resolves
/// shows as "Unknown".
pub struct Directory<'a> {
    members: &'a [Member],
    tcfs: &'a [Tcf],
}

impl<'a> Directory<'a> {
    pub fn new(members: &'a [Member], tcfs: &'a [Tcf]) -> Self {
        Self { members, tcfs }
    }

    pub fn member_name(&self, id: &str) -> &'a str {
        self.members
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.name.as_str())
            .unwrap_or(UNKNOWN_NAME)
    }

    pub fn tcf_name(&self, id: &str) -> &'a str {
        self.tcfs
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.name.as_str())
            .unwrap_or(UNKNOWN_NAME)
    }

    /// Names for a schedule's TCF set, dangling ids included as "Unknown"
    pub fn tcf_names(&self, ids: &[String]) -> Vec<&'a str> {
        ids.iter().map(|id| self.tcf_name(id)).collect()
    }
}
