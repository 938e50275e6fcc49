//! TCFs a member may report against: those reachable through any of the
//! member's schedules.

use shared::{Schedule, Tcf};
use std::collections::HashSet;

/// Union of the TCF ids across `member_id`'s schedules, resolved against the
/// catalog. Results follow catalog order; ids with no matching TCF are
/// dropped. An unset member yields nothing.
pub fn eligible_tcfs(member_id: Option<&str>, schedules: &[Schedule], tcfs: &[Tcf]) -> Vec<Tcf> {
    let Some(member_id) = member_id.filter(|id| !id.is_empty()) else {
        return Vec::new();
    };

    let scheduled: HashSet<&str> = schedules
        .iter()
        .filter(|s| s.member_id == member_id)
        .flat_map(|s| s.tcf_ids.iter().map(String::as_str))
        .collect();

    tcfs.iter()
        .filter(|tcf| scheduled.contains(tcf.id.as_str()))
        .cloned()
        .collect()
}

/// Memoized [`eligible_tcfs`]; recomputes only when an input changes
#[derive(Debug, Default)]
pub struct EligibilityView {
    inputs: Option<(Option<String>, Vec<Schedule>, Vec<Tcf>)>,
    result: Vec<Tcf>,
    recomputations: usize,
}

impl EligibilityView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, member_id: Option<&str>, schedules: &[Schedule], tcfs: &[Tcf]) -> &[Tcf] {
        let unchanged = matches!(
            &self.inputs,
            Some((m, s, t)) if m.as_deref() == member_id && s.as_slice() == schedules && t.as_slice() == tcfs
        );

        if !unchanged {
            self.result = eligible_tcfs(member_id, schedules, tcfs);
            self.inputs = Some((member_id.map(str::to_string), schedules.to_vec(), tcfs.to_vec()));
            self.recomputations += 1;
        }

        &self.result
    }

    /// Number of times the result was actually computed
    pub fn recomputations(&self) -> usize {
        self.recomputations
    }
}
