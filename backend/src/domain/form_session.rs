//! Editing discipline for forms that keep a draft.
//!
//! A session is either creating a new record or editing an existing one.
//! Only creating sessions touch drafts: the stored draft is loaded once when
//! the session opens, every change reschedules a debounced save, and a
//! successful submit clears it. Editing sessions never read or write drafts.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::{MemberDraft, ReportDraft, ScheduleDraft, TcfDraft};
use tracing::{debug, error};

use super::draft_autosave::DraftAutosaver;
use super::models::FormKind;
use crate::storage::repositories::DraftRepository;

/// A partial form that can be autosaved
pub trait FormDraft: Serialize + DeserializeOwned + Clone + Default + Send + Sync + 'static {
    const FORM: FormKind;

    /// Top-level fields left out of autosaved snapshots
    const EXCLUDED_FIELDS: &'static [&'static str] = &[];

    /// Id of the record being edited, if any
    fn record_id(&self) -> Option<&str>;
}

impl FormDraft for MemberDraft {
    const FORM: FormKind = FormKind::Member;

    fn record_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl FormDraft for TcfDraft {
    const FORM: FormKind = FormKind::Tcf;

    fn record_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl FormDraft for ScheduleDraft {
    const FORM: FormKind = FormKind::Schedule;

    fn record_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl FormDraft for ReportDraft {
    const FORM: FormKind = FormKind::Report;
    // Recorded audio can be megabytes of base64
    const EXCLUDED_FIELDS: &'static [&'static str] = &["audioNote"];

    fn record_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

pub struct FormSession<D: FormDraft> {
    data: D,
    mode: FormMode,
    drafts: DraftRepository,
    autosaver: DraftAutosaver,
}

impl<D: FormDraft> FormSession<D> {
    /// Open a blank create form, restoring the stored draft if there is one
    pub async fn open_new(drafts: DraftRepository, autosaver: DraftAutosaver) -> Self {
        Self::open_with(drafts, autosaver, D::default()).await
    }

    /// Open a create form starting from `initial`; a stored draft replaces
    /// it wholesale
    pub async fn open_with(drafts: DraftRepository, autosaver: DraftAutosaver, initial: D) -> Self {
        let form = D::FORM.draft_name();
        let data = match drafts.load::<D>(form).await {
            Some(draft) => {
                debug!("Restored draft for form '{}'", form);
                draft
            }
            None => initial,
        };

        Self {
            data,
            mode: FormMode::Create,
            drafts,
            autosaver,
        }
    }

    /// Open a create form with caller-supplied values, skipping the stored
    /// draft. Later changes are still autosaved.
    pub fn open_prefilled(drafts: DraftRepository, autosaver: DraftAutosaver, data: D) -> Self {
        Self {
            data,
            mode: FormMode::Create,
            drafts,
            autosaver,
        }
    }

    /// Open an edit form for an existing record
    pub fn open_edit(drafts: DraftRepository, autosaver: DraftAutosaver, existing: D) -> Self {
        Self {
            data: existing,
            mode: FormMode::Edit,
            drafts,
            autosaver,
        }
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn is_creating(&self) -> bool {
        self.mode == FormMode::Create
    }

    /// Changes are autosaved while creating a record that has no id yet
    pub fn autosaves(&self) -> bool {
        self.is_creating() && self.data.record_id().is_none()
    }

    /// Apply a change to the form and schedule an autosave when it applies
    pub fn update<F>(&mut self, change: F)
    where
        F: FnOnce(&mut D),
    {
        change(&mut self.data);

        if !self.autosaves() {
            return;
        }
        match self.snapshot() {
            Ok(snapshot) => self.autosaver.schedule(D::FORM.draft_name(), snapshot),
            Err(e) => error!("Error building draft for form '{}': {}", D::FORM, e),
        }
    }

    /// Serialized form state as it would be autosaved
    pub fn snapshot(&self) -> Result<Value, serde_json::Error> {
        let mut value = serde_json::to_value(&self.data)?;
        if let Value::Object(fields) = &mut value {
            for field in D::EXCLUDED_FIELDS {
                fields.remove(*field);
            }
        }
        Ok(value)
    }

    /// Finish after a successful submit. A create session's draft is discarded.
    pub async fn complete(self) {
        let form = D::FORM.draft_name();
        self.autosaver.cancel(form);
        if self.is_creating() {
            self.drafts.clear(form).await;
        }
    }

    /// Close without submitting. The last saved draft stays in place.
    pub fn close(self) {
        self.autosaver.cancel(D::FORM.draft_name());
    }
}
