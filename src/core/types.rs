use super::{EngineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Relative importance of a note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// A note record as the view believes it exists on the server.
///
/// A record created locally carries a temporary identifier until the remote
/// collection confirms it with an authoritative one; the temporary record is
/// then replaced in its original slot. Tag ordering is deterministic
/// (`BTreeSet`) so structural comparison of two collections is stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub body: String,
    pub notebook_id: Option<String>,
    pub priority: Priority,
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_id: String,
}

/// Input for creating a note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub title: String,
    pub body: String,
    pub notebook_id: Option<String>,
    pub priority: Priority,
    pub tags: BTreeSet<String>,
    pub owner_id: String,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    /// Attach the note to a notebook.
    pub fn notebook(mut self, notebook_id: impl Into<String>) -> Self {
        self.notebook_id = Some(notebook_id.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = owner_id.into();
        self
    }

    /// Local validation, performed before any store mutation.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(EngineError::Validation("title must not be empty".into()));
        }
        Ok(())
    }

    /// Materialize the draft as a record under the given identifier.
    pub fn into_note(self, id: impl Into<String>, now: DateTime<Utc>) -> Note {
        Note {
            id: id.into(),
            title: self.title,
            body: self.body,
            notebook_id: self.notebook_id,
            priority: self.priority,
            tags: self.tags,
            created_at: now,
            updated_at: now,
            owner_id: self.owner_id,
        }
    }
}

/// Partial update applied over an existing note.
///
/// Every field is optional. `notebook_id` is doubly optional so a patch can
/// distinguish "leave unchanged" (`None`) from "clear the notebook"
/// (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub notebook_id: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub tags: Option<BTreeSet<String>>,
}

impl NotePatch {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn notebook(mut self, notebook_id: Option<String>) -> Self {
        self.notebook_id = Some(notebook_id);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags = Some(tags.into_iter().collect());
        self
    }

    /// Merge the patch over a base record. Timestamps are left to the caller.
    pub fn apply(&self, base: &Note) -> Note {
        let mut next = base.clone();
        if let Some(title) = &self.title {
            next.title = title.clone();
        }
        if let Some(body) = &self.body {
            next.body = body.clone();
        }
        if let Some(notebook_id) = &self.notebook_id {
            next.notebook_id = notebook_id.clone();
        }
        if let Some(priority) = self.priority {
            next.priority = priority;
        }
        if let Some(tags) = &self.tags {
            next.tags = tags.clone();
        }
        next
    }
}

/// Active search term and notebook filter for the current view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub notebook_id: Option<String>,
}

impl ListQuery {
    /// Client-side filter predicate: case-insensitive substring match over
    /// title and body, exact match on the notebook reference.
    pub fn matches(&self, note: &Note) -> bool {
        if let Some(notebook_id) = &self.notebook_id {
            if note.notebook_id.as_deref() != Some(notebook_id.as_str()) {
                return false;
            }
        }
        if let Some(term) = &self.search {
            let needle = term.to_lowercase();
            if !note.title.to_lowercase().contains(&needle)
                && !note.body.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}
