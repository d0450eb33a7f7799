use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::ReviewStatus;

/// A label attached to a merge request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Label title
    pub title: String,

    /// Label color (e.g. `#428BCA`), if the provider reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Label {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// A classified merge request.
///
/// Values are never mutated after classification; a refresh produces new ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    /// Title
    pub name: String,

    /// Web URL, unique within a fetch and used as the item identity
    pub url: String,

    /// Review status for the current user
    pub status: ReviewStatus,

    /// Labels
    pub labels: Vec<Label>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Provider-neutral input to the classifier.
#[derive(Debug, Clone, Default)]
pub struct ReviewRecord {
    pub author_id: String,
    pub approver_ids: Vec<String>,
    pub discussions: Vec<Discussion>,
    pub created_at: DateTime<Utc>,
}

/// A thread of notes attached to a merge request
#[derive(Debug, Clone, Default)]
pub struct Discussion {
    pub resolvable: bool,
    pub resolved: bool,
    pub notes: Vec<Note>,
}

impl Discussion {
    /// Resolvable and not yet resolved.
    pub fn is_open(&self) -> bool {
        self.resolvable && !self.resolved
    }

    /// True when `user_id` wrote at least one note in this thread.
    pub fn involves(&self, user_id: &str) -> bool {
        self.notes.iter().any(|note| note.author_id == user_id)
    }
}

/// A single comment, or a system-generated event, within a discussion
#[derive(Debug, Clone)]
pub struct Note {
    pub author_id: String,
    pub updated_at: DateTime<Utc>,
    /// Generated by the provider rather than written by a person
    pub system: bool,
    /// Kind of system note, e.g. `approval` or `commit`
    pub system_kind: Option<String>,
}

/// System-note kind recorded when someone approves.
pub const APPROVAL_NOTE_KIND: &str = "approval";

impl Note {
    /// A note written by a person.
    pub fn comment(author_id: impl Into<String>, updated_at: DateTime<Utc>) -> Self {
        Self {
            author_id: author_id.into(),
            updated_at,
            system: false,
            system_kind: None,
        }
    }

    /// A provider-generated note of the given kind.
    pub fn system(
        author_id: impl Into<String>,
        updated_at: DateTime<Utc>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            author_id: author_id.into(),
            updated_at,
            system: true,
            system_kind: Some(kind.into()),
        }
    }

    /// System notes other than approvals, such as pushed commits.
    pub fn is_non_approval_system(&self) -> bool {
        self.system && self.system_kind.as_deref() != Some(APPROVAL_NOTE_KIND)
    }
}
