//! GraphQL document and response shapes for open merge requests.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use reviewdesk_core::models::{Discussion, Label, Note, ReviewRecord};

pub const MERGE_REQUESTS_QUERY: &str = r#"
query reviewdeskMergeRequests($repositoryPath: ID!) {
  currentUser { id }
  project(fullPath: $repositoryPath) {
    mergeRequests(state: opened) {
      nodes {
        title
        webUrl
        createdAt
        updatedAt
        author { id }
        approvedBy { nodes { id } }
        labels { nodes { title color } }
        discussions { nodes {
          resolvable
          resolved
          notes { nodes {
            author { id }
            updatedAt
            system
            systemNoteIconName
          } }
        } }
      }
    }
  }
}
"#;

/// GraphQL envelope
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct Nodes<T> {
    pub nodes: Vec<T>,
}

impl<T> Default for Nodes<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserRef {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequestsData {
    pub current_user: Option<UserRef>,
    pub project: Option<ProjectNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectNode {
    pub merge_requests: Nodes<MergeRequestNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequestNode {
    pub title: String,
    pub web_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: Option<UserRef>,
    #[serde(default)]
    pub approved_by: Nodes<UserRef>,
    #[serde(default)]
    pub labels: Nodes<LabelNode>,
    #[serde(default)]
    pub discussions: Nodes<DiscussionNode>,
}

#[derive(Debug, Deserialize)]
pub struct LabelNode {
    pub title: String,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DiscussionNode {
    #[serde(default)]
    pub resolvable: bool,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub notes: Nodes<NoteNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteNode {
    pub author: Option<UserRef>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub system: bool,
    pub system_note_icon_name: Option<String>,
}

fn user_id(user: &Option<UserRef>) -> String {
    user.as_ref().map(|u| u.id.clone()).unwrap_or_default()
}

impl MergeRequestNode {
    pub fn labels(&self) -> Vec<Label> {
        self.labels
            .nodes
            .iter()
            .map(|label| Label {
                title: label.title.clone(),
                color: label.color.clone(),
            })
            .collect()
    }

    /// Provider-neutral view used for classification
    pub fn to_record(&self) -> ReviewRecord {
        ReviewRecord {
            author_id: user_id(&self.author),
            approver_ids: self.approved_by.nodes.iter().map(|u| u.id.clone()).collect(),
            discussions: self.discussions.nodes.iter().map(DiscussionNode::to_discussion).collect(),
            created_at: self.created_at,
        }
    }
}

impl DiscussionNode {
    fn to_discussion(&self) -> Discussion {
        Discussion {
            resolvable: self.resolvable,
            resolved: self.resolved,
            notes: self
                .notes
                .nodes
                .iter()
                .map(|note| Note {
                    author_id: user_id(&note.author),
                    updated_at: note.updated_at,
                    system: note.system,
                    system_kind: note.system_note_icon_name.clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_merge_request_deserialization() {
        let json = r##"{
            "title": "Add search",
            "webUrl": "https://gitlab.com/acme/web/-/merge_requests/3",
            "createdAt": "2026-01-21T10:00:00Z",
            "updatedAt": "2026-01-22T10:00:00Z",
            "author": { "id": "gid://gitlab/User/1" },
            "approvedBy": { "nodes": [{ "id": "gid://gitlab/User/2" }] },
            "labels": { "nodes": [{ "title": "frontend", "color": "#428BCA" }] },
            "discussions": { "nodes": [{
                "resolvable": false,
                "resolved": false,
                "notes": { "nodes": [{
                    "author": { "id": "gid://gitlab/User/2" },
                    "updatedAt": "2026-01-22T09:00:00Z",
                    "system": true,
                    "systemNoteIconName": "approval"
                }] }
            }] }
        }"##;
        let node: MergeRequestNode = serde_json::from_str(json).unwrap();

        let labels = node.labels();
        assert_eq!(labels, vec![Label::new("frontend").with_color("#428BCA")]);

        let record = node.to_record();
        assert_eq!(record.author_id, "gid://gitlab/User/1");
        assert_eq!(record.approver_ids, vec!["gid://gitlab/User/2".to_string()]);
        let note = &record.discussions[0].notes[0];
        assert!(note.system);
        assert_eq!(note.system_kind.as_deref(), Some("approval"));
        assert!(!note.is_non_approval_system());
    }

    #[test]
    fn test_missing_collections_default_to_empty() {
        let json = r#"{
            "title": "Bare",
            "webUrl": "https://gitlab.com/acme/web/-/merge_requests/4",
            "createdAt": "2026-01-21T10:00:00Z",
            "updatedAt": "2026-01-21T10:00:00Z",
            "author": null
        }"#;
        let node: MergeRequestNode = serde_json::from_str(json).unwrap();
        let record = node.to_record();
        assert_eq!(record.author_id, "");
        assert!(record.discussions.is_empty());
        assert!(node.labels().is_empty());
    }
}
