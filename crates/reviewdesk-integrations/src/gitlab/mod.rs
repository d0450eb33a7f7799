//! GitLab merge requests as review items.

pub mod client;
pub mod query;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use reviewdesk_auth::gitlab::GITLAB_CALLBACK_PATH;
use reviewdesk_auth::{CredentialStatus, CredentialStore, GitLabAuth, OAuth2Provider};
use reviewdesk_core::classify;
use reviewdesk_core::config::GitLabConfig;
use reviewdesk_core::error::ProviderError;
use reviewdesk_core::integration::{ExtraRoute, FetchOutcome, Integration, RouteOutcome};
use reviewdesk_core::models::PullRequest;
use reviewdesk_core::sort::{sorted, LabelFilter};

pub use client::{GitLabClient, MergeRequestsPage};

use crate::project_path::normalize_project_path;

/// Which GitLab project to watch, and which labels to keep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitLabSource {
    pub repository_path: String,
    #[serde(default)]
    pub filter_labels: Vec<String>,
}

impl GitLabSource {
    /// Build a source from a project path or URL
    pub fn new(path_or_url: &str, filter_labels: Vec<String>) -> Result<Self, ProviderError> {
        let repository_path = normalize_project_path(path_or_url).ok_or_else(|| {
            ProviderError::InvalidSource(format!("Not a GitLab project path: {:?}", path_or_url))
        })?;
        let filter_labels = filter_labels
            .into_iter()
            .filter(|label| !label.is_empty())
            .collect();
        Ok(Self {
            repository_path,
            filter_labels,
        })
    }

    /// Decode and normalise a persisted source
    pub fn from_value(value: &serde_json::Value) -> Result<Self, ProviderError> {
        let source: GitLabSource = serde_json::from_value(value.clone())
            .map_err(|e| ProviderError::InvalidSource(e.to_string()))?;
        Self::new(&source.repository_path, source.filter_labels)
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "repositoryPath": self.repository_path,
            "filterLabels": self.filter_labels,
        })
    }
}

/// Filter, classify and sort one page of merge requests as of `now`
pub fn build_pull_requests(
    page: MergeRequestsPage,
    filter: &LabelFilter,
    now: DateTime<Utc>,
) -> Vec<PullRequest> {
    let me = page.current_user_id;
    let items = page
        .merge_requests
        .into_iter()
        .filter(|mr| filter.matches(&mr.labels()))
        .map(|mr| {
            let status = classify(&mr.to_record(), &me, now);
            PullRequest {
                labels: mr.labels(),
                name: mr.title,
                url: mr.web_url,
                status,
                created_at: mr.created_at,
            }
        })
        .collect();
    sorted(items)
}

/// GitLab integration: OAuth implicit-grant sign-in plus GraphQL fetching
pub struct GitLabIntegration {
    auth: Arc<GitLabAuth>,
    client: GitLabClient,
}

impl GitLabIntegration {
    pub fn new(settings: &GitLabConfig, credentials: CredentialStore) -> anyhow::Result<Self> {
        Ok(Self {
            auth: Arc::new(GitLabAuth::new(settings, credentials)),
            client: GitLabClient::new(&settings.api_url)?,
        })
    }

    pub fn auth(&self) -> &GitLabAuth {
        &self.auth
    }
}

#[async_trait]
impl Integration for GitLabIntegration {
    fn id(&self) -> &str {
        "gitlab"
    }

    fn name(&self) -> &str {
        "GitLab cloud"
    }

    async fn fetch(&self, source: &serde_json::Value) -> Result<FetchOutcome, ProviderError> {
        let source = GitLabSource::from_value(source)?;

        let token = match self.auth.ensure_credential()? {
            CredentialStatus::Available(token) => token,
            CredentialStatus::RedirectRequired { authorize_url } => {
                return Ok(FetchOutcome::AuthRequired { authorize_url });
            }
        };

        let page = self.client.merge_requests(&token, &source.repository_path).await?;
        let filter = LabelFilter::new(&source.filter_labels);
        Ok(FetchOutcome::Ready(build_pull_requests(page, &filter, Utc::now())))
    }

    fn validate_source(&self, source: &serde_json::Value) -> Result<(), ProviderError> {
        GitLabSource::from_value(source).map(|_| ())
    }

    fn extra_routes(&self) -> Vec<ExtraRoute> {
        let auth = self.auth.clone();
        vec![ExtraRoute::new(GITLAB_CALLBACK_PATH, move |url: &Url| {
            if auth.accept_callback(url)? {
                Ok(RouteOutcome::Reload {
                    location: "/".to_string(),
                })
            } else {
                Ok(RouteOutcome::Nothing)
            }
        })]
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use query::MergeRequestNode;
    use reviewdesk_core::status::ReviewStatus;
    use reviewdesk_core::storage::MemoryStore;

    const ME: &str = "gid://gitlab/User/2";

    fn now() -> DateTime<Utc> {
        "2026-03-01T12:00:00Z".parse().unwrap()
    }

    fn mr(iid: u32, author: &str, created_at: &str, labels: &[&str]) -> MergeRequestNode {
        let labels: Vec<_> = labels
            .iter()
            .map(|title| serde_json::json!({ "title": title, "color": "#ffffff" }))
            .collect();
        serde_json::from_value(serde_json::json!({
            "title": format!("MR {}", iid),
            "webUrl": format!("https://gitlab.com/acme/web/-/merge_requests/{}", iid),
            "createdAt": created_at,
            "updatedAt": created_at,
            "author": { "id": author },
            "labels": { "nodes": labels },
        }))
        .unwrap()
    }

    fn page(merge_requests: Vec<MergeRequestNode>) -> MergeRequestsPage {
        MergeRequestsPage {
            current_user_id: ME.to_string(),
            merge_requests,
        }
    }

    #[test]
    fn test_build_classifies_and_sorts() {
        let items = build_pull_requests(
            page(vec![
                mr(1, ME, "2026-02-01T00:00:00Z", &[]),
                mr(2, "gid://gitlab/User/1", "2026-03-01T11:55:00Z", &[]),
                mr(3, "gid://gitlab/User/1", "2026-02-10T00:00:00Z", &[]),
            ]),
            &LabelFilter::default(),
            now(),
        );

        let statuses: Vec<_> = items.iter().map(|i| (i.name.as_str(), i.status)).collect();
        assert_eq!(
            statuses,
            vec![
                ("MR 3", ReviewStatus::NotChecked),
                ("MR 2", ReviewStatus::New),
                ("MR 1", ReviewStatus::Mine),
            ]
        );
        assert_eq!(items[0].labels, vec![]);
    }

    #[test]
    fn test_build_applies_label_filter() {
        let items = build_pull_requests(
            page(vec![
                mr(1, "u1", "2026-02-01T00:00:00Z", &["Backend"]),
                mr(2, "u1", "2026-02-01T00:00:00Z", &["docs"]),
            ]),
            &LabelFilter::new(["backend"]),
            now(),
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://gitlab.com/acme/web/-/merge_requests/1");
        assert_eq!(items[0].labels[0].color.as_deref(), Some("#ffffff"));
    }

    #[test]
    fn test_source_normalises_url_and_drops_empty_labels() {
        let source = GitLabSource::new(
            "https://gitlab.com/acme/web.git",
            vec!["backend".to_string(), String::new()],
        )
        .unwrap();
        assert_eq!(source.repository_path, "acme/web");
        assert_eq!(source.filter_labels, vec!["backend".to_string()]);

        let value = source.to_value();
        assert_eq!(value["repositoryPath"], "acme/web");
        assert_eq!(GitLabSource::from_value(&value).unwrap(), source);
    }

    #[test]
    fn test_source_keeps_labels_as_entered() {
        let source = GitLabSource::new("acme/web", vec![" needs review ".to_string()]).unwrap();
        assert_eq!(source.filter_labels, vec![" needs review ".to_string()]);

        let filter = LabelFilter::new(&source.filter_labels);
        assert!(!filter.matches(&[reviewdesk_core::models::Label::new("needs review")]));
        assert!(filter.matches(&[reviewdesk_core::models::Label::new(" Needs Review ")]));
    }

    #[test]
    fn test_source_rejects_bad_paths() {
        assert!(matches!(
            GitLabSource::new("", vec![]),
            Err(ProviderError::InvalidSource(_))
        ));
        assert!(GitLabSource::from_value(&serde_json::json!({ "filterLabels": [] })).is_err());
        assert!(GitLabSource::from_value(&serde_json::json!({ "repositoryPath": "web" })).is_err());
    }

    fn integration() -> GitLabIntegration {
        GitLabIntegration::new(
            &GitLabConfig::default(),
            CredentialStore::new(Arc::new(MemoryStore::new())),
        )
        .unwrap()
    }

    #[test]
    fn test_token_route_stores_token_and_reloads() {
        let integration = integration();
        let routes = integration.extra_routes();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].path(), "/gitlab/token");

        let callback =
            Url::parse("http://localhost:3000/gitlab/token#access_token=tok&token_type=Bearer")
                .unwrap();
        assert_eq!(
            routes[0].handle(&callback).unwrap(),
            RouteOutcome::Reload {
                location: "/".to_string()
            }
        );
        assert!(integration.auth().is_authenticated());
    }

    #[test]
    fn test_token_route_without_token_is_noop() {
        let integration = integration();
        let callback = Url::parse("http://localhost:3000/gitlab/token").unwrap();
        assert_eq!(
            integration.extra_routes()[0].handle(&callback).unwrap(),
            RouteOutcome::Nothing
        );
        assert!(!integration.auth().is_authenticated());
    }

    #[tokio::test]
    async fn test_fetch_without_token_requires_authorization() {
        let outcome = integration()
            .fetch(&GitLabSource::new("acme/web", vec![]).unwrap().to_value())
            .await
            .unwrap();
        match outcome {
            FetchOutcome::AuthRequired { authorize_url } => {
                assert!(authorize_url.as_str().starts_with("https://gitlab.com/oauth/authorize?"));
            }
            other => panic!("expected authorization, got {:?}", other),
        }
    }
}
