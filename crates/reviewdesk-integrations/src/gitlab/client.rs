use anyhow::{Context, Result};
use reqwest::{header, Client, StatusCode};
use std::sync::Arc;
use url::Url;

use reviewdesk_core::error::{NetworkError, ProviderError, ReqwestErrorExt};

use super::query::{GraphQlResponse, MergeRequestNode, MergeRequestsData, MERGE_REQUESTS_QUERY};

/// Open merge requests of one project, as seen by the token's owner
#[derive(Debug)]
pub struct MergeRequestsPage {
    pub current_user_id: String,
    pub merge_requests: Vec<MergeRequestNode>,
}

/// GitLab GraphQL API client
#[derive(Debug, Clone)]
pub struct GitLabClient {
    api_url: Url,
    client: Arc<Client>,
}

impl GitLabClient {
    /// Create a client posting queries to `api_url`
    pub fn new(api_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("reviewdesk")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_url: Url::parse(api_url).context("Invalid GitLab API URL")?,
            client: Arc::new(client),
        })
    }

    /// Fetch open merge requests of `repository_path` in a single query.
    ///
    /// No pagination: only the first page GitLab returns is considered.
    pub async fn merge_requests(
        &self,
        token: &str,
        repository_path: &str,
    ) -> Result<MergeRequestsPage, ProviderError> {
        tracing::debug!("Fetching merge requests for {}", repository_path);

        let body = serde_json::json!({
            "query": MERGE_REQUESTS_QUERY,
            "variables": { "repositoryPath": repository_path },
        });

        let response = self
            .client
            .post(self.api_url.clone())
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| e.into_network_error())?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ProviderError::Unauthorized);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NetworkError::ServerError {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let text = response.text().await.map_err(|e| e.into_network_error())?;
        let payload: GraphQlResponse<MergeRequestsData> = serde_json::from_str(&text)
            .map_err(|e| ProviderError::QueryFailed(format!("Unexpected response: {}", e)))?;

        let Some(data) = payload.data else {
            let messages: Vec<String> = payload.errors.into_iter().map(|e| e.message).collect();
            return Err(ProviderError::QueryFailed(if messages.is_empty() {
                "Response carried no data".to_string()
            } else {
                messages.join("; ")
            }));
        };

        let current_user_id = data
            .current_user
            .map(|user| user.id)
            .ok_or_else(|| ProviderError::QueryFailed("No current user in response".to_string()))?;
        let project = data.project.ok_or_else(|| {
            ProviderError::QueryFailed(format!("Project {} not found", repository_path))
        })?;

        let merge_requests = project.merge_requests.nodes;
        tracing::info!("Fetched {} merge requests for {}", merge_requests.len(), repository_path);
        Ok(MergeRequestsPage {
            current_user_id,
            merge_requests,
        })
    }
}
