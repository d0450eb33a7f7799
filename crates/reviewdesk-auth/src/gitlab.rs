use reviewdesk_core::config::GitLabConfig;

use crate::oauth::{OAuth2Config, OAuth2Provider};
use crate::storage::CredentialStore;

/// Path the authorization server redirects back to, relative to the app origin
pub const GITLAB_CALLBACK_PATH: &str = "/gitlab/token";

/// GitLab OAuth2 authentication provider
pub struct GitLabAuth {
    config: OAuth2Config,
    credentials: CredentialStore,
}

impl GitLabAuth {
    /// Create a GitLab provider with the `api` scope
    pub fn new(settings: &GitLabConfig, credentials: CredentialStore) -> Self {
        Self::with_scopes(settings, credentials, vec!["api".to_string()])
    }

    /// Create with custom scopes
    pub fn with_scopes(
        settings: &GitLabConfig,
        credentials: CredentialStore,
        scopes: Vec<String>,
    ) -> Self {
        let origin = settings.app_origin.trim_end_matches('/');
        Self {
            config: OAuth2Config {
                client_id: settings.application_id.clone(),
                auth_url: settings.authorize_url.clone(),
                redirect_uri: format!("{}{}", origin, GITLAB_CALLBACK_PATH),
                scopes,
            },
            credentials,
        }
    }
}

impl OAuth2Provider for GitLabAuth {
    fn service_id(&self) -> &str {
        "gitlab"
    }

    fn config(&self) -> &OAuth2Config {
        &self.config
    }

    fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }
}
