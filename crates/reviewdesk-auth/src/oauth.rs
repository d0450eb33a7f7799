use oauth2::basic::BasicClient;
use oauth2::{AuthUrl, ClientId, CsrfToken, RedirectUrl, Scope};
use url::Url;

use reviewdesk_core::error::AuthError;

use crate::storage::CredentialStore;

/// OAuth2 implicit-grant configuration
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    /// Application (client) id registered with the provider
    pub client_id: String,

    /// Authorization endpoint URL
    pub auth_url: String,

    /// Redirect URI the provider sends the token back to
    pub redirect_uri: String,

    /// Scopes to request
    pub scopes: Vec<String>,
}

/// Outcome of looking for a usable credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialStatus {
    /// A token is stored and can be sent as a bearer credential
    Available(String),
    /// No token; the user must visit `authorize_url` before retrying
    RedirectRequired { authorize_url: Url },
}

/// Extract the access token from an implicit-grant callback fragment.
///
/// The fragment must begin with `access_token=`; the token runs up to the
/// next `&` or the end of the fragment. Anything else yields `None`.
pub fn token_from_fragment(fragment: &str) -> Option<&str> {
    let rest = fragment.strip_prefix("access_token=")?;
    let token = rest.split('&').next().unwrap_or_default();
    (!token.is_empty()).then_some(token)
}

/// OAuth2 provider using the implicit grant.
///
/// There is no code exchange and no refresh: the provider redirects back
/// with the token in the URL fragment and it is stored as-is.
pub trait OAuth2Provider: Send + Sync {
    /// Get the service identifier (e.g., "gitlab")
    fn service_id(&self) -> &str;

    /// Get the OAuth2 configuration
    fn config(&self) -> &OAuth2Config;

    /// Where tokens for this provider are kept
    fn credentials(&self) -> &CredentialStore;

    /// Build the authorization URL for the implicit grant
    fn authorize(&self) -> Result<(Url, CsrfToken), AuthError> {
        let config = self.config();

        let client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            None,
            AuthUrl::new(config.auth_url.clone())
                .map_err(|e| AuthError::InvalidEndpoint(e.to_string()))?,
            None,
        )
        .set_redirect_uri(
            RedirectUrl::new(config.redirect_uri.clone())
                .map_err(|e| AuthError::InvalidRedirect(e.to_string()))?,
        );

        let mut auth_request = client.authorize_url(CsrfToken::new_random);

        for scope in &config.scopes {
            auth_request = auth_request.add_scope(Scope::new(scope.clone()));
        }

        Ok(auth_request.use_implicit_flow().url())
    }

    /// Return the stored credential, or the URL the user must visit first.
    ///
    /// Callers must not proceed with the request on `RedirectRequired`.
    fn ensure_credential(&self) -> Result<CredentialStatus, AuthError> {
        match self.credentials().retrieve_token(self.service_id())? {
            Some(token) => Ok(CredentialStatus::Available(token)),
            None => {
                let (authorize_url, _state) = self.authorize()?;
                tracing::info!(
                    "No {} credential stored, authorization required",
                    self.service_id()
                );
                Ok(CredentialStatus::RedirectRequired { authorize_url })
            }
        }
    }

    /// Store the token carried by an authorization callback URL.
    ///
    /// Returns `false` without touching storage when the fragment holds no
    /// token.
    fn accept_callback(&self, callback: &Url) -> Result<bool, AuthError> {
        let Some(token) = callback.fragment().and_then(token_from_fragment) else {
            tracing::debug!("Callback for {} carried no token", self.service_id());
            return Ok(false);
        };

        self.credentials().store_token(self.service_id(), token)?;
        tracing::info!("OAuth2 flow completed for {}", self.service_id());
        Ok(true)
    }

    fn is_authenticated(&self) -> bool {
        self.credentials().has_token(self.service_id())
    }

    /// Sign out (delete stored token)
    fn sign_out(&self) -> Result<(), AuthError> {
        self.credentials().delete_token(self.service_id())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_token_from_fragment() {
        assert_eq!(token_from_fragment("access_token=abc123"), Some("abc123"));
        assert_eq!(
            token_from_fragment("access_token=abc123&token_type=Bearer&state=xyz"),
            Some("abc123")
        );
    }

    #[test]
    fn test_token_must_lead_the_fragment() {
        assert_eq!(token_from_fragment("state=xyz&access_token=abc123"), None);
        assert_eq!(token_from_fragment(""), None);
        assert_eq!(token_from_fragment("access_token="), None);
        assert_eq!(token_from_fragment("access_token=&state=xyz"), None);
    }
}
