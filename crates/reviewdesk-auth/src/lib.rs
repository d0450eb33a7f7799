pub mod gitlab;
pub mod oauth;
pub mod storage;

pub use gitlab::GitLabAuth;
pub use oauth::{token_from_fragment, CredentialStatus, OAuth2Config, OAuth2Provider};
pub use storage::CredentialStore;

use anyhow::{Context, Result};
use url::Url;

/// Open the provider's authorization page in the user's browser
pub fn open_in_browser(authorize_url: &Url) -> Result<()> {
    tracing::info!("Opening browser for authorization...");
    webbrowser::open(authorize_url.as_str()).context("Failed to open browser")?;
    Ok(())
}
