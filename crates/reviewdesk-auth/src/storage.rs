use std::sync::Arc;

use reviewdesk_core::error::StorageError;
use reviewdesk_core::storage::{token_key, KeyValueStore};

/// Bearer credentials kept in the application's key-value store,
/// one per provider under `<provider>-token`.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Store a token, replacing any previous one
    ///
    /// # Arguments
    /// * `provider` - Provider identifier (e.g., "gitlab")
    /// * `token` - Bearer token as received from the provider
    pub fn store_token(&self, provider: &str, token: &str) -> Result<(), StorageError> {
        self.store.set(&token_key(provider), token)?;
        tracing::info!("Stored token for provider: {}", provider);
        Ok(())
    }

    /// Retrieve a provider's token
    ///
    /// Surrounding whitespace is ignored and a blank value counts as no token.
    pub fn retrieve_token(&self, provider: &str) -> Result<Option<String>, StorageError> {
        let token = self.store.get(&token_key(provider))?;
        Ok(token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()))
    }

    /// Delete a provider's token. Deleting a missing token is not an error.
    pub fn delete_token(&self, provider: &str) -> Result<(), StorageError> {
        self.store.remove(&token_key(provider))?;
        tracing::info!("Deleted token for provider: {}", provider);
        Ok(())
    }

    pub fn has_token(&self, provider: &str) -> bool {
        matches!(self.retrieve_token(provider), Ok(Some(_)))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use reviewdesk_core::storage::MemoryStore;

    fn credentials() -> (CredentialStore, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (CredentialStore::new(store.clone()), store)
    }

    #[test]
    fn test_store_and_retrieve() {
        let (credentials, store) = credentials();
        assert_eq!(credentials.retrieve_token("gitlab").unwrap(), None);

        credentials.store_token("gitlab", "abc123").unwrap();
        assert_eq!(credentials.retrieve_token("gitlab").unwrap().as_deref(), Some("abc123"));
        assert!(store.get("gitlab-token").unwrap().is_some());
        assert!(!credentials.has_token("github"));
    }

    #[test]
    fn test_delete_token() {
        let (credentials, _) = credentials();
        credentials.store_token("gitlab", "abc123").unwrap();
        credentials.delete_token("gitlab").unwrap();
        assert!(!credentials.has_token("gitlab"));

        credentials.delete_token("gitlab").unwrap();
    }

    #[test]
    fn test_token_is_stored_raw() {
        let (credentials, store) = credentials();
        credentials.store_token("gitlab", "abc123").unwrap();
        assert_eq!(store.get("gitlab-token").unwrap().as_deref(), Some("abc123"));

        store.set("gitlab-token", "abc123\n").unwrap();
        assert_eq!(credentials.retrieve_token("gitlab").unwrap().as_deref(), Some("abc123"));
    }

    #[test]
    fn test_blank_token_is_absent() {
        let (credentials, store) = credentials();
        credentials.store_token("gitlab", "  ").unwrap();
        assert_eq!(credentials.retrieve_token("gitlab").unwrap(), None);

        store.set("gitlab-token", "").unwrap();
        assert!(!credentials.has_token("gitlab"));
    }
}
