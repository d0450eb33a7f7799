//! Persisted list of repositories with an in-memory cache of their last fetch.
//!
//! Entries are append-only, so an index identifies the same repository for
//! the lifetime of the registry. A fetch that completes after the user moved
//! on to another repository still lands in the entry that started it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{RegistryError, StorageError};
use crate::integration::{FetchOutcome, Integration, IntegrationRegistry};
use crate::load_state::LoadState;
use crate::models::PullRequest;
use crate::stopwatch::StopwatchEngine;
use crate::storage::{load_json, save_json, KeyValueStore, REPOSITORIES_KEY};
use crate::view::{annotate, AnnotatedItem};

/// A user-configured repository, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryConfig {
    /// Label chosen by the user
    pub name: String,

    /// Id of the integration that understands `source`
    pub integration_id: String,

    /// Integration-specific settings, opaque to the registry
    pub source: serde_json::Value,
}

/// A repository together with its runtime state.
#[derive(Debug, Clone)]
pub struct RepositoryEntry {
    pub config: RepositoryConfig,

    /// Items from the last successful fetch; `None` until then
    pub cached_items: Option<Vec<PullRequest>>,

    pub load_state: LoadState,
}

impl RepositoryEntry {
    fn new(config: RepositoryConfig) -> Self {
        Self {
            config,
            cached_items: None,
            load_state: LoadState::Idle,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.load_state.is_loading()
    }
}

/// How a refresh request was settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The cache was replaced with `count` items
    Updated { count: usize },
    /// No credential; nothing changed. The user must authorize first.
    AuthRequired { authorize_url: Url },
    /// A fetch for this entry is already in flight; nothing was started
    AlreadyLoading,
}

#[derive(Debug, Default)]
struct RegistryState {
    entries: Vec<RepositoryEntry>,
    selected: Option<usize>,
}

/// Returns an entry to `Idle` when its fetch settles or is dropped.
struct LoadingGuard<'a> {
    state: &'a Mutex<RegistryState>,
    index: usize,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if let Some(entry) = self.state.lock().entries.get_mut(self.index) {
            entry.load_state = entry.load_state.on_refresh_done();
        }
    }
}

pub struct RepositoryRegistry {
    state: Mutex<RegistryState>,
    integrations: Arc<IntegrationRegistry>,
    store: Arc<dyn KeyValueStore>,
}

impl RepositoryRegistry {
    /// Load persisted configurations. Corrupt data yields an empty registry.
    pub fn load(
        integrations: Arc<IntegrationRegistry>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, StorageError> {
        let configs: Vec<RepositoryConfig> = load_json(store.as_ref(), REPOSITORIES_KEY)?;
        tracing::info!("Loaded {} repositories", configs.len());

        let selected = if configs.is_empty() { None } else { Some(0) };
        let entries = configs.into_iter().map(RepositoryEntry::new).collect();

        Ok(Self {
            state: Mutex::new(RegistryState { entries, selected }),
            integrations,
            store,
        })
    }

    /// Append a repository, select it and persist the configuration list.
    ///
    /// Returns the new entry's index. Nothing changes if persisting fails.
    pub fn add(&self, config: RepositoryConfig) -> Result<usize, RegistryError> {
        let integration = self.integration(&config.integration_id)?;
        integration.validate_source(&config.source)?;

        let mut state = self.state.lock();

        let mut configs: Vec<&RepositoryConfig> = state.entries.iter().map(|e| &e.config).collect();
        configs.push(&config);
        save_json(self.store.as_ref(), REPOSITORIES_KEY, &configs)?;

        tracing::info!("Added repository {} ({})", config.name, config.integration_id);
        state.entries.push(RepositoryEntry::new(config));
        let index = state.entries.len() - 1;
        state.selected = Some(index);
        Ok(index)
    }

    /// Mark `index` active, fetching it when nothing is cached yet.
    ///
    /// Returns the refresh outcome if a fetch was started.
    pub async fn select(&self, index: usize) -> Result<Option<RefreshOutcome>, RegistryError> {
        let needs_fetch = {
            let mut state = self.state.lock();
            let entry = state
                .entries
                .get(index)
                .ok_or(RegistryError::IndexOutOfRange(index))?;
            let needs_fetch = entry.cached_items.is_none() && entry.load_state.can_start_refresh();
            state.selected = Some(index);
            needs_fetch
        };

        if needs_fetch {
            self.refresh(index).await.map(Some)
        } else {
            Ok(None)
        }
    }

    /// Fetch `index` again and replace its cache on success.
    ///
    /// On failure the previous cache is kept and the error is returned.
    pub async fn refresh(&self, index: usize) -> Result<RefreshOutcome, RegistryError> {
        let (integration, source) = {
            let mut state = self.state.lock();
            let entry = state
                .entries
                .get_mut(index)
                .ok_or(RegistryError::IndexOutOfRange(index))?;

            if !entry.load_state.can_start_refresh() {
                tracing::debug!("Refresh of {} skipped, already loading", entry.config.name);
                return Ok(RefreshOutcome::AlreadyLoading);
            }

            let integration = self.integration(&entry.config.integration_id)?;
            entry.load_state = entry.load_state.on_refresh_started();
            (integration, entry.config.source.clone())
        };

        let loading = LoadingGuard {
            state: &self.state,
            index,
        };
        let fetched = integration.fetch(&source).await;
        drop(loading);

        let mut state = self.state.lock();
        let entry = state
            .entries
            .get_mut(index)
            .ok_or(RegistryError::IndexOutOfRange(index))?;

        match fetched {
            Ok(FetchOutcome::Ready(items)) => {
                let count = items.len();
                tracing::info!("Fetched {} items for {}", count, entry.config.name);
                entry.cached_items = Some(items);
                Ok(RefreshOutcome::Updated { count })
            }
            Ok(FetchOutcome::AuthRequired { authorize_url }) => {
                tracing::info!("Authorization required for {}", entry.config.name);
                Ok(RefreshOutcome::AuthRequired { authorize_url })
            }
            Err(e) => {
                tracing::warn!("Fetch failed for {}: {}", entry.config.name, e);
                Err(RegistryError::Fetch(e))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn selected(&self) -> Option<usize> {
        self.state.lock().selected
    }

    /// Snapshot of all entries.
    pub fn entries(&self) -> Vec<RepositoryEntry> {
        self.state.lock().entries.clone()
    }

    pub fn entry(&self, index: usize) -> Option<RepositoryEntry> {
        self.state.lock().entries.get(index).cloned()
    }

    pub fn cached_items(&self, index: usize) -> Option<Vec<PullRequest>> {
        self.state
            .lock()
            .entries
            .get(index)
            .and_then(|e| e.cached_items.clone())
    }

    /// Cached items of `index` paired with their stopwatch readings.
    ///
    /// Empty when nothing has been fetched yet.
    pub fn annotated(
        &self,
        index: usize,
        stopwatches: &StopwatchEngine,
        now: DateTime<Utc>,
    ) -> Result<Vec<AnnotatedItem>, RegistryError> {
        let entry = self.entry(index).ok_or(RegistryError::IndexOutOfRange(index))?;
        let items = entry.cached_items.unwrap_or_default();
        Ok(annotate(&items, stopwatches, now))
    }

    fn integration(&self, id: &str) -> Result<Arc<dyn Integration>, RegistryError> {
        self.integrations
            .get(id)
            .ok_or_else(|| RegistryError::UnknownIntegration(id.to_string()))
    }
}
