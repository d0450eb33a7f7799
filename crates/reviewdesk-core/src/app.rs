use anyhow::{Context, Result};
use std::sync::Arc;
use url::Url;

use crate::integration::{IntegrationRegistry, RouteOutcome};
use crate::registry::RepositoryRegistry;
use crate::stopwatch::StopwatchEngine;
use crate::storage::{FileStore, KeyValueStore};
use crate::Config;

/// Application state shared by every host
pub struct App {
    config: Arc<Config>,
    store: Arc<dyn KeyValueStore>,
    integrations: Arc<IntegrationRegistry>,
    repositories: RepositoryRegistry,
    stopwatches: Arc<StopwatchEngine>,
}

impl App {
    /// Create an application persisting under `config.storage_dir`
    pub fn new(config: Config, integrations: IntegrationRegistry) -> Result<Self> {
        let store = Arc::new(FileStore::new(config.storage_dir.clone()));
        Self::with_store(config, integrations, store)
    }

    /// Create an application on top of an explicit store
    pub fn with_store(
        config: Config,
        integrations: IntegrationRegistry,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        let integrations = Arc::new(integrations);
        let repositories = RepositoryRegistry::load(integrations.clone(), store.clone())
            .context("Failed to load repositories")?;
        let stopwatches =
            Arc::new(StopwatchEngine::load(store.clone()).context("Failed to load stopwatches")?);

        tracing::info!(
            "Application ready with {} integrations and {} repositories",
            integrations.ids().len(),
            repositories.len()
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            integrations,
            repositories,
            stopwatches,
        })
    }

    /// Give registered integrations the first look at a navigation.
    ///
    /// `None` means no callback route matched and the host renders normally.
    pub fn handle_navigation(&self, url: &Url) -> Result<Option<RouteOutcome>> {
        self.integrations.dispatch_route(url)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        self.store.clone()
    }

    pub fn integrations(&self) -> &IntegrationRegistry {
        &self.integrations
    }

    pub fn repositories(&self) -> &RepositoryRegistry {
        &self.repositories
    }

    pub fn stopwatches(&self) -> &Arc<StopwatchEngine> {
        &self.stopwatches
    }
}
