use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use url::Url;

use crate::error::ProviderError;
use crate::models::PullRequest;

/// Result of asking an integration for its items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Classified, filtered and sorted items
    Ready(Vec<PullRequest>),
    /// No credential is stored; the user must visit `authorize_url` first
    AuthRequired { authorize_url: Url },
}

/// What the host should do after an extra route handled a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Reload the application at `location`
    Reload { location: String },
    /// The route matched but there was nothing to do
    Nothing,
}

type RouteHandler = Arc<dyn Fn(&Url) -> Result<RouteOutcome> + Send + Sync>;

/// Out-of-band callback endpoint an integration asks the host to serve.
#[derive(Clone)]
pub struct ExtraRoute {
    path: String,
    handler: RouteHandler,
}

impl ExtraRoute {
    pub fn new<F>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Url) -> Result<RouteOutcome> + Send + Sync + 'static,
    {
        Self {
            path: path.into(),
            handler: Arc::new(handler),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Exact path equality; query and fragment are ignored.
    pub fn matches(&self, url: &Url) -> bool {
        url.path() == self.path
    }

    pub fn handle(&self, url: &Url) -> Result<RouteOutcome> {
        (self.handler)(url)
    }
}

impl fmt::Debug for ExtraRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtraRoute").field("path", &self.path).finish_non_exhaustive()
    }
}

/// A code-hosting provider that can list review items.
#[async_trait]
pub trait Integration: Send + Sync {
    /// Stable identifier referenced by repository configurations
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Fetch the classified, filtered and sorted items for `source`.
    ///
    /// `source` is opaque outside the integration that produced it.
    async fn fetch(&self, source: &serde_json::Value) -> Result<FetchOutcome, ProviderError>;

    /// Check that `source` is usable before it is persisted.
    fn validate_source(&self, _source: &serde_json::Value) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Callback endpoints the host must dispatch to before normal rendering
    fn extra_routes(&self) -> Vec<ExtraRoute> {
        Vec::new()
    }
}

/// Static set of available integrations, keyed by id.
#[derive(Default)]
pub struct IntegrationRegistry {
    integrations: Vec<Arc<dyn Integration>>,
}

impl IntegrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an integration. A later registration with the same id wins.
    pub fn register(&mut self, integration: Arc<dyn Integration>) {
        tracing::info!("Registering integration: {}", integration.name());
        self.integrations.retain(|existing| existing.id() != integration.id());
        self.integrations.push(integration);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Integration>> {
        self.integrations.iter().find(|i| i.id() == id).cloned()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.integrations.iter().map(|i| i.id()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Integration>> {
        self.integrations.iter()
    }

    /// Run the first extra route whose path equals `url`'s path.
    ///
    /// Returns `None` when no route matched, in which case the host renders
    /// normally. At most one handler runs per call.
    pub fn dispatch_route(&self, url: &Url) -> Result<Option<RouteOutcome>> {
        for integration in &self.integrations {
            if let Some(route) = integration.extra_routes().into_iter().find(|r| r.matches(url)) {
                tracing::debug!("Route {} handled by {}", route.path(), integration.id());
                return route.handle(url).map(Some);
            }
        }
        Ok(None)
    }
}


#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::testing::ScriptedIntegration;
    use super::*;

    #[test]
    fn test_lookup_by_id() {
        let mut registry = IntegrationRegistry::new();
        registry.register(Arc::new(ScriptedIntegration::new("gitlab")));
        registry.register(Arc::new(ScriptedIntegration::new("other")));

        assert_eq!(registry.get("gitlab").unwrap().id(), "gitlab");
        assert!(registry.get("github").is_none());
        assert_eq!(registry.ids(), vec!["gitlab", "other"]);
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut registry = IntegrationRegistry::new();
        registry.register(Arc::new(ScriptedIntegration::new("gitlab")));
        registry.register(Arc::new(ScriptedIntegration::new("gitlab")));
        assert_eq!(registry.iter().count(), 1);
    }

    #[test]
    fn test_dispatch_route_exact_path() {
        let mut registry = IntegrationRegistry::new();
        registry.register(Arc::new(ScriptedIntegration::new("scripted")));

        let hit = Url::parse("http://localhost:3000/scripted/callback#token").unwrap();
        assert_eq!(
            registry.dispatch_route(&hit).unwrap(),
            Some(RouteOutcome::Reload {
                location: "/".to_string()
            })
        );

        let no_fragment = Url::parse("http://localhost:3000/scripted/callback").unwrap();
        assert_eq!(registry.dispatch_route(&no_fragment).unwrap(), Some(RouteOutcome::Nothing));

        let miss = Url::parse("http://localhost:3000/scripted/callback/extra#token").unwrap();
        assert_eq!(registry.dispatch_route(&miss).unwrap(), None);
    }
}
