pub mod app;
pub mod classifier;
pub mod config;
pub mod error;
pub mod integration;
pub mod load_state;
pub mod models;
pub mod registry;
pub mod sort;
pub mod status;
pub mod stopwatch;
pub mod storage;
pub mod view;

pub use app::App;
pub use classifier::classify;
pub use config::{Config, GitLabConfig, StopwatchConfig};
pub use error::{
    AppError, AuthError, ConfigError, NetworkError, ProviderError, RegistryError, StorageError,
};
pub use integration::{ExtraRoute, FetchOutcome, Integration, IntegrationRegistry, RouteOutcome};
pub use models::{Discussion, Label, Note, PullRequest, ReviewRecord};
pub use registry::{RefreshOutcome, RepositoryConfig, RepositoryRegistry};
pub use sort::{sort_pull_requests, LabelFilter};
pub use status::ReviewStatus;
pub use stopwatch::{StopwatchEngine, StopwatchState, StopwatchTicker};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use view::AnnotatedItem;

use anyhow::Result;

/// Initialize the core application
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("ReviewDesk core initialized");
    Ok(())
}
