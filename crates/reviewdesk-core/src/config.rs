use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

type Result<T> = std::result::Result<T, ConfigError>;

fn io_error(action: &str, path: &Path, e: std::io::Error) -> ConfigError {
    ConfigError::Io(format!("{} {}: {}", action, path.display(), e))
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding persisted repositories, stopwatches and tokens
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// GitLab application and endpoint settings
    #[serde(default)]
    pub gitlab: GitLabConfig,

    /// Stopwatch presentation settings
    #[serde(default)]
    pub stopwatch: StopwatchConfig,
}

/// Application id of the public GitLab cloud OAuth application
pub const DEFAULT_GITLAB_APPLICATION_ID: &str =
    "3d1983d0d92a47f5f2791e63aaef1536445f7a91b7f4b0c84129d4beb26d493a";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabConfig {
    /// OAuth application id registered on the GitLab instance
    pub application_id: String,

    /// GraphQL endpoint
    pub api_url: String,

    /// OAuth authorization endpoint
    pub authorize_url: String,

    /// Origin the application is served from; the token callback is
    /// `<app_origin>/gitlab/token`
    pub app_origin: String,
}

impl GitLabConfig {
    /// Check if the application id looks real (not a placeholder)
    pub fn is_configured(&self) -> bool {
        !self.application_id.is_empty() && !self.application_id.starts_with("YOUR_")
    }
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            application_id: DEFAULT_GITLAB_APPLICATION_ID.to_string(),
            api_url: "https://gitlab.com/api/graphql".to_string(),
            authorize_url: "https://gitlab.com/oauth/authorize".to_string(),
            app_origin: "http://localhost:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopwatchConfig {
    /// Redraw period of running stopwatches, in milliseconds
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

fn default_tick_millis() -> u64 {
    500
}

impl Default for StopwatchConfig {
    fn default() -> Self {
        Self {
            tick_millis: default_tick_millis(),
        }
    }
}

fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("reviewdesk")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            gitlab: GitLabConfig::default(),
            stopwatch: StopwatchConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(path).map_err(|e| io_error("Failed to read", path, e))?;

        let config: Config =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated(path: Option<&Path>) -> Result<(Self, ValidationResult)> {
        let config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(&self.gitlab.api_url, "gitlab.api_url", &mut result);
        validate_url(&self.gitlab.authorize_url, "gitlab.authorize_url", &mut result);
        validate_url(&self.gitlab.app_origin, "gitlab.app_origin", &mut result);

        if !self.gitlab.is_configured() {
            result.add_warning(
                "gitlab.application_id",
                "GitLab application id not configured - sign-in will fail",
            );
        }

        if self.stopwatch.tick_millis == 0 {
            result.add_error("stopwatch.tick_millis", "Tick period must be greater than 0");
        } else if self.stopwatch.tick_millis > 60_000 {
            result.add_warning(
                "stopwatch.tick_millis",
                "Tick period is longer than a minute; running stopwatches will look frozen",
            );
        }

        if self.storage_dir.exists() && !self.storage_dir.is_dir() {
            result.add_error(
                "storage_dir",
                format!("Path is not a directory: {}", self.storage_dir.display()),
            );
        }

        result
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| io_error("Failed to create directory for", path, e))?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))?;

        std::fs::write(path, contents).map_err(|e| io_error("Failed to write", path, e))?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Io("No user configuration directory".to_string()))?
            .join("reviewdesk");

        Ok(config_dir.join("config.toml"))
    }
}

fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }

            if url.port() == Some(0) {
                result.add_error(field_name, "Port cannot be 0");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}
