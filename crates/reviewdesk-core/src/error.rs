//! Centralized error types for ReviewDesk.
//!
//! This module provides a typed error hierarchy that:
//! - Separates provider, storage and registry failures
//! - Provides user-friendly messages suitable for display
//! - Preserves full error context for debugging/logging
//!
//! Classification and sorting are total and never produce errors. Corrupt
//! persisted data is normalised to defaults by its loaders and never reaches
//! this module either.

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a display-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Repository error: {0}")]
    Registry(#[from] RegistryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Storage(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Auth(e) => e.user_message(),
            AppError::Provider(e) => e.user_message(),
            AppError::Registry(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Unable to connect. Check your internet connection."
            }
            NetworkError::Timeout => "The request timed out. Please try again.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The server is experiencing issues. Please try again later."
            }
            NetworkError::ServerError { .. } => "The request failed. Please try again.",
            NetworkError::InvalidResponse(_) => {
                "Received an unexpected response. Please try again."
            }
        }
    }
}

/// Durable key-value storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read key {key}: {message}")]
    ReadFailed { key: String, message: String },

    #[error("Failed to write key {key}: {message}")]
    WriteFailed { key: String, message: String },

    #[error("Failed to serialize value for key {key}: {message}")]
    Serialize { key: String, message: String },

    #[error("Storage location unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub fn user_message(&self) -> &'static str {
        match self {
            StorageError::ReadFailed { .. } => "Unable to read local data. Try restarting.",
            StorageError::WriteFailed { .. } => "Failed to save local data. Please try again.",
            StorageError::Serialize { .. } => "Failed to save local data. Please try again.",
            StorageError::Unavailable(_) => "Local data directory is unavailable.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Configuration file error: {0}")]
    Io(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::Io(_) => "Unable to read or write the configuration file.",
        }
    }
}

/// Authentication errors (OAuth, tokens).
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid authorization endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Invalid redirect URI: {0}")]
    InvalidRedirect(String),

    #[error("Credential storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AuthError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::InvalidEndpoint(_) => "Sign-in is misconfigured. Check your settings.",
            AuthError::InvalidRedirect(_) => "Sign-in is misconfigured. Check your settings.",
            AuthError::Storage(e) => e.user_message(),
        }
    }
}

/// Errors raised while fetching items from a code-hosting provider.
///
/// A fetch either yields the full item list or one of these; partial results
/// are never produced.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Unauthorized - token may be invalid or expired")]
    Unauthorized,

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Invalid source configuration: {0}")]
    InvalidSource(String),

    #[error("Credential lookup failed: {0}")]
    Credential(#[from] AuthError),
}

impl ProviderError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ProviderError::Network(e) => e.user_message(),
            ProviderError::Unauthorized => "Authentication failed. Please sign in again.",
            ProviderError::QueryFailed(_) => "Failed to fetch merge requests. Please try again.",
            ProviderError::InvalidSource(_) => "Repository settings are invalid.",
            ProviderError::Credential(e) => e.user_message(),
        }
    }
}

/// Repository registry errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("No repository at index {0}")]
    IndexOutOfRange(usize),

    #[error("Unknown integration: {0}")]
    UnknownIntegration(String),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] ProviderError),

    #[error("Persisting repositories failed: {0}")]
    Storage(#[from] StorageError),
}

impl RegistryError {
    pub fn user_message(&self) -> &'static str {
        match self {
            RegistryError::IndexOutOfRange(_) => "That repository does not exist.",
            RegistryError::UnknownIntegration(_) => {
                "This repository uses a platform that is not available."
            }
            RegistryError::Fetch(e) => e.user_message(),
            RegistryError::Storage(e) => e.user_message(),
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_connect() {
            NetworkError::ConnectionFailed(self.to_string())
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_conversion() {
        let err: AppError = RegistryError::IndexOutOfRange(3).into();
        assert!(matches!(err, AppError::Registry(RegistryError::IndexOutOfRange(3))));
    }

    #[test]
    fn test_user_message_propagation() {
        let err = AppError::Registry(RegistryError::Fetch(ProviderError::Unauthorized));
        assert_eq!(
            err.user_message(),
            "Authentication failed. Please sign in again."
        );
    }

    #[test]
    fn test_server_error_message_depends_on_status() {
        let outage = NetworkError::ServerError {
            status: 503,
            message: "down".into(),
        };
        let bad = NetworkError::ServerError {
            status: 400,
            message: "bad".into(),
        };
        assert_ne!(outage.user_message(), bad.user_message());
    }

    #[test]
    fn test_config_error_message() {
        let err: AppError = ConfigError::Invalid("stopwatch.tick_millis".into()).into();
        assert_eq!(err.user_message(), "Invalid configuration. Check your settings.");
    }

    #[test]
    fn test_provider_error_wraps_network() {
        let err: ProviderError = NetworkError::Timeout.into();
        assert_eq!(err.user_message(), NetworkError::Timeout.user_message());
    }
}
