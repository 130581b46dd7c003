//! Error types for the storeops CLI

use std::time::Duration;
use thiserror::Error;

/// Result type alias for storeops operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Interactive prompt error: {0}")]
    Dialoguer(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Operation failed: {0}")]
    Other(String),
}

impl Error {
    /// Whether the message already reached the user through the notification
    /// channel. Conflicts are announced where they happen.
    pub fn already_shown(&self) -> bool {
        matches!(self, Error::Api(api) if api.statuscode() == Some(409))
    }
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        Error::Dialoguer(err.to_string())
    }
}

/// API-related errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed. Run `storeops login` to sign in.")]
    Unauthorized,

    /// 409 from the backend. Surfaced to the user and never retried.
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        body: serde_json::Value,
    },

    #[error("{0}")]
    RefreshFailed(String),

    #[error("Refresh token invalid or expired (status {0})")]
    RefreshRejected(u16),

    #[error("Token refresh timed out after {0:?}")]
    RefreshTimedOut(Duration),

    #[error("Gave up waiting for token refresh after {0:?}")]
    QueueTimedOut(Duration),

    #[error("Rate limit exceeded. Retry after {0:?}")]
    RateLimit(Duration),

    #[error("Request failed with status {status}: {body}")]
    Http {
        status: u16,
        body: serde_json::Value,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// HTTP status code carried by this error, if any
    pub fn statuscode(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Conflict { .. } => Some(409),
            ApiError::RateLimit(_) => Some(429),
            ApiError::RefreshRejected(status) | ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timed out".to_string())
        } else if err.is_connect() {
            ApiError::Network("Failed to connect to API".to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),

    #[error("No session found. Run `storeops login` to sign in.")]
    NotLoggedIn,
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
