use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Reddit API error: {0}")]
    RedditApi(#[from] RedditApiError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid subreddit name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("{source_name} unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("no answer within {after:?}")]
    Timeout { after: Duration },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CoreError {
    pub fn source_unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        CoreError::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Folds any failure that kept an operation from running into `SourceUnavailable`.
    /// Errors that are already a verdict on the caller's input pass through.
    pub fn into_source_unavailable(self, source_name: &str) -> Self {
        match self {
            CoreError::SourceUnavailable { .. }
            | CoreError::InvalidName { .. }
            | CoreError::Config(_) => self,
            other => CoreError::source_unavailable(source_name, other),
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum RedditApiError {
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Forbidden access to resource: {resource}")]
    Forbidden {
        resource: String,
        /// Reddit's `reason` field from the response body, when present.
        reason: Option<String>,
    },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Invalid OAuth token")]
    InvalidToken,

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Unexpected status {status_code} from {endpoint}")]
    UnexpectedStatus { endpoint: String, status_code: u16 },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Invalid table name: {table}")]
    InvalidTable { table: String },

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    Missing { path: String },

    #[error("Malformed configuration at [{section}] {key}: {reason}")]
    Malformed {
        section: String,
        key: String,
        reason: String,
    },

    #[error("Configuration syntax error on line {line}: {details}")]
    Syntax { line: usize, details: String },

    #[error("Invalid value for [{section}] {key}: {reason}")]
    Validation {
        section: String,
        key: String,
        reason: String,
    },

    #[error("Failed to write configuration to {path}: {reason}")]
    Write { path: String, reason: String },

    #[error("Settings parsing error: {0}")]
    Settings(#[from] toml::de::Error),
}

impl ConfigError {
    /// The offending `(section, key)` pair, when the error names one.
    pub fn offending_key(&self) -> Option<(&str, &str)> {
        match self {
            ConfigError::Malformed { section, key, .. }
            | ConfigError::Validation { section, key, .. } => {
                Some((section.as_str(), key.as_str()))
            }
            _ => None,
        }
    }
}
