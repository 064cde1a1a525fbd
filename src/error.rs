//! Error types for the alerts pipeline.

use reqwest::StatusCode;

/// Fatal errors. Any of these aborts the run before output files are written.
#[derive(Debug, thiserror::Error)]
pub enum AlertsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed endpoint returned HTTP {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },

    #[error("Failed to decompress gzip payload: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("Failed to decode GTFS-RT feed: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("Failed to serialize alerts: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

/// Notification errors. Never fatal; the caller logs them and moves on.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Invalid mail address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("Failed to build email: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP send failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}
