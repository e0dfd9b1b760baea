use thiserror::Error;

/// Common error type for DSLSight components.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid QoS level: {0} (expected 0, 1 or 2)")]
    QoS(u8),
}

/// Result type alias using DSLSight's Error.
pub type Result<T> = std::result::Result<T, Error>;
