use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Candle source error: {0}")]
    Source(String),

    #[error("Malformed candle data: {0}")]
    Parse(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Notification failed: {0}")]
    Notify(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
