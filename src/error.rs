use thiserror::Error;

/// Errors raised by the startup collaborators (configuration, logging, server bind).
/// Per-request failures never use this type, see `proxy::error::ProxyError`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Server error: {0}")]
    Server(String),
}

// Implement alias for Result to simplify usage
pub type AppResult<T> = Result<T, AppError>;
