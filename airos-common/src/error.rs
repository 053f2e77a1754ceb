use thiserror::Error;

/// Common error type for airOS exporter components.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to initialize tracing: {0}")]
    Tracing(String),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
