//! Error types for the exporter

use thiserror::Error;

/// Result type alias for exporter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while exporting an element snapshot
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to initialize a document host
    #[error("Host initialization failed: {0}")]
    InitializationError(String),

    /// Failed to load a document
    #[error("Failed to load document: {0}")]
    LoadError(String),

    /// No element matches the requested id
    #[error("No element matches id '{0}'")]
    ElementNotFound(String),

    /// The requested id matches more than one element
    #[error("Element id '{0}' matches more than one element")]
    AmbiguousElement(String),

    /// The rasterization capability could not produce an image
    #[error("Rasterization failed: {0}")]
    RasterizationFailure(String),

    /// The transient download anchor could not be driven
    #[error("Download anchor failed: {0}")]
    AnchorError(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Invalid configuration or request
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// CDP-specific error
    #[cfg(feature = "cdp")]
    #[error("CDP error: {0}")]
    CdpError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "cdp")]
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::CdpError(err.to_string())
    }
}
