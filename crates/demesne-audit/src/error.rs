//! Error types for audit analytics and export

use thiserror::Error;

/// Result type for audit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during audit export
#[derive(Debug, Error)]
pub enum Error {
    /// Serialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Export failed
    #[error("export error: {0}")]
    Export(String),
}
