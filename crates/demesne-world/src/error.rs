//! Error types for demesne-world

use demesne_core::{Permission, PrincipalId, StorageError};
use thiserror::Error;

/// Result type for world operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in demesne-world
#[derive(Debug, Error)]
pub enum Error {
    /// The actor lacks the capability a management operation requires
    ///
    /// Distinct from an in-world permission denial, which `check` reports
    /// as a [`demesne_core::Decision`], never as an error.
    #[error("{actor} may not perform {permission} here")]
    Denied {
        /// The refused actor
        actor: PrincipalId,
        /// The capability the operation requires
        permission: Permission,
    },

    /// Configuration could not be read or parsed
    #[error("config error: {0}")]
    Config(String),

    /// Storage failed while booting; runtime writes never surface this
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Core engine error
    #[error(transparent)]
    Core(#[from] demesne_core::Error),
}
