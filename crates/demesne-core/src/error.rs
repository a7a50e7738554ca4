//! Error types for demesne-core
//!
//! Validation conditions are returned, never thrown: every mutating call
//! yields an explicit result, and none of these errors is process-fatal.
//! Permission denial is a [`crate::Decision`], not an error.

use crate::cell::CellCoordinate;
use thiserror::Error;

/// Core error type
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Malformed input, e.g. a radius outside its bounds
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown group, cell, or conflict id
    #[error("Not found: {0}")]
    NotFound(String),

    /// A group name is already taken
    #[error("Name already taken: {0}")]
    DuplicateName(String),

    /// The cell is already owned by a group
    #[error("Cell {0} is already claimed")]
    AlreadyClaimed(CellCoordinate),

    /// A non-founding claim with no adjacent same-group cell
    #[error("Cell {0} is not adjacent to existing territory")]
    NotAdjacent(CellCoordinate),

    /// The claim would exceed the group's cell capacity
    #[error("Claim capacity exceeded: {used} of {capacity} cells used")]
    CapacityExceeded {
        /// Cells currently claimed
        used: usize,
        /// Maximum cells for the group's level
        capacity: usize,
    },

    /// A treasury withdrawal larger than the balance
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        /// Amount requested
        requested: f64,
        /// Balance available
        available: f64,
    },

    /// An operation illegal in the current lifecycle state, e.g. declaring
    /// war while already at war or sieging during an active ceasefire
    #[error("Invalid state: {0}")]
    State(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
