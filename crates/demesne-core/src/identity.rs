//! Identity types for groups, principals, and conflicts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub u64);

impl GroupId {
    /// Create a new group ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group:{}", self.0)
    }
}

/// Unique identifier for a principal (any individual actor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalId(pub u64);

impl PrincipalId {
    /// Create a new principal ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "principal:{}", self.0)
    }
}

/// Unique identifier for a war, siege, raid, or ceasefire record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConflictId(pub u64);

impl ConflictId {
    /// Create a new conflict ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConflictId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conflict:{}", self.0)
    }
}

/// An individual actor subject to permission checks
///
/// Carries no engine-specific behavior; the embedding application maps its
/// own player/actor handles onto this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Unique identifier
    pub id: PrincipalId,
    /// Display name
    pub name: String,
}

impl Principal {
    /// Create a new principal
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: PrincipalId::new(id),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_id() {
        let id = GroupId::new(7);
        assert_eq!(id.raw(), 7);
        assert_eq!(format!("{}", id), "group:7");
    }

    #[test]
    fn test_principal() {
        let p = Principal::new(1, "playerX");
        assert_eq!(p.id.raw(), 1);
        assert_eq!(format!("{}", p.id), "principal:1");
    }
}
