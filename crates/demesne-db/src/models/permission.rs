//! Permission row models: scopes, trusts, and temporaries.

use crate::error::{Error, Result};
use demesne_core::{CellCoordinate, PermissionScope, TemporaryPermission, TrustGrant};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Stored per-cell permission scope, keyed by the cell key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 3, version = 1)]
#[native_db]
pub struct StoredScope {
    /// Primary key - cell key.
    #[primary_key]
    pub cell_key: String,
    /// Serialized scope.
    pub data: Vec<u8>,
}

impl StoredScope {
    /// Create from a cell and its scope.
    pub fn from_scope(cell: &CellCoordinate, scope: &PermissionScope) -> Self {
        Self {
            cell_key: cell.key(),
            data: bincode::serialize(scope).unwrap_or_default(),
        }
    }

    /// Convert back to the cell and scope pair.
    pub fn to_scope(&self) -> Result<(CellCoordinate, PermissionScope)> {
        let cell = CellCoordinate::from_key(&self.cell_key)
            .ok_or_else(|| Error::Serialization(format!("bad cell key {}", self.cell_key)))?;
        let scope =
            bincode::deserialize(&self.data).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok((cell, scope))
    }
}

/// Stored trust grant, keyed by `"group:principal"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 4, version = 1)]
#[native_db]
pub struct StoredTrust {
    /// Primary key - `"group:principal"`.
    #[primary_key]
    pub key: String,
    /// Granting group id.
    #[secondary_key]
    pub group: u64,
    /// Serialized trust grant.
    pub data: Vec<u8>,
}

impl StoredTrust {
    /// The primary key for a (group, principal) pair.
    pub fn key_for(group: u64, principal: u64) -> String {
        format!("{}:{}", group, principal)
    }

    /// Create from a domain trust grant.
    pub fn from_trust(trust: &TrustGrant) -> Self {
        Self {
            key: Self::key_for(trust.group.raw(), trust.principal.raw()),
            group: trust.group.raw(),
            data: bincode::serialize(trust).unwrap_or_default(),
        }
    }

    /// Convert back to a domain trust grant.
    pub fn to_trust(&self) -> Result<TrustGrant> {
        bincode::deserialize(&self.data).map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// Stored temporary permission, keyed by the grant's storage key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 5, version = 1)]
#[native_db]
pub struct StoredTemporary {
    /// Primary key - `"group:principal:permission:cellKey"`.
    #[primary_key]
    pub key: String,
    /// Granting group id.
    #[secondary_key]
    pub group: u64,
    /// Serialized grant.
    pub data: Vec<u8>,
}

impl StoredTemporary {
    /// Create from a domain temporary permission.
    pub fn from_temporary(temp: &TemporaryPermission) -> Self {
        Self {
            key: temp.storage_key(),
            group: temp.group.raw(),
            data: bincode::serialize(temp).unwrap_or_default(),
        }
    }

    /// Convert back to a domain temporary permission.
    pub fn to_temporary(&self) -> Result<TemporaryPermission> {
        bincode::deserialize(&self.data).map_err(|e| Error::Serialization(e.to_string()))
    }
}
