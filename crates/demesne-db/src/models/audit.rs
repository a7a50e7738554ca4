//! Audit row model.

use crate::error::{Error, Result};
use demesne_core::AuditEntry;
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Stored audit entry, keyed by an append sequence number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 10, version = 1)]
#[native_db]
pub struct StoredAuditEntry {
    /// Primary key - append sequence, assigned by the store.
    #[primary_key]
    pub seq: u64,
    /// Group id, for per-group queries without unpacking.
    #[secondary_key]
    pub group: u64,
    /// Serialized entry.
    pub data: Vec<u8>,
}

impl StoredAuditEntry {
    /// Create from a domain entry at a sequence position.
    pub fn from_entry(seq: u64, entry: &AuditEntry) -> Self {
        Self {
            seq,
            group: entry.group.raw(),
            data: bincode::serialize(entry).unwrap_or_default(),
        }
    }

    /// Convert back to a domain entry.
    pub fn to_entry(&self) -> Result<AuditEntry> {
        bincode::deserialize(&self.data).map_err(|e| Error::Serialization(e.to_string()))
    }
}
