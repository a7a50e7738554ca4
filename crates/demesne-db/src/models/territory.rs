//! Claim row model.

use crate::error::{Error, Result};
use demesne_core::ClaimRecord;
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Stored claim, keyed by `"mapId:x:y"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 2, version = 1)]
#[native_db]
pub struct StoredClaim {
    /// Primary key - cell key.
    #[primary_key]
    pub cell_key: String,
    /// Owning group id.
    #[secondary_key]
    pub owner: u64,
    /// Serialized claim record.
    pub data: Vec<u8>,
}

impl StoredClaim {
    /// Create from a domain claim record.
    pub fn from_claim(claim: &ClaimRecord) -> Self {
        Self {
            cell_key: claim.cell.key(),
            owner: claim.owner.raw(),
            data: bincode::serialize(claim).unwrap_or_default(),
        }
    }

    /// Convert back to a domain claim record.
    pub fn to_claim(&self) -> Result<ClaimRecord> {
        bincode::deserialize(&self.data).map_err(|e| Error::Serialization(e.to_string()))
    }
}
