//! Group row model.

use crate::error::{Error, Result};
use demesne_core::Group;
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Stored group, keyed by its unique name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct StoredGroup {
    /// Primary key - unique group name.
    #[primary_key]
    pub name: String,
    /// Group id, for cross-referencing without unpacking the payload.
    pub id: u64,
    /// Serialized group record.
    pub data: Vec<u8>,
}

impl StoredGroup {
    /// Create from a domain group.
    pub fn from_group(group: &Group) -> Self {
        Self {
            name: group.name.clone(),
            id: group.id.raw(),
            data: bincode::serialize(group).unwrap_or_default(),
        }
    }

    /// Convert back to a domain group.
    pub fn to_group(&self) -> Result<Group> {
        bincode::deserialize(&self.data).map_err(|e| Error::Serialization(e.to_string()))
    }
}
