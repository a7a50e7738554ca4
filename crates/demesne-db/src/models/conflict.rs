//! Conflict row models: wars, sieges, raids, ceasefires.

use crate::error::{Error, Result};
use demesne_core::{Ceasefire, Raid, Siege, War};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};

/// Stored war, keyed by conflict id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 6, version = 1)]
#[native_db]
pub struct StoredWar {
    /// Primary key - conflict id.
    #[primary_key]
    pub id: u64,
    /// Serialized war record.
    pub data: Vec<u8>,
}

impl StoredWar {
    /// Create from a domain war.
    pub fn from_war(war: &War) -> Self {
        Self {
            id: war.id.raw(),
            data: bincode::serialize(war).unwrap_or_default(),
        }
    }

    /// Convert back to a domain war.
    pub fn to_war(&self) -> Result<War> {
        bincode::deserialize(&self.data).map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// Stored siege, keyed by conflict id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 7, version = 1)]
#[native_db]
pub struct StoredSiege {
    /// Primary key - conflict id.
    #[primary_key]
    pub id: u64,
    /// Serialized siege record.
    pub data: Vec<u8>,
}

impl StoredSiege {
    /// Create from a domain siege.
    pub fn from_siege(siege: &Siege) -> Self {
        Self {
            id: siege.id.raw(),
            data: bincode::serialize(siege).unwrap_or_default(),
        }
    }

    /// Convert back to a domain siege.
    pub fn to_siege(&self) -> Result<Siege> {
        bincode::deserialize(&self.data).map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// Stored raid, keyed by conflict id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 8, version = 1)]
#[native_db]
pub struct StoredRaid {
    /// Primary key - conflict id.
    #[primary_key]
    pub id: u64,
    /// Serialized raid record.
    pub data: Vec<u8>,
}

impl StoredRaid {
    /// Create from a domain raid.
    pub fn from_raid(raid: &Raid) -> Self {
        Self {
            id: raid.id.raw(),
            data: bincode::serialize(raid).unwrap_or_default(),
        }
    }

    /// Convert back to a domain raid.
    pub fn to_raid(&self) -> Result<Raid> {
        bincode::deserialize(&self.data).map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// Stored ceasefire, keyed by conflict id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 9, version = 1)]
#[native_db]
pub struct StoredCeasefire {
    /// Primary key - conflict id.
    #[primary_key]
    pub id: u64,
    /// Serialized ceasefire record.
    pub data: Vec<u8>,
}

impl StoredCeasefire {
    /// Create from a domain ceasefire.
    pub fn from_ceasefire(ceasefire: &Ceasefire) -> Self {
        Self {
            id: ceasefire.id.raw(),
            data: bincode::serialize(ceasefire).unwrap_or_default(),
        }
    }

    /// Convert back to a domain ceasefire.
    pub fn to_ceasefire(&self) -> Result<Ceasefire> {
        bincode::deserialize(&self.data).map_err(|e| Error::Serialization(e.to_string()))
    }
}
