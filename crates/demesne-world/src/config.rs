//! World configuration
//!
//! Tunables for territory capacity and sweep cadence, loadable from RON so
//! hosts can ship a config file next to the world data.

use crate::error::{Error, Result};
use demesne_core::{CAPACITY_BASE, CAPACITY_PER_LEVEL, MAX_CLAIM_RADIUS};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Runtime settings for a [`crate::World`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Claim capacity every group starts with
    pub capacity_base: usize,
    /// Additional claim capacity per group level
    pub capacity_per_level: usize,
    /// Largest radius `claim_radius` accepts, clamped to the engine cap
    pub max_claim_radius: u32,
    /// Suggested seconds between host-driven `sweep` calls
    pub sweep_interval_secs: u64,
}

impl WorldConfig {
    /// Parse a configuration from RON text
    pub fn from_ron(text: &str) -> Result<Self> {
        let config: WorldConfig =
            ron::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a RON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_ron(&text)
    }

    /// The claim capacity for a group at `level`
    pub fn capacity_for_level(&self, level: u32) -> usize {
        self.capacity_base + self.capacity_per_level * level as usize
    }

    fn validate(&self) -> Result<()> {
        if self.max_claim_radius == 0 || self.max_claim_radius > MAX_CLAIM_RADIUS {
            return Err(Error::Config(format!(
                "max_claim_radius must be between 1 and {}",
                MAX_CLAIM_RADIUS
            )));
        }
        Ok(())
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            capacity_base: CAPACITY_BASE,
            capacity_per_level: CAPACITY_PER_LEVEL,
            max_claim_radius: MAX_CLAIM_RADIUS,
            sweep_interval_secs: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_engine_constants() {
        let config = WorldConfig::default();
        assert_eq!(config.capacity_base, 10);
        assert_eq!(config.capacity_per_level, 5);
        assert_eq!(config.capacity_for_level(1), 15);
        assert_eq!(config.capacity_for_level(3), 25);
    }

    #[test]
    fn test_from_ron() {
        let config = WorldConfig::from_ron(
            "(capacity_base: 20, capacity_per_level: 2, max_claim_radius: 4, sweep_interval_secs: 30)",
        )
        .unwrap();
        assert_eq!(config.capacity_base, 20);
        assert_eq!(config.max_claim_radius, 4);
    }

    #[test]
    fn test_radius_out_of_range_rejected() {
        let result = WorldConfig::from_ron(
            "(capacity_base: 10, capacity_per_level: 5, max_claim_radius: 99, sweep_interval_secs: 60)",
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
