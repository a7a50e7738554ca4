//! Claim records and plot types

use crate::cell::CellCoordinate;
use crate::identity::GroupId;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag describing what a claimed cell is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PlotType {
    /// Ordinary territory
    #[default]
    Normal,
    /// Farmland, typically opened to harvesting
    Farm,
    /// Trade plot, typically opened to interaction
    Market,
    /// Defensive plot
    Fortress,
    /// The group's seat
    Capital,
}

impl PlotType {
    /// Stable name used in storage rows and exports
    pub fn as_str(&self) -> &'static str {
        match self {
            PlotType::Normal => "normal",
            PlotType::Farm => "farm",
            PlotType::Market => "market",
            PlotType::Fortress => "fortress",
            PlotType::Capital => "capital",
        }
    }

    /// Parse a stable name back into a plot type
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(PlotType::Normal),
            "farm" => Some(PlotType::Farm),
            "market" => Some(PlotType::Market),
            "fortress" => Some(PlotType::Fortress),
            "capital" => Some(PlotType::Capital),
            _ => None,
        }
    }

    /// Flags a plot of this type starts with
    pub fn default_flags(&self) -> &'static [(&'static str, bool)] {
        match self {
            PlotType::Normal | PlotType::Capital => &[],
            PlotType::Farm => &[("open_harvest", true)],
            PlotType::Market => &[("public_interact", true)],
            PlotType::Fortress => &[("no_entry", true)],
        }
    }
}

impl fmt::Display for PlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ownership record for one claimed cell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRecord {
    /// The claimed cell
    pub cell: CellCoordinate,
    /// The owning group
    pub owner: GroupId,
    /// What the plot is used for
    pub plot_type: PlotType,
    /// Per-cell flags
    pub flags: IndexMap<String, bool>,
    /// When the cell was claimed or captured
    pub claimed_at: DateTime<Utc>,
}

impl ClaimRecord {
    /// Create a record for a fresh claim
    pub fn new(cell: CellCoordinate, owner: GroupId, now: DateTime<Utc>) -> Self {
        Self {
            cell,
            owner,
            plot_type: PlotType::Normal,
            flags: IndexMap::new(),
            claimed_at: now,
        }
    }

    /// Read a flag
    pub fn flag(&self, name: &str) -> Option<bool> {
        self.flags.get(name).copied()
    }

    /// Set a flag
    pub fn set_flag(&mut self, name: impl Into<String>, value: bool) {
        self.flags.insert(name.into(), value);
    }

    /// Change the plot type, seeding its default flags where unset
    pub fn set_plot_type(&mut self, plot_type: PlotType) {
        self.plot_type = plot_type;
        for (name, value) in plot_type.default_flags() {
            self.flags.entry((*name).to_string()).or_insert(*value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plot_type_names() {
        for p in [
            PlotType::Normal,
            PlotType::Farm,
            PlotType::Market,
            PlotType::Fortress,
            PlotType::Capital,
        ] {
            assert_eq!(PlotType::parse(p.as_str()), Some(p));
        }
        assert_eq!(PlotType::parse("swamp"), None);
    }

    #[test]
    fn test_plot_type_seeds_flags_without_clobbering() {
        let cell = CellCoordinate::new("w", 0, 0);
        let mut record = ClaimRecord::new(cell, GroupId::new(1), Utc::now());
        assert!(record.flags.is_empty());

        record.set_plot_type(PlotType::Farm);
        assert_eq!(record.flag("open_harvest"), Some(true));

        record.set_flag("open_harvest", false);
        record.set_plot_type(PlotType::Farm);
        // an explicit flag survives re-tagging
        assert_eq!(record.flag("open_harvest"), Some(false));
    }
}
