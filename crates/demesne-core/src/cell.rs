//! Grid cell coordinates
//!
//! A cell is one grid tile of land, the atomic unit of ownership. Cells are
//! addressed by exact integer coordinate on a named map; there are no range
//! queries beyond local neighborhoods.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate of one grid tile on a named map
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCoordinate {
    /// The map (world) this cell belongs to
    pub map_id: String,
    /// Column
    pub x: i64,
    /// Row
    pub y: i64,
}

impl CellCoordinate {
    /// Create a new cell coordinate
    pub fn new(map_id: impl Into<String>, x: i64, y: i64) -> Self {
        Self {
            map_id: map_id.into(),
            x,
            y,
        }
    }

    /// Storage key in `mapId:x:y` form
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.map_id, self.x, self.y)
    }

    /// Parse a `mapId:x:y` storage key back into a coordinate
    pub fn from_key(key: &str) -> Option<Self> {
        let (rest, y) = key.rsplit_once(':')?;
        let (map_id, x) = rest.rsplit_once(':')?;
        Some(Self {
            map_id: map_id.to_string(),
            x: x.parse().ok()?,
            y: y.parse().ok()?,
        })
    }

    /// The four edge-adjacent neighbors of this cell
    pub fn neighbors(&self) -> [CellCoordinate; 4] {
        [
            Self::new(self.map_id.clone(), self.x + 1, self.y),
            Self::new(self.map_id.clone(), self.x - 1, self.y),
            Self::new(self.map_id.clone(), self.x, self.y + 1),
            Self::new(self.map_id.clone(), self.x, self.y - 1),
        ]
    }

    /// Whether `other` is a 4-neighbor of this cell (same map)
    pub fn is_adjacent(&self, other: &CellCoordinate) -> bool {
        self.map_id == other.map_id
            && (self.x - other.x).abs() + (self.y - other.y).abs() == 1
    }

    /// Chebyshev distance to another cell, or `None` across maps
    pub fn chebyshev(&self, other: &CellCoordinate) -> Option<u64> {
        if self.map_id != other.map_id {
            return None;
        }
        Some((self.x - other.x).unsigned_abs().max((self.y - other.y).unsigned_abs()))
    }

    /// Cells at exactly Chebyshev distance `d` from this cell, in row-major
    /// order (ascending y, then ascending x)
    ///
    /// Distance 0 yields the cell itself. This ordering is the contract for
    /// deterministic bulk claims.
    pub fn ring(&self, d: u64) -> Vec<CellCoordinate> {
        let d = d as i64;
        if d == 0 {
            return vec![self.clone()];
        }
        let mut cells = Vec::new();
        for y in (self.y - d)..=(self.y + d) {
            for x in (self.x - d)..=(self.x + d) {
                if (x - self.x).abs().max((y - self.y).abs()) == d {
                    cells.push(Self::new(self.map_id.clone(), x, y));
                }
            }
        }
        cells
    }
}

impl fmt::Display for CellCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.map_id, self.x, self.y)
    }
}
