//! Territory store: cell ownership, contiguity, and capacity
//!
//! At most one group owns a cell at any time. Expansion is contiguous: a
//! non-founding claim must touch the group's existing territory on an edge.
//! Conquest through [`TerritoryStore::transfer_ownership`] is the one path
//! that bypasses adjacency, so holdings may become non-contiguous; so may
//! `unclaim`, which never cascades removal of disconnected fragments.

use crate::cell::CellCoordinate;
use crate::claim::{ClaimRecord, PlotType};
use crate::error::{Error, Result};
use crate::identity::GroupId;
use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};

/// Largest radius accepted by [`TerritoryStore::claim_radius`]
///
/// Radius 10 bounds a bulk claim at 441 candidate cells, small enough to
/// finish within one host tick.
pub const MAX_CLAIM_RADIUS: u32 = 10;

/// Map of cell ownership for every group
#[derive(Debug, Clone, Default)]
pub struct TerritoryStore {
    claims: IndexMap<CellCoordinate, ClaimRecord>,
    by_group: IndexMap<GroupId, IndexSet<CellCoordinate>>,
}

impl TerritoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// The group owning a cell, if any
    pub fn owner_of(&self, cell: &CellCoordinate) -> Option<GroupId> {
        self.claims.get(cell).map(|c| c.owner)
    }

    /// The full claim record for a cell
    pub fn claim_record(&self, cell: &CellCoordinate) -> Option<&ClaimRecord> {
        self.claims.get(cell)
    }

    /// Number of cells a group owns
    pub fn claimed_count(&self, group: GroupId) -> usize {
        self.by_group.get(&group).map(IndexSet::len).unwrap_or(0)
    }

    /// Iterate the cells a group owns, in claim order
    pub fn cells_of(&self, group: GroupId) -> impl Iterator<Item = &CellCoordinate> {
        self.by_group.get(&group).into_iter().flatten()
    }

    /// Iterate every claim record
    pub fn iter(&self) -> impl Iterator<Item = &ClaimRecord> {
        self.claims.values()
    }

    /// Total number of claimed cells across all groups
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Whether no cell is claimed
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Whether a cell touches the group's territory on an edge
    pub fn has_adjacent(&self, group: GroupId, cell: &CellCoordinate) -> bool {
        cell.neighbors()
            .iter()
            .any(|n| self.owner_of(n) == Some(group))
    }

    /// Claim one cell for a group
    ///
    /// A group's first claim is its founding claim and skips the adjacency
    /// rule. `capacity` is the group's current cell limit.
    pub fn claim(
        &mut self,
        group: GroupId,
        capacity: usize,
        cell: CellCoordinate,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.claims.contains_key(&cell) {
            return Err(Error::AlreadyClaimed(cell));
        }
        let used = self.claimed_count(group);
        if used + 1 > capacity {
            return Err(Error::CapacityExceeded { used, capacity });
        }
        if used > 0 && !self.has_adjacent(group, &cell) {
            return Err(Error::NotAdjacent(cell));
        }
        self.insert_record(ClaimRecord::new(cell, group, now));
        Ok(())
    }

    /// Claim outward from a center cell up to a Chebyshev radius
    ///
    /// Candidates are attempted in a fixed order, ascending distance ring
    /// then row-major within each ring, so a run cut short by capacity or
    /// adjacency is reproducible. Cells owned by anyone are skipped;
    /// candidates not adjacent to territory claimed so far (including
    /// earlier in this call) are skipped; capacity exhaustion stops the
    /// walk. Partial success is the contract: cells already claimed are
    /// never rolled back.
    pub fn claim_radius(
        &mut self,
        group: GroupId,
        capacity: usize,
        center: &CellCoordinate,
        radius: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<CellCoordinate>> {
        if radius == 0 || radius > MAX_CLAIM_RADIUS {
            return Err(Error::Validation(format!(
                "claim radius must be between 1 and {}, got {}",
                MAX_CLAIM_RADIUS, radius
            )));
        }
        let mut claimed = Vec::new();
        'rings: for d in 0..=u64::from(radius) {
            for cell in center.ring(d) {
                if self.claims.contains_key(&cell) {
                    continue;
                }
                match self.claim(group, capacity, cell.clone(), now) {
                    Ok(()) => claimed.push(cell),
                    Err(Error::CapacityExceeded { .. }) => break 'rings,
                    Err(Error::NotAdjacent(_)) => continue,
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(claimed)
    }

    /// Release a cell owned by the group
    ///
    /// Never cascades: fragments disconnected by this release stay claimed.
    pub fn unclaim(&mut self, group: GroupId, cell: &CellCoordinate) -> Result<ClaimRecord> {
        match self.owner_of(cell) {
            None => Err(Error::NotFound(format!("cell {} is not claimed", cell))),
            Some(owner) if owner != group => Err(Error::State(format!(
                "cell {} is owned by another group",
                cell
            ))),
            Some(_) => {
                if let Some(set) = self.by_group.get_mut(&group) {
                    set.shift_remove(cell);
                }
                // owner checked above, the record is present
                Ok(self.claims.shift_remove(cell).unwrap())
            }
        }
    }

    /// Move a cell between groups on siege capture
    ///
    /// The conquest path: adjacency is not checked, so capture may create
    /// non-contiguous holdings for the new owner.
    pub fn transfer_ownership(
        &mut self,
        cell: &CellCoordinate,
        from: GroupId,
        to: GroupId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        match self.owner_of(cell) {
            None => return Err(Error::NotFound(format!("cell {} is not claimed", cell))),
            Some(owner) if owner != from => {
                return Err(Error::State(format!(
                    "cell {} is not owned by {}",
                    cell, from
                )))
            }
            Some(_) => {}
        }
        if let Some(set) = self.by_group.get_mut(&from) {
            set.shift_remove(cell);
        }
        let record = self.claims.get_mut(cell).unwrap();
        record.owner = to;
        record.claimed_at = now;
        self.by_group.entry(to).or_default().insert(cell.clone());
        Ok(())
    }

    /// Release every cell a group owns, returning the released set
    ///
    /// The caller cascades deletion of the group's permission scopes.
    pub fn dissolve(&mut self, group: GroupId) -> Vec<CellCoordinate> {
        let cells: Vec<CellCoordinate> = self
            .by_group
            .shift_remove(&group)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();
        for cell in &cells {
            self.claims.shift_remove(cell);
        }
        cells
    }

    /// Tag what a claimed cell is used for
    pub fn set_plot_type(
        &mut self,
        group: GroupId,
        cell: &CellCoordinate,
        plot_type: PlotType,
    ) -> Result<()> {
        let record = self.owned_record_mut(group, cell)?;
        record.set_plot_type(plot_type);
        Ok(())
    }

    /// Set a per-cell flag on a claimed cell
    pub fn set_claim_flag(
        &mut self,
        group: GroupId,
        cell: &CellCoordinate,
        flag: impl Into<String>,
        value: bool,
    ) -> Result<()> {
        let record = self.owned_record_mut(group, cell)?;
        record.set_flag(flag, value);
        Ok(())
    }

    /// Re-insert a loaded record, used when booting from storage
    pub fn insert_record(&mut self, record: ClaimRecord) {
        self.by_group
            .entry(record.owner)
            .or_default()
            .insert(record.cell.clone());
        self.claims.insert(record.cell.clone(), record);
    }

    fn owned_record_mut(
        &mut self,
        group: GroupId,
        cell: &CellCoordinate,
    ) -> Result<&mut ClaimRecord> {
        match self.owner_of(cell) {
            None => Err(Error::NotFound(format!("cell {} is not claimed", cell))),
            Some(owner) if owner != group => Err(Error::State(format!(
                "cell {} is owned by another group",
                cell
            ))),
            Some(_) => Ok(self.claims.get_mut(cell).unwrap()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(x: i64, y: i64) -> CellCoordinate {
        CellCoordinate::new("w", x, y)
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    const A: GroupId = GroupId(1);
    const B: GroupId = GroupId(2);

    #[test]
    fn test_founding_claim_needs_no_adjacency() {
        let mut t = TerritoryStore::new();
        t.claim(A, 15, cell(100, -40), now()).unwrap();
        assert_eq!(t.owner_of(&cell(100, -40)), Some(A));
        assert_eq!(t.claimed_count(A), 1);
    }

    #[test]
    fn test_expansion_requires_adjacency() {
        let mut t = TerritoryStore::new();
        t.claim(A, 15, cell(0, 0), now()).unwrap();
        t.claim(A, 15, cell(1, 0), now()).unwrap();
        let err = t.claim(A, 15, cell(5, 5), now()).unwrap_err();
        assert!(matches!(err, Error::NotAdjacent(_)));
        // the failed claim left nothing behind
        assert_eq!(t.claimed_count(A), 2);
        assert_eq!(t.owner_of(&cell(5, 5)), None);
    }

    #[test]
    fn test_diagonal_is_not_adjacent() {
        let mut t = TerritoryStore::new();
        t.claim(A, 15, cell(0, 0), now()).unwrap();
        assert!(matches!(
            t.claim(A, 15, cell(1, 1), now()),
            Err(Error::NotAdjacent(_))
        ));
    }

    #[test]
    fn test_already_claimed_beats_everything() {
        let mut t = TerritoryStore::new();
        t.claim(A, 15, cell(0, 0), now()).unwrap();
        assert!(matches!(
            t.claim(B, 15, cell(0, 0), now()),
            Err(Error::AlreadyClaimed(_))
        ));
    }

    #[test]
    fn test_capacity_enforced_at_the_boundary() {
        let mut t = TerritoryStore::new();
        // level-1 capacity of 15: a straight line of 15 cells fits
        for x in 0..15 {
            t.claim(A, 15, cell(x, 0), now()).unwrap();
        }
        let err = t.claim(A, 15, cell(15, 0), now()).unwrap_err();
        assert!(matches!(
            err,
            Error::CapacityExceeded {
                used: 15,
                capacity: 15
            }
        ));
        assert_eq!(t.claimed_count(A), 15);
    }

    #[test]
    fn test_claim_radius_validates_bounds() {
        let mut t = TerritoryStore::new();
        assert!(matches!(
            t.claim_radius(A, 100, &cell(0, 0), 0, now()),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            t.claim_radius(A, 100, &cell(0, 0), 11, now()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_claim_radius_deterministic_order() {
        let mut t = TerritoryStore::new();
        let claimed = t.claim_radius(A, 100, &cell(0, 0), 1, now()).unwrap();
        // center first, then the ring row-major; (-1,-1) is attempted
        // before any of its neighbors exist and is skipped for good
        assert_eq!(
            claimed,
            vec![
                cell(0, 0),
                cell(0, -1),
                cell(1, -1),
                cell(-1, 0),
                cell(1, 0),
                cell(-1, 1),
                cell(0, 1),
                cell(1, 1),
            ]
        );
        assert_eq!(t.owner_of(&cell(-1, -1)), None);
        assert_eq!(t.claimed_count(A), 8);
    }

    #[test]
    fn test_claim_radius_stops_at_capacity() {
        let mut t = TerritoryStore::new();
        let claimed = t.claim_radius(A, 5, &cell(0, 0), 2, now()).unwrap();
        assert_eq!(claimed.len(), 5);
        assert_eq!(t.claimed_count(A), 5);
        // deterministic prefix of the full ordering
        assert_eq!(claimed[0], cell(0, 0));
        assert_eq!(claimed[1], cell(0, -1));
        assert_eq!(claimed[4], cell(1, 0));
    }

    #[test]
    fn test_claim_radius_skips_foreign_cells() {
        let mut t = TerritoryStore::new();
        t.claim(B, 15, cell(1, 0), now()).unwrap();
        let claimed = t.claim_radius(A, 100, &cell(0, 0), 1, now()).unwrap();
        assert!(!claimed.contains(&cell(1, 0)));
        assert_eq!(t.owner_of(&cell(1, 0)), Some(B));
        // foreign cell does not count towards adjacency but (1,1) still
        // chains through (0,1)
        assert!(claimed.contains(&cell(1, 1)));
    }

    #[test]
    fn test_claim_radius_chains_adjacency_within_call() {
        let mut t = TerritoryStore::new();
        // founding claim far from prior territory; every ring-2 cell on the
        // wavefront chains through cells claimed earlier in this same call
        let claimed = t.claim_radius(A, 100, &cell(50, 50), 2, now()).unwrap();
        assert_eq!(claimed.len(), 21);
        assert!(claimed.contains(&cell(52, 52)));
        // the four upper-left corner cells precede the wavefront
        for missing in [cell(49, 49), cell(48, 48), cell(49, 48), cell(48, 49)] {
            assert_eq!(t.owner_of(&missing), None);
        }
    }

    #[test]
    fn test_unclaim_tolerates_fragmentation() {
        let mut t = TerritoryStore::new();
        for x in 0..3 {
            t.claim(A, 15, cell(x, 0), now()).unwrap();
        }
        // removing the middle cell disconnects the ends; both stay claimed
        t.unclaim(A, &cell(1, 0)).unwrap();
        assert_eq!(t.owner_of(&cell(0, 0)), Some(A));
        assert_eq!(t.owner_of(&cell(2, 0)), Some(A));
        assert_eq!(t.claimed_count(A), 2);
    }

    #[test]
    fn test_unclaim_rejects_wrong_owner() {
        let mut t = TerritoryStore::new();
        t.claim(A, 15, cell(0, 0), now()).unwrap();
        assert!(matches!(t.unclaim(B, &cell(0, 0)), Err(Error::State(_))));
        assert!(matches!(
            t.unclaim(A, &cell(9, 9)),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_transfer_bypasses_adjacency() {
        let mut t = TerritoryStore::new();
        t.claim(A, 15, cell(0, 0), now()).unwrap();
        t.claim(B, 15, cell(10, 10), now()).unwrap();
        t.transfer_ownership(&cell(10, 10), B, A, now()).unwrap();
        assert_eq!(t.owner_of(&cell(10, 10)), Some(A));
        assert_eq!(t.claimed_count(B), 0);
        assert_eq!(t.claimed_count(A), 2);
    }

    #[test]
    fn test_transfer_keeps_plot_data() {
        let mut t = TerritoryStore::new();
        t.claim(B, 15, cell(0, 0), now()).unwrap();
        t.set_plot_type(B, &cell(0, 0), PlotType::Fortress).unwrap();
        t.transfer_ownership(&cell(0, 0), B, A, now()).unwrap();
        let record = t.claim_record(&cell(0, 0)).unwrap();
        assert_eq!(record.plot_type, PlotType::Fortress);
        assert_eq!(record.flag("no_entry"), Some(true));
    }

    #[test]
    fn test_transfer_checks_current_owner() {
        let mut t = TerritoryStore::new();
        t.claim(A, 15, cell(0, 0), now()).unwrap();
        assert!(matches!(
            t.transfer_ownership(&cell(0, 0), B, A, now()),
            Err(Error::State(_))
        ));
        assert!(matches!(
            t.transfer_ownership(&cell(5, 5), B, A, now()),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_dissolve_releases_everything() {
        let mut t = TerritoryStore::new();
        for x in 0..4 {
            t.claim(A, 15, cell(x, 0), now()).unwrap();
        }
        t.claim(B, 15, cell(0, 5), now()).unwrap();
        let released = t.dissolve(A);
        assert_eq!(released.len(), 4);
        assert_eq!(t.claimed_count(A), 0);
        assert_eq!(t.owner_of(&cell(0, 0)), None);
        assert_eq!(t.claimed_count(B), 1);
    }

    #[test]
    fn test_plot_ops_require_ownership() {
        let mut t = TerritoryStore::new();
        t.claim(A, 15, cell(0, 0), now()).unwrap();
        t.set_claim_flag(A, &cell(0, 0), "pvp", true).unwrap();
        assert_eq!(t.claim_record(&cell(0, 0)).unwrap().flag("pvp"), Some(true));
        assert!(t.set_plot_type(B, &cell(0, 0), PlotType::Farm).is_err());
        assert!(t.set_claim_flag(A, &cell(1, 1), "pvp", true).is_err());
    }
}
