//! Conflict coordinator: wars, sieges, raids, and ceasefires
//!
//! Time-bounded state machines that bookkeep conflicts; none of them
//! mutates territory. A completed siege is a signal to the caller, which
//! performs the actual capture through
//! [`crate::territory::TerritoryStore::transfer_ownership`]. Expiry is
//! evaluated lazily on the read path and corrected by a periodic
//! [`ConflictCoordinator::sweep`].

use crate::cell::CellCoordinate;
use crate::error::{Error, Result};
use crate::identity::{ConflictId, GroupId};
use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// War score awarded to the attacker when a siege completes
pub const SIEGE_CAPTURE_SCORE: u32 = 10;
/// War score awarded to the defender when a siege expires unfinished
pub const SIEGE_DEFENSE_SCORE: u32 = 5;

/// An open conflict between two groups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct War {
    /// Unique identifier
    pub id: ConflictId,
    /// The declaring group
    pub attacker: GroupId,
    /// The group declared against
    pub defender: GroupId,
    /// When the war started
    pub started_at: DateTime<Utc>,
    /// When the war ends unless ended earlier
    pub ends_at: DateTime<Utc>,
    /// Cleared on explicit end or sweep
    pub active: bool,
    /// Score accumulated by the attacker
    pub attacker_score: u32,
    /// Score accumulated by the defender
    pub defender_score: u32,
}

impl War {
    /// Whether the war is still running at `now`
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.active && now < self.ends_at
    }

    /// Whether a group is a party to this war
    pub fn involves(&self, group: GroupId) -> bool {
        self.attacker == group || self.defender == group
    }

    /// Whether this war is between the two groups, either orientation
    pub fn is_between(&self, a: GroupId, b: GroupId) -> bool {
        (self.attacker == a && self.defender == b) || (self.attacker == b && self.defender == a)
    }

    /// The group with the strictly higher score, or `None` on a tie
    pub fn winner(&self) -> Option<GroupId> {
        match self.attacker_score.cmp(&self.defender_score) {
            std::cmp::Ordering::Greater => Some(self.attacker),
            std::cmp::Ordering::Less => Some(self.defender),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// A timed contest over one cell whose completion enables capture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Siege {
    /// Unique identifier
    pub id: ConflictId,
    /// The war this siege belongs to
    pub war: ConflictId,
    /// The besieging group
    pub attacker: GroupId,
    /// The group holding the target cell
    pub defender: GroupId,
    /// The contested cell
    pub cell: CellCoordinate,
    /// When the siege began
    pub started_at: DateTime<Utc>,
    /// When the siege times out
    pub ends_at: DateTime<Utc>,
    /// Progress towards completion, 0–100
    pub progress: u8,
    /// Set once the outcome has been attributed
    pub resolved: bool,
}

impl Siege {
    /// Whether progress has reached 100, independent of the timer
    pub fn is_complete(&self) -> bool {
        self.progress >= 100
    }

    /// Whether the timer has run out, independent of progress
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.ends_at
    }
}

/// A timed contest draining a target's resources, never transferring land
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Raid {
    /// Unique identifier
    pub id: ConflictId,
    /// The raiding group
    pub raider: GroupId,
    /// The raided group
    pub target: GroupId,
    /// The raided cell
    pub cell: CellCoordinate,
    /// When the raid began
    pub started_at: DateTime<Utc>,
    /// When the raid times out
    pub ends_at: DateTime<Utc>,
    /// Percentage of the target's stored resources drained, 0–100
    pub resources_stolen: u8,
    /// Set once the outcome has been attributed
    pub resolved: bool,
}

impl Raid {
    /// Whether the drain has reached 100 percent
    pub fn is_complete(&self) -> bool {
        self.resources_stolen >= 100
    }

    /// Whether the timer has run out
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.ends_at
    }
}

/// Lifecycle state of a ceasefire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CeasefireStatus {
    /// Proposed by one side, awaiting the other
    Proposed,
    /// Accepted and in force
    Active,
    /// Explicitly declined
    Rejected,
    /// Ran out before acceptance, or its active window closed
    Expired,
}

/// A mutually-agreed suspension of new combat between two groups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ceasefire {
    /// Unique identifier
    pub id: ConflictId,
    /// The war this ceasefire suspends
    pub war: ConflictId,
    /// The proposing group
    pub proposer: GroupId,
    /// The group asked to accept
    pub respondent: GroupId,
    /// When it was proposed
    pub proposed_at: DateTime<Utc>,
    /// When it was accepted, if it was
    pub accepted_at: Option<DateTime<Utc>>,
    /// Length of the window in seconds, from acceptance once active
    pub duration_secs: i64,
    /// Current lifecycle state
    pub status: CeasefireStatus,
}

impl Ceasefire {
    /// Whether the ceasefire is in force at `now`
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == CeasefireStatus::Active
            && self
                .accepted_at
                .map(|at| now < at + Duration::seconds(self.duration_secs))
                .unwrap_or(false)
    }

    /// Whether the two groups are the parties to this ceasefire
    pub fn is_between(&self, a: GroupId, b: GroupId) -> bool {
        (self.proposer == a && self.respondent == b)
            || (self.proposer == b && self.respondent == a)
    }
}

/// Attributed outcome of a resolved siege
#[derive(Debug, Clone)]
pub struct SiegeOutcome {
    /// The resolved siege
    pub siege: ConflictId,
    /// The war the score was attributed to
    pub war: ConflictId,
    /// True when progress reached 100: the caller may capture the cell
    pub captured: bool,
    /// The besieging group
    pub attacker: GroupId,
    /// The defending group
    pub defender: GroupId,
    /// The contested cell
    pub cell: CellCoordinate,
}

/// Attributed outcome of a resolved raid
#[derive(Debug, Clone)]
pub struct RaidOutcome {
    /// The resolved raid
    pub raid: ConflictId,
    /// The raiding group
    pub raider: GroupId,
    /// The raided group
    pub target: GroupId,
    /// Final drain percentage
    pub resources_stolen: u8,
}

/// Counts of records the periodic sweep closed out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConflictSweep {
    /// Wars ended by timer
    pub wars_ended: usize,
    /// Expired sieges resolved
    pub sieges_resolved: usize,
    /// Expired raids resolved
    pub raids_resolved: usize,
    /// Ceasefires or proposals expired
    pub ceasefires_expired: usize,
}

/// Owner of all war, siege, raid, and ceasefire records
#[derive(Debug, Clone, Default)]
pub struct ConflictCoordinator {
    wars: IndexMap<ConflictId, War>,
    sieges: IndexMap<ConflictId, Siege>,
    raids: IndexMap<ConflictId, Raid>,
    ceasefires: IndexMap<ConflictId, Ceasefire>,
    next_id: u64,
}

impl ConflictCoordinator {
    /// Create an empty coordinator
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc_id(&mut self) -> ConflictId {
        let id = ConflictId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Declare a war between two groups, created directly active
    pub fn declare_war(
        &mut self,
        attacker: GroupId,
        defender: GroupId,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> Result<ConflictId> {
        if attacker == defender {
            return Err(Error::Validation(
                "a group cannot declare war on itself".to_string(),
            ));
        }
        if duration <= Duration::zero() {
            return Err(Error::Validation("war duration must be positive".to_string()));
        }
        if self
            .wars
            .values()
            .any(|w| w.is_between(attacker, defender) && w.is_active(now))
        {
            return Err(Error::State(format!(
                "{} and {} are already at war",
                attacker, defender
            )));
        }
        let id = self.alloc_id();
        self.wars.insert(
            id,
            War {
                id,
                attacker,
                defender,
                started_at: now,
                ends_at: now + duration,
                active: true,
                attacker_score: 0,
                defender_score: 0,
            },
        );
        Ok(id)
    }

    /// Explicitly end a war
    pub fn end_war(&mut self, id: ConflictId, now: DateTime<Utc>) -> Result<()> {
        let war = self
            .wars
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("no war {}", id)))?;
        if !war.active {
            return Err(Error::State(format!("war {} has already ended", id)));
        }
        war.active = false;
        war.ends_at = war.ends_at.min(now);
        Ok(())
    }

    /// Look up a war
    pub fn war(&self, id: ConflictId) -> Option<&War> {
        self.wars.get(&id)
    }

    /// The active war between two groups, if any
    pub fn war_between(&self, a: GroupId, b: GroupId, now: DateTime<Utc>) -> Option<&War> {
        self.wars
            .values()
            .find(|w| w.is_between(a, b) && w.is_active(now))
    }

    /// Add attributed score for one party of a war
    pub fn record_score(&mut self, id: ConflictId, group: GroupId, points: u32) -> Result<()> {
        let war = self
            .wars
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("no war {}", id)))?;
        if war.attacker == group {
            war.attacker_score += points;
        } else if war.defender == group {
            war.defender_score += points;
        } else {
            return Err(Error::Validation(format!(
                "{} is not a party to war {}",
                group, id
            )));
        }
        Ok(())
    }

    /// The winner of a war: strictly higher score, or `None` on a tie
    pub fn winner(&self, id: ConflictId) -> Result<Option<GroupId>> {
        self.wars
            .get(&id)
            .map(War::winner)
            .ok_or_else(|| Error::NotFound(format!("no war {}", id)))
    }

    /// The ceasefire currently in force between two groups, if any
    pub fn ceasefire_between(
        &self,
        a: GroupId,
        b: GroupId,
        now: DateTime<Utc>,
    ) -> Option<&Ceasefire> {
        self.ceasefires
            .values()
            .find(|c| c.is_between(a, b) && c.is_active(now))
    }

    /// Open a siege against one cell under an active war
    ///
    /// The one place combat creation consults conflict state: refused while
    /// a ceasefire between the parties is in force.
    pub fn begin_siege(
        &mut self,
        war_id: ConflictId,
        attacker: GroupId,
        cell: CellCoordinate,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> Result<ConflictId> {
        let war = self
            .wars
            .get(&war_id)
            .ok_or_else(|| Error::NotFound(format!("no war {}", war_id)))?;
        if !war.is_active(now) {
            return Err(Error::State(format!("war {} is not active", war_id)));
        }
        if !war.involves(attacker) {
            return Err(Error::Validation(format!(
                "{} is not a party to war {}",
                attacker, war_id
            )));
        }
        let defender = if war.attacker == attacker {
            war.defender
        } else {
            war.attacker
        };
        if self.ceasefire_between(attacker, defender, now).is_some() {
            return Err(Error::State(format!(
                "a ceasefire between {} and {} is in force",
                attacker, defender
            )));
        }
        if duration <= Duration::zero() {
            return Err(Error::Validation("siege duration must be positive".to_string()));
        }
        let id = self.alloc_id();
        self.sieges.insert(
            id,
            Siege {
                id,
                war: war_id,
                attacker,
                defender,
                cell,
                started_at: now,
                ends_at: now + duration,
                progress: 0,
                resolved: false,
            },
        );
        Ok(id)
    }

    /// Look up a siege
    pub fn siege(&self, id: ConflictId) -> Option<&Siege> {
        self.sieges.get(&id)
    }

    /// Advance siege progress, clamped into [0, 100]
    pub fn add_siege_progress(
        &mut self,
        id: ConflictId,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<u8> {
        let siege = self
            .sieges
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("no siege {}", id)))?;
        if siege.resolved {
            return Err(Error::State(format!("siege {} is already resolved", id)));
        }
        if siege.is_expired(now) {
            return Err(Error::State(format!("siege {} has expired", id)));
        }
        siege.progress = (i64::from(siege.progress) + amount).clamp(0, 100) as u8;
        Ok(siege.progress)
    }

    /// Attribute the outcome of a completed or expired siege to its war
    ///
    /// A completed siege awards the attacker and reports `captured`; the
    /// caller then captures the cell through the territory store. An
    /// expired, unfinished siege awards the defender.
    pub fn resolve_siege(&mut self, id: ConflictId, now: DateTime<Utc>) -> Result<SiegeOutcome> {
        let siege = self
            .sieges
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("no siege {}", id)))?;
        if siege.resolved {
            return Err(Error::State(format!("siege {} is already resolved", id)));
        }
        if !siege.is_complete() && !siege.is_expired(now) {
            return Err(Error::State(format!("siege {} is still in progress", id)));
        }
        siege.resolved = true;
        let outcome = SiegeOutcome {
            siege: id,
            war: siege.war,
            captured: siege.is_complete(),
            attacker: siege.attacker,
            defender: siege.defender,
            cell: siege.cell.clone(),
        };
        if let Some(war) = self.wars.get_mut(&outcome.war) {
            if outcome.captured {
                if war.attacker == outcome.attacker {
                    war.attacker_score += SIEGE_CAPTURE_SCORE;
                } else {
                    war.defender_score += SIEGE_CAPTURE_SCORE;
                }
            } else if war.attacker == outcome.defender {
                war.attacker_score += SIEGE_DEFENSE_SCORE;
            } else {
                war.defender_score += SIEGE_DEFENSE_SCORE;
            }
        }
        Ok(outcome)
    }

    /// Open a raid against one cell
    ///
    /// Raids need no war but respect an active ceasefire between the
    /// parties. They drain resources only and never transfer ownership.
    pub fn begin_raid(
        &mut self,
        raider: GroupId,
        target: GroupId,
        cell: CellCoordinate,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> Result<ConflictId> {
        if raider == target {
            return Err(Error::Validation("a group cannot raid itself".to_string()));
        }
        if self.ceasefire_between(raider, target, now).is_some() {
            return Err(Error::State(format!(
                "a ceasefire between {} and {} is in force",
                raider, target
            )));
        }
        if duration <= Duration::zero() {
            return Err(Error::Validation("raid duration must be positive".to_string()));
        }
        let id = self.alloc_id();
        self.raids.insert(
            id,
            Raid {
                id,
                raider,
                target,
                cell,
                started_at: now,
                ends_at: now + duration,
                resources_stolen: 0,
                resolved: false,
            },
        );
        Ok(id)
    }

    /// Look up a raid
    pub fn raid(&self, id: ConflictId) -> Option<&Raid> {
        self.raids.get(&id)
    }

    /// Advance the drain percentage, clamped into [0, 100]
    pub fn add_raid_drain(
        &mut self,
        id: ConflictId,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<u8> {
        let raid = self
            .raids
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("no raid {}", id)))?;
        if raid.resolved {
            return Err(Error::State(format!("raid {} is already resolved", id)));
        }
        if raid.is_expired(now) {
            return Err(Error::State(format!("raid {} has expired", id)));
        }
        raid.resources_stolen = (i64::from(raid.resources_stolen) + amount).clamp(0, 100) as u8;
        Ok(raid.resources_stolen)
    }

    /// Attribute the outcome of a finished raid
    ///
    /// When an active war exists between the parties, the raider earns one
    /// war score point per ten percent drained.
    pub fn resolve_raid(&mut self, id: ConflictId, now: DateTime<Utc>) -> Result<RaidOutcome> {
        let raid = self
            .raids
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("no raid {}", id)))?;
        if raid.resolved {
            return Err(Error::State(format!("raid {} is already resolved", id)));
        }
        if !raid.is_complete() && !raid.is_expired(now) {
            return Err(Error::State(format!("raid {} is still in progress", id)));
        }
        raid.resolved = true;
        let outcome = RaidOutcome {
            raid: id,
            raider: raid.raider,
            target: raid.target,
            resources_stolen: raid.resources_stolen,
        };
        let points = u32::from(outcome.resources_stolen) / 10;
        if points > 0 {
            if let Some(war) = self
                .wars
                .values_mut()
                .find(|w| w.is_between(outcome.raider, outcome.target) && w.is_active(now))
            {
                if war.attacker == outcome.raider {
                    war.attacker_score += points;
                } else {
                    war.defender_score += points;
                }
            }
        }
        Ok(outcome)
    }

    /// Propose a ceasefire for a war
    pub fn propose_ceasefire(
        &mut self,
        war_id: ConflictId,
        proposer: GroupId,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> Result<ConflictId> {
        let war = self
            .wars
            .get(&war_id)
            .ok_or_else(|| Error::NotFound(format!("no war {}", war_id)))?;
        if !war.is_active(now) {
            return Err(Error::State(format!("war {} is not active", war_id)));
        }
        if !war.involves(proposer) {
            return Err(Error::Validation(format!(
                "{} is not a party to war {}",
                proposer, war_id
            )));
        }
        if duration <= Duration::zero() {
            return Err(Error::Validation(
                "ceasefire duration must be positive".to_string(),
            ));
        }
        let respondent = if war.attacker == proposer {
            war.defender
        } else {
            war.attacker
        };
        let open = self.ceasefires.values().any(|c| {
            c.war == war_id
                && match c.status {
                    CeasefireStatus::Proposed => {
                        now < c.proposed_at + Duration::seconds(c.duration_secs)
                    }
                    CeasefireStatus::Active => c.is_active(now),
                    _ => false,
                }
        });
        if open {
            return Err(Error::State(format!(
                "war {} already has an open ceasefire",
                war_id
            )));
        }
        let id = self.alloc_id();
        self.ceasefires.insert(
            id,
            Ceasefire {
                id,
                war: war_id,
                proposer,
                respondent,
                proposed_at: now,
                accepted_at: None,
                duration_secs: duration.num_seconds(),
                status: CeasefireStatus::Proposed,
            },
        );
        Ok(id)
    }

    /// Accept or reject a proposed ceasefire
    ///
    /// The active window runs from acceptance, not from the proposal.
    pub fn respond_ceasefire(
        &mut self,
        id: ConflictId,
        accept: bool,
        now: DateTime<Utc>,
    ) -> Result<CeasefireStatus> {
        let ceasefire = self
            .ceasefires
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("no ceasefire {}", id)))?;
        if ceasefire.status != CeasefireStatus::Proposed {
            return Err(Error::State(format!(
                "ceasefire {} is not awaiting a response",
                id
            )));
        }
        if now >= ceasefire.proposed_at + Duration::seconds(ceasefire.duration_secs) {
            ceasefire.status = CeasefireStatus::Expired;
            return Err(Error::State(format!("ceasefire proposal {} has expired", id)));
        }
        if accept {
            ceasefire.status = CeasefireStatus::Active;
            ceasefire.accepted_at = Some(now);
        } else {
            ceasefire.status = CeasefireStatus::Rejected;
        }
        Ok(ceasefire.status)
    }

    /// Look up a ceasefire
    pub fn ceasefire(&self, id: ConflictId) -> Option<&Ceasefire> {
        self.ceasefires.get(&id)
    }

    /// Close out stale records
    ///
    /// Ends timed-out wars, resolves expired sieges and raids with their
    /// score attribution, and expires stale ceasefires and proposals.
    /// Intended to run at low frequency; the read paths already treat
    /// expired records as dead, so the sweep only bounds how long passive
    /// observers can see them.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> ConflictSweep {
        let mut result = ConflictSweep::default();

        let expired_sieges: Vec<ConflictId> = self
            .sieges
            .values()
            .filter(|s| !s.resolved && s.is_expired(now))
            .map(|s| s.id)
            .collect();
        for id in expired_sieges {
            if self.resolve_siege(id, now).is_ok() {
                result.sieges_resolved += 1;
            }
        }

        let expired_raids: Vec<ConflictId> = self
            .raids
            .values()
            .filter(|r| !r.resolved && r.is_expired(now))
            .map(|r| r.id)
            .collect();
        for id in expired_raids {
            if self.resolve_raid(id, now).is_ok() {
                result.raids_resolved += 1;
            }
        }

        for war in self.wars.values_mut() {
            if war.active && now >= war.ends_at {
                war.active = false;
                result.wars_ended += 1;
            }
        }

        for ceasefire in self.ceasefires.values_mut() {
            let window = Duration::seconds(ceasefire.duration_secs);
            match ceasefire.status {
                CeasefireStatus::Proposed if now >= ceasefire.proposed_at + window => {
                    ceasefire.status = CeasefireStatus::Expired;
                    result.ceasefires_expired += 1;
                }
                CeasefireStatus::Active
                    if ceasefire
                        .accepted_at
                        .map(|at| now >= at + window)
                        .unwrap_or(true) =>
                {
                    ceasefire.status = CeasefireStatus::Expired;
                    result.ceasefires_expired += 1;
                }
                _ => {}
            }
        }

        result
    }

    /// Iterate all wars
    pub fn wars(&self) -> impl Iterator<Item = &War> {
        self.wars.values()
    }

    /// Iterate all sieges
    pub fn sieges(&self) -> impl Iterator<Item = &Siege> {
        self.sieges.values()
    }

    /// Iterate all raids
    pub fn raids(&self) -> impl Iterator<Item = &Raid> {
        self.raids.values()
    }

    /// Iterate all ceasefires
    pub fn ceasefires(&self) -> impl Iterator<Item = &Ceasefire> {
        self.ceasefires.values()
    }

    /// Re-insert a loaded war, used when booting from storage
    pub fn restore_war(&mut self, war: War) {
        self.next_id = self.next_id.max(war.id.raw() + 1);
        self.wars.insert(war.id, war);
    }

    /// Re-insert a loaded siege, used when booting from storage
    pub fn restore_siege(&mut self, siege: Siege) {
        self.next_id = self.next_id.max(siege.id.raw() + 1);
        self.sieges.insert(siege.id, siege);
    }

    /// Re-insert a loaded raid, used when booting from storage
    pub fn restore_raid(&mut self, raid: Raid) {
        self.next_id = self.next_id.max(raid.id.raw() + 1);
        self.raids.insert(raid.id, raid);
    }

    /// Re-insert a loaded ceasefire, used when booting from storage
    pub fn restore_ceasefire(&mut self, ceasefire: Ceasefire) {
        self.next_id = self.next_id.max(ceasefire.id.raw() + 1);
        self.ceasefires.insert(ceasefire.id, ceasefire);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: GroupId = GroupId(1);
    const B: GroupId = GroupId(2);
    const C: GroupId = GroupId(3);

    fn cell(x: i64, y: i64) -> CellCoordinate {
        CellCoordinate::new("w", x, y)
    }

    fn hour() -> Duration {
        Duration::seconds(3600)
    }

    #[test]
    fn test_double_declaration_fails() {
        let mut c = ConflictCoordinator::new();
        let now = Utc::now();
        c.declare_war(A, B, hour(), now).unwrap();
        assert!(matches!(c.declare_war(A, B, hour(), now), Err(Error::State(_))));
        // orientation does not matter
        assert!(matches!(c.declare_war(B, A, hour(), now), Err(Error::State(_))));
        // an unrelated pair is fine
        c.declare_war(A, C, hour(), now).unwrap();
    }

    #[test]
    fn test_redeclaration_after_expiry() {
        let mut c = ConflictCoordinator::new();
        let now = Utc::now();
        c.declare_war(A, B, hour(), now).unwrap();
        let later = now + hour();
        // lazily expired, no sweep needed
        c.declare_war(A, B, hour(), later).unwrap();
    }

    #[test]
    fn test_end_war_is_explicit_and_once() {
        let mut c = ConflictCoordinator::new();
        let now = Utc::now();
        let war = c.declare_war(A, B, hour(), now).unwrap();
        c.end_war(war, now + Duration::seconds(5)).unwrap();
        assert!(!c.war(war).unwrap().is_active(now + Duration::seconds(6)));
        assert!(matches!(c.end_war(war, now), Err(Error::State(_))));
    }

    #[test]
    fn test_winner_strictly_higher_or_none() {
        let mut c = ConflictCoordinator::new();
        let now = Utc::now();
        let war = c.declare_war(A, B, hour(), now).unwrap();
        assert_eq!(c.winner(war).unwrap(), None);
        c.record_score(war, A, 7).unwrap();
        assert_eq!(c.winner(war).unwrap(), Some(A));
        c.record_score(war, B, 7).unwrap();
        assert_eq!(c.winner(war).unwrap(), None);
        c.record_score(war, B, 1).unwrap();
        assert_eq!(c.winner(war).unwrap(), Some(B));
        assert!(c.record_score(war, C, 1).is_err());
    }

    #[test]
    fn test_siege_progress_clamps() {
        let mut c = ConflictCoordinator::new();
        let now = Utc::now();
        let war = c.declare_war(A, B, hour(), now).unwrap();
        let siege = c.begin_siege(war, A, cell(5, 5), hour(), now).unwrap();
        assert_eq!(c.add_siege_progress(siege, 80, now).unwrap(), 80);
        // 80 + 150 yields exactly 100
        assert_eq!(c.add_siege_progress(siege, 150, now).unwrap(), 100);
        assert!(c.siege(siege).unwrap().is_complete());
        // negative adjustments clamp at the floor
        let siege2 = c.begin_siege(war, B, cell(0, 0), hour(), now).unwrap();
        assert_eq!(c.add_siege_progress(siege2, -40, now).unwrap(), 0);
    }

    #[test]
    fn test_completion_and_expiry_are_independent() {
        let mut c = ConflictCoordinator::new();
        let now = Utc::now();
        let war = c.declare_war(A, B, hour(), now).unwrap();
        let siege = c
            .begin_siege(war, A, cell(5, 5), Duration::seconds(60), now)
            .unwrap();
        c.add_siege_progress(siege, 100, now).unwrap();
        let s = c.siege(siege).unwrap();
        assert!(s.is_complete());
        assert!(!s.is_expired(now + Duration::seconds(30)));
        assert!(s.is_expired(now + Duration::seconds(60)));
        // progress cannot advance after the timer runs out
        let siege2 = c
            .begin_siege(war, A, cell(6, 5), Duration::seconds(60), now)
            .unwrap();
        assert!(matches!(
            c.add_siege_progress(siege2, 10, now + Duration::seconds(61)),
            Err(Error::State(_))
        ));
    }

    #[test]
    fn test_siege_resolution_attributes_score() {
        let mut c = ConflictCoordinator::new();
        let now = Utc::now();
        let war = c.declare_war(A, B, hour(), now).unwrap();

        let captured = c.begin_siege(war, A, cell(5, 5), hour(), now).unwrap();
        c.add_siege_progress(captured, 100, now).unwrap();
        let outcome = c.resolve_siege(captured, now).unwrap();
        assert!(outcome.captured);
        assert_eq!(c.war(war).unwrap().attacker_score, SIEGE_CAPTURE_SCORE);

        let failed = c
            .begin_siege(war, A, cell(6, 5), Duration::seconds(10), now)
            .unwrap();
        let outcome = c
            .resolve_siege(failed, now + Duration::seconds(10))
            .unwrap();
        assert!(!outcome.captured);
        assert_eq!(c.war(war).unwrap().defender_score, SIEGE_DEFENSE_SCORE);

        // double resolution is refused
        assert!(c.resolve_siege(captured, now).is_err());
        // an unfinished, unexpired siege cannot be resolved
        let open = c.begin_siege(war, A, cell(7, 5), hour(), now).unwrap();
        assert!(matches!(c.resolve_siege(open, now), Err(Error::State(_))));
    }

    #[test]
    fn test_raid_drains_and_scores_under_war() {
        let mut c = ConflictCoordinator::new();
        let now = Utc::now();
        let war = c.declare_war(A, B, hour(), now).unwrap();
        let raid = c.begin_raid(A, B, cell(1, 1), hour(), now).unwrap();
        assert_eq!(c.add_raid_drain(raid, 45, now).unwrap(), 45);
        assert_eq!(c.add_raid_drain(raid, 80, now).unwrap(), 100);
        let outcome = c.resolve_raid(raid, now).unwrap();
        assert_eq!(outcome.resources_stolen, 100);
        assert_eq!(c.war(war).unwrap().attacker_score, 10);
    }

    #[test]
    fn test_raid_without_war_scores_nothing() {
        let mut c = ConflictCoordinator::new();
        let now = Utc::now();
        let raid = c
            .begin_raid(A, B, cell(1, 1), Duration::seconds(30), now)
            .unwrap();
        c.add_raid_drain(raid, 60, now).unwrap();
        let outcome = c.resolve_raid(raid, now + Duration::seconds(30)).unwrap();
        assert_eq!(outcome.resources_stolen, 60);
        assert!(c.wars().next().is_none());
    }

    #[test]
    fn test_ceasefire_lifecycle_and_gating() {
        let mut c = ConflictCoordinator::new();
        let now = Utc::now();
        let war = c.declare_war(A, B, hour(), now).unwrap();
        let cf = c.propose_ceasefire(war, B, hour(), now).unwrap();
        assert_eq!(c.ceasefire(cf).unwrap().status, CeasefireStatus::Proposed);

        // a proposal does not yet gate combat
        c.begin_siege(war, A, cell(1, 1), hour(), now).unwrap();

        let t1 = now + Duration::seconds(10);
        assert_eq!(
            c.respond_ceasefire(cf, true, t1).unwrap(),
            CeasefireStatus::Active
        );
        // active ceasefire blocks new sieges and raids between the parties
        assert!(matches!(
            c.begin_siege(war, A, cell(2, 1), hour(), t1),
            Err(Error::State(_))
        ));
        assert!(matches!(
            c.begin_raid(B, A, cell(2, 1), hour(), t1),
            Err(Error::State(_))
        ));
        // third parties are unaffected
        c.begin_raid(C, A, cell(3, 1), Duration::seconds(60), t1)
            .unwrap();

        // the window runs from acceptance
        let after = t1 + hour();
        assert!(!c.ceasefire(cf).unwrap().is_active(after));
        let war2 = c.war(war).unwrap();
        assert!(war2.is_active(after - Duration::seconds(1)) || !war2.is_active(after));
    }

    #[test]
    fn test_ceasefire_reject_and_proposal_expiry() {
        let mut c = ConflictCoordinator::new();
        let now = Utc::now();
        let war = c.declare_war(A, B, hour(), now).unwrap();
        let cf = c.propose_ceasefire(war, A, Duration::seconds(60), now).unwrap();
        assert_eq!(
            c.respond_ceasefire(cf, false, now).unwrap(),
            CeasefireStatus::Rejected
        );
        // a rejected ceasefire leaves room for a new proposal
        let cf2 = c.propose_ceasefire(war, B, Duration::seconds(60), now).unwrap();
        // but only one open proposal at a time
        assert!(c.propose_ceasefire(war, A, hour(), now).is_err());
        // a response after the proposal window marks it expired
        let err = c.respond_ceasefire(cf2, true, now + Duration::seconds(60));
        assert!(matches!(err, Err(Error::State(_))));
        assert_eq!(c.ceasefire(cf2).unwrap().status, CeasefireStatus::Expired);
    }

    #[test]
    fn test_sweep_closes_stale_records() {
        let mut c = ConflictCoordinator::new();
        let now = Utc::now();
        let war = c.declare_war(A, B, Duration::seconds(100), now).unwrap();
        c.begin_siege(war, A, cell(1, 1), Duration::seconds(50), now)
            .unwrap();
        c.begin_raid(A, B, cell(2, 2), Duration::seconds(50), now)
            .unwrap();
        let cf = c.propose_ceasefire(war, A, Duration::seconds(30), now).unwrap();

        let result = c.sweep(now + Duration::seconds(120));
        assert_eq!(
            result,
            ConflictSweep {
                wars_ended: 1,
                sieges_resolved: 1,
                raids_resolved: 1,
                ceasefires_expired: 1,
            }
        );
        assert_eq!(c.ceasefire(cf).unwrap().status, CeasefireStatus::Expired);
        // the expired siege was attributed to the defender before the war
        // record closed
        assert_eq!(c.war(war).unwrap().defender_score, SIEGE_DEFENSE_SCORE);
    }
}
