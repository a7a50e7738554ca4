//! World - Explicit context owning every engine subsystem
//!
//! World bundles the registry, territory, resolver, conflict coordinator,
//! and audit log behind one mutable handle, so nothing in the engine is a
//! global. All mutation goes through it on a single writer thread.
//!
//! Every mutating operation follows the same shape: validate, mutate in
//! memory, append audit where the operation is audited, emit a
//! [`WorldEvent`] to observers, enqueue a write-behind persistence op, and
//! return. Storage failures never fail or roll back an operation; `flush`
//! logs them and keeps the op queued.

use crate::config::WorldConfig;
use crate::error::{Error, Result};
use crate::persist::PersistOp;
use chrono::{DateTime, Duration, Utc};
use demesne_core::{
    AuditLog, CapabilityTable, CellCoordinate, ConflictCoordinator, ConflictId, ConflictSweep,
    Decision, GroupId, GroupRegistry, Observer, Permission, PermissionResolver,
    PermissionTemplate, PlotType, Principal, PrincipalId, RaidOutcome, ResolveContext, Role,
    SiegeOutcome, Storage, TemplateTarget, TerritoryStore, WorldEvent,
};
use tracing::{debug, warn};

/// What one `sweep` call closed out
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepReport {
    /// Expired temporary permissions purged
    pub temporaries_purged: usize,
    /// Conflict records closed
    pub conflicts: ConflictSweep,
}

/// The engine context: all state, one writer
pub struct World {
    registry: GroupRegistry,
    territory: TerritoryStore,
    resolver: PermissionResolver,
    conflicts: ConflictCoordinator,
    audit: AuditLog,
    capabilities: CapabilityTable,
    config: WorldConfig,
    storage: Option<Box<dyn Storage>>,
    observers: Vec<Box<dyn Observer>>,
    pending: Vec<PersistOp>,
}

impl World {
    /// Create an empty world with no persistence
    pub fn new(config: WorldConfig) -> Self {
        Self {
            registry: GroupRegistry::new(),
            territory: TerritoryStore::new(),
            resolver: PermissionResolver::new(),
            conflicts: ConflictCoordinator::new(),
            audit: AuditLog::new(),
            capabilities: CapabilityTable::default(),
            config,
            storage: None,
            observers: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Create an empty world backed by a storage backend
    pub fn with_storage(config: WorldConfig, storage: Box<dyn Storage>) -> Self {
        let mut world = Self::new(config);
        world.storage = Some(storage);
        world
    }

    /// Rebuild a world from everything the backend has stored
    pub fn boot(config: WorldConfig, storage: Box<dyn Storage>) -> Result<Self> {
        let mut world = Self::new(config);
        for group in storage.load_groups()? {
            world.registry.restore(group);
        }
        for claim in storage.load_claims()? {
            world.territory.insert_record(claim);
        }
        for (cell, scope) in storage.load_scopes()? {
            world.resolver.restore_scope(cell, scope);
        }
        for trust in storage.load_trusts()? {
            world.resolver.restore_trust(trust);
        }
        for temp in storage.load_temporaries()? {
            world.resolver.restore_temporary(temp);
        }
        for war in storage.load_wars()? {
            world.conflicts.restore_war(war);
        }
        for siege in storage.load_sieges()? {
            world.conflicts.restore_siege(siege);
        }
        for raid in storage.load_raids()? {
            world.conflicts.restore_raid(raid);
        }
        for ceasefire in storage.load_ceasefires()? {
            world.conflicts.restore_ceasefire(ceasefire);
        }
        for entry in storage.load_audit_entries()? {
            world.audit.append(entry);
        }
        debug!(
            groups = world.registry.len(),
            claims = world.territory.len(),
            "world booted from storage"
        );
        world.storage = Some(storage);
        Ok(world)
    }

    /// Register an observer; zero observers is fully supported
    pub fn add_observer(&mut self, observer: Box<dyn Observer>) {
        self.observers.push(observer);
    }

    /// Group registry, read-only
    pub fn groups(&self) -> &GroupRegistry {
        &self.registry
    }

    /// Territory store, read-only
    pub fn territory(&self) -> &TerritoryStore {
        &self.territory
    }

    /// Permission resolver, read-only
    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    /// Conflict coordinator, read-only
    pub fn conflicts(&self) -> &ConflictCoordinator {
        &self.conflicts
    }

    /// The audit log
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// The active configuration
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Number of persistence ops awaiting flush
    pub fn pending_ops(&self) -> usize {
        self.pending.len()
    }

    // ---- group lifecycle ----

    /// Create a group with a unique name; the founder joins as Founder
    pub fn create_group(
        &mut self,
        name: impl Into<String>,
        founder: &Principal,
        now: DateTime<Utc>,
    ) -> Result<GroupId> {
        let id = self.registry.create(name, founder, now)?;
        self.enqueue_group(id);
        self.emit(WorldEvent::GroupCreated { group: id });
        Ok(id)
    }

    /// Disband a group, founder only
    ///
    /// Cascades: every cell is released, the group's scopes, trusts, and
    /// temporaries are purged with one audit entry, and the stored records
    /// are deleted.
    pub fn disband_group(
        &mut self,
        group: GroupId,
        actor: PrincipalId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let g = self
            .registry
            .get(group)
            .ok_or_else(|| no_group(group))?;
        if g.founder != actor {
            return Err(Error::Denied {
                actor,
                permission: Permission::ManagePermissions,
            });
        }
        let name = g.name.clone();

        // capture storage keys before the purge erases them
        let trust_keys: Vec<(GroupId, PrincipalId)> = self
            .resolver
            .trusts()
            .filter(|t| t.group == group)
            .map(|t| (t.group, t.principal))
            .collect();
        let temp_keys: Vec<String> = self
            .resolver
            .temporaries()
            .filter(|t| t.group == group)
            .map(|t| t.storage_key())
            .collect();

        let released = self.territory.dissolve(group);
        self.resolver
            .purge_group(group, &released, actor, now, &mut self.audit);
        self.registry.remove(group);

        self.enqueue(PersistOp::DeleteGroup(name));
        for cell in &released {
            self.enqueue(PersistOp::DeleteClaim(cell.clone()));
            self.enqueue(PersistOp::DeleteScope(cell.clone()));
        }
        for (g, p) in trust_keys {
            self.enqueue(PersistOp::DeleteTrust(g, p));
        }
        for key in temp_keys {
            self.enqueue(PersistOp::DeleteTemporary(key));
        }
        self.enqueue_audit_tail(1);

        for cell in released {
            self.emit(WorldEvent::ClaimChanged {
                cell,
                new_owner: None,
            });
        }
        self.emit(WorldEvent::GroupDisbanded { group });
        Ok(())
    }

    /// Add a principal to the roster as a plain Member
    pub fn invite_member(
        &mut self,
        group: GroupId,
        actor: PrincipalId,
        principal: PrincipalId,
    ) -> Result<()> {
        self.require(group, actor, Permission::Invite)?;
        self.registry
            .get_mut(group)
            .ok_or_else(|| no_group(group))?
            .add_member(principal, Role::Member)?;
        self.enqueue_group(group);
        Ok(())
    }

    /// Remove a member; the actor must outrank them
    pub fn kick_member(
        &mut self,
        group: GroupId,
        actor: PrincipalId,
        principal: PrincipalId,
    ) -> Result<()> {
        self.require(group, actor, Permission::Kick)?;
        let g = self.registry.get(group).ok_or_else(|| no_group(group))?;
        let actor_role = g.role_of(actor).unwrap_or(Role::Member);
        if let Some(target_role) = g.role_of(principal) {
            if !actor_role.outranks(target_role) {
                return Err(Error::Denied {
                    actor,
                    permission: Permission::Kick,
                });
            }
        }
        self.registry
            .get_mut(group)
            .ok_or_else(|| no_group(group))?
            .remove_member(principal)?;
        self.enqueue_group(group);
        Ok(())
    }

    /// A member removes themselves; the founder cannot leave
    pub fn leave_group(&mut self, group: GroupId, principal: PrincipalId) -> Result<()> {
        self.registry
            .get_mut(group)
            .ok_or_else(|| no_group(group))?
            .remove_member(principal)?;
        self.enqueue_group(group);
        Ok(())
    }

    /// Change a member's role; the actor must outrank both the member's
    /// current role and the role being assigned
    pub fn set_member_role(
        &mut self,
        group: GroupId,
        actor: PrincipalId,
        principal: PrincipalId,
        role: Role,
    ) -> Result<()> {
        self.require(group, actor, Permission::Promote)?;
        let g = self.registry.get(group).ok_or_else(|| no_group(group))?;
        let actor_role = g.role_of(actor).unwrap_or(Role::Member);
        let current = g.role_of(principal).unwrap_or(Role::Member);
        if !actor_role.outranks(role) || !actor_role.outranks(current) {
            return Err(Error::Denied {
                actor,
                permission: Permission::Promote,
            });
        }
        self.registry
            .get_mut(group)
            .ok_or_else(|| no_group(group))?
            .set_role(principal, role)?;
        self.enqueue_group(group);
        Ok(())
    }

    /// Deposit into the group treasury
    pub fn deposit(&mut self, group: GroupId, actor: PrincipalId, amount: f64) -> Result<()> {
        self.require(group, actor, Permission::Deposit)?;
        self.registry
            .get_mut(group)
            .ok_or_else(|| no_group(group))?
            .deposit(amount)?;
        self.enqueue_group(group);
        Ok(())
    }

    /// Withdraw from the group treasury
    pub fn withdraw(&mut self, group: GroupId, actor: PrincipalId, amount: f64) -> Result<()> {
        self.require(group, actor, Permission::Withdraw)?;
        self.registry
            .get_mut(group)
            .ok_or_else(|| no_group(group))?
            .withdraw(amount)?;
        self.enqueue_group(group);
        Ok(())
    }

    /// Award experience; returns whether the group leveled up
    pub fn add_experience(&mut self, group: GroupId, points: u64) -> Result<bool> {
        let leveled = self
            .registry
            .get_mut(group)
            .ok_or_else(|| no_group(group))?
            .add_experience(points);
        self.enqueue_group(group);
        Ok(leveled)
    }

    // ---- territory ----

    /// Claim one cell for a group
    pub fn claim_cell(
        &mut self,
        group: GroupId,
        actor: PrincipalId,
        cell: CellCoordinate,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.require(group, actor, Permission::ClaimLand)?;
        let capacity = self.capacity_of(group)?;
        self.territory.claim(group, capacity, cell.clone(), now)?;
        self.enqueue_claim(&cell);
        self.emit(WorldEvent::ClaimChanged {
            cell,
            new_owner: Some(group),
        });
        Ok(())
    }

    /// Claim outward from a center cell, partial success allowed
    pub fn claim_radius(
        &mut self,
        group: GroupId,
        actor: PrincipalId,
        center: &CellCoordinate,
        radius: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<CellCoordinate>> {
        self.require(group, actor, Permission::ClaimLand)?;
        if radius == 0 || radius > self.config.max_claim_radius {
            return Err(demesne_core::Error::Validation(format!(
                "claim radius must be between 1 and {}, got {}",
                self.config.max_claim_radius, radius
            ))
            .into());
        }
        let capacity = self.capacity_of(group)?;
        let claimed = self
            .territory
            .claim_radius(group, capacity, center, radius, now)?;
        for cell in &claimed {
            self.enqueue_claim(cell);
        }
        for cell in claimed.clone() {
            self.emit(WorldEvent::ClaimChanged {
                cell,
                new_owner: Some(group),
            });
        }
        Ok(claimed)
    }

    /// Release a cell back to wilderness, dropping its permission scope
    pub fn unclaim_cell(
        &mut self,
        group: GroupId,
        actor: PrincipalId,
        cell: &CellCoordinate,
    ) -> Result<()> {
        self.require(group, actor, Permission::UnclaimLand)?;
        self.territory.unclaim(group, cell)?;
        self.resolver.remove_scope(cell);
        self.enqueue(PersistOp::DeleteClaim(cell.clone()));
        self.enqueue(PersistOp::DeleteScope(cell.clone()));
        self.emit(WorldEvent::ClaimChanged {
            cell: cell.clone(),
            new_owner: None,
        });
        Ok(())
    }

    /// Tag a claimed cell's use
    pub fn set_plot_type(
        &mut self,
        group: GroupId,
        actor: PrincipalId,
        cell: &CellCoordinate,
        plot_type: PlotType,
    ) -> Result<()> {
        self.require(group, actor, Permission::ManagePermissions)?;
        self.territory.set_plot_type(group, cell, plot_type)?;
        self.enqueue_claim(cell);
        Ok(())
    }

    /// Set a per-cell claim flag
    pub fn set_claim_flag(
        &mut self,
        group: GroupId,
        actor: PrincipalId,
        cell: &CellCoordinate,
        flag: impl Into<String>,
        value: bool,
    ) -> Result<()> {
        self.require(group, actor, Permission::ManagePermissions)?;
        self.territory.set_claim_flag(group, cell, flag, value)?;
        self.enqueue_claim(cell);
        Ok(())
    }

    // ---- permissions ----

    /// Decide whether `actor` may perform `permission` in `cell`
    pub fn check(
        &self,
        actor: PrincipalId,
        permission: Permission,
        cell: &CellCoordinate,
        now: DateTime<Utc>,
    ) -> Decision {
        let ctx = ResolveContext {
            territory: &self.territory,
            groups: &self.registry,
            capabilities: &self.capabilities,
        };
        self.resolver.evaluate(&ctx, actor, permission, cell, now)
    }

    /// Set a player-specific override on an owned cell
    #[allow(clippy::too_many_arguments)]
    pub fn set_player_override(
        &mut self,
        actor: PrincipalId,
        cell: CellCoordinate,
        principal: PrincipalId,
        permission: Permission,
        decision: Decision,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let owner = self.owner_group(&cell)?;
        self.require(owner, actor, Permission::ManagePermissions)?;
        self.resolver.set_player_override(
            owner,
            cell.clone(),
            principal,
            permission,
            decision,
            actor,
            reason,
            now,
            &mut self.audit,
        );
        self.enqueue_scope(&cell);
        self.enqueue_audit_tail(1);
        self.emit(WorldEvent::PermissionChanged {
            group: owner,
            cell: Some(cell),
            principal,
        });
        Ok(())
    }

    /// Clear a player-specific override on an owned cell
    pub fn clear_player_override(
        &mut self,
        actor: PrincipalId,
        cell: &CellCoordinate,
        principal: PrincipalId,
        permission: Permission,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let owner = self.owner_group(cell)?;
        self.require(owner, actor, Permission::ManagePermissions)?;
        self.resolver
            .clear_player_override(owner, cell, principal, permission, actor, now, &mut self.audit)?;
        self.enqueue_scope(cell);
        self.enqueue_audit_tail(1);
        self.emit(WorldEvent::PermissionChanged {
            group: owner,
            cell: Some(cell.clone()),
            principal,
        });
        Ok(())
    }

    /// Set a role override on an owned cell
    pub fn set_role_override(
        &mut self,
        actor: PrincipalId,
        cell: CellCoordinate,
        role: Role,
        permission: Permission,
        decision: Decision,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let owner = self.owner_group(&cell)?;
        self.require(owner, actor, Permission::ManagePermissions)?;
        self.resolver.set_role_override(
            owner,
            cell.clone(),
            role,
            permission,
            decision,
            actor,
            now,
            &mut self.audit,
        );
        self.enqueue_scope(&cell);
        self.enqueue_audit_tail(1);
        self.emit(WorldEvent::PermissionChanged {
            group: owner,
            cell: Some(cell),
            principal: actor,
        });
        Ok(())
    }

    /// Set a cell default for a permission
    pub fn set_cell_default(
        &mut self,
        actor: PrincipalId,
        cell: CellCoordinate,
        permission: Permission,
        decision: Decision,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let owner = self.owner_group(&cell)?;
        self.require(owner, actor, Permission::ManagePermissions)?;
        self.resolver.set_cell_default(
            owner,
            cell.clone(),
            permission,
            decision,
            actor,
            now,
            &mut self.audit,
        );
        self.enqueue_scope(&cell);
        self.enqueue_audit_tail(1);
        self.emit(WorldEvent::PermissionChanged {
            group: owner,
            cell: Some(cell),
            principal: actor,
        });
        Ok(())
    }

    /// Grant or widen a group-wide trust for an external principal
    pub fn grant_trust(
        &mut self,
        group: GroupId,
        actor: PrincipalId,
        principal: PrincipalId,
        permissions: impl IntoIterator<Item = Permission>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.require(group, actor, Permission::ManagePermissions)?;
        self.resolver
            .grant_trust(group, principal, permissions, actor, now, &mut self.audit);
        let trust = self
            .resolver
            .trusts()
            .find(|t| t.group == group && t.principal == principal)
            .cloned();
        if let Some(trust) = trust {
            self.enqueue(PersistOp::SaveTrust(trust));
        }
        self.enqueue_audit_tail(1);
        self.emit(WorldEvent::PermissionChanged {
            group,
            cell: None,
            principal,
        });
        Ok(())
    }

    /// Revoke a trust grant entirely
    pub fn revoke_trust(
        &mut self,
        group: GroupId,
        actor: PrincipalId,
        principal: PrincipalId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.require(group, actor, Permission::ManagePermissions)?;
        self.resolver
            .revoke_trust(group, principal, actor, now, &mut self.audit)?;
        self.enqueue(PersistOp::DeleteTrust(group, principal));
        self.enqueue_audit_tail(1);
        self.emit(WorldEvent::PermissionChanged {
            group,
            cell: None,
            principal,
        });
        Ok(())
    }

    /// Grant a self-expiring permission, group-wide or scoped to one cell
    #[allow(clippy::too_many_arguments)]
    pub fn grant_temporary(
        &mut self,
        group: GroupId,
        actor: PrincipalId,
        principal: PrincipalId,
        permission: Permission,
        cell: Option<CellCoordinate>,
        decision: Decision,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.require(group, actor, Permission::ManagePermissions)?;
        self.resolver.grant_temporary(
            group,
            principal,
            permission,
            cell.clone(),
            decision,
            expires_at,
            actor,
            now,
            &mut self.audit,
        )?;
        if let Some(temp) = self.resolver.temporaries().last().cloned() {
            self.enqueue(PersistOp::SaveTemporary(temp));
        }
        self.enqueue_audit_tail(1);
        self.emit(WorldEvent::PermissionChanged {
            group,
            cell,
            principal,
        });
        Ok(())
    }

    /// Define or replace a named permission template
    pub fn define_template(&mut self, template: PermissionTemplate) {
        self.resolver.define_template(template);
    }

    /// Remove a named template
    pub fn remove_template(&mut self, name: &str) -> Result<()> {
        self.resolver.remove_template(name)?;
        Ok(())
    }

    /// Apply a template bundle to a role or player on one owned cell
    pub fn apply_template(
        &mut self,
        actor: PrincipalId,
        cell: CellCoordinate,
        target: TemplateTarget,
        template_name: &str,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let owner = self.owner_group(&cell)?;
        self.require(owner, actor, Permission::ManagePermissions)?;
        let applied = self.resolver.apply_template(
            owner,
            cell.clone(),
            target,
            template_name,
            actor,
            now,
            &mut self.audit,
        )?;
        self.enqueue_scope(&cell);
        self.enqueue_audit_tail(1);
        let principal = match target {
            TemplateTarget::Player(p) => p,
            TemplateTarget::Role(_) => actor,
        };
        self.emit(WorldEvent::PermissionChanged {
            group: owner,
            cell: Some(cell),
            principal,
        });
        Ok(applied)
    }

    // ---- conflicts ----

    /// Declare a war on another group
    pub fn declare_war(
        &mut self,
        group: GroupId,
        actor: PrincipalId,
        target: GroupId,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> Result<ConflictId> {
        self.require(group, actor, Permission::DeclareWar)?;
        if !self.registry.contains(target) {
            return Err(no_group(target));
        }
        let id = self.conflicts.declare_war(group, target, duration, now)?;
        self.enqueue_war(id);
        self.emit(WorldEvent::WarStateChanged { war: id });
        Ok(id)
    }

    /// End a war; the actor must hold war capability in one of the parties
    pub fn end_war(&mut self, id: ConflictId, actor: PrincipalId, now: DateTime<Utc>) -> Result<()> {
        let war = self
            .conflicts
            .war(id)
            .ok_or_else(|| demesne_core::Error::NotFound(format!("no war {}", id)))?;
        let (a, b) = (war.attacker, war.defender);
        if !self.has_capability(a, actor, Permission::DeclareWar)
            && !self.has_capability(b, actor, Permission::DeclareWar)
        {
            return Err(Error::Denied {
                actor,
                permission: Permission::DeclareWar,
            });
        }
        self.conflicts.end_war(id, now)?;
        self.enqueue_war(id);
        self.emit(WorldEvent::WarStateChanged { war: id });
        Ok(())
    }

    /// Open a siege against a cell the opposing party owns
    #[allow(clippy::too_many_arguments)]
    pub fn begin_siege(
        &mut self,
        war: ConflictId,
        group: GroupId,
        actor: PrincipalId,
        cell: CellCoordinate,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> Result<ConflictId> {
        self.require(group, actor, Permission::DeclareWar)?;
        let record = self
            .conflicts
            .war(war)
            .ok_or_else(|| demesne_core::Error::NotFound(format!("no war {}", war)))?;
        let defender = if record.attacker == group {
            record.defender
        } else {
            record.attacker
        };
        if self.territory.owner_of(&cell) != Some(defender) {
            return Err(demesne_core::Error::Validation(format!(
                "cell {} is not held by {}",
                cell, defender
            ))
            .into());
        }
        let id = self.conflicts.begin_siege(war, group, cell, duration, now)?;
        self.enqueue_siege(id);
        self.emit(WorldEvent::SiegeProgressChanged {
            siege: id,
            progress: 0,
        });
        Ok(id)
    }

    /// Advance siege progress
    pub fn add_siege_progress(
        &mut self,
        id: ConflictId,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<u8> {
        let progress = self.conflicts.add_siege_progress(id, amount, now)?;
        self.enqueue_siege(id);
        self.emit(WorldEvent::SiegeProgressChanged {
            siege: id,
            progress,
        });
        Ok(progress)
    }

    /// Resolve a finished siege and, on capture, transfer the cell
    ///
    /// Capture can miss: if the defender no longer holds the cell the
    /// score still stands but no territory moves.
    pub fn resolve_siege(&mut self, id: ConflictId, now: DateTime<Utc>) -> Result<SiegeOutcome> {
        let outcome = self.conflicts.resolve_siege(id, now)?;
        if outcome.captured {
            match self
                .territory
                .transfer_ownership(&outcome.cell, outcome.defender, outcome.attacker, now)
            {
                Ok(()) => {
                    self.resolver.remove_scope(&outcome.cell);
                    self.enqueue_claim(&outcome.cell);
                    self.enqueue(PersistOp::DeleteScope(outcome.cell.clone()));
                    self.emit(WorldEvent::ClaimChanged {
                        cell: outcome.cell.clone(),
                        new_owner: Some(outcome.attacker),
                    });
                }
                Err(e) => {
                    debug!(siege = %id, cell = %outcome.cell, error = %e, "siege capture skipped");
                }
            }
        }
        self.enqueue_siege(id);
        self.enqueue_war(outcome.war);
        self.emit(WorldEvent::WarStateChanged { war: outcome.war });
        Ok(outcome)
    }

    /// Open a raid against a claimed cell
    pub fn begin_raid(
        &mut self,
        group: GroupId,
        actor: PrincipalId,
        cell: CellCoordinate,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> Result<ConflictId> {
        self.require(group, actor, Permission::DeclareWar)?;
        let target = self
            .territory
            .owner_of(&cell)
            .ok_or_else(|| demesne_core::Error::NotFound(format!("cell {} is not claimed", cell)))?;
        let id = self.conflicts.begin_raid(group, target, cell, duration, now)?;
        self.enqueue_raid(id);
        self.emit(WorldEvent::RaidProgressChanged {
            raid: id,
            resources_stolen: 0,
        });
        Ok(id)
    }

    /// Advance the raid drain
    pub fn add_raid_drain(
        &mut self,
        id: ConflictId,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<u8> {
        let stolen = self.conflicts.add_raid_drain(id, amount, now)?;
        self.enqueue_raid(id);
        self.emit(WorldEvent::RaidProgressChanged {
            raid: id,
            resources_stolen: stolen,
        });
        Ok(stolen)
    }

    /// Resolve a finished raid, moving the drained treasury share
    pub fn resolve_raid(&mut self, id: ConflictId, now: DateTime<Utc>) -> Result<RaidOutcome> {
        let outcome = self.conflicts.resolve_raid(id, now)?;
        if outcome.resources_stolen > 0 {
            let share = f64::from(outcome.resources_stolen) / 100.0;
            let loot = self
                .registry
                .get(outcome.target)
                .map(|g| g.treasury * share)
                .unwrap_or(0.0);
            if loot > 0.0 {
                if let Some(target) = self.registry.get_mut(outcome.target) {
                    // loot is a fraction of the current balance, cannot overdraw
                    target.withdraw(loot)?;
                }
                if let Some(raider) = self.registry.get_mut(outcome.raider) {
                    raider.deposit(loot)?;
                }
                self.enqueue_group(outcome.target);
                self.enqueue_group(outcome.raider);
            }
        }
        self.enqueue_raid(id);
        if let Some(war) = self
            .conflicts
            .war_between(outcome.raider, outcome.target, now)
        {
            let war_id = war.id;
            self.enqueue_war(war_id);
            self.emit(WorldEvent::WarStateChanged { war: war_id });
        }
        Ok(outcome)
    }

    /// Propose a ceasefire for a war
    pub fn propose_ceasefire(
        &mut self,
        war: ConflictId,
        group: GroupId,
        actor: PrincipalId,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> Result<ConflictId> {
        self.require(group, actor, Permission::DeclareWar)?;
        let id = self.conflicts.propose_ceasefire(war, group, duration, now)?;
        self.enqueue_ceasefire(id);
        self.emit(WorldEvent::CeasefireChanged {
            ceasefire: id,
            status: demesne_core::CeasefireStatus::Proposed,
        });
        Ok(id)
    }

    /// Accept or reject a proposed ceasefire on behalf of the respondent
    pub fn respond_ceasefire(
        &mut self,
        id: ConflictId,
        actor: PrincipalId,
        accept: bool,
        now: DateTime<Utc>,
    ) -> Result<demesne_core::CeasefireStatus> {
        let respondent = self
            .conflicts
            .ceasefire(id)
            .ok_or_else(|| demesne_core::Error::NotFound(format!("no ceasefire {}", id)))?
            .respondent;
        self.require(respondent, actor, Permission::DeclareWar)?;
        match self.conflicts.respond_ceasefire(id, accept, now) {
            Ok(status) => {
                self.enqueue_ceasefire(id);
                self.emit(WorldEvent::CeasefireChanged {
                    ceasefire: id,
                    status,
                });
                Ok(status)
            }
            Err(e) => {
                // an expired proposal flips to Expired even on the error path
                if let Some(cf) = self.conflicts.ceasefire(id) {
                    if cf.status == demesne_core::CeasefireStatus::Expired {
                        let status = cf.status;
                        self.enqueue_ceasefire(id);
                        self.emit(WorldEvent::CeasefireChanged {
                            ceasefire: id,
                            status,
                        });
                    }
                }
                Err(e.into())
            }
        }
    }

    // ---- maintenance ----

    /// Purge expired permissions and close stale conflicts
    ///
    /// Intended to be driven by the host at roughly
    /// `config.sweep_interval_secs`.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> SweepReport {
        let expired_keys: Vec<String> = self
            .resolver
            .temporaries()
            .filter(|t| t.is_expired(now))
            .map(|t| t.storage_key())
            .collect();
        let purged = self.resolver.sweep_expired(now, &mut self.audit);
        for key in expired_keys {
            self.enqueue(PersistOp::DeleteTemporary(key));
        }
        self.enqueue_audit_tail(purged);

        let open_wars: Vec<ConflictId> = self
            .conflicts
            .wars()
            .filter(|w| w.active)
            .map(|w| w.id)
            .collect();
        let open_sieges: Vec<ConflictId> = self
            .conflicts
            .sieges()
            .filter(|s| !s.resolved)
            .map(|s| s.id)
            .collect();
        let open_raids: Vec<ConflictId> = self
            .conflicts
            .raids()
            .filter(|r| !r.resolved)
            .map(|r| r.id)
            .collect();
        let open_ceasefires: Vec<ConflictId> = self
            .conflicts
            .ceasefires()
            .filter(|c| {
                matches!(
                    c.status,
                    demesne_core::CeasefireStatus::Proposed | demesne_core::CeasefireStatus::Active
                )
            })
            .map(|c| c.id)
            .collect();

        let swept = self.conflicts.sweep(now);

        for id in open_wars {
            if self.conflicts.war(id).map(|w| !w.active).unwrap_or(false) {
                self.enqueue_war(id);
                self.emit(WorldEvent::WarStateChanged { war: id });
            }
        }
        for id in open_sieges {
            if self.conflicts.siege(id).map(|s| s.resolved).unwrap_or(false) {
                self.enqueue_siege(id);
            }
        }
        for id in open_raids {
            if self.conflicts.raid(id).map(|r| r.resolved).unwrap_or(false) {
                self.enqueue_raid(id);
            }
        }
        for id in open_ceasefires {
            let expired = self
                .conflicts
                .ceasefire(id)
                .map(|c| c.status == demesne_core::CeasefireStatus::Expired)
                .unwrap_or(false);
            if expired {
                self.enqueue_ceasefire(id);
                self.emit(WorldEvent::CeasefireChanged {
                    ceasefire: id,
                    status: demesne_core::CeasefireStatus::Expired,
                });
            }
        }

        let report = SweepReport {
            temporaries_purged: purged,
            conflicts: swept,
        };
        debug!(
            temporaries = report.temporaries_purged,
            wars = report.conflicts.wars_ended,
            sieges = report.conflicts.sieges_resolved,
            raids = report.conflicts.raids_resolved,
            ceasefires = report.conflicts.ceasefires_expired,
            "sweep finished"
        );
        report
    }

    /// Drain the persistence queue against storage
    ///
    /// Failed ops are logged and retained for the next flush. Returns the
    /// number of ops still pending.
    pub fn flush(&mut self) -> usize {
        let Some(storage) = self.storage.as_deref() else {
            return 0;
        };
        let ops = std::mem::take(&mut self.pending);
        let mut retained = Vec::new();
        for op in ops {
            if let Err(e) = op.apply(storage) {
                warn!(op = op.label(), error = %e, "persistence write failed, retrying next flush");
                retained.push(op);
            }
        }
        self.pending = retained;
        self.pending.len()
    }

    // ---- internal ----

    fn require(&self, group: GroupId, actor: PrincipalId, permission: Permission) -> Result<()> {
        let g = self.registry.get(group).ok_or_else(|| no_group(group))?;
        let Some(role) = g.role_of(actor) else {
            return Err(Error::Denied { actor, permission });
        };
        if self.capabilities.allows(role, permission) {
            Ok(())
        } else {
            Err(Error::Denied { actor, permission })
        }
    }

    fn has_capability(&self, group: GroupId, actor: PrincipalId, permission: Permission) -> bool {
        self.require(group, actor, permission).is_ok()
    }

    fn capacity_of(&self, group: GroupId) -> Result<usize> {
        let g = self.registry.get(group).ok_or_else(|| no_group(group))?;
        Ok(g.capacity_with(self.config.capacity_base, self.config.capacity_per_level))
    }

    fn owner_group(&self, cell: &CellCoordinate) -> Result<GroupId> {
        self.territory
            .owner_of(cell)
            .ok_or_else(|| demesne_core::Error::NotFound(format!("cell {} is not claimed", cell)).into())
    }

    fn emit(&mut self, event: WorldEvent) {
        for observer in &mut self.observers {
            observer.notify(&event);
        }
    }

    fn enqueue(&mut self, op: PersistOp) {
        if self.storage.is_some() {
            self.pending.push(op);
        }
    }

    fn enqueue_group(&mut self, group: GroupId) {
        if let Some(g) = self.registry.get(group).cloned() {
            self.enqueue(PersistOp::SaveGroup(g));
        }
    }

    fn enqueue_claim(&mut self, cell: &CellCoordinate) {
        if let Some(record) = self.territory.claim_record(cell).cloned() {
            self.enqueue(PersistOp::SaveClaim(record));
        }
    }

    fn enqueue_scope(&mut self, cell: &CellCoordinate) {
        let scope = self
            .resolver
            .scopes()
            .find(|(c, _)| *c == cell)
            .map(|(_, s)| s.clone());
        if let Some(scope) = scope {
            self.enqueue(PersistOp::SaveScope(cell.clone(), scope));
        }
    }

    fn enqueue_war(&mut self, id: ConflictId) {
        if let Some(war) = self.conflicts.war(id).cloned() {
            self.enqueue(PersistOp::SaveWar(war));
        }
    }

    fn enqueue_siege(&mut self, id: ConflictId) {
        if let Some(siege) = self.conflicts.siege(id).cloned() {
            self.enqueue(PersistOp::SaveSiege(siege));
        }
    }

    fn enqueue_raid(&mut self, id: ConflictId) {
        if let Some(raid) = self.conflicts.raid(id).cloned() {
            self.enqueue(PersistOp::SaveRaid(raid));
        }
    }

    fn enqueue_ceasefire(&mut self, id: ConflictId) {
        if let Some(ceasefire) = self.conflicts.ceasefire(id).cloned() {
            self.enqueue(PersistOp::SaveCeasefire(ceasefire));
        }
    }

    fn enqueue_audit_tail(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        let start = self.audit.len().saturating_sub(n);
        let tail: Vec<_> = self.audit.entries()[start..].to_vec();
        for entry in tail {
            self.enqueue(PersistOp::SaveAudit(entry));
        }
    }
}

fn no_group(group: GroupId) -> Error {
    demesne_core::Error::NotFound(format!("no group {}", group)).into()
}
