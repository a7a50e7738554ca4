//! Permission resolution engine
//!
//! [`PermissionResolver::evaluate`] walks a strict precedence chain, first
//! match wins:
//!
//! 1. Unexpired temporary permission for the actor and cell
//! 2. Cell-level player-specific override
//! 3. Cell-level role override for the actor's role in the owning group
//! 4. Cell-level default flag for the permission
//! 5. Trust grant against the owning group, non-members only
//! 6. The actor's innate role capability table
//! 7. Deny
//!
//! Resolution is a pure function of the scope data: the same inputs always
//! produce the same decision, and denial is a value, never an error. Every
//! mutating operation appends exactly one audit entry before returning.

use crate::audit::{AuditEntry, AuditKind, AuditLog};
use crate::cell::CellCoordinate;
use crate::error::{Error, Result};
use crate::group::GroupRegistry;
use crate::identity::{GroupId, PrincipalId};
use crate::permission::{Decision, Permission};
use crate::role::{CapabilityTable, Role};
use crate::scope::{PermissionScope, PermissionTemplate, TemporaryPermission, TrustGrant};
use crate::territory::TerritoryStore;
use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};

/// Read-only state the resolver consults during evaluation
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Cell ownership
    pub territory: &'a TerritoryStore,
    /// Group rosters
    pub groups: &'a GroupRegistry,
    /// Innate role capabilities, the final fallback tier
    pub capabilities: &'a CapabilityTable,
}

/// Target of a template application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateTarget {
    /// Apply the bundle as role overrides
    Role(Role),
    /// Apply the bundle as player overrides
    Player(PrincipalId),
}

/// Multi-tier, expiring, auditable access control per cell and per group
#[derive(Debug, Clone, Default)]
pub struct PermissionResolver {
    scopes: IndexMap<CellCoordinate, PermissionScope>,
    trusts: IndexMap<(GroupId, PrincipalId), TrustGrant>,
    temporaries: Vec<TemporaryPermission>,
    templates: IndexMap<String, PermissionTemplate>,
}

impl PermissionResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether `actor` may perform `permission` in `cell`
    ///
    /// Expired temporaries are dead on the read path regardless of whether
    /// the sweep has purged them yet. Unowned cells are unregulated: only
    /// tier 1 applies, then the action is allowed.
    pub fn evaluate(
        &self,
        ctx: &ResolveContext<'_>,
        actor: PrincipalId,
        permission: Permission,
        cell: &CellCoordinate,
        now: DateTime<Utc>,
    ) -> Decision {
        // tier 1: temporary grants, explicit allow or deny short-circuits
        if let Some(temp) = self.temporaries.iter().find(|t| {
            t.principal == actor
                && t.permission == permission
                && !t.is_expired(now)
                && t.applies_to(cell)
        }) {
            return temp.decision;
        }

        let Some(owner) = ctx.territory.owner_of(cell) else {
            return Decision::Allow;
        };
        let scope = self.scopes.get(cell);
        let role = ctx
            .groups
            .get(owner)
            .and_then(|group| group.role_of(actor));

        // tier 2: player-specific cell override
        if let Some(decision) = scope.and_then(|s| s.player_override(actor, permission)) {
            return decision;
        }

        // tier 3: role override within the owning group
        if let (Some(s), Some(role)) = (scope, role) {
            if let Some(decision) = s.role_override(role, permission) {
                return decision;
            }
        }

        // tier 4: cell default
        if let Some(decision) = scope.and_then(|s| s.default_for(permission)) {
            return decision;
        }

        // tier 5: trust, for non-members only
        if role.is_none() {
            if let Some(trust) = self.trusts.get(&(owner, actor)) {
                if trust.covers(permission) {
                    return Decision::Allow;
                }
            }
        }

        // tier 6: innate role capabilities
        if let Some(role) = role {
            if ctx.capabilities.allows(role, permission) {
                return Decision::Allow;
            }
        }

        // tier 7
        Decision::Deny
    }

    /// Set a player-specific override on a cell
    pub fn set_player_override(
        &mut self,
        group: GroupId,
        cell: CellCoordinate,
        principal: PrincipalId,
        permission: Permission,
        decision: Decision,
        granted_by: PrincipalId,
        reason: impl Into<String>,
        now: DateTime<Utc>,
        audit: &mut AuditLog,
    ) {
        self.scopes
            .entry(cell.clone())
            .or_default()
            .player_overrides
            .entry(principal)
            .or_default()
            .insert(permission, decision);
        audit.append(AuditEntry {
            at: now,
            group,
            principal,
            permission: Some(permission),
            cell: Some(cell),
            kind: AuditKind::PlayerOverride,
            modifier: format!("{} by {}", decision, granted_by),
            reason: reason.into(),
        });
    }

    /// Clear a player-specific override on a cell
    pub fn clear_player_override(
        &mut self,
        group: GroupId,
        cell: &CellCoordinate,
        principal: PrincipalId,
        permission: Permission,
        cleared_by: PrincipalId,
        now: DateTime<Utc>,
        audit: &mut AuditLog,
    ) -> Result<()> {
        let removed = self
            .scopes
            .get_mut(cell)
            .and_then(|s| s.player_overrides.get_mut(&principal))
            .and_then(|m| m.shift_remove(&permission));
        if removed.is_none() {
            return Err(Error::NotFound(format!(
                "no override for {} on {} in cell {}",
                permission, principal, cell
            )));
        }
        audit.append(AuditEntry {
            at: now,
            group,
            principal,
            permission: Some(permission),
            cell: Some(cell.clone()),
            kind: AuditKind::OverrideCleared,
            modifier: cleared_by.to_string(),
            reason: String::new(),
        });
        Ok(())
    }

    /// Set a role override on a cell
    pub fn set_role_override(
        &mut self,
        group: GroupId,
        cell: CellCoordinate,
        role: Role,
        permission: Permission,
        decision: Decision,
        granted_by: PrincipalId,
        now: DateTime<Utc>,
        audit: &mut AuditLog,
    ) {
        self.scopes
            .entry(cell.clone())
            .or_default()
            .role_overrides
            .entry(role)
            .or_default()
            .insert(permission, decision);
        audit.append(AuditEntry {
            at: now,
            group,
            principal: granted_by,
            permission: Some(permission),
            cell: Some(cell),
            kind: AuditKind::RoleOverride,
            modifier: format!("{}={}", role, decision),
            reason: String::new(),
        });
    }

    /// Set a cell default for a permission
    pub fn set_cell_default(
        &mut self,
        group: GroupId,
        cell: CellCoordinate,
        permission: Permission,
        decision: Decision,
        set_by: PrincipalId,
        now: DateTime<Utc>,
        audit: &mut AuditLog,
    ) {
        self.scopes
            .entry(cell.clone())
            .or_default()
            .defaults
            .insert(permission, decision);
        audit.append(AuditEntry {
            at: now,
            group,
            principal: set_by,
            permission: Some(permission),
            cell: Some(cell),
            kind: AuditKind::DefaultChanged,
            modifier: decision.as_str().to_string(),
            reason: String::new(),
        });
    }

    /// Grant or widen a group-wide trust for an external principal
    pub fn grant_trust(
        &mut self,
        group: GroupId,
        principal: PrincipalId,
        permissions: impl IntoIterator<Item = Permission>,
        granted_by: PrincipalId,
        now: DateTime<Utc>,
        audit: &mut AuditLog,
    ) {
        let permissions: IndexSet<Permission> = permissions.into_iter().collect();
        let names: Vec<&str> = permissions.iter().map(Permission::as_str).collect();
        let entry = self
            .trusts
            .entry((group, principal))
            .or_insert_with(|| TrustGrant {
                group,
                principal,
                permissions: IndexSet::new(),
                granted_at: now,
                granted_by,
            });
        entry.permissions.extend(permissions);
        audit.append(AuditEntry {
            at: now,
            group,
            principal,
            permission: None,
            cell: None,
            kind: AuditKind::TrustGranted,
            modifier: names.join(","),
            reason: String::new(),
        });
    }

    /// Revoke a trust grant entirely
    pub fn revoke_trust(
        &mut self,
        group: GroupId,
        principal: PrincipalId,
        revoked_by: PrincipalId,
        now: DateTime<Utc>,
        audit: &mut AuditLog,
    ) -> Result<()> {
        if self.trusts.shift_remove(&(group, principal)).is_none() {
            return Err(Error::NotFound(format!(
                "no trust for {} in {}",
                principal, group
            )));
        }
        audit.append(AuditEntry {
            at: now,
            group,
            principal,
            permission: None,
            cell: None,
            kind: AuditKind::TrustRevoked,
            modifier: revoked_by.to_string(),
            reason: String::new(),
        });
        Ok(())
    }

    /// Grant a self-expiring permission
    pub fn grant_temporary(
        &mut self,
        group: GroupId,
        principal: PrincipalId,
        permission: Permission,
        cell: Option<CellCoordinate>,
        decision: Decision,
        expires_at: DateTime<Utc>,
        granted_by: PrincipalId,
        now: DateTime<Utc>,
        audit: &mut AuditLog,
    ) -> Result<()> {
        if expires_at <= now {
            return Err(Error::Validation(
                "temporary permission must expire in the future".to_string(),
            ));
        }
        self.temporaries.push(TemporaryPermission {
            group,
            principal,
            permission,
            cell: cell.clone(),
            decision,
            expires_at,
            granted_by,
        });
        audit.append(AuditEntry {
            at: now,
            group,
            principal,
            permission: Some(permission),
            cell,
            kind: AuditKind::TemporaryGranted,
            modifier: decision.as_str().to_string(),
            reason: format!("expires {}", expires_at.to_rfc3339()),
        });
        Ok(())
    }

    /// Define or replace a named permission template
    pub fn define_template(&mut self, template: PermissionTemplate) {
        self.templates.insert(template.name.clone(), template);
    }

    /// Remove a named template
    pub fn remove_template(&mut self, name: &str) -> Result<()> {
        self.templates
            .shift_remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("no template named {}", name)))
    }

    /// Look up a template by name
    pub fn template(&self, name: &str) -> Option<&PermissionTemplate> {
        self.templates.get(name)
    }

    /// Apply a template's bundle to a role or player on one cell
    ///
    /// Writes one allow override per bundled permission but appends a
    /// single audit entry for the whole application, keeping the log
    /// proportionate to operations rather than bundle size.
    pub fn apply_template(
        &mut self,
        group: GroupId,
        cell: CellCoordinate,
        target: TemplateTarget,
        template_name: &str,
        applied_by: PrincipalId,
        now: DateTime<Utc>,
        audit: &mut AuditLog,
    ) -> Result<usize> {
        let template = self
            .templates
            .get(template_name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("no template named {}", template_name)))?;
        let scope = self.scopes.entry(cell.clone()).or_default();
        for permission in &template.permissions {
            match target {
                TemplateTarget::Role(role) => {
                    scope
                        .role_overrides
                        .entry(role)
                        .or_default()
                        .insert(*permission, Decision::Allow);
                }
                TemplateTarget::Player(principal) => {
                    scope
                        .player_overrides
                        .entry(principal)
                        .or_default()
                        .insert(*permission, Decision::Allow);
                }
            }
        }
        let (principal, modifier) = match target {
            TemplateTarget::Role(role) => (applied_by, format!("{}>{}", template.name, role)),
            TemplateTarget::Player(principal) => (principal, template.name.clone()),
        };
        audit.append(AuditEntry {
            at: now,
            group,
            principal,
            permission: None,
            cell: Some(cell),
            kind: AuditKind::TemplateApplied,
            modifier,
            reason: String::new(),
        });
        Ok(template.permissions.len())
    }

    /// Physically purge expired temporaries, one audit entry per purge
    ///
    /// Reads already ignore expired grants; this sweep reclaims the records
    /// and leaves the trace the lazy check cannot.
    pub fn sweep_expired(&mut self, now: DateTime<Utc>, audit: &mut AuditLog) -> usize {
        let mut purged = 0;
        self.temporaries.retain(|temp| {
            if temp.is_expired(now) {
                audit.append(AuditEntry {
                    at: now,
                    group: temp.group,
                    principal: temp.principal,
                    permission: Some(temp.permission),
                    cell: temp.cell.clone(),
                    kind: AuditKind::TemporaryExpired,
                    modifier: temp.decision.as_str().to_string(),
                    reason: format!("expired {}", temp.expires_at.to_rfc3339()),
                });
                purged += 1;
                false
            } else {
                true
            }
        });
        purged
    }

    /// Cascade deletion of a dissolved group's permission data
    ///
    /// Removes the scopes of every released cell plus the group's trusts
    /// and temporaries, then appends a single dissolution entry.
    pub fn purge_group(
        &mut self,
        group: GroupId,
        released_cells: &[CellCoordinate],
        dissolved_by: PrincipalId,
        now: DateTime<Utc>,
        audit: &mut AuditLog,
    ) {
        for cell in released_cells {
            self.scopes.shift_remove(cell);
        }
        self.trusts.retain(|(g, _), _| *g != group);
        self.temporaries.retain(|t| t.group != group);
        audit.append(AuditEntry {
            at: now,
            group,
            principal: dissolved_by,
            permission: None,
            cell: None,
            kind: AuditKind::GroupPurged,
            modifier: released_cells.len().to_string(),
            reason: String::new(),
        });
    }

    /// Drop a cell's scope when the cell is released back to wilderness
    ///
    /// Cascade of a territory operation, not a permission change, so no
    /// audit entry is appended here.
    pub fn remove_scope(&mut self, cell: &CellCoordinate) -> Option<PermissionScope> {
        self.scopes.shift_remove(cell)
    }

    /// Iterate all cell scopes
    pub fn scopes(&self) -> impl Iterator<Item = (&CellCoordinate, &PermissionScope)> {
        self.scopes.iter()
    }

    /// Iterate all trust grants
    pub fn trusts(&self) -> impl Iterator<Item = &TrustGrant> {
        self.trusts.values()
    }

    /// Iterate all (possibly expired) temporary permissions
    pub fn temporaries(&self) -> impl Iterator<Item = &TemporaryPermission> {
        self.temporaries.iter()
    }

    /// Iterate all templates
    pub fn templates(&self) -> impl Iterator<Item = &PermissionTemplate> {
        self.templates.values()
    }

    /// Re-insert a loaded scope, used when booting from storage
    pub fn restore_scope(&mut self, cell: CellCoordinate, scope: PermissionScope) {
        self.scopes.insert(cell, scope);
    }

    /// Re-insert a loaded trust, used when booting from storage
    pub fn restore_trust(&mut self, trust: TrustGrant) {
        self.trusts.insert((trust.group, trust.principal), trust);
    }

    /// Re-insert a loaded temporary, used when booting from storage
    pub fn restore_temporary(&mut self, temp: TemporaryPermission) {
        self.temporaries.push(temp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Principal;
    use chrono::Duration;

    struct Fixture {
        territory: TerritoryStore,
        groups: GroupRegistry,
        capabilities: CapabilityTable,
        resolver: PermissionResolver,
        audit: AuditLog,
        group: GroupId,
        now: DateTime<Utc>,
    }

    const FOUNDER: PrincipalId = PrincipalId(1);
    const MEMBER: PrincipalId = PrincipalId(2);
    const OUTSIDER: PrincipalId = PrincipalId(9);

    fn cell(x: i64, y: i64) -> CellCoordinate {
        CellCoordinate::new("w", x, y)
    }

    fn fixture() -> Fixture {
        let now = Utc::now();
        let mut groups = GroupRegistry::new();
        let group = groups
            .create("Avalon", &Principal::new(FOUNDER.raw(), "alice"), now)
            .unwrap();
        groups
            .get_mut(group)
            .unwrap()
            .add_member(MEMBER, Role::Member)
            .unwrap();
        let mut territory = TerritoryStore::new();
        territory.claim(group, 15, cell(0, 0), now).unwrap();
        Fixture {
            territory,
            groups,
            capabilities: CapabilityTable::default(),
            resolver: PermissionResolver::new(),
            audit: AuditLog::new(),
            group,
            now,
        }
    }

    impl Fixture {
        fn ctx(&self) -> ResolveContext<'_> {
            ResolveContext {
                territory: &self.territory,
                groups: &self.groups,
                capabilities: &self.capabilities,
            }
        }

        fn eval(&self, actor: PrincipalId, permission: Permission) -> Decision {
            self.resolver
                .evaluate(&self.ctx(), actor, permission, &cell(0, 0), self.now)
        }
    }

    #[test]
    fn test_default_deny_for_outsiders() {
        let f = fixture();
        assert_eq!(f.eval(OUTSIDER, Permission::Build), Decision::Deny);
    }

    #[test]
    fn test_innate_role_tier() {
        let f = fixture();
        // member's innate table allows interact but not build
        assert_eq!(f.eval(MEMBER, Permission::Interact), Decision::Allow);
        assert_eq!(f.eval(MEMBER, Permission::Build), Decision::Deny);
        // founder's All
        assert_eq!(f.eval(FOUNDER, Permission::DeclareWar), Decision::Allow);
    }

    #[test]
    fn test_wilderness_is_unregulated() {
        let f = fixture();
        let decision =
            f.resolver
                .evaluate(&f.ctx(), OUTSIDER, Permission::Build, &cell(99, 99), f.now);
        assert_eq!(decision, Decision::Allow);
    }

    #[test]
    fn test_player_override_beats_role_and_default() {
        let mut f = fixture();
        let g = f.group;
        f.resolver.set_cell_default(
            g,
            cell(0, 0),
            Permission::Interact,
            Decision::Allow,
            FOUNDER,
            f.now,
            &mut f.audit,
        );
        f.resolver.set_player_override(
            g,
            cell(0, 0),
            MEMBER,
            Permission::Interact,
            Decision::Deny,
            FOUNDER,
            "griefing",
            f.now,
            &mut f.audit,
        );
        assert_eq!(f.eval(MEMBER, Permission::Interact), Decision::Deny);
        // other members still get the default
        assert_eq!(f.eval(OUTSIDER, Permission::Interact), Decision::Allow);
    }

    #[test]
    fn test_role_override_beats_default_and_innate() {
        let mut f = fixture();
        let g = f.group;
        f.resolver.set_cell_default(
            g,
            cell(0, 0),
            Permission::Build,
            Decision::Allow,
            FOUNDER,
            f.now,
            &mut f.audit,
        );
        f.resolver.set_role_override(
            g,
            cell(0, 0),
            Role::Member,
            Permission::Build,
            Decision::Deny,
            FOUNDER,
            f.now,
            &mut f.audit,
        );
        assert_eq!(f.eval(MEMBER, Permission::Build), Decision::Deny);
        // non-members have no role, so the default applies to them
        assert_eq!(f.eval(OUTSIDER, Permission::Build), Decision::Allow);
    }

    #[test]
    fn test_trust_applies_to_non_members_only() {
        let mut f = fixture();
        let g = f.group;
        f.resolver.grant_trust(
            g,
            OUTSIDER,
            [Permission::Build],
            FOUNDER,
            f.now,
            &mut f.audit,
        );
        assert_eq!(f.eval(OUTSIDER, Permission::Build), Decision::Allow);
        assert_eq!(f.eval(OUTSIDER, Permission::Destroy), Decision::Deny);

        // the same grant for a member is ignored; their denied innate
        // permission stays denied
        f.resolver.grant_trust(
            g,
            MEMBER,
            [Permission::Build],
            FOUNDER,
            f.now,
            &mut f.audit,
        );
        assert_eq!(f.eval(MEMBER, Permission::Build), Decision::Deny);
    }

    #[test]
    fn test_temporary_beats_every_tier_and_expires() {
        let mut f = fixture();
        let g = f.group;
        f.resolver.set_player_override(
            g,
            cell(0, 0),
            MEMBER,
            Permission::Build,
            Decision::Deny,
            FOUNDER,
            "",
            f.now,
            &mut f.audit,
        );
        f.resolver
            .grant_temporary(
                g,
                MEMBER,
                Permission::Build,
                Some(cell(0, 0)),
                Decision::Allow,
                f.now + Duration::seconds(60),
                FOUNDER,
                f.now,
                &mut f.audit,
            )
            .unwrap();

        let at = |secs: i64| {
            f.resolver
                .evaluate(&f.ctx(), MEMBER, Permission::Build, &cell(0, 0), f.now + Duration::seconds(secs))
        };
        assert_eq!(at(30), Decision::Allow);
        // at t=61 the grant is dead on read, the chain falls through to the
        // player override exactly as if the grant had never existed
        assert_eq!(at(61), Decision::Deny);
    }

    #[test]
    fn test_temporary_cell_scoping() {
        let mut f = fixture();
        let g = f.group;
        f.territory.claim(g, 15, cell(1, 0), f.now).unwrap();
        f.resolver
            .grant_temporary(
                g,
                OUTSIDER,
                Permission::Build,
                Some(cell(0, 0)),
                Decision::Allow,
                f.now + Duration::seconds(60),
                FOUNDER,
                f.now,
                &mut f.audit,
            )
            .unwrap();
        assert_eq!(f.eval(OUTSIDER, Permission::Build), Decision::Allow);
        let elsewhere =
            f.resolver
                .evaluate(&f.ctx(), OUTSIDER, Permission::Build, &cell(1, 0), f.now);
        assert_eq!(elsewhere, Decision::Deny);
    }

    #[test]
    fn test_evaluate_is_pure() {
        let f = fixture();
        let first = f.eval(MEMBER, Permission::Interact);
        let second = f.eval(MEMBER, Permission::Interact);
        assert_eq!(first, second);
    }

    #[test]
    fn test_each_mutation_appends_one_entry() {
        let mut f = fixture();
        let g = f.group;
        f.resolver.set_player_override(
            g,
            cell(0, 0),
            MEMBER,
            Permission::Build,
            Decision::Allow,
            FOUNDER,
            "",
            f.now,
            &mut f.audit,
        );
        assert_eq!(f.audit.len(), 1);
        f.resolver.grant_trust(g, OUTSIDER, [Permission::All], FOUNDER, f.now, &mut f.audit);
        assert_eq!(f.audit.len(), 2);
        f.resolver
            .revoke_trust(g, OUTSIDER, FOUNDER, f.now, &mut f.audit)
            .unwrap();
        assert_eq!(f.audit.len(), 3);
        assert!(f
            .resolver
            .revoke_trust(g, OUTSIDER, FOUNDER, f.now, &mut f.audit)
            .is_err());
        // failed revoke appends nothing
        assert_eq!(f.audit.len(), 3);
    }

    #[test]
    fn test_template_bundle_single_audit_entry() {
        let mut f = fixture();
        let g = f.group;
        f.resolver.define_template(PermissionTemplate::new(
            "builder_kit",
            [Permission::Build, Permission::Destroy, Permission::Interact],
        ));
        let applied = f
            .resolver
            .apply_template(
                g,
                cell(0, 0),
                TemplateTarget::Player(OUTSIDER),
                "builder_kit",
                FOUNDER,
                f.now,
                &mut f.audit,
            )
            .unwrap();
        assert_eq!(applied, 3);
        // three overrides, one audit entry
        assert_eq!(f.audit.len(), 1);
        assert_eq!(f.audit.entries()[0].kind, AuditKind::TemplateApplied);
        assert_eq!(f.eval(OUTSIDER, Permission::Destroy), Decision::Allow);

        assert!(f
            .resolver
            .apply_template(
                g,
                cell(0, 0),
                TemplateTarget::Role(Role::Member),
                "missing",
                FOUNDER,
                f.now,
                &mut f.audit,
            )
            .is_err());
    }

    #[test]
    fn test_sweep_purges_and_audits_per_purge() {
        let mut f = fixture();
        let g = f.group;
        for (i, secs) in [(0u64, 10i64), (1, 20), (2, 300)] {
            f.resolver
                .grant_temporary(
                    g,
                    PrincipalId::new(100 + i as u64),
                    Permission::Build,
                    None,
                    Decision::Allow,
                    f.now + Duration::seconds(secs),
                    FOUNDER,
                    f.now,
                    &mut f.audit,
                )
                .unwrap();
        }
        let before = f.audit.len();
        let purged = f
            .resolver
            .sweep_expired(f.now + Duration::seconds(60), &mut f.audit);
        assert_eq!(purged, 2);
        assert_eq!(f.audit.len(), before + 2);
        assert!(f
            .audit
            .entries()
            .iter()
            .rev()
            .take(2)
            .all(|e| e.kind == AuditKind::TemporaryExpired));
        assert_eq!(f.resolver.temporaries().count(), 1);
    }

    #[test]
    fn test_purge_group_cascades() {
        let mut f = fixture();
        let g = f.group;
        f.resolver.set_cell_default(
            g,
            cell(0, 0),
            Permission::Build,
            Decision::Allow,
            FOUNDER,
            f.now,
            &mut f.audit,
        );
        f.resolver.grant_trust(g, OUTSIDER, [Permission::All], FOUNDER, f.now, &mut f.audit);
        f.resolver
            .grant_temporary(
                g,
                OUTSIDER,
                Permission::Build,
                None,
                Decision::Allow,
                f.now + Duration::seconds(600),
                FOUNDER,
                f.now,
                &mut f.audit,
            )
            .unwrap();

        f.resolver
            .purge_group(g, &[cell(0, 0)], FOUNDER, f.now, &mut f.audit);
        assert_eq!(f.resolver.scopes().count(), 0);
        assert_eq!(f.resolver.trusts().count(), 0);
        assert_eq!(f.resolver.temporaries().count(), 0);
        assert_eq!(
            f.audit.entries().last().unwrap().kind,
            AuditKind::GroupPurged
        );
    }
}
