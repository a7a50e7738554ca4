//! Permission scope data: overrides, trusts, temporaries, and templates

use crate::cell::CellCoordinate;
use crate::identity::{GroupId, PrincipalId};
use crate::permission::{Decision, Permission};
use crate::role::Role;
use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Per-cell access-control overrides
///
/// Mutated only through the resolver, which gates callers on management
/// capability and appends audit entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionScope {
    /// Player-specific overrides, keyed by principal then permission
    pub player_overrides: IndexMap<PrincipalId, IndexMap<Permission, Decision>>,
    /// Role overrides within the owning group
    pub role_overrides: IndexMap<Role, IndexMap<Permission, Decision>>,
    /// Default allow/deny flags per permission
    pub defaults: IndexMap<Permission, Decision>,
}

impl PermissionScope {
    /// Create an empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// The player-specific override for a principal and permission
    pub fn player_override(
        &self,
        principal: PrincipalId,
        permission: Permission,
    ) -> Option<Decision> {
        self.player_overrides
            .get(&principal)
            .and_then(|m| m.get(&permission))
            .copied()
    }

    /// The role override for a role and permission
    pub fn role_override(&self, role: Role, permission: Permission) -> Option<Decision> {
        self.role_overrides
            .get(&role)
            .and_then(|m| m.get(&permission))
            .copied()
    }

    /// The cell default for a permission
    pub fn default_for(&self, permission: Permission) -> Option<Decision> {
        self.defaults.get(&permission).copied()
    }

    /// Whether the scope holds no overrides at all
    pub fn is_empty(&self) -> bool {
        self.player_overrides.is_empty()
            && self.role_overrides.is_empty()
            && self.defaults.is_empty()
    }
}

/// Group-wide grant of named permissions to a non-member principal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustGrant {
    /// The granting group
    pub group: GroupId,
    /// The trusted external principal
    pub principal: PrincipalId,
    /// Granted permissions; `All` matches everything
    pub permissions: IndexSet<Permission>,
    /// When the trust was first granted
    pub granted_at: DateTime<Utc>,
    /// Who granted it
    pub granted_by: PrincipalId,
}

impl TrustGrant {
    /// Whether this trust covers a permission
    pub fn covers(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission) || self.permissions.contains(&Permission::All)
    }
}

/// Self-expiring grant or denial for one principal
///
/// Scoped to a single cell when `cell` is set, otherwise group-wide.
/// Never treated as valid once `now >= expires_at`; a periodic sweep
/// physically purges expired records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporaryPermission {
    /// The granting group
    pub group: GroupId,
    /// The affected principal
    pub principal: PrincipalId,
    /// The permission granted or denied
    pub permission: Permission,
    /// Limiting cell, or `None` for group-wide
    pub cell: Option<CellCoordinate>,
    /// Explicit allow or deny; both short-circuit resolution
    pub decision: Decision,
    /// Expiry timestamp
    pub expires_at: DateTime<Utc>,
    /// Who granted it
    pub granted_by: PrincipalId,
}

impl TemporaryPermission {
    /// Whether the grant has expired
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the grant applies in a given cell
    pub fn applies_to(&self, cell: &CellCoordinate) -> bool {
        match &self.cell {
            Some(scoped) => scoped == cell,
            None => true,
        }
    }

    /// Storage key in `group:principal:permission:cellKey` form
    pub fn storage_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.group.raw(),
            self.principal.raw(),
            self.permission,
            self.cell.as_ref().map(CellCoordinate::key).unwrap_or_else(|| "-".to_string())
        )
    }
}

/// Named bundle of permissions applied in one operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionTemplate {
    /// Unique template name
    pub name: String,
    /// The bundled permissions
    pub permissions: IndexSet<Permission>,
}

impl PermissionTemplate {
    /// Create a template
    pub fn new(name: impl Into<String>, permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            name: name.into(),
            permissions: permissions.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_scope_lookups() {
        let mut scope = PermissionScope::new();
        assert!(scope.is_empty());
        scope
            .player_overrides
            .entry(PrincipalId::new(1))
            .or_default()
            .insert(Permission::Build, Decision::Deny);
        scope
            .role_overrides
            .entry(Role::Member)
            .or_default()
            .insert(Permission::Container, Decision::Allow);
        scope.defaults.insert(Permission::Interact, Decision::Allow);

        assert_eq!(
            scope.player_override(PrincipalId::new(1), Permission::Build),
            Some(Decision::Deny)
        );
        assert_eq!(scope.player_override(PrincipalId::new(1), Permission::Destroy), None);
        assert_eq!(
            scope.role_override(Role::Member, Permission::Container),
            Some(Decision::Allow)
        );
        assert_eq!(scope.default_for(Permission::Interact), Some(Decision::Allow));
        assert!(!scope.is_empty());
    }

    #[test]
    fn test_trust_all_catch_all() {
        let trust = TrustGrant {
            group: GroupId::new(1),
            principal: PrincipalId::new(9),
            permissions: [Permission::All].into_iter().collect(),
            granted_at: Utc::now(),
            granted_by: PrincipalId::new(1),
        };
        assert!(trust.covers(Permission::Build));
        assert!(trust.covers(Permission::DeclareWar));
    }

    #[test]
    fn test_temporary_expiry_and_cell_scope() {
        let now = Utc::now();
        let cell = CellCoordinate::new("w", 0, 0);
        let temp = TemporaryPermission {
            group: GroupId::new(1),
            principal: PrincipalId::new(9),
            permission: Permission::Build,
            cell: Some(cell.clone()),
            decision: Decision::Allow,
            expires_at: now + Duration::seconds(60),
            granted_by: PrincipalId::new(1),
        };
        assert!(!temp.is_expired(now + Duration::seconds(30)));
        // expiry boundary is inclusive
        assert!(temp.is_expired(now + Duration::seconds(60)));
        assert!(temp.applies_to(&cell));
        assert!(!temp.applies_to(&CellCoordinate::new("w", 1, 0)));
        assert_eq!(temp.storage_key(), "1:9:build:w:0:0");
    }
}
