//! Group roles and the innate capability table
//!
//! Roles are an ordered rank ladder. What a role may intrinsically do is
//! data: the [`CapabilityTable`] maps each role to a permission set and is
//! consulted as the second-to-last resolution tier, so the ladder itself
//! carries no behavior.

use crate::permission::Permission;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rank within a group
///
/// Variants are declared lowest first so the derived `Ord` ranks
/// `Founder` highest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Role {
    /// Ordinary member
    Member,
    /// Member trusted to build
    Builder,
    /// Member trusted to defend claims
    Guard,
    /// Management rank below the founder
    Officer,
    /// The group's founding principal
    Founder,
}

impl Role {
    /// Stable name used in storage rows and exports
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Builder => "builder",
            Role::Guard => "guard",
            Role::Officer => "officer",
            Role::Founder => "founder",
        }
    }

    /// Parse a stable name back into a role
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "member" => Some(Role::Member),
            "builder" => Some(Role::Builder),
            "guard" => Some(Role::Guard),
            "officer" => Some(Role::Officer),
            "founder" => Some(Role::Founder),
            _ => None,
        }
    }

    /// Whether this role strictly outranks another
    pub fn outranks(&self, other: Role) -> bool {
        *self > other
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Data-driven table of permissions intrinsic to each role
///
/// Consulted by the resolver only after every explicit override has failed
/// to match. The default table encodes the shipped rank ladder; hosts may
/// grant or revoke entries to reshape it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityTable {
    table: IndexMap<Role, IndexSet<Permission>>,
}

impl CapabilityTable {
    /// Create an empty table (no role can do anything intrinsically)
    pub fn empty() -> Self {
        Self {
            table: IndexMap::new(),
        }
    }

    /// Whether `role` intrinsically holds `permission`
    pub fn allows(&self, role: Role, permission: Permission) -> bool {
        self.table
            .get(&role)
            .map(|set| set.contains(&permission) || set.contains(&Permission::All))
            .unwrap_or(false)
    }

    /// Grant an intrinsic permission to a role
    pub fn grant(&mut self, role: Role, permission: Permission) {
        self.table.entry(role).or_default().insert(permission);
    }

    /// Revoke an intrinsic permission from a role
    pub fn revoke(&mut self, role: Role, permission: Permission) -> bool {
        self.table
            .get_mut(&role)
            .map(|set| set.shift_remove(&permission))
            .unwrap_or(false)
    }

    /// The permission set for a role, if any
    pub fn permissions(&self, role: Role) -> Option<&IndexSet<Permission>> {
        self.table.get(&role)
    }
}

impl Default for CapabilityTable {
    fn default() -> Self {
        let mut t = Self::empty();
        t.grant(Role::Founder, Permission::All);
        for p in [
            Permission::Build,
            Permission::Destroy,
            Permission::Interact,
            Permission::Container,
            Permission::ClaimLand,
            Permission::UnclaimLand,
            Permission::ManagePermissions,
            Permission::Invite,
            Permission::Kick,
            Permission::Promote,
            Permission::Withdraw,
            Permission::Deposit,
        ] {
            t.grant(Role::Officer, p);
        }
        for p in [
            Permission::Build,
            Permission::Destroy,
            Permission::Interact,
            Permission::Container,
            Permission::Deposit,
        ] {
            t.grant(Role::Guard, p);
        }
        for p in [
            Permission::Build,
            Permission::Destroy,
            Permission::Interact,
            Permission::Deposit,
        ] {
            t.grant(Role::Builder, p);
        }
        for p in [Permission::Interact, Permission::Deposit] {
            t.grant(Role::Member, p);
        }
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Founder.outranks(Role::Officer));
        assert!(Role::Officer.outranks(Role::Guard));
        assert!(Role::Guard.outranks(Role::Builder));
        assert!(Role::Builder.outranks(Role::Member));
        assert!(!Role::Member.outranks(Role::Member));
    }

    #[test]
    fn test_default_table() {
        let t = CapabilityTable::default();
        // founder's All matches everything
        assert!(t.allows(Role::Founder, Permission::DeclareWar));
        assert!(t.allows(Role::Officer, Permission::ManagePermissions));
        assert!(!t.allows(Role::Officer, Permission::DeclareWar));
        assert!(t.allows(Role::Member, Permission::Interact));
        assert!(!t.allows(Role::Member, Permission::Build));
    }

    #[test]
    fn test_grant_revoke() {
        let mut t = CapabilityTable::empty();
        assert!(!t.allows(Role::Member, Permission::Build));
        t.grant(Role::Member, Permission::Build);
        assert!(t.allows(Role::Member, Permission::Build));
        assert!(t.revoke(Role::Member, Permission::Build));
        assert!(!t.allows(Role::Member, Permission::Build));
        assert!(!t.revoke(Role::Member, Permission::Build));
    }
}
