//! Named permissions and resolution decisions

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named permission checked before a principal may act in a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// Place blocks or structures
    Build,
    /// Break blocks or structures
    Destroy,
    /// Use doors, levers, and other interactables
    Interact,
    /// Open chests and other containers
    Container,
    /// Claim land for the group
    ClaimLand,
    /// Release land owned by the group
    UnclaimLand,
    /// Edit permission scopes, trusts, and templates
    ManagePermissions,
    /// Invite a principal into the group
    Invite,
    /// Remove a member from the group
    Kick,
    /// Change a member's role
    Promote,
    /// Take from the group treasury
    Withdraw,
    /// Pay into the group treasury
    Deposit,
    /// Open a war against another group
    DeclareWar,
    /// Catch-all; matches every permission in trust grants and role tables
    All,
}

impl Permission {
    /// Stable name used in storage rows and exports
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Build => "build",
            Permission::Destroy => "destroy",
            Permission::Interact => "interact",
            Permission::Container => "container",
            Permission::ClaimLand => "claim_land",
            Permission::UnclaimLand => "unclaim_land",
            Permission::ManagePermissions => "manage_permissions",
            Permission::Invite => "invite",
            Permission::Kick => "kick",
            Permission::Promote => "promote",
            Permission::Withdraw => "withdraw",
            Permission::Deposit => "deposit",
            Permission::DeclareWar => "declare_war",
            Permission::All => "all",
        }
    }

    /// Parse a stable name back into a permission
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "build" => Some(Permission::Build),
            "destroy" => Some(Permission::Destroy),
            "interact" => Some(Permission::Interact),
            "container" => Some(Permission::Container),
            "claim_land" => Some(Permission::ClaimLand),
            "unclaim_land" => Some(Permission::UnclaimLand),
            "manage_permissions" => Some(Permission::ManagePermissions),
            "invite" => Some(Permission::Invite),
            "kick" => Some(Permission::Kick),
            "promote" => Some(Permission::Promote),
            "withdraw" => Some(Permission::Withdraw),
            "deposit" => Some(Permission::Deposit),
            "declare_war" => Some(Permission::DeclareWar),
            "all" => Some(Permission::All),
            _ => None,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a permission resolution
///
/// Denial is a value, never an error: the resolver is deterministic and
/// total over its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    /// The action may proceed
    Allow,
    /// The action is refused
    Deny,
}

impl Decision {
    /// Whether this decision permits the action
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Stable name used in audit entries
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Deny => "deny",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_names_round_trip() {
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
            Permission::DeclareWar,
            Permission::All,
        ] {
            assert_eq!(Permission::parse(p.as_str()), Some(p));
        }
        assert_eq!(Permission::parse("fly"), None);
    }

    #[test]
    fn test_decision() {
        assert!(Decision::Allow.is_allow());
        assert!(!Decision::Deny.is_allow());
        assert_eq!(Decision::Deny.as_str(), "deny");
    }
}
