//! Append-only audit log for permission changes
//!
//! Every mutating permission operation appends exactly one entry before it
//! reports success. Entries are immutable and never deleted by the core;
//! read-side analytics live in the `demesne-audit` crate.

use crate::cell::CellCoordinate;
use crate::identity::{GroupId, PrincipalId};
use crate::permission::Permission;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of change an audit entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditKind {
    /// A player-specific cell override was set
    PlayerOverride,
    /// A player-specific cell override was cleared
    OverrideCleared,
    /// A role override on a cell was set
    RoleOverride,
    /// A cell default was set
    DefaultChanged,
    /// A trust grant was created or widened
    TrustGranted,
    /// A trust grant was revoked
    TrustRevoked,
    /// A temporary permission was granted
    TemporaryGranted,
    /// A temporary permission was purged by the expiry sweep
    TemporaryExpired,
    /// A permission template was applied as a bundle
    TemplateApplied,
    /// A group's permission data was purged on dissolution
    GroupPurged,
}

impl AuditKind {
    /// Stable name used in exports
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditKind::PlayerOverride => "player_override",
            AuditKind::OverrideCleared => "override_cleared",
            AuditKind::RoleOverride => "role_override",
            AuditKind::DefaultChanged => "default_changed",
            AuditKind::TrustGranted => "trust_granted",
            AuditKind::TrustRevoked => "trust_revoked",
            AuditKind::TemporaryGranted => "temporary_granted",
            AuditKind::TemporaryExpired => "temporary_expired",
            AuditKind::TemplateApplied => "template_applied",
            AuditKind::GroupPurged => "group_purged",
        }
    }
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One immutable audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the change happened
    pub at: DateTime<Utc>,
    /// The group whose permission data changed
    pub group: GroupId,
    /// The principal the change is about (grantee, trustee, …)
    pub principal: PrincipalId,
    /// The permission involved, if the change names one
    pub permission: Option<Permission>,
    /// The cell involved, or none for group-wide changes
    pub cell: Option<CellCoordinate>,
    /// What kind of change this is
    pub kind: AuditKind,
    /// The applied modifier: a decision, role, or bundle name
    pub modifier: String,
    /// Free-form reason supplied by the caller
    pub reason: String,
}

/// Append-only change history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry
    pub fn append(&mut self, entry: AuditEntry) {
        self.entries.push(entry);
    }

    /// All entries in append order
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries with `from <= at < to`
    pub fn entries_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Iterator<Item = &AuditEntry> {
        self.entries
            .iter()
            .filter(move |e| e.at >= from && e.at < to)
    }

    /// Entries about one group
    pub fn entries_for_group(&self, group: GroupId) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().filter(move |e| e.group == group)
    }

    /// Entries about one principal
    pub fn entries_for_principal(
        &self,
        principal: PrincipalId,
    ) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().filter(move |e| e.principal == principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(at: DateTime<Utc>, group: u64, kind: AuditKind) -> AuditEntry {
        AuditEntry {
            at,
            group: GroupId::new(group),
            principal: PrincipalId::new(1),
            permission: Some(Permission::Build),
            cell: None,
            kind,
            modifier: "allow".to_string(),
            reason: String::new(),
        }
    }

    #[test]
    fn test_append_order_and_filters() {
        let t0 = Utc::now();
        let mut log = AuditLog::new();
        log.append(entry(t0, 1, AuditKind::PlayerOverride));
        log.append(entry(t0 + Duration::seconds(10), 2, AuditKind::TrustGranted));
        log.append(entry(t0 + Duration::seconds(20), 1, AuditKind::TemporaryExpired));

        assert_eq!(log.len(), 3);
        assert_eq!(log.entries_for_group(GroupId::new(1)).count(), 2);
        assert_eq!(
            log.entries_in_range(t0 + Duration::seconds(5), t0 + Duration::seconds(20))
                .count(),
            1
        );
        // range end is exclusive
        assert_eq!(
            log.entries_in_range(t0, t0 + Duration::seconds(20)).count(),
            2
        );
    }
}
