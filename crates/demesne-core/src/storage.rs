//! Storage seam between the in-memory world and its persistence backend
//!
//! The world is authoritative in memory; storage is a write-behind copy
//! used for recovery. The trait deals in the core's own types so the
//! backend crate owns all serialization concerns.

use crate::audit::AuditEntry;
use crate::cell::CellCoordinate;
use crate::claim::ClaimRecord;
use crate::conflict::{Ceasefire, Raid, Siege, War};
use crate::group::Group;
use crate::identity::{ConflictId, GroupId, PrincipalId};
use crate::scope::{PermissionScope, TemporaryPermission, TrustGrant};

/// Errors surfaced by a storage backend
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backing database rejected or failed an operation
    #[error("storage backend error: {0}")]
    Backend(String),
    /// A record could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Filesystem-level failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Write-behind persistence backend
///
/// Writes happen after the in-memory commit; a failed write is retried by
/// the flush loop and never rolls the world back.
pub trait Storage {
    /// Persist a group, keyed by its unique name
    fn save_group(&self, group: &Group) -> StorageResult<()>;
    /// Remove a group by name
    fn delete_group(&self, name: &str) -> StorageResult<()>;
    /// Load every stored group
    fn load_groups(&self) -> StorageResult<Vec<Group>>;

    /// Persist a claim, keyed by its cell key
    fn save_claim(&self, claim: &ClaimRecord) -> StorageResult<()>;
    /// Remove a claim by cell
    fn delete_claim(&self, cell: &CellCoordinate) -> StorageResult<()>;
    /// Load every stored claim
    fn load_claims(&self) -> StorageResult<Vec<ClaimRecord>>;

    /// Persist a cell's permission scope
    fn save_scope(&self, cell: &CellCoordinate, scope: &PermissionScope) -> StorageResult<()>;
    /// Remove a cell's permission scope
    fn delete_scope(&self, cell: &CellCoordinate) -> StorageResult<()>;
    /// Load every stored scope with its cell
    fn load_scopes(&self) -> StorageResult<Vec<(CellCoordinate, PermissionScope)>>;

    /// Persist a trust grant, keyed by group and principal
    fn save_trust(&self, trust: &TrustGrant) -> StorageResult<()>;
    /// Remove a trust grant
    fn delete_trust(&self, group: GroupId, principal: PrincipalId) -> StorageResult<()>;
    /// Load every stored trust grant
    fn load_trusts(&self) -> StorageResult<Vec<TrustGrant>>;

    /// Persist a temporary permission, keyed by its storage key
    fn save_temporary(&self, temporary: &TemporaryPermission) -> StorageResult<()>;
    /// Remove a temporary permission by storage key
    fn delete_temporary(&self, key: &str) -> StorageResult<()>;
    /// Load every stored temporary permission
    fn load_temporaries(&self) -> StorageResult<Vec<TemporaryPermission>>;

    /// Persist a war
    fn save_war(&self, war: &War) -> StorageResult<()>;
    /// Remove a war
    fn delete_war(&self, id: ConflictId) -> StorageResult<()>;
    /// Load every stored war
    fn load_wars(&self) -> StorageResult<Vec<War>>;

    /// Persist a siege
    fn save_siege(&self, siege: &Siege) -> StorageResult<()>;
    /// Remove a siege
    fn delete_siege(&self, id: ConflictId) -> StorageResult<()>;
    /// Load every stored siege
    fn load_sieges(&self) -> StorageResult<Vec<Siege>>;

    /// Persist a raid
    fn save_raid(&self, raid: &Raid) -> StorageResult<()>;
    /// Remove a raid
    fn delete_raid(&self, id: ConflictId) -> StorageResult<()>;
    /// Load every stored raid
    fn load_raids(&self) -> StorageResult<Vec<Raid>>;

    /// Persist a ceasefire
    fn save_ceasefire(&self, ceasefire: &Ceasefire) -> StorageResult<()>;
    /// Remove a ceasefire
    fn delete_ceasefire(&self, id: ConflictId) -> StorageResult<()>;
    /// Load every stored ceasefire
    fn load_ceasefires(&self) -> StorageResult<Vec<Ceasefire>>;

    /// Append an audit entry
    fn save_audit_entry(&self, entry: &AuditEntry) -> StorageResult<()>;
    /// Load the audit log in append order
    fn load_audit_entries(&self) -> StorageResult<Vec<AuditEntry>>;
}
