//! Write-behind persistence queue
//!
//! Every committed world mutation enqueues one [`PersistOp`] carrying an
//! owned snapshot of the changed record. `World::flush` drains the queue
//! against the storage backend; a failed op is kept for the next flush and
//! never fails the operation that produced it.

use demesne_core::{
    AuditEntry, Ceasefire, CellCoordinate, ClaimRecord, ConflictId, Group, GroupId,
    PermissionScope, PrincipalId, Raid, Siege, Storage, StorageResult, TemporaryPermission,
    TrustGrant, War,
};

/// One pending storage write or delete
#[derive(Debug, Clone)]
pub enum PersistOp {
    SaveGroup(Group),
    DeleteGroup(String),
    SaveClaim(ClaimRecord),
    DeleteClaim(CellCoordinate),
    SaveScope(CellCoordinate, PermissionScope),
    DeleteScope(CellCoordinate),
    SaveTrust(TrustGrant),
    DeleteTrust(GroupId, PrincipalId),
    SaveTemporary(TemporaryPermission),
    DeleteTemporary(String),
    SaveWar(War),
    SaveSiege(Siege),
    SaveRaid(Raid),
    SaveCeasefire(Ceasefire),
    DeleteWar(ConflictId),
    DeleteSiege(ConflictId),
    DeleteRaid(ConflictId),
    DeleteCeasefire(ConflictId),
    SaveAudit(AuditEntry),
}

impl PersistOp {
    /// Apply this op against a storage backend
    pub fn apply(&self, storage: &dyn Storage) -> StorageResult<()> {
        match self {
            PersistOp::SaveGroup(group) => storage.save_group(group),
            PersistOp::DeleteGroup(name) => storage.delete_group(name),
            PersistOp::SaveClaim(claim) => storage.save_claim(claim),
            PersistOp::DeleteClaim(cell) => storage.delete_claim(cell),
            PersistOp::SaveScope(cell, scope) => storage.save_scope(cell, scope),
            PersistOp::DeleteScope(cell) => storage.delete_scope(cell),
            PersistOp::SaveTrust(trust) => storage.save_trust(trust),
            PersistOp::DeleteTrust(group, principal) => storage.delete_trust(*group, *principal),
            PersistOp::SaveTemporary(temp) => storage.save_temporary(temp),
            PersistOp::DeleteTemporary(key) => storage.delete_temporary(key),
            PersistOp::SaveWar(war) => storage.save_war(war),
            PersistOp::SaveSiege(siege) => storage.save_siege(siege),
            PersistOp::SaveRaid(raid) => storage.save_raid(raid),
            PersistOp::SaveCeasefire(ceasefire) => storage.save_ceasefire(ceasefire),
            PersistOp::DeleteWar(id) => storage.delete_war(*id),
            PersistOp::DeleteSiege(id) => storage.delete_siege(*id),
            PersistOp::DeleteRaid(id) => storage.delete_raid(*id),
            PersistOp::DeleteCeasefire(id) => storage.delete_ceasefire(*id),
            PersistOp::SaveAudit(entry) => storage.save_audit_entry(entry),
        }
    }

    /// Short label for flush-failure logs
    pub fn label(&self) -> &'static str {
        match self {
            PersistOp::SaveGroup(_) => "save_group",
            PersistOp::DeleteGroup(_) => "delete_group",
            PersistOp::SaveClaim(_) => "save_claim",
            PersistOp::DeleteClaim(_) => "delete_claim",
            PersistOp::SaveScope(..) => "save_scope",
            PersistOp::DeleteScope(_) => "delete_scope",
            PersistOp::SaveTrust(_) => "save_trust",
            PersistOp::DeleteTrust(..) => "delete_trust",
            PersistOp::SaveTemporary(_) => "save_temporary",
            PersistOp::DeleteTemporary(_) => "delete_temporary",
            PersistOp::SaveWar(_) => "save_war",
            PersistOp::SaveSiege(_) => "save_siege",
            PersistOp::SaveRaid(_) => "save_raid",
            PersistOp::SaveCeasefire(_) => "save_ceasefire",
            PersistOp::DeleteWar(_) => "delete_war",
            PersistOp::DeleteSiege(_) => "delete_siege",
            PersistOp::DeleteRaid(_) => "delete_raid",
            PersistOp::DeleteCeasefire(_) => "delete_ceasefire",
            PersistOp::SaveAudit(_) => "save_audit",
        }
    }
}
