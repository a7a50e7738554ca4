//! Database store wrapper.

use crate::error::{Error, Result};
use crate::models::*;
use demesne_core::{
    AuditEntry, Ceasefire, CellCoordinate, ClaimRecord, ConflictId, Group, GroupId,
    PermissionScope, PrincipalId, Raid, Siege, Storage, StorageResult, TemporaryPermission,
    TrustGrant, War,
};
use native_db::*;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;

// Static models for the database
static MODELS: LazyLock<Models> = LazyLock::new(|| {
    let mut models = Models::new();
    models.define::<StoredGroup>().unwrap();
    models.define::<StoredClaim>().unwrap();
    models.define::<StoredScope>().unwrap();
    models.define::<StoredTrust>().unwrap();
    models.define::<StoredTemporary>().unwrap();
    models.define::<StoredWar>().unwrap();
    models.define::<StoredSiege>().unwrap();
    models.define::<StoredRaid>().unwrap();
    models.define::<StoredCeasefire>().unwrap();
    models.define::<StoredAuditEntry>().unwrap();
    models
});

/// Database store for persistent world state.
///
/// Implements the engine's [`Storage`] trait over `native_db`. Each write
/// is its own transaction; the engine expects at-least-once semantics and
/// no cross-entity transactions.
pub struct Store {
    pub(crate) db: Database<'static>,
    audit_seq: AtomicU64,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new()
            .create(&MODELS, path.as_ref())
            .map_err(|e| Error::Database(e.to_string()))?;
        Self::with_db(db)
    }

    /// Create an in-memory database.
    pub fn in_memory() -> Result<Self> {
        let db = Builder::new()
            .create_in_memory(&MODELS)
            .map_err(|e| Error::Database(e.to_string()))?;
        Self::with_db(db)
    }

    fn with_db(db: Database<'static>) -> Result<Self> {
        let store = Self {
            db,
            audit_seq: AtomicU64::new(0),
        };
        let next = store
            .load_all::<StoredAuditEntry>()?
            .iter()
            .map(|e| e.seq + 1)
            .max()
            .unwrap_or(0);
        store.audit_seq.store(next, Ordering::Relaxed);
        Ok(store)
    }

    fn upsert<T: ToInput>(&self, row: T) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        rw.upsert(row)?;
        rw.commit()?;
        Ok(())
    }

    fn delete_by_pk<T: ToInput>(&self, key: impl ToKey) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        let row: Option<T> = rw.get().primary(key)?;
        if let Some(row) = row {
            rw.remove(row)?;
        }
        rw.commit()?;
        Ok(())
    }

    pub(crate) fn load_all<T: ToInput>(&self) -> Result<Vec<T>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<T>()?;
        let iter = scan.all()?;
        let rows: std::result::Result<Vec<T>, _> = iter.collect();
        rows.map_err(|e| Error::Database(e.to_string()))
    }
}

impl Storage for Store {
    fn save_group(&self, group: &Group) -> StorageResult<()> {
        self.upsert(StoredGroup::from_group(group)).map_err(Into::into)
    }

    fn delete_group(&self, name: &str) -> StorageResult<()> {
        self.delete_by_pk::<StoredGroup>(name.to_string())
            .map_err(Into::into)
    }

    fn load_groups(&self) -> StorageResult<Vec<Group>> {
        let rows = self.load_all::<StoredGroup>()?;
        rows.iter()
            .map(|r| r.to_group().map_err(Into::into))
            .collect()
    }

    fn save_claim(&self, claim: &ClaimRecord) -> StorageResult<()> {
        self.upsert(StoredClaim::from_claim(claim)).map_err(Into::into)
    }

    fn delete_claim(&self, cell: &CellCoordinate) -> StorageResult<()> {
        self.delete_by_pk::<StoredClaim>(cell.key()).map_err(Into::into)
    }

    fn load_claims(&self) -> StorageResult<Vec<ClaimRecord>> {
        let rows = self.load_all::<StoredClaim>()?;
        rows.iter()
            .map(|r| r.to_claim().map_err(Into::into))
            .collect()
    }

    fn save_scope(&self, cell: &CellCoordinate, scope: &PermissionScope) -> StorageResult<()> {
        self.upsert(StoredScope::from_scope(cell, scope))
            .map_err(Into::into)
    }

    fn delete_scope(&self, cell: &CellCoordinate) -> StorageResult<()> {
        self.delete_by_pk::<StoredScope>(cell.key()).map_err(Into::into)
    }

    fn load_scopes(&self) -> StorageResult<Vec<(CellCoordinate, PermissionScope)>> {
        let rows = self.load_all::<StoredScope>()?;
        rows.iter()
            .map(|r| r.to_scope().map_err(Into::into))
            .collect()
    }

    fn save_trust(&self, trust: &TrustGrant) -> StorageResult<()> {
        self.upsert(StoredTrust::from_trust(trust)).map_err(Into::into)
    }

    fn delete_trust(&self, group: GroupId, principal: PrincipalId) -> StorageResult<()> {
        self.delete_by_pk::<StoredTrust>(StoredTrust::key_for(group.raw(), principal.raw()))
            .map_err(Into::into)
    }

    fn load_trusts(&self) -> StorageResult<Vec<TrustGrant>> {
        let rows = self.load_all::<StoredTrust>()?;
        rows.iter()
            .map(|r| r.to_trust().map_err(Into::into))
            .collect()
    }

    fn save_temporary(&self, temporary: &TemporaryPermission) -> StorageResult<()> {
        self.upsert(StoredTemporary::from_temporary(temporary))
            .map_err(Into::into)
    }

    fn delete_temporary(&self, key: &str) -> StorageResult<()> {
        self.delete_by_pk::<StoredTemporary>(key.to_string())
            .map_err(Into::into)
    }

    fn load_temporaries(&self) -> StorageResult<Vec<TemporaryPermission>> {
        let rows = self.load_all::<StoredTemporary>()?;
        rows.iter()
            .map(|r| r.to_temporary().map_err(Into::into))
            .collect()
    }

    fn save_war(&self, war: &War) -> StorageResult<()> {
        self.upsert(StoredWar::from_war(war)).map_err(Into::into)
    }

    fn delete_war(&self, id: ConflictId) -> StorageResult<()> {
        self.delete_by_pk::<StoredWar>(id.raw()).map_err(Into::into)
    }

    fn load_wars(&self) -> StorageResult<Vec<War>> {
        let rows = self.load_all::<StoredWar>()?;
        rows.iter().map(|r| r.to_war().map_err(Into::into)).collect()
    }

    fn save_siege(&self, siege: &Siege) -> StorageResult<()> {
        self.upsert(StoredSiege::from_siege(siege)).map_err(Into::into)
    }

    fn delete_siege(&self, id: ConflictId) -> StorageResult<()> {
        self.delete_by_pk::<StoredSiege>(id.raw()).map_err(Into::into)
    }

    fn load_sieges(&self) -> StorageResult<Vec<Siege>> {
        let rows = self.load_all::<StoredSiege>()?;
        rows.iter()
            .map(|r| r.to_siege().map_err(Into::into))
            .collect()
    }

    fn save_raid(&self, raid: &Raid) -> StorageResult<()> {
        self.upsert(StoredRaid::from_raid(raid)).map_err(Into::into)
    }

    fn delete_raid(&self, id: ConflictId) -> StorageResult<()> {
        self.delete_by_pk::<StoredRaid>(id.raw()).map_err(Into::into)
    }

    fn load_raids(&self) -> StorageResult<Vec<Raid>> {
        let rows = self.load_all::<StoredRaid>()?;
        rows.iter().map(|r| r.to_raid().map_err(Into::into)).collect()
    }

    fn save_ceasefire(&self, ceasefire: &Ceasefire) -> StorageResult<()> {
        self.upsert(StoredCeasefire::from_ceasefire(ceasefire))
            .map_err(Into::into)
    }

    fn delete_ceasefire(&self, id: ConflictId) -> StorageResult<()> {
        self.delete_by_pk::<StoredCeasefire>(id.raw()).map_err(Into::into)
    }

    fn load_ceasefires(&self) -> StorageResult<Vec<Ceasefire>> {
        let rows = self.load_all::<StoredCeasefire>()?;
        rows.iter()
            .map(|r| r.to_ceasefire().map_err(Into::into))
            .collect()
    }

    fn save_audit_entry(&self, entry: &AuditEntry) -> StorageResult<()> {
        let seq = self.audit_seq.fetch_add(1, Ordering::Relaxed);
        self.upsert(StoredAuditEntry::from_entry(seq, entry))
            .map_err(Into::into)
    }

    fn load_audit_entries(&self) -> StorageResult<Vec<AuditEntry>> {
        let mut rows = self.load_all::<StoredAuditEntry>()?;
        rows.sort_by_key(|r| r.seq);
        rows.iter()
            .map(|r| r.to_entry().map_err(Into::into))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use demesne_core::{AuditKind, Permission, Principal, Role};

    fn cell(x: i64, y: i64) -> CellCoordinate {
        CellCoordinate::new("w", x, y)
    }

    fn sample_group(name: &str, id: u64) -> Group {
        let mut group = Group::new(
            GroupId::new(id),
            name,
            &Principal::new(1, "alice"),
            Utc::now(),
        );
        group.add_member(PrincipalId::new(2), Role::Builder).unwrap();
        group.deposit(42.5).unwrap();
        group
    }

    #[test]
    fn test_group_roundtrip() {
        let store = Store::in_memory().unwrap();
        let group = sample_group("Avalon", 1);
        store.save_group(&group).unwrap();

        let loaded = store.load_groups().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Avalon");
        assert_eq!(loaded[0].treasury, 42.5);
        assert_eq!(loaded[0].role_of(PrincipalId::new(2)), Some(Role::Builder));

        store.delete_group("Avalon").unwrap();
        assert!(store.load_groups().unwrap().is_empty());
    }

    #[test]
    fn test_save_is_upsert() {
        let store = Store::in_memory().unwrap();
        let mut group = sample_group("Avalon", 1);
        store.save_group(&group).unwrap();
        group.deposit(10.0).unwrap();
        store.save_group(&group).unwrap();

        let loaded = store.load_groups().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].treasury, 52.5);
    }

    #[test]
    fn test_claim_roundtrip_and_owner_query() {
        let store = Store::in_memory().unwrap();
        let now = Utc::now();
        for (x, owner) in [(0, 1u64), (1, 1), (5, 2)] {
            let claim = ClaimRecord::new(cell(x, 0), GroupId::new(owner), now);
            store.save_claim(&claim).unwrap();
        }
        assert_eq!(store.load_claims().unwrap().len(), 3);
        assert_eq!(store.claims_by_owner(GroupId::new(1)).unwrap().len(), 2);

        store.delete_claim(&cell(0, 0)).unwrap();
        assert_eq!(store.claims_by_owner(GroupId::new(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_audit_entries_keep_append_order() {
        let store = Store::in_memory().unwrap();
        let now = Utc::now();
        for kind in [
            AuditKind::TrustGranted,
            AuditKind::TrustRevoked,
            AuditKind::GroupPurged,
        ] {
            store
                .save_audit_entry(&AuditEntry {
                    at: now,
                    group: GroupId::new(1),
                    principal: PrincipalId::new(1),
                    permission: Some(Permission::Build),
                    cell: None,
                    kind,
                    modifier: String::new(),
                    reason: String::new(),
                })
                .unwrap();
        }
        let entries = store.load_audit_entries().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].kind, AuditKind::TrustGranted);
        assert_eq!(entries[2].kind, AuditKind::GroupPurged);
    }
}
