//! Common query patterns for the database.

use crate::error::{Error, Result};
use crate::models::*;
use crate::store::Store;
use demesne_core::{ClaimRecord, GroupId, TemporaryPermission, TrustGrant};
use native_db::*;

impl Store {
    /// All claims held by one group.
    pub fn claims_by_owner(&self, group: GroupId) -> Result<Vec<ClaimRecord>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().secondary::<StoredClaim>(StoredClaimKey::owner)?;
        let iter = scan.start_with(group.raw())?;
        let rows: std::result::Result<Vec<StoredClaim>, _> = iter.collect();
        let rows = rows.map_err(|e| Error::Database(e.to_string()))?;
        rows.iter().map(|r| r.to_claim()).collect()
    }

    /// Number of claims held by one group.
    pub fn count_claims_by_owner(&self, group: GroupId) -> Result<usize> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().secondary::<StoredClaim>(StoredClaimKey::owner)?;
        let iter = scan.start_with(group.raw())?;
        Ok(iter.count())
    }

    /// All trust grants issued by one group.
    pub fn trusts_by_group(&self, group: GroupId) -> Result<Vec<TrustGrant>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().secondary::<StoredTrust>(StoredTrustKey::group)?;
        let iter = scan.start_with(group.raw())?;
        let rows: std::result::Result<Vec<StoredTrust>, _> = iter.collect();
        let rows = rows.map_err(|e| Error::Database(e.to_string()))?;
        rows.iter().map(|r| r.to_trust()).collect()
    }

    /// All temporary permissions issued by one group.
    pub fn temporaries_by_group(&self, group: GroupId) -> Result<Vec<TemporaryPermission>> {
        let r = self.db.r_transaction()?;
        let scan = r
            .scan()
            .secondary::<StoredTemporary>(StoredTemporaryKey::group)?;
        let iter = scan.start_with(group.raw())?;
        let rows: std::result::Result<Vec<StoredTemporary>, _> = iter.collect();
        let rows = rows.map_err(|e| Error::Database(e.to_string()))?;
        rows.iter().map(|r| r.to_temporary()).collect()
    }
}
