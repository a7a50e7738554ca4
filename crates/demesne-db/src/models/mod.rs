//! Stored row models.
//!
//! Each row carries its natural key as plain columns and the full domain
//! record as a bincode payload, so key scans stay cheap and the domain
//! types keep evolving behind `serde`.

mod audit;
mod conflict;
mod group;
mod permission;
mod territory;

pub use audit::StoredAuditEntry;
pub use conflict::{StoredCeasefire, StoredRaid, StoredSiege, StoredWar};
pub use group::StoredGroup;
pub use permission::{StoredScope, StoredTemporary, StoredTrust};
pub use territory::StoredClaim;

#[allow(unused_imports)]
pub(crate) use audit::StoredAuditEntryKey;
#[allow(unused_imports)]
pub(crate) use permission::{StoredTemporaryKey, StoredTrustKey};
#[allow(unused_imports)]
pub(crate) use territory::StoredClaimKey;
