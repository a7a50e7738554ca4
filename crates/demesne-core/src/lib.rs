//! Demesne Core - Territory, permission, and conflict engine
//!
//! This crate provides the in-memory heart of the demesne engine:
//! - Grid identity: cells, groups, principals (`CellCoordinate`, `GroupId`)
//! - Group rosters, roles, levels, and treasuries (`Group`, `GroupRegistry`)
//! - Cell ownership with contiguous expansion (`TerritoryStore`)
//! - Layered access control with a fixed precedence chain
//!   (`PermissionResolver`)
//! - Wars, sieges, raids, and ceasefires (`ConflictCoordinator`)
//! - An append-only audit log of permission changes (`AuditLog`)
//!
//! Everything here is synchronous and single-writer: the orchestration
//! layer in `demesne-world` owns one instance of each store and mutates
//! them from its tick thread. Time-sensitive operations take `now`
//! explicitly so behavior is reproducible under test and replay.

mod audit;
mod cell;
mod claim;
pub mod conflict;
mod error;
mod events;
mod group;
mod identity;
mod permission;
mod resolver;
mod role;
mod scope;
mod storage;
mod territory;

pub use audit::{AuditEntry, AuditKind, AuditLog};
pub use cell::CellCoordinate;
pub use claim::{ClaimRecord, PlotType};
pub use conflict::{
    Ceasefire, CeasefireStatus, ConflictCoordinator, ConflictSweep, Raid, RaidOutcome, Siege,
    SiegeOutcome, War, SIEGE_CAPTURE_SCORE, SIEGE_DEFENSE_SCORE,
};
pub use error::{Error, Result};
pub use events::{Observer, RecordingObserver, WorldEvent};
pub use group::{Group, GroupRegistry, CAPACITY_BASE, CAPACITY_PER_LEVEL, LEVEL_EXPERIENCE};
pub use identity::{ConflictId, GroupId, Principal, PrincipalId};
pub use permission::{Decision, Permission};
pub use resolver::{PermissionResolver, ResolveContext, TemplateTarget};
pub use role::{CapabilityTable, Role};
pub use scope::{PermissionScope, PermissionTemplate, TemporaryPermission, TrustGrant};
pub use storage::{Storage, StorageError, StorageResult};
pub use territory::{TerritoryStore, MAX_CLAIM_RADIUS};
