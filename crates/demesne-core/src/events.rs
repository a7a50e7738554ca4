//! World events and the observer seam
//!
//! The engine core emits an event after each committed state change so
//! that outer layers (network broadcast, map rendering, metrics) can react
//! without the core knowing about them. Observers run synchronously on
//! the tick thread and must stay cheap.

use crate::cell::CellCoordinate;
use crate::conflict::CeasefireStatus;
use crate::identity::{ConflictId, GroupId, PrincipalId};
use serde::{Deserialize, Serialize};

/// A committed state change worth broadcasting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorldEvent {
    /// A cell changed hands, or was released when `new_owner` is `None`
    ClaimChanged {
        cell: CellCoordinate,
        new_owner: Option<GroupId>,
    },
    /// Permission data affecting a principal changed
    PermissionChanged {
        group: GroupId,
        cell: Option<CellCoordinate>,
        principal: PrincipalId,
    },
    /// A group was created
    GroupCreated { group: GroupId },
    /// A group was disbanded and its state purged
    GroupDisbanded { group: GroupId },
    /// A war was declared or ended
    WarStateChanged { war: ConflictId },
    /// Siege progress moved
    SiegeProgressChanged { siege: ConflictId, progress: u8 },
    /// Raid drain moved
    RaidProgressChanged { raid: ConflictId, resources_stolen: u8 },
    /// A ceasefire changed lifecycle state
    CeasefireChanged {
        ceasefire: ConflictId,
        status: CeasefireStatus,
    },
}

/// Synchronous subscriber to world events
pub trait Observer {
    /// Called once per committed event, in commit order
    fn notify(&mut self, event: &WorldEvent);
}

/// Observer that records every event, used in tests
#[derive(Debug, Default)]
pub struct RecordingObserver {
    /// Events in the order they were received
    pub events: Vec<WorldEvent>,
}

impl Observer for RecordingObserver {
    fn notify(&mut self, event: &WorldEvent) {
        self.events.push(event.clone());
    }
}
