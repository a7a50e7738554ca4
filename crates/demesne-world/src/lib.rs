//! Demesne World - Engine context and orchestration
//!
//! `World` is the single entry point into the demesne engine: it owns the
//! group registry, territory store, permission resolver, conflict
//! coordinator, and audit log, wires mutations to observers and the
//! write-behind persistence queue, and exposes the periodic `sweep`.
//!
//! Everything is single-writer; hosts drive it from one thread and call
//! `flush` and `sweep` at their own cadence.

mod config;
mod error;
mod persist;
mod world;

pub use config::WorldConfig;
pub use error::{Error, Result};
pub use persist::PersistOp;
pub use world::{SweepReport, World};
