//! Demesne DB - Database layer using native_db
//!
//! Provides persistent storage for:
//! - Groups, claims, and per-cell permission scopes
//! - Trust grants and temporary permissions
//! - Wars, sieges, raids, and ceasefires
//! - The audit log
//!
//! `Store` implements the engine's `Storage` trait, so a world can be
//! booted from or flushed to it without knowing about `native_db`.

mod error;
mod models;
mod queries;
mod store;

pub use error::{Error, Result};
pub use store::Store;
