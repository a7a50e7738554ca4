//! Demesne Audit - Analytics and export over the permission audit log
//!
//! Read-side tooling: `Auditor` answers who-changed-what questions over an
//! `AuditLog`, and `Exporter` serializes the log to RON, JSON (optional
//! `serde_json` feature), CSV, or plain text for external review.

mod auditor;
mod error;
mod exporter;

pub use auditor::{AuditQuery, AuditReport, Auditor, ChangeSummary};
pub use error::{Error, Result};
pub use exporter::{ExportFormat, Exporter};
