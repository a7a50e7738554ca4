//! Export audit data to various formats

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use demesne_core::{AuditEntry, AuditLog};
use serde::Serialize;
use std::io::Write;

/// Export format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// RON format (Rust Object Notation)
    Ron,
    /// JSON format (requires serde_json feature)
    Json,
    /// CSV format
    Csv,
    /// Human-readable text format
    Text,
}

/// Exporter for audit data
pub struct Exporter<'a> {
    log: &'a AuditLog,
}

impl<'a> Exporter<'a> {
    /// Create a new exporter
    pub fn new(log: &'a AuditLog) -> Self {
        Self { log }
    }

    /// Export to a string in the specified format
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Ron => self.to_ron(),
            ExportFormat::Json => self.to_json(),
            ExportFormat::Csv => Ok(self.to_csv()),
            ExportFormat::Text => Ok(self.to_text()),
        }
    }

    /// Export to a writer
    pub fn export_to<W: Write>(&self, writer: &mut W, format: ExportFormat) -> Result<()> {
        let content = self.export(format)?;
        writer
            .write_all(content.as_bytes())
            .map_err(|e| Error::Export(e.to_string()))?;
        Ok(())
    }

    /// Export to RON format
    pub fn to_ron(&self) -> Result<String> {
        let export = ExportData::from_log(self.log);
        ron::ser::to_string_pretty(&export, ron::ser::PrettyConfig::default())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Export to JSON format
    #[cfg(feature = "serde_json")]
    pub fn to_json(&self) -> Result<String> {
        let export = ExportData::from_log(self.log);
        serde_json::to_string_pretty(&export).map_err(|e| Error::Serialization(e.to_string()))
    }

    #[cfg(not(feature = "serde_json"))]
    pub fn to_json(&self) -> Result<String> {
        Err(Error::Export(
            "JSON export requires the 'serde_json' feature".to_string(),
        ))
    }

    /// Export to CSV format
    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str("at,group,principal,permission,cell,kind,modifier,reason\n");

        for entry in self.log.entries() {
            let permission = entry
                .permission
                .map(|p| p.as_str().to_string())
                .unwrap_or_default();
            let cell = entry
                .cell
                .as_ref()
                .map(|c| c.key())
                .unwrap_or_default();
            let modifier = entry.modifier.replace('"', "\"\"");
            let reason = entry.reason.replace('"', "\"\"");

            output.push_str(&format!(
                "{},{},{},{},{},{},\"{}\",\"{}\"\n",
                entry.at.to_rfc3339(),
                entry.group.raw(),
                entry.principal.raw(),
                permission,
                cell,
                entry.kind,
                modifier,
                reason
            ));
        }

        output
    }

    /// Export to human-readable text format
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str("=== Audit Export ===\n\n");
        output.push_str(&format!("Total entries: {}\n", self.log.len()));
        if let (Some(first), Some(last)) = (
            self.log.entries().first(),
            self.log.entries().last(),
        ) {
            output.push_str(&format!(
                "Range: {} - {}\n",
                first.at.to_rfc3339(),
                last.at.to_rfc3339()
            ));
        }

        output.push_str("\n=== Entries ===\n\n");

        for (i, entry) in self.log.entries().iter().enumerate() {
            let permission = entry
                .permission
                .map(|p| format!(" [{}]", p))
                .unwrap_or_default();
            let cell = entry
                .cell
                .as_ref()
                .map(|c| format!(" at {}", c))
                .unwrap_or_default();

            output.push_str(&format!(
                "  #{} {} {} {}{}{} -> {}\n",
                i,
                entry.at.to_rfc3339(),
                entry.kind,
                entry.principal,
                permission,
                cell,
                entry.modifier
            ));
            if !entry.reason.is_empty() {
                output.push_str(&format!("      reason: {}\n", entry.reason));
            }
        }

        output
    }

    /// Export only entries in a time range, end exclusive
    pub fn export_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        format: ExportFormat,
    ) -> Result<String> {
        let entries: Vec<AuditEntry> = self.log.entries_in_range(from, to).cloned().collect();
        let filtered = FilteredExport { entries };

        match format {
            ExportFormat::Ron => {
                ron::ser::to_string_pretty(&filtered, ron::ser::PrettyConfig::default())
                    .map_err(|e| Error::Serialization(e.to_string()))
            }
            #[cfg(feature = "serde_json")]
            ExportFormat::Json => serde_json::to_string_pretty(&filtered)
                .map_err(|e| Error::Serialization(e.to_string())),
            #[cfg(not(feature = "serde_json"))]
            ExportFormat::Json => Err(Error::Export(
                "JSON export requires the 'serde_json' feature".to_string(),
            )),
            _ => Err(Error::Export(
                "Range export only supports RON and JSON".to_string(),
            )),
        }
    }
}

/// Data structure for full log export
#[derive(Debug, Clone, Serialize)]
struct ExportData {
    version: u32,
    total_entries: usize,
    entries: Vec<AuditEntry>,
}

impl ExportData {
    fn from_log(log: &AuditLog) -> Self {
        Self {
            version: 1,
            total_entries: log.len(),
            entries: log.entries().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct FilteredExport {
    entries: Vec<AuditEntry>,
}
