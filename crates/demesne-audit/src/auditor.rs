//! Auditing and analytics over a permission audit log

use chrono::{DateTime, Utc};
use demesne_core::{AuditEntry, AuditKind, AuditLog, CellCoordinate, GroupId, PrincipalId};
use std::collections::HashMap;

/// Auditor for querying and analyzing an audit log
pub struct Auditor<'a> {
    log: &'a AuditLog,
}

impl<'a> Auditor<'a> {
    /// Create a new auditor for a log
    pub fn new(log: &'a AuditLog) -> Self {
        Self { log }
    }

    /// Generate a comprehensive audit report
    pub fn generate_report(&self) -> AuditReport {
        let mut counts_by_kind: HashMap<String, u64> = HashMap::new();
        let mut actions_by_principal: HashMap<u64, u64> = HashMap::new();
        let mut entries_by_group: HashMap<u64, u64> = HashMap::new();

        for entry in self.log.entries() {
            *counts_by_kind
                .entry(entry.kind.as_str().to_string())
                .or_insert(0) += 1;
            *actions_by_principal
                .entry(entry.principal.raw())
                .or_insert(0) += 1;
            *entries_by_group.entry(entry.group.raw()).or_insert(0) += 1;
        }

        AuditReport {
            total_entries: self.log.len(),
            first_at: self.log.entries().first().map(|e| e.at),
            last_at: self.log.entries().last().map(|e| e.at),
            counts_by_kind,
            actions_by_principal,
            entries_by_group,
        }
    }

    /// Query entries matching specific criteria
    pub fn query(&self, query: &AuditQuery) -> Vec<&AuditEntry> {
        self.log
            .entries()
            .iter()
            .filter(|entry| query.matches(entry))
            .collect()
    }

    /// Get a summary of changes affecting a specific principal
    pub fn principal_summary(&self, principal: PrincipalId) -> ChangeSummary {
        let mut total = 0;
        let mut by_kind: HashMap<String, u64> = HashMap::new();

        for entry in self.log.entries() {
            if entry.principal == principal {
                total += 1;
                *by_kind.entry(entry.kind.as_str().to_string()).or_insert(0) += 1;
            }
        }

        ChangeSummary { total, by_kind }
    }

    /// Get entries in a time range, end exclusive
    pub fn entries_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Vec<&AuditEntry> {
        self.log.entries_in_range(from, to).collect()
    }

    /// Count entries of a specific kind
    pub fn count_kind(&self, kind: AuditKind) -> u64 {
        self.log.entries().iter().filter(|e| e.kind == kind).count() as u64
    }
}

/// A comprehensive audit report
#[derive(Debug, Clone)]
pub struct AuditReport {
    /// Total number of entries
    pub total_entries: usize,
    /// Timestamp of the first entry
    pub first_at: Option<DateTime<Utc>>,
    /// Timestamp of the last entry
    pub last_at: Option<DateTime<Utc>>,
    /// Count of each change kind
    pub counts_by_kind: HashMap<String, u64>,
    /// Changes per affected principal
    pub actions_by_principal: HashMap<u64, u64>,
    /// Changes per group
    pub entries_by_group: HashMap<u64, u64>,
}

impl std::fmt::Display for AuditReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Audit Report ===")?;
        writeln!(f, "Total entries: {}", self.total_entries)?;
        if let (Some(first), Some(last)) = (self.first_at, self.last_at) {
            writeln!(f, "Range: {} - {}", first.to_rfc3339(), last.to_rfc3339())?;
        }

        if !self.counts_by_kind.is_empty() {
            writeln!(f, "\nChanges by kind:")?;
            let mut sorted: Vec<_> = self.counts_by_kind.iter().collect();
            sorted.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
            for (kind, count) in sorted {
                writeln!(f, "  {}: {}", kind, count)?;
            }
        }

        if !self.entries_by_group.is_empty() {
            writeln!(f, "\nChanges by group:")?;
            for (group, count) in &self.entries_by_group {
                writeln!(f, "  group:{}: {}", group, count)?;
            }
        }

        if !self.actions_by_principal.is_empty() {
            writeln!(f, "\nChanges by principal:")?;
            for (principal, count) in &self.actions_by_principal {
                writeln!(f, "  player:{}: {}", principal, count)?;
            }
        }

        Ok(())
    }
}

/// Query criteria for filtering audit entries
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Range start, inclusive
    pub from: Option<DateTime<Utc>>,
    /// Range end, exclusive
    pub to: Option<DateTime<Utc>>,
    /// Filter by group
    pub group: Option<GroupId>,
    /// Filter by affected principal
    pub principal: Option<PrincipalId>,
    /// Filter by change kind
    pub kind: Option<AuditKind>,
    /// Filter by cell
    pub cell: Option<CellCoordinate>,
}

impl AuditQuery {
    /// Create a new empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by time range, end exclusive
    pub fn in_range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Filter by group
    pub fn by_group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    /// Filter by affected principal
    pub fn by_principal(mut self, principal: PrincipalId) -> Self {
        self.principal = Some(principal);
        self
    }

    /// Filter by change kind
    pub fn by_kind(mut self, kind: AuditKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Filter by cell
    pub fn by_cell(mut self, cell: CellCoordinate) -> Self {
        self.cell = Some(cell);
        self
    }

    fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(from) = self.from {
            if entry.at < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if entry.at >= to {
                return false;
            }
        }
        if let Some(group) = self.group {
            if entry.group != group {
                return false;
            }
        }
        if let Some(principal) = self.principal {
            if entry.principal != principal {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if entry.kind != kind {
                return false;
            }
        }
        if let Some(ref cell) = self.cell {
            if entry.cell.as_ref() != Some(cell) {
                return false;
            }
        }
        true
    }
}

/// Summary of changes for one principal
#[derive(Debug, Clone)]
pub struct ChangeSummary {
    /// Total number of changes
    pub total: u64,
    /// Changes grouped by kind
    pub by_kind: HashMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use demesne_core::Permission;

    fn entry(
        at: DateTime<Utc>,
        group: u64,
        principal: u64,
        kind: AuditKind,
        cell: Option<CellCoordinate>,
    ) -> AuditEntry {
        AuditEntry {
            at,
            group: GroupId::new(group),
            principal: PrincipalId::new(principal),
            permission: Some(Permission::Build),
            cell,
            kind,
            modifier: "allow".to_string(),
            reason: String::new(),
        }
    }

    fn test_log() -> AuditLog {
        let t0 = Utc::now();
        let cell = CellCoordinate::new("w", 0, 0);
        let mut log = AuditLog::new();
        log.append(entry(t0, 1, 2, AuditKind::PlayerOverride, Some(cell.clone())));
        log.append(entry(
            t0 + Duration::seconds(10),
            1,
            9,
            AuditKind::TrustGranted,
            None,
        ));
        log.append(entry(
            t0 + Duration::seconds(20),
            2,
            9,
            AuditKind::TrustRevoked,
            None,
        ));
        log.append(entry(
            t0 + Duration::seconds(30),
            1,
            2,
            AuditKind::PlayerOverride,
            Some(cell),
        ));
        log
    }

    #[test]
    fn test_generate_report() {
        let log = test_log();
        let report = Auditor::new(&log).generate_report();

        assert_eq!(report.total_entries, 4);
        assert_eq!(report.counts_by_kind.get("player_override"), Some(&2));
        assert_eq!(report.entries_by_group.get(&1), Some(&3));
        assert_eq!(report.actions_by_principal.get(&9), Some(&2));
        assert!(report.first_at.unwrap() < report.last_at.unwrap());
    }

    #[test]
    fn test_query_filters_compose() {
        let log = test_log();
        let auditor = Auditor::new(&log);

        let by_group = auditor.query(&AuditQuery::new().by_group(GroupId::new(1)));
        assert_eq!(by_group.len(), 3);

        let trust_for_nine = auditor.query(
            &AuditQuery::new()
                .by_principal(PrincipalId::new(9))
                .by_kind(AuditKind::TrustGranted),
        );
        assert_eq!(trust_for_nine.len(), 1);

        let on_cell =
            auditor.query(&AuditQuery::new().by_cell(CellCoordinate::new("w", 0, 0)));
        assert_eq!(on_cell.len(), 2);
    }

    #[test]
    fn test_principal_summary() {
        let log = test_log();
        let summary = Auditor::new(&log).principal_summary(PrincipalId::new(2));
        assert_eq!(summary.total, 2);
        assert_eq!(summary.by_kind.get("player_override"), Some(&2));
    }
}
