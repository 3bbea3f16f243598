//! Classification reports and the merge summary handed back to callers.

use crate::types::{Identity, Row, TableDefinition, TableKind};

/// Name shown for rows that carry no usable name.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Columns tried, in order, when naming a row for operators.
const NAME_COLUMNS: &[&str] = &["name", "reference", "synonym"];

/// Returns the operator-facing name of a row.
///
/// Uses the `name`, `reference` or `synonym` column, then the natural key, and falls back to
/// [`UNKNOWN_NAME`].
pub fn display_name(table: &TableDefinition, row: &Row) -> String {
    NAME_COLUMNS
        .iter()
        .copied()
        .chain(table.natural_key.iter().map(String::as_str))
        .filter_map(|column| row.value(column).as_str())
        .find(|value| !value.is_empty())
        .unwrap_or(UNKNOWN_NAME)
        .to_string()
}

/// A slave row recorded in a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub identity: Identity,
    pub name: String,
}

/// A slave identity rewritten to the identity of the matching master row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remap {
    pub from: Identity,
    pub to: Identity,
    pub name: String,
}

/// Outcome of merging one table: every slave row lands in exactly one of the three sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationReport {
    already_there: Vec<ReportEntry>,
    added: Vec<ReportEntry>,
    modified: Vec<Remap>,
}

impl ClassificationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_already_there(&mut self, identity: Identity, name: String) {
        self.already_there.push(ReportEntry { identity, name });
    }

    pub fn record_added(&mut self, identity: Identity, name: String) {
        self.added.push(ReportEntry { identity, name });
    }

    pub fn record_modified(&mut self, from: Identity, to: Identity, name: String) {
        self.modified.push(Remap { from, to, name });
    }

    pub fn already_there(&self) -> &[ReportEntry] {
        &self.already_there
    }

    pub fn added(&self) -> &[ReportEntry] {
        &self.added
    }

    pub fn modified(&self) -> &[Remap] {
        &self.modified
    }

    pub fn added_identities(&self) -> Vec<Identity> {
        self.added.iter().map(|entry| entry.identity).collect()
    }

    /// Returns the slave identities the report covers, as they were before any remap.
    pub fn slave_identities(&self) -> Vec<Identity> {
        self.already_there
            .iter()
            .chain(self.added.iter())
            .map(|entry| entry.identity)
            .chain(self.modified.iter().map(|remap| remap.from))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.already_there.is_empty() && self.added.is_empty() && self.modified.is_empty()
    }

    pub fn statistics(&self) -> TableStatistics {
        TableStatistics {
            already_there: self.already_there.len(),
            added: self.added.len(),
            modified: self.modified.len(),
        }
    }
}

/// Row counts of a merged table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStatistics {
    pub already_there: usize,
    pub added: usize,
    pub modified: usize,
}

/// What happened to one table during a merge run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOutcome {
    /// Rows were matched one by one.
    Merged(ClassificationReport),
    /// Rows belonging to added datafiles were copied without matching.
    Copied { added: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    pub table: String,
    pub kind: TableKind,
    pub outcome: TableOutcome,
}

/// Result of a complete merge run, one entry per processed table in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    tables: Vec<TableSummary>,
}

impl MergeSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_merged(&mut self, table: &TableDefinition, report: ClassificationReport) {
        self.tables.push(TableSummary {
            table: table.name.clone(),
            kind: table.kind,
            outcome: TableOutcome::Merged(report),
        });
    }

    pub fn record_copied(&mut self, table: &TableDefinition, added: usize) {
        self.tables.push(TableSummary {
            table: table.name.clone(),
            kind: table.kind,
            outcome: TableOutcome::Copied { added },
        });
    }

    pub fn tables(&self) -> &[TableSummary] {
        &self.tables
    }

    /// Returns the classification report of a row-by-row merged table.
    pub fn report(&self, table: &str) -> Option<&ClassificationReport> {
        self.tables
            .iter()
            .find(|summary| summary.table == table)
            .and_then(|summary| match &summary.outcome {
                TableOutcome::Merged(report) => Some(report),
                TableOutcome::Copied { .. } => None,
            })
    }

    /// Returns the number of rows copied into a table gated on added datafiles.
    pub fn copied(&self, table: &str) -> Option<usize> {
        self.tables
            .iter()
            .find(|summary| summary.table == table)
            .and_then(|summary| match summary.outcome {
                TableOutcome::Copied { added } => Some(added),
                TableOutcome::Merged(_) => None,
            })
    }

    /// Returns the statistics of every merged table of the given tier.
    pub fn statistics(&self, kind: TableKind) -> Vec<(&str, TableStatistics)> {
        self.tables
            .iter()
            .filter(|summary| summary.kind == kind)
            .filter_map(|summary| match &summary.outcome {
                TableOutcome::Merged(report) => Some((summary.table.as_str(), report.statistics())),
                TableOutcome::Copied { .. } => None,
            })
            .collect()
    }

    /// Returns the copy counts of every table copied per datafile.
    pub fn copy_counts(&self) -> Vec<(&str, usize)> {
        self.tables
            .iter()
            .filter_map(|summary| match summary.outcome {
                TableOutcome::Copied { added } => Some((summary.table.as_str(), added)),
                TableOutcome::Merged(_) => None,
            })
            .collect()
    }

    /// Returns the names of the rows added to each merged table, skipping tables with none.
    pub fn added_names(&self) -> Vec<(&str, Vec<&str>)> {
        self.tables
            .iter()
            .filter_map(|summary| match &summary.outcome {
                TableOutcome::Merged(report) if !report.added().is_empty() => Some((
                    summary.table.as_str(),
                    report.added().iter().map(|entry| entry.name.as_str()).collect(),
                )),
                _ => None,
            })
            .collect()
    }

    /// Returns `true` when the run neither added, remapped nor copied anything.
    pub fn is_noop(&self) -> bool {
        self.tables.iter().all(|summary| match &summary.outcome {
            TableOutcome::Merged(report) => report.added().is_empty() && report.modified().is_empty(),
            TableOutcome::Copied { added } => *added == 0,
        })
    }
}
