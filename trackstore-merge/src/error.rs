//! Error types for the merge engine.

use thiserror::Error;

use crate::store::StoreError;
use crate::types::{Identity, TableKind};

/// Result type for merge operations.
pub type MergeResult<T> = Result<T, MergeError>;

/// Errors raised while interpreting the table catalog and ordering configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("table `{0}` is not defined in the catalog")]
    UnknownTable(String),

    #[error("table `{0}` is defined more than once")]
    DuplicateTable(String),

    #[error("column `{column}` of table `{table}` references unknown table `{references}`")]
    UnknownReference {
        table: String,
        column: String,
        references: String,
    },

    #[error("table `{table}` has no column `{column}`")]
    UnknownColumn { table: String, column: String },

    #[error("priority table `{table}` is a {actual} table, not a {expected} table")]
    PriorityTableInWrongTier {
        table: String,
        expected: TableKind,
        actual: TableKind,
    },

    #[error("{role} table `{table}` is a {actual} table, only metadata tables can be {role}")]
    FixedPointTableInWrongTier {
        table: String,
        role: &'static str,
        actual: TableKind,
    },

    #[error("priority table `{table}` depends on `{dependency}`, which is not merged before it")]
    PriorityConflict { table: String, dependency: String },

    #[error("cyclic dependency between {kind} tables: {}", .tables.join(", "))]
    Cycle { kind: TableKind, tables: Vec<String> },

    #[error("table `{0}` has no parent column and cannot be copied per datafile")]
    MissingParentColumn(String),

    #[error("table `{table}` is a {kind} table and cannot be merged row by row")]
    NotMergeable { table: String, kind: TableKind },
}

/// Errors that abort the merge of the table in progress.
#[derive(Debug, Error)]
pub enum MergeError {
    /// More than one master row shares the slave row's primary key.
    #[error("{count} master rows in `{table}` share identity {identity}")]
    AmbiguousIdentity {
        table: String,
        identity: Identity,
        count: usize,
    },

    /// More than one master row matches the slave row on its natural key or unique constraint.
    #[error(
        "slave row {identity} of `{table}` matches {} master rows on ({}): {}",
        .matches.len(),
        .columns.join(", "),
        join_identities(.matches)
    )]
    AmbiguousNaturalKey {
        table: String,
        identity: Identity,
        columns: Vec<String>,
        matches: Vec<Identity>,
    },

    /// More than one master row matches the slave row on every compared data column.
    #[error(
        "slave row {identity} of `{table}` matches {} master rows on all data columns: {}",
        .matches.len(),
        join_identities(.matches)
    )]
    AmbiguousDataMatch {
        table: String,
        identity: Identity,
        matches: Vec<Identity>,
    },

    /// The slave store rejected an identity rewrite.
    #[error("slave store rejected rewriting `{table}` identity {from} to {to}: {source}")]
    RemapConflict {
        table: String,
        from: Identity,
        to: Identity,
        #[source]
        source: StoreError,
    },

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    /// The store rejected an operation for a reason other than availability.
    #[error("store rejected operation: {0}")]
    StoreRejected(#[source] StoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl MergeError {
    /// Returns a short category label for this error.
    pub fn category(&self) -> &'static str {
        match self {
            MergeError::AmbiguousIdentity { .. } => "ambiguous identity",
            MergeError::AmbiguousNaturalKey { .. } => "ambiguous natural key",
            MergeError::AmbiguousDataMatch { .. } => "ambiguous data match",
            MergeError::RemapConflict { .. } => "remap conflict",
            MergeError::StoreUnavailable(_) => "store unavailable",
            MergeError::StoreRejected(_) => "store error",
            MergeError::Catalog(_) => "catalog error",
        }
    }
}

impl From<StoreError> for MergeError {
    fn from(err: StoreError) -> Self {
        if err.is_unavailable() {
            MergeError::StoreUnavailable(err)
        } else {
            MergeError::StoreRejected(err)
        }
    }
}

fn join_identities(identities: &[Identity]) -> String {
    identities
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
