use std::collections::BTreeMap;

use crate::types::{Cell, Identity};

static NULL_CELL: Cell = Cell::Null;

/// A row of a track store table: its identity plus data column values.
///
/// Columns that are not present in the row read as [`Cell::Null`].
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    identity: Identity,
    values: BTreeMap<String, Cell>,
}

impl Row {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, column: impl Into<String>, value: impl Into<Cell>) -> Self {
        self.set_value(column, value);
        self
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn set_identity(&mut self, identity: Identity) {
        self.identity = identity;
    }

    pub fn value(&self, column: &str) -> &Cell {
        self.values.get(column).unwrap_or(&NULL_CELL)
    }

    pub fn set_value(&mut self, column: impl Into<String>, value: impl Into<Cell>) {
        self.values.insert(column.into(), value.into());
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.values
            .iter()
            .map(|(column, value)| (column.as_str(), value))
    }

    /// Replaces every occurrence of `from` in `column` with `to`, returning whether it changed.
    pub fn rewrite_reference(&mut self, column: &str, from: Identity, to: Identity) -> bool {
        match self.values.get_mut(column) {
            Some(value) if value.as_identity() == Some(from) => {
                *value = Cell::from(to);
                true
            }
            _ => false,
        }
    }

    /// Compares the data columns of two rows, ignoring the identity and the `ignored` columns.
    pub fn same_data(&self, other: &Row, ignored: &[String]) -> bool {
        let keep = |column: &&String| !ignored.contains(*column);

        self.values
            .keys()
            .chain(other.values.keys())
            .filter(keep)
            .all(|column| self.value(column) == other.value(column))
    }
}
