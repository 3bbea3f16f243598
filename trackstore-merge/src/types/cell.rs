use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::types::Identity;

/// A single typed column value.
///
/// [`Cell::Null`] is the absent value. Geometry columns carry extended WKT text so that spatial
/// values can be compared and copied without a geometry library.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F64(f64),
    String(String),
    Uuid(Uuid),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Bytes(Vec<u8>),
    Geometry(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Returns the identity held by a uuid cell.
    pub fn as_identity(&self) -> Option<Identity> {
        match self {
            Cell::Uuid(uuid) => Some(Identity::new(*uuid)),
            _ => None,
        }
    }

    /// Returns the text held by a string or geometry cell.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::String(value) | Cell::Geometry(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the [`ColumnType`](crate::types::ColumnType) matching this value, `None` for null.
    pub fn column_type(&self) -> Option<crate::types::ColumnType> {
        use crate::types::ColumnType;

        let typ = match self {
            Cell::Null => return None,
            Cell::Bool(_) => ColumnType::Bool,
            Cell::I32(_) => ColumnType::I32,
            Cell::I64(_) => ColumnType::I64,
            Cell::F64(_) => ColumnType::F64,
            Cell::String(_) => ColumnType::String,
            Cell::Uuid(_) => ColumnType::Uuid,
            Cell::Date(_) => ColumnType::Date,
            Cell::Timestamp(_) => ColumnType::Timestamp,
            Cell::TimestampTz(_) => ColumnType::TimestampTz,
            Cell::Bytes(_) => ColumnType::Bytes,
            Cell::Geometry(_) => ColumnType::Geometry,
        };

        Some(typ)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => f.write_str("NULL"),
            Cell::Bool(value) => write!(f, "{value}"),
            Cell::I32(value) => write!(f, "{value}"),
            Cell::I64(value) => write!(f, "{value}"),
            Cell::F64(value) => write!(f, "{value}"),
            Cell::String(value) | Cell::Geometry(value) => f.write_str(value),
            Cell::Uuid(value) => write!(f, "{value}"),
            Cell::Date(value) => write!(f, "{value}"),
            Cell::Timestamp(value) => write!(f, "{value}"),
            Cell::TimestampTz(value) => write!(f, "{value}"),
            Cell::Bytes(value) => write!(f, "<{} bytes>", value.len()),
        }
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::I32(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::I64(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::F64(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::String(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::String(value)
    }
}

impl From<Uuid> for Cell {
    fn from(value: Uuid) -> Self {
        Cell::Uuid(value)
    }
}

impl From<Identity> for Cell {
    fn from(value: Identity) -> Self {
        Cell::Uuid(value.into_uuid())
    }
}

impl From<NaiveDate> for Cell {
    fn from(value: NaiveDate) -> Self {
        Cell::Date(value)
    }
}

impl From<NaiveDateTime> for Cell {
    fn from(value: NaiveDateTime) -> Self {
        Cell::Timestamp(value)
    }
}

impl From<DateTime<Utc>> for Cell {
    fn from(value: DateTime<Utc>) -> Self {
        Cell::TimestampTz(value)
    }
}

impl<T> From<Option<T>> for Cell
where
    T: Into<Cell>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Null, Into::into)
    }
}
