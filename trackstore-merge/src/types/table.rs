use std::fmt;

/// The tier a table belongs to, which decides how its rows are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableKind {
    /// Small vocabulary tables keyed by a unique name.
    Reference,
    /// Entity tables such as platforms, sensors and datafiles.
    Metadata,
    /// Time-series and event tables owned by a datafile.
    Measurement,
}

impl TableKind {
    pub const ALL: [TableKind; 3] = [
        TableKind::Reference,
        TableKind::Metadata,
        TableKind::Measurement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Reference => "reference",
            TableKind::Metadata => "metadata",
            TableKind::Measurement => "measurement",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Bool,
    I32,
    I64,
    F64,
    String,
    Uuid,
    Date,
    Timestamp,
    TimestampTz,
    Bytes,
    Geometry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    pub typ: ColumnType,
    pub nullable: bool,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, typ: ColumnType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            typ,
            nullable,
        }
    }
}

/// A column holding the identity of a row in another table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: String,
    pub references: String,
}

/// A column pair referencing "a row in the table named by the discriminator".
///
/// Synonyms (`table`, `entity`) and the audit log (`table`, `id`) address rows this way, so they
/// cannot be kept consistent by ordinary foreign key rewrites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolymorphicReference {
    pub table: String,
    pub discriminator_column: String,
    pub identity_column: String,
}

impl PolymorphicReference {
    pub fn new(
        table: impl Into<String>,
        discriminator_column: impl Into<String>,
        identity_column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            discriminator_column: discriminator_column.into(),
            identity_column: identity_column.into(),
        }
    }
}

/// Structure of one track store table.
///
/// The primary key column is not part of [`TableDefinition::columns`]; its value is the row's
/// [`Identity`](crate::types::Identity).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub name: String,
    pub kind: TableKind,
    pub primary_key: String,
    pub columns: Vec<ColumnDefinition>,
    /// Columns identifying the same real-world entity across stores, usually `name`.
    pub natural_key: Vec<String>,
    pub unique_constraint: Option<Vec<String>>,
    pub foreign_keys: Vec<ForeignKey>,
    /// Foreign key to the owning datafile, used when copying rows gated on added datafiles.
    pub parent_column: Option<String>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>, kind: TableKind, primary_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            primary_key: primary_key.into(),
            columns: Vec::new(),
            natural_key: Vec::new(),
            unique_constraint: None,
            foreign_keys: Vec::new(),
            parent_column: None,
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, typ: ColumnType) -> Self {
        self.columns.push(ColumnDefinition::new(name, typ, false));
        self
    }

    pub fn with_nullable_column(mut self, name: impl Into<String>, typ: ColumnType) -> Self {
        self.columns.push(ColumnDefinition::new(name, typ, true));
        self
    }

    /// Adds a non-null uuid column referencing `references`.
    pub fn with_foreign_key(mut self, column: impl Into<String>, references: impl Into<String>) -> Self {
        let column = column.into();
        self.columns
            .push(ColumnDefinition::new(column.clone(), ColumnType::Uuid, false));
        self.foreign_keys.push(ForeignKey {
            column,
            references: references.into(),
        });
        self
    }

    /// Adds a nullable uuid column referencing `references`.
    pub fn with_nullable_foreign_key(
        mut self,
        column: impl Into<String>,
        references: impl Into<String>,
    ) -> Self {
        let column = column.into();
        self.columns
            .push(ColumnDefinition::new(column.clone(), ColumnType::Uuid, true));
        self.foreign_keys.push(ForeignKey {
            column,
            references: references.into(),
        });
        self
    }

    pub fn with_natural_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.natural_key = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_unique_constraint<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique_constraint = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_parent_column(mut self, column: impl Into<String>) -> Self {
        self.parent_column = Some(column.into());
        self
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    /// Returns the foreign keys pointing at `table`.
    pub fn foreign_keys_to<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a ForeignKey> {
        self.foreign_keys
            .iter()
            .filter(move |fk| fk.references == table)
    }
}
