//! The set of table definitions a merge run works with.

mod standard;

use std::collections::HashSet;

pub use standard::standard_catalog;

use crate::error::CatalogError;
use crate::store::DependentColumn;
use crate::types::{PolymorphicReference, TableDefinition, TableKind};

/// Table definitions plus the polymorphic references between them.
///
/// Tables keep their declaration order, which is the tie-breaker for every ordering decision the
/// classifier makes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    tables: Vec<TableDefinition>,
    polymorphic_references: Vec<PolymorphicReference>,
}

impl Catalog {
    /// Builds a catalog, checking that every referenced table and column is defined.
    pub fn new(
        tables: Vec<TableDefinition>,
        polymorphic_references: Vec<PolymorphicReference>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self {
            tables,
            polymorphic_references,
        };
        catalog.validate()?;

        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut names = HashSet::new();
        for table in &self.tables {
            if !names.insert(table.name.as_str()) {
                return Err(CatalogError::DuplicateTable(table.name.clone()));
            }
        }

        for table in &self.tables {
            for fk in &table.foreign_keys {
                if !names.contains(fk.references.as_str()) {
                    return Err(CatalogError::UnknownReference {
                        table: table.name.clone(),
                        column: fk.column.clone(),
                        references: fk.references.clone(),
                    });
                }
            }

            let declared = table
                .natural_key
                .iter()
                .chain(table.unique_constraint.iter().flatten())
                .chain(table.parent_column.iter());
            for column in declared {
                require_column(table, column)?;
            }
        }

        for reference in &self.polymorphic_references {
            let table = self.require(&reference.table)?;
            require_column(table, &reference.discriminator_column)?;
            require_column(table, &reference.identity_column)?;
        }

        Ok(())
    }

    pub fn tables(&self) -> &[TableDefinition] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.iter().find(|table| table.name == name)
    }

    pub fn require(&self, name: &str) -> Result<&TableDefinition, CatalogError> {
        self.table(name)
            .ok_or_else(|| CatalogError::UnknownTable(name.to_string()))
    }

    pub fn tables_of_kind(&self, kind: TableKind) -> impl Iterator<Item = &TableDefinition> {
        self.tables.iter().filter(move |table| table.kind == kind)
    }

    pub fn polymorphic_references(&self) -> &[PolymorphicReference] {
        &self.polymorphic_references
    }

    /// Returns every foreign key column, in any table, that references `table`.
    pub fn dependents_of(&self, table: &str) -> Vec<DependentColumn> {
        self.tables
            .iter()
            .flat_map(|dependent| {
                dependent
                    .foreign_keys_to(table)
                    .map(|fk| DependentColumn::new(dependent.name.clone(), fk.column.clone()))
            })
            .collect()
    }

    /// Returns a catalog holding only the named tables.
    ///
    /// Foreign keys and polymorphic references into tables that are dropped are dropped too.
    pub fn restricted_to<'a, I>(&self, names: I) -> Catalog
    where
        I: IntoIterator<Item = &'a str>,
    {
        let keep: HashSet<&str> = names.into_iter().collect();

        let tables = self
            .tables
            .iter()
            .filter(|table| keep.contains(table.name.as_str()))
            .map(|table| {
                let mut table = table.clone();
                table
                    .foreign_keys
                    .retain(|fk| keep.contains(fk.references.as_str()));
                table
            })
            .collect();

        let polymorphic_references = self
            .polymorphic_references
            .iter()
            .filter(|reference| keep.contains(reference.table.as_str()))
            .cloned()
            .collect();

        Catalog {
            tables,
            polymorphic_references,
        }
    }
}

fn require_column(table: &TableDefinition, column: &str) -> Result<(), CatalogError> {
    if table.has_column(column) {
        Ok(())
    } else {
        Err(CatalogError::UnknownColumn {
            table: table.name.clone(),
            column: column.to_string(),
        })
    }
}
