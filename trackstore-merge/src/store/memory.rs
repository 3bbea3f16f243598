use std::sync::Arc;

use tokio::sync::Mutex;

use crate::catalog::Catalog;
use crate::store::{EntityStore, IdentityRewrite, StoreError, StoreResult};
use crate::types::{Cell, Identity, Predicate, Row, TableDefinition, TableKind};

/// Rows of one table, in insertion order.
#[derive(Debug)]
struct TableData {
    definition: TableDefinition,
    rows: Vec<Row>,
}

impl TableData {
    fn position(&self, identity: Identity) -> Option<usize> {
        self.rows.iter().position(|row| row.identity() == identity)
    }

    /// Checks that `row` could be added next to `existing` without breaking a declared
    /// uniqueness constraint. Constraints never fire on rows with a null constrained column.
    fn check_unique(&self, row: &Row, existing: &[Row]) -> StoreResult<()> {
        let Some(columns) = &self.definition.unique_constraint else {
            return Ok(());
        };
        if columns.iter().any(|column| row.value(column).is_null()) {
            return Ok(());
        }

        let clash = existing.iter().find(|other| {
            other.identity() != row.identity()
                && columns
                    .iter()
                    .all(|column| other.value(column) == row.value(column))
        });

        match clash {
            Some(other) => Err(StoreError::constraint_violation(
                &self.definition.name,
                format!(
                    "row {} duplicates ({}) of row {}",
                    row.identity(),
                    columns.join(", "),
                    other.identity()
                ),
            )),
            None => Ok(()),
        }
    }
}

/// Inner state of [`MemoryStore`].
#[derive(Debug)]
struct Inner {
    /// Tables in catalog order.
    tables: Vec<TableData>,
}

impl Inner {
    fn table(&self, name: &str) -> StoreResult<&TableData> {
        self.tables
            .iter()
            .find(|table| table.definition.name == name)
            .ok_or_else(|| StoreError::UnknownTable(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> StoreResult<&mut TableData> {
        self.tables
            .iter_mut()
            .find(|table| table.definition.name == name)
            .ok_or_else(|| StoreError::UnknownTable(name.to_string()))
    }
}

/// A foreign key value pointing at a row that does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    pub table: String,
    pub identity: Identity,
    pub column: String,
    pub missing: Identity,
}

/// In-memory track store.
///
/// [`MemoryStore`] enforces primary key uniqueness and declared uniqueness constraints, and applies
/// identity rewrites together with their dependent columns. It does not enforce foreign keys on
/// insert; [`MemoryStore::dangling_references`] reports violations instead.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Creates an empty store with one table per catalog definition.
    pub fn new(catalog: &Catalog) -> Self {
        let tables = catalog
            .tables()
            .iter()
            .map(|definition| TableData {
                definition: definition.clone(),
                rows: Vec::new(),
            })
            .collect();

        Self {
            inner: Arc::new(Mutex::new(Inner { tables })),
        }
    }

    /// Returns a copy of every row of the table.
    pub async fn rows(&self, table: &str) -> StoreResult<Vec<Row>> {
        let inner = self.inner.lock().await;

        Ok(inner.table(table)?.rows.clone())
    }

    /// Returns every foreign key value that does not resolve to a row of the referenced table.
    pub async fn dangling_references(&self) -> Vec<DanglingReference> {
        let inner = self.inner.lock().await;
        let mut dangling = Vec::new();

        for table in &inner.tables {
            for fk in &table.definition.foreign_keys {
                let Ok(referenced) = inner.table(&fk.references) else {
                    continue;
                };

                for row in &table.rows {
                    let Some(target) = row.value(&fk.column).as_identity() else {
                        continue;
                    };
                    if referenced.position(target).is_none() {
                        dangling.push(DanglingReference {
                            table: table.definition.name.clone(),
                            identity: row.identity(),
                            column: fk.column.clone(),
                            missing: target,
                        });
                    }
                }
            }
        }

        dangling
    }
}

impl EntityStore for MemoryStore {
    async fn list_tables(&self, kind: TableKind) -> StoreResult<Vec<TableDefinition>> {
        let inner = self.inner.lock().await;

        Ok(inner
            .tables
            .iter()
            .filter(|table| table.definition.kind == kind)
            .map(|table| table.definition.clone())
            .collect())
    }

    async fn get(&self, table: &str, identity: Identity) -> StoreResult<Option<Row>> {
        let inner = self.inner.lock().await;
        let table = inner.table(table)?;

        Ok(table.position(identity).map(|index| table.rows[index].clone()))
    }

    async fn find(&self, table: &str, predicate: &Predicate) -> StoreResult<Vec<Row>> {
        let inner = self.inner.lock().await;

        Ok(inner
            .table(table)?
            .rows
            .iter()
            .filter(|row| predicate.matches(row))
            .cloned()
            .collect())
    }

    async fn insert_rows(&self, table: &str, rows: Vec<Row>) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        let data = inner.table_mut(table)?;

        // Validate the whole batch before touching the table so a rejected batch leaves no rows.
        for (index, row) in rows.iter().enumerate() {
            let earlier = &rows[..index];
            if data.position(row.identity()).is_some()
                || earlier.iter().any(|other| other.identity() == row.identity())
            {
                return Err(StoreError::constraint_violation(
                    table,
                    format!("duplicate primary key {}", row.identity()),
                ));
            }
            data.check_unique(row, &data.rows)?;
            data.check_unique(row, earlier)?;
        }

        data.rows.extend(rows);

        Ok(())
    }

    async fn update_identity(&self, rewrite: &IdentityRewrite) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;

        let data = inner.table(&rewrite.table)?;
        let Some(index) = data.position(rewrite.from) else {
            return Err(StoreError::RowNotFound {
                table: rewrite.table.clone(),
                identity: rewrite.from,
            });
        };
        if rewrite.from != rewrite.to && data.position(rewrite.to).is_some() {
            return Err(StoreError::constraint_violation(
                &rewrite.table,
                format!("primary key {} is already in use", rewrite.to),
            ));
        }
        for dependent in &rewrite.dependents {
            let dependent_table = inner.table(&dependent.table)?;
            if !dependent_table.definition.has_column(&dependent.column) {
                return Err(StoreError::constraint_violation(
                    &dependent.table,
                    format!("unknown dependent column `{}`", dependent.column),
                ));
            }
        }

        inner.table_mut(&rewrite.table)?.rows[index].set_identity(rewrite.to);
        for dependent in &rewrite.dependents {
            let dependent_table = inner.table_mut(&dependent.table)?;
            for row in &mut dependent_table.rows {
                row.rewrite_reference(&dependent.column, rewrite.from, rewrite.to);
            }
        }

        Ok(())
    }

    async fn update_column(
        &self,
        table: &str,
        identity: Identity,
        column: &str,
        value: Cell,
    ) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        let data = inner.table_mut(table)?;

        let Some(index) = data.position(identity) else {
            return Err(StoreError::RowNotFound {
                table: table.to_string(),
                identity,
            });
        };
        data.rows[index].set_value(column, value);

        Ok(())
    }

    async fn count(&self, table: &str) -> StoreResult<usize> {
        let inner = self.inner.lock().await;

        Ok(inner.table(table)?.rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::standard_catalog;
    use crate::store::DependentColumn;

    fn sensor_type(id: u128, name: &str) -> Row {
        Row::new(Identity::from_u128(id)).with_value("name", name)
    }

    #[tokio::test]
    async fn rejected_batch_inserts_nothing() {
        let store = MemoryStore::new(&standard_catalog());
        store.insert("SensorTypes", sensor_type(1, "GPS")).await.unwrap();

        let result = store
            .insert_rows(
                "SensorTypes",
                vec![sensor_type(2, "Radar"), sensor_type(1, "Sonar")],
            )
            .await;

        assert!(matches!(result, Err(StoreError::ConstraintViolation { .. })));
        assert_eq!(store.count("SensorTypes").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unique_constraints_are_enforced_within_a_batch() {
        let store = MemoryStore::new(&standard_catalog());
        let host = Identity::from_u128(100);
        let sensor = |id: u128| {
            Row::new(Identity::from_u128(id))
                .with_value("name", "GPS")
                .with_value("host", host)
        };

        let result = store.insert_rows("Sensors", vec![sensor(1), sensor(2)]).await;

        assert!(matches!(result, Err(StoreError::ConstraintViolation { .. })));
    }

    #[tokio::test]
    async fn identity_rewrite_cascades_to_dependents() {
        let store = MemoryStore::new(&standard_catalog());
        let old = Identity::from_u128(1);
        let new = Identity::from_u128(2);
        store.insert("SensorTypes", sensor_type(1, "GPS")).await.unwrap();
        store
            .insert(
                "Sensors",
                Row::new(Identity::from_u128(10)).with_value("sensor_type_id", old),
            )
            .await
            .unwrap();

        let rewrite = IdentityRewrite::new("SensorTypes", old, new)
            .with_dependents(vec![DependentColumn::new("Sensors", "sensor_type_id")]);
        store.update_identity(&rewrite).await.unwrap();

        assert!(store.get("SensorTypes", old).await.unwrap().is_none());
        assert!(store.get("SensorTypes", new).await.unwrap().is_some());
        let sensor = store
            .get("Sensors", Identity::from_u128(10))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sensor.value("sensor_type_id").as_identity(), Some(new));
        assert!(store.dangling_references().await.is_empty());
    }

    #[tokio::test]
    async fn identity_rewrite_onto_an_existing_row_is_rejected() {
        let store = MemoryStore::new(&standard_catalog());
        store
            .insert_rows(
                "SensorTypes",
                vec![sensor_type(1, "GPS"), sensor_type(2, "Radar")],
            )
            .await
            .unwrap();

        let rewrite =
            IdentityRewrite::new("SensorTypes", Identity::from_u128(1), Identity::from_u128(2));

        assert!(matches!(
            store.update_identity(&rewrite).await,
            Err(StoreError::ConstraintViolation { .. })
        ));
        assert_eq!(store.rows("SensorTypes").await.unwrap()[0].identity(), Identity::from_u128(1));
    }

    #[tokio::test]
    async fn dangling_references_are_reported() {
        let store = MemoryStore::new(&standard_catalog());
        let missing = Identity::from_u128(99);
        store
            .insert(
                "Sensors",
                Row::new(Identity::from_u128(10)).with_value("host", missing),
            )
            .await
            .unwrap();

        let dangling = store.dangling_references().await;

        assert_eq!(
            dangling,
            vec![DanglingReference {
                table: "Sensors".into(),
                identity: Identity::from_u128(10),
                column: "host".into(),
                missing,
            }]
        );
    }
}
