//! Row-by-row merge of one reference or metadata table.

use tracing::info;

use crate::catalog::Catalog;
use crate::error::{CatalogError, MergeResult};
use crate::matcher::{EntityMatcher, MatchOutcome};
use crate::remap::{IdentityRemapper, SynonymPropagator};
use crate::report::{ClassificationReport, Remap, display_name};
use crate::store::{EntityStore, StoreError};
use crate::types::{Predicate, Row, TableDefinition, TableKind};

/// Rows of one table classified as new but not yet written to master.
#[derive(Debug)]
pub struct StagedTable {
    pub report: ClassificationReport,
    /// Rows to insert into master, in classification order.
    pub rows: Vec<Row>,
}

/// Merges the rows of one table from the slave store into the master store.
///
/// Slave identity rewrites are committed as soon as a duplicate is found, together with the
/// synonyms and log entries naming the old identity. Rows new to master are staged and inserted
/// in one batch once every slave row has been classified, so a failure leaves master without any
/// row of the table from this run.
#[derive(Debug)]
pub struct TableMerger<'a, M, S> {
    master: &'a M,
    slave: &'a S,
    catalog: &'a Catalog,
    volatile_columns: &'a [String],
}

impl<'a, M, S> TableMerger<'a, M, S>
where
    M: EntityStore,
    S: EntityStore,
{
    pub fn new(
        master: &'a M,
        slave: &'a S,
        catalog: &'a Catalog,
        volatile_columns: &'a [String],
    ) -> Self {
        Self {
            master,
            slave,
            catalog,
            volatile_columns,
        }
    }

    pub async fn merge_table(&self, table: &TableDefinition) -> MergeResult<ClassificationReport> {
        let StagedTable { report, rows } = self.stage_table(table).await?;

        if !rows.is_empty() {
            self.master.insert_rows(&table.name, rows).await?;
        }

        Ok(report)
    }

    /// Classifies every slave row of `table` and applies the slave side of the merge.
    ///
    /// Master is not written; the rows it is missing are returned for the caller to insert.
    pub async fn stage_table(&self, table: &TableDefinition) -> MergeResult<StagedTable> {
        if table.kind == TableKind::Measurement {
            return Err(CatalogError::NotMergeable {
                table: table.name.clone(),
                kind: table.kind,
            }
            .into());
        }

        let mut report = ClassificationReport::new();

        // Rows are re-read one at a time because earlier remaps may rewrite their references.
        let identities: Vec<_> = self
            .slave
            .find(&table.name, &Predicate::all())
            .await?
            .iter()
            .map(Row::identity)
            .collect();
        if identities.is_empty() {
            return Ok(StagedTable {
                report,
                rows: Vec::new(),
            });
        }

        let matcher = EntityMatcher::new(table, self.volatile_columns);
        let remapper = IdentityRemapper::new(self.slave, self.catalog);
        let propagator = SynonymPropagator::new(self.slave, self.catalog.polymorphic_references());
        let self_references: Vec<String> = table
            .foreign_keys_to(&table.name)
            .map(|fk| fk.column.clone())
            .collect();
        let mut staged: Vec<Row> = Vec::new();

        for identity in identities {
            let row = self
                .slave
                .get(&table.name, identity)
                .await?
                .ok_or_else(|| StoreError::RowNotFound {
                    table: table.name.clone(),
                    identity,
                })?;
            let name = display_name(table, &row);

            match matcher.classify(self.master, &staged, &row).await? {
                MatchOutcome::AlreadyThere => report.record_already_there(identity, name),
                MatchOutcome::New => {
                    staged.push(row);
                    report.record_added(identity, name);
                }
                MatchOutcome::Duplicate { target } => {
                    remapper.remap(&table.name, identity, target).await?;
                    // Synonyms and logs follow each remap before the next row is classified.
                    let remap = Remap {
                        from: identity,
                        to: target,
                        name,
                    };
                    propagator
                        .propagate(&table.name, std::slice::from_ref(&remap))
                        .await?;
                    // Staged copies were taken before this rewrite reached the slave.
                    for staged_row in &mut staged {
                        for column in &self_references {
                            staged_row.rewrite_reference(column, identity, target);
                        }
                    }
                    report.record_modified(remap.from, remap.to, remap.name);
                }
            }
        }

        let statistics = report.statistics();
        info!(
            table = %table.name,
            already_there = statistics.already_there,
            added = statistics.added,
            modified = statistics.modified,
            "classified table"
        );

        Ok(StagedTable {
            report,
            rows: staged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::standard_catalog;
    use crate::error::MergeError;
    use crate::store::memory::MemoryStore;
    use crate::types::Identity;

    fn volatile() -> Vec<String> {
        vec!["created_date".to_string(), "privacy_id".to_string()]
    }

    fn task(id: u128, name: &str, parent: Option<Identity>) -> Row {
        Row::new(Identity::from_u128(id))
            .with_value("name", name)
            .with_value("parent_id", parent)
    }

    #[tokio::test]
    async fn empty_table_produces_an_empty_report() {
        let catalog = standard_catalog();
        let master = MemoryStore::new(&catalog);
        let slave = MemoryStore::new(&catalog);
        let volatile = volatile();
        let merger = TableMerger::new(&master, &slave, &catalog, &volatile);

        let report = merger
            .merge_table(catalog.require("SensorTypes").unwrap())
            .await
            .unwrap();

        assert!(report.is_empty());
        assert_eq!(master.count("SensorTypes").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn measurement_tables_are_not_merged_row_by_row() {
        let catalog = standard_catalog();
        let master = MemoryStore::new(&catalog);
        let slave = MemoryStore::new(&catalog);
        let volatile = volatile();
        let merger = TableMerger::new(&master, &slave, &catalog, &volatile);

        let err = merger
            .merge_table(catalog.require("States").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            MergeError::Catalog(CatalogError::NotMergeable { .. })
        ));
    }

    #[tokio::test]
    async fn staged_children_follow_a_remapped_parent() {
        let catalog = standard_catalog();
        let master = MemoryStore::new(&catalog);
        let slave = MemoryStore::new(&catalog);
        let master_parent = Identity::from_u128(100);
        master
            .insert("Tasks", task(100, "Exercise", None))
            .await
            .unwrap();
        // The child is classified before its parent is found to duplicate the master task.
        slave
            .insert_rows(
                "Tasks",
                vec![
                    task(2, "Serial 1", Some(Identity::from_u128(1))),
                    task(1, "Exercise", None),
                ],
            )
            .await
            .unwrap();
        let volatile = volatile();
        let merger = TableMerger::new(&master, &slave, &catalog, &volatile);

        let report = merger
            .merge_table(catalog.require("Tasks").unwrap())
            .await
            .unwrap();

        assert_eq!(report.added().len(), 1);
        assert_eq!(report.modified()[0].to, master_parent);
        let child = master.get("Tasks", Identity::from_u128(2)).await.unwrap().unwrap();
        assert_eq!(child.value("parent_id").as_identity(), Some(master_parent));
        assert!(master.dangling_references().await.is_empty());
        assert!(slave.dangling_references().await.is_empty());
    }

    #[tokio::test]
    async fn synonyms_follow_remaps_made_before_a_failing_row() {
        let catalog = standard_catalog();
        let master = MemoryStore::new(&catalog);
        let slave = MemoryStore::new(&catalog);
        master
            .insert_rows(
                "SensorTypes",
                vec![
                    Row::new(Identity::from_u128(3)).with_value("name", "ST_Shared_1"),
                    Row::new(Identity::from_u128(1)).with_value("name", "GPS"),
                    Row::new(Identity::from_u128(2)).with_value("name", "GPS"),
                ],
            )
            .await
            .unwrap();
        slave
            .insert_rows(
                "SensorTypes",
                vec![
                    Row::new(Identity::from_u128(13)).with_value("name", "ST_Shared_1"),
                    Row::new(Identity::from_u128(11)).with_value("name", "GPS"),
                ],
            )
            .await
            .unwrap();
        slave
            .insert(
                "Synonyms",
                Row::new(Identity::from_u128(60))
                    .with_value("table", "SensorTypes")
                    .with_value("entity", Identity::from_u128(13))
                    .with_value("synonym", "Shared"),
            )
            .await
            .unwrap();
        let volatile = volatile();
        let merger = TableMerger::new(&master, &slave, &catalog, &volatile);

        let err = merger
            .merge_table(catalog.require("SensorTypes").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, MergeError::AmbiguousNaturalKey { .. }));
        assert!(slave.get("SensorTypes", Identity::from_u128(3)).await.unwrap().is_some());
        let synonym = slave.get("Synonyms", Identity::from_u128(60)).await.unwrap().unwrap();
        assert_eq!(
            synonym.value("entity").as_identity(),
            Some(Identity::from_u128(3))
        );
    }

    #[tokio::test]
    async fn staged_table_leaves_master_untouched() {
        let catalog = standard_catalog();
        let master = MemoryStore::new(&catalog);
        let slave = MemoryStore::new(&catalog);
        slave
            .insert(
                "SensorTypes",
                Row::new(Identity::from_u128(1)).with_value("name", "GPS"),
            )
            .await
            .unwrap();
        let volatile = volatile();
        let merger = TableMerger::new(&master, &slave, &catalog, &volatile);

        let staged = merger
            .stage_table(catalog.require("SensorTypes").unwrap())
            .await
            .unwrap();

        assert_eq!(staged.report.added_identities(), vec![Identity::from_u128(1)]);
        assert_eq!(staged.rows.len(), 1);
        assert_eq!(master.count("SensorTypes").await.unwrap(), 0);
    }
}
