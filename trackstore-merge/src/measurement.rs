//! Copying of rows owned by newly added datafiles.

use tracing::{debug, info};

use crate::error::{CatalogError, MergeResult};
use crate::store::EntityStore;
use crate::types::{Identity, Predicate, TableDefinition};

/// Copies slave rows whose parent datafile was added to master during this run.
///
/// Rows are copied verbatim, identities included, without any matching. Parent identities are
/// bound into slave queries in batches of at most `batch_size`; the rows of all batches are
/// written to master in one insert, so a table is either copied completely or not at all.
#[derive(Debug)]
pub struct MeasurementCopier<'a, M, S> {
    master: &'a M,
    slave: &'a S,
    batch_size: usize,
}

impl<'a, M, S> MeasurementCopier<'a, M, S>
where
    M: EntityStore,
    S: EntityStore,
{
    pub fn new(master: &'a M, slave: &'a S, batch_size: usize) -> Self {
        Self {
            master,
            slave,
            batch_size: batch_size.max(1),
        }
    }

    /// Copies the rows of `table` owned by `parents`, returning how many were copied.
    ///
    /// Rows are read in batches of parents and written in a single insert, so master receives
    /// either every row of the table or none.
    pub async fn copy_table(
        &self,
        table: &TableDefinition,
        parents: &[Identity],
    ) -> MergeResult<usize> {
        let parent_column = table
            .parent_column
            .as_deref()
            .ok_or_else(|| CatalogError::MissingParentColumn(table.name.clone()))?;

        let mut rows = Vec::new();
        for (batch, chunk) in parents.chunks(self.batch_size).enumerate() {
            let predicate = Predicate::all().with_in(parent_column, chunk.iter().copied());
            let found = self.slave.find(&table.name, &predicate).await?;

            debug!(
                table = %table.name,
                batch,
                parents = chunk.len(),
                rows = found.len(),
                "read batch"
            );

            rows.extend(found);
        }

        let copied = rows.len();
        if copied > 0 {
            self.master.insert_rows(&table.name, rows).await?;
        }

        info!(table = %table.name, copied, "copied rows of added datafiles");

        Ok(copied)
    }
}
