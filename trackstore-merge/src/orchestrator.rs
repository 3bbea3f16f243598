//! Stage-by-stage merge of a slave store into a master store.

use thiserror::Error;
use tracing::{info, info_span, Instrument};
use trackstore_config::shared::MergeConfig;

use crate::catalog::Catalog;
use crate::classifier::{MergePlan, MergeStage, plan_merge};
use crate::error::{MergeError, MergeResult};
use crate::measurement::MeasurementCopier;
use crate::merger::{StagedTable, TableMerger};
use crate::report::MergeSummary;
use crate::store::EntityStore;
use crate::types::{Identity, Row, TableKind};

/// The single failure a merge run reports: the error plus where it happened.
///
/// Tables merged before the failing one stay committed. Re-running the merge is safe since they
/// classify as already present.
#[derive(Debug, Error)]
#[error(
    "merge failed in the {stage} stage{}: {source}",
    .table.as_ref().map(|table| format!(" on table `{table}`")).unwrap_or_default()
)]
pub struct MergeFailure {
    pub stage: MergeStage,
    pub table: Option<String>,
    #[source]
    pub source: MergeError,
}

impl MergeFailure {
    fn planning(source: impl Into<MergeError>) -> Self {
        Self {
            stage: MergeStage::Planning,
            table: None,
            source: source.into(),
        }
    }
}

/// Master rows held back until the stages depending on them are about to run.
#[derive(Debug)]
pub struct PendingInsert {
    pub table: String,
    pub rows: Vec<Row>,
}

/// State carried from one stage of a run to the next.
#[derive(Debug, Default)]
pub struct MergeContext {
    /// Datafiles new to master; only their measurement rows are copied.
    pub added_datafiles: Vec<Identity>,
    /// New datafiles, written to master right before the measurement copy.
    ///
    /// A run failing before then leaves master without them.
    pub pending_datafiles: Option<PendingInsert>,
    pub summary: MergeSummary,
}

/// Drives a complete merge of `slave` into `master`.
#[derive(Debug)]
pub struct Orchestrator<'a, M, S> {
    master: &'a M,
    slave: &'a S,
    catalog: &'a Catalog,
    config: &'a MergeConfig,
}

impl<'a, M, S> Orchestrator<'a, M, S>
where
    M: EntityStore,
    S: EntityStore,
{
    pub fn new(master: &'a M, slave: &'a S, catalog: &'a Catalog, config: &'a MergeConfig) -> Self {
        Self {
            master,
            slave,
            catalog,
            config,
        }
    }

    /// Lists the tables present in master and orders those the catalog defines.
    ///
    /// Returns the catalog restricted to the present tables together with the plan.
    pub async fn plan(&self) -> Result<(Catalog, MergePlan), MergeFailure> {
        let mut present = Vec::new();
        for kind in TableKind::ALL {
            let tables = self
                .master
                .list_tables(kind)
                .await
                .map_err(MergeFailure::planning)?;
            present.extend(tables.into_iter().map(|table| table.name));
        }

        let catalog = self
            .catalog
            .restricted_to(present.iter().map(String::as_str));
        let plan = plan_merge(&catalog, &self.config.order).map_err(MergeFailure::planning)?;

        Ok((catalog, plan))
    }

    /// Runs every stage in order and returns the summary of all processed tables.
    pub async fn merge_all(&self) -> Result<MergeSummary, MergeFailure> {
        let (catalog, plan) = self.plan().await?;
        let mut context = MergeContext::default();

        info!(
            reference = plan.reference.len(),
            metadata = plan.metadata.len(),
            measurement = plan.gated.len() + plan.measurement.len(),
            excluded = ?plan.excluded,
            "starting merge"
        );

        for (stage, table) in plan.steps() {
            if stage == MergeStage::Measurement {
                self.write_pending_datafiles(&mut context).await?;
            }

            let span = info_span!("merge_table", %stage, table);
            self.run_step(&catalog, stage, table, &mut context)
                .instrument(span)
                .await
                .map_err(|source| MergeFailure {
                    stage,
                    table: Some(table.to_string()),
                    source,
                })?;
        }

        self.write_pending_datafiles(&mut context).await?;

        info!(
            tables = context.summary.tables().len(),
            added_datafiles = context.added_datafiles.len(),
            "merge completed"
        );

        Ok(context.summary)
    }

    async fn run_step(
        &self,
        catalog: &Catalog,
        stage: MergeStage,
        table: &str,
        context: &mut MergeContext,
    ) -> MergeResult<()> {
        let definition = catalog.require(table)?;

        match stage {
            MergeStage::Planning => Ok(()),
            MergeStage::Measurement => {
                let copier = MeasurementCopier::new(self.master, self.slave, self.config.batch_size);
                let copied = copier
                    .copy_table(definition, &context.added_datafiles)
                    .await?;
                context.summary.record_copied(definition, copied);

                Ok(())
            }
            MergeStage::Reference | MergeStage::Metadata | MergeStage::Synonym => {
                let report = self.merger(catalog).merge_table(definition).await?;
                context.summary.record_merged(definition, report);

                Ok(())
            }
            MergeStage::Datafile => {
                let StagedTable { report, rows } =
                    self.merger(catalog).stage_table(definition).await?;
                context.added_datafiles = report.added_identities();
                context.pending_datafiles = Some(PendingInsert {
                    table: definition.name.clone(),
                    rows,
                });
                context.summary.record_merged(definition, report);

                Ok(())
            }
        }
    }

    fn merger<'c>(&'c self, catalog: &'c Catalog) -> TableMerger<'c, M, S> {
        TableMerger::new(
            self.master,
            self.slave,
            catalog,
            &self.config.volatile_columns,
        )
    }

    async fn write_pending_datafiles(&self, context: &mut MergeContext) -> Result<(), MergeFailure> {
        let Some(PendingInsert { table, rows }) = context.pending_datafiles.take() else {
            return Ok(());
        };
        if rows.is_empty() {
            return Ok(());
        }

        let count = rows.len();
        self.master
            .insert_rows(&table, rows)
            .await
            .map_err(|source| MergeFailure {
                stage: MergeStage::Datafile,
                table: Some(table.clone()),
                source: source.into(),
            })?;

        info!(table = %table, rows = count, "wrote added datafiles");

        Ok(())
    }
}

/// Merges `slave` into `master` using the given catalog and settings.
pub async fn merge_all<M, S>(
    master: &M,
    slave: &S,
    catalog: &Catalog,
    config: &MergeConfig,
) -> Result<MergeSummary, MergeFailure>
where
    M: EntityStore,
    S: EntityStore,
{
    Orchestrator::new(master, slave, catalog, config)
        .merge_all()
        .await
}
