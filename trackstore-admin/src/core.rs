use tracing::info;
use trackstore_config::shared::AdminConfig;
use trackstore_merge::catalog::standard_catalog;
use trackstore_merge::classifier::plan_merge;
use trackstore_merge::merge_all;
use trackstore_postgres::PostgresStore;

use crate::error::{AdminError, AdminResult, StoreRole};
use crate::report::{render_plan, render_summary};

/// Prints the table order of a merge run without connecting to either store.
pub fn print_plan(config: &AdminConfig) -> AdminResult<()> {
    let plan = plan_merge(&standard_catalog(), &config.merge.order).map_err(AdminError::config)?;

    print!("{}", render_plan(&plan));

    Ok(())
}

/// Merges the slave store into the master store and prints the statistics of the run.
pub async fn run_merge(config: AdminConfig) -> AdminResult<()> {
    let catalog = standard_catalog();

    let master = PostgresStore::connect(&config.master, catalog.clone())
        .await
        .map_err(AdminError::connect(StoreRole::Master))?;
    let slave = PostgresStore::connect(&config.slave, catalog.clone())
        .await
        .map_err(AdminError::connect(StoreRole::Slave))?;

    info!(
        master = %config.master.name,
        slave = %config.slave.name,
        batch_size = config.merge.batch_size,
        "merging slave store into master store"
    );

    let summary = merge_all(&master, &slave, &catalog, &config.merge).await?;

    if summary.is_noop() {
        info!("stores were already merged, nothing changed");
    }
    print!("{}", render_summary(&summary));

    Ok(())
}
