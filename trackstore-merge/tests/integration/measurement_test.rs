use trackstore_config::shared::MergeConfig;
use trackstore_merge::merge_all;
use trackstore_merge::store::EntityStore;
use trackstore_merge::test_utils::fixtures::id;
use trackstore_merge::types::Row;
use trackstore_telemetry::tracing::init_test_tracing;

use crate::common::{D1, D2, overlapping_stores};

fn owned_by(rows: &[Row], datafile: u128) -> Vec<Row> {
    rows.iter()
        .filter(|row| row.value("source_id").as_identity() == Some(id(datafile)))
        .cloned()
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn only_measurements_of_added_datafiles_are_copied_test() {
    init_test_tracing();
    let (stores, _) = overlapping_stores().await;

    let summary = merge_all(
        &stores.master,
        &stores.slave,
        &stores.catalog,
        &MergeConfig::default(),
    )
    .await
    .unwrap();

    let datafiles = summary.report("Datafiles").unwrap();
    assert_eq!(datafiles.already_there()[0].identity, id(D1));
    assert_eq!(datafiles.added_identities(), vec![id(D2)]);

    let master_states = stores.master.rows("States").await.unwrap();
    let slave_states = stores.slave.rows("States").await.unwrap();
    // D1 rows were already in master and are not duplicated.
    assert_eq!(owned_by(&master_states, D1).len(), 2);
    // D2 rows arrive complete and unchanged.
    assert_eq!(owned_by(&master_states, D2), owned_by(&slave_states, D2));
    assert_eq!(owned_by(&master_states, D2).len(), 3);
    assert_eq!(summary.copied("States"), Some(3));
    assert_eq!(summary.copied("Contacts"), Some(0));
}

#[tokio::test(flavor = "multi_thread")]
async fn copied_measurements_reference_master_sensors_test() {
    init_test_tracing();
    let (stores, _) = overlapping_stores().await;

    merge_all(
        &stores.master,
        &stores.slave,
        &stores.catalog,
        &MergeConfig::default(),
    )
    .await
    .unwrap();

    // Slave sensor 52 duplicated master sensor 41 before the state was copied.
    let state = stores.master.get("States", id(90)).await.unwrap().unwrap();
    assert_eq!(state.value("sensor_id").as_identity(), Some(id(41)));
    let state = stores.master.get("States", id(91)).await.unwrap().unwrap();
    assert_eq!(state.value("sensor_id").as_identity(), Some(id(53)));
}

#[tokio::test(flavor = "multi_thread")]
async fn extractions_are_copied_per_added_datafile_test() {
    init_test_tracing();
    let (stores, _) = overlapping_stores().await;

    let summary = merge_all(
        &stores.master,
        &stores.slave,
        &stores.catalog,
        &MergeConfig::default(),
    )
    .await
    .unwrap();

    let extractions = stores.master.rows("Extractions").await.unwrap();
    assert_eq!(extractions.len(), 1);
    assert_eq!(extractions[0].identity(), id(96));
    assert_eq!(summary.copied("Extractions"), Some(1));
    assert!(summary.report("Extractions").is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn small_batches_copy_the_same_rows_test() {
    init_test_tracing();
    let (stores, _) = overlapping_stores().await;
    let config = MergeConfig::default().with_batch_size(1);

    let summary = merge_all(&stores.master, &stores.slave, &stores.catalog, &config)
        .await
        .unwrap();

    assert_eq!(summary.copied("States"), Some(3));
    assert_eq!(stores.master.count("States").await.unwrap(), 5);
}
