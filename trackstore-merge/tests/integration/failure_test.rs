use trackstore_config::shared::MergeConfig;
use trackstore_merge::classifier::MergeStage;
use trackstore_merge::error::MergeError;
use trackstore_merge::merge_all;
use trackstore_merge::store::EntityStore;
use trackstore_merge::store::memory::MemoryStore;
use trackstore_merge::test_utils::faulty_store::{Fault, FaultyStore};
use trackstore_merge::test_utils::fixtures::{TrackStores, id, named, synonym};
use trackstore_telemetry::tracing::init_test_tracing;

use crate::common::{D2, insert, overlapping_stores, sorted};

#[tokio::test(flavor = "multi_thread")]
async fn ambiguous_natural_key_aborts_the_table_test() {
    init_test_tracing();
    let stores = TrackStores::new();
    insert(
        &stores.master,
        "SensorTypes",
        vec![named(1, "GPS"), named(2, "GPS")],
    )
    .await;
    // The new row is classified first and must not reach master either.
    insert(
        &stores.slave,
        "SensorTypes",
        vec![named(10, "Radar"), named(11, "GPS")],
    )
    .await;

    let failure = merge_all(
        &stores.master,
        &stores.slave,
        &stores.catalog,
        &MergeConfig::default(),
    )
    .await
    .unwrap_err();

    assert_eq!(failure.stage, MergeStage::Reference);
    assert_eq!(failure.table.as_deref(), Some("SensorTypes"));
    let MergeError::AmbiguousNaturalKey {
        identity, matches, ..
    } = &failure.source
    else {
        panic!("unexpected error: {failure}");
    };
    assert_eq!(*identity, id(11));
    assert_eq!(sorted(matches.clone()), vec![id(1), id(2)]);
    assert_eq!(stores.master.count("SensorTypes").await.unwrap(), 2);
    assert!(stores.master.get("SensorTypes", id(10)).await.unwrap().is_none());
    assert!(failure.to_string().contains("SensorTypes"));
}

#[tokio::test(flavor = "multi_thread")]
async fn unavailable_slave_fails_at_the_table_in_progress_test() {
    init_test_tracing();
    let (stores, _) = overlapping_stores().await;
    let slave = FaultyStore::wrap(stores.slave.clone()).with_fault(Fault::Find("Sensors".into()));

    let failure = merge_all(
        &stores.master,
        &slave,
        &stores.catalog,
        &MergeConfig::default(),
    )
    .await
    .unwrap_err();

    assert_eq!(failure.stage, MergeStage::Metadata);
    assert_eq!(failure.table.as_deref(), Some("Sensors"));
    assert!(matches!(failure.source, MergeError::StoreUnavailable(_)));
    assert_eq!(failure.source.category(), "store unavailable");
    // Tables merged before the failure stay merged.
    assert_eq!(stores.master.count("Platforms").await.unwrap(), 2);
    assert_eq!(stores.master.count("Sensors").await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_master_insert_leaves_the_table_untouched_test() {
    init_test_tracing();
    let (stores, _) = overlapping_stores().await;
    let master =
        FaultyStore::wrap(stores.master.clone()).with_fault(Fault::Insert("Datafiles".into()));

    let failure = merge_all(&master, &stores.slave, &stores.catalog, &MergeConfig::default())
        .await
        .unwrap_err();

    assert_eq!(failure.stage, MergeStage::Datafile);
    assert_eq!(stores.master.count("Datafiles").await.unwrap(), 1);
    assert_eq!(stores.master.count("States").await.unwrap(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn unavailable_master_fails_while_planning_test() {
    init_test_tracing();
    let stores = TrackStores::new();
    let master = FaultyStore::wrap(stores.master.clone()).with_fault(Fault::ListTables);

    let failure = merge_all(&master, &stores.slave, &stores.catalog, &MergeConfig::default())
        .await
        .unwrap_err();

    assert_eq!(failure.stage, MergeStage::Planning);
    assert_eq!(failure.table, None);
    assert!(matches!(failure.source, MergeError::StoreUnavailable(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn rerun_after_a_failure_completes_the_merge_test() {
    init_test_tracing();
    let (stores, _) = overlapping_stores().await;
    let config = MergeConfig::default();
    let master =
        FaultyStore::wrap(stores.master.clone()).with_fault(Fault::Insert("Synonyms".into()));
    let failure = merge_all(&master, &stores.slave, &stores.catalog, &config)
        .await
        .unwrap_err();
    assert_eq!(failure.stage, MergeStage::Synonym);

    let summary = merge_all(&stores.master, &stores.slave, &stores.catalog, &config)
        .await
        .unwrap();

    assert_eq!(summary.report("Platforms").unwrap().already_there().len(), 2);
    assert_eq!(summary.report("Synonyms").unwrap().added().len(), 2);
    assert_eq!(stores.master.count("Synonyms").await.unwrap(), 2);
    // The first run stopped before writing the new datafile, so its rows are copied now.
    assert_eq!(
        summary.report("Datafiles").unwrap().added_identities(),
        vec![id(D2)]
    );
    assert_eq!(summary.copied("States"), Some(3));
    assert_eq!(stores.master.count("States").await.unwrap(), 5);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_measurement_copy_keeps_the_table_uncopied_test() {
    init_test_tracing();
    let (stores, _) = overlapping_stores().await;
    let master =
        FaultyStore::wrap(stores.master.clone()).with_fault(Fault::Insert("States".into()));

    let failure = merge_all(&master, &stores.slave, &stores.catalog, &MergeConfig::default())
        .await
        .unwrap_err();

    assert_eq!(failure.stage, MergeStage::Measurement);
    assert_eq!(failure.table.as_deref(), Some("States"));
    assert_eq!(stores.master.count("Datafiles").await.unwrap(), 2);
    assert_eq!(stores.master.count("States").await.unwrap(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn remaps_before_an_ambiguity_keep_their_synonyms_test() {
    init_test_tracing();
    let stores = TrackStores::new();
    insert(
        &stores.master,
        "SensorTypes",
        vec![named(3, "ST_Shared_1"), named(1, "GPS"), named(2, "GPS")],
    )
    .await;
    insert(
        &stores.slave,
        "SensorTypes",
        vec![named(13, "ST_Shared_1"), named(11, "GPS")],
    )
    .await;
    insert(
        &stores.slave,
        "Synonyms",
        vec![synonym(60, "SensorTypes", id(13), "SHARED")],
    )
    .await;
    let config = MergeConfig::default();

    let failure = merge_all(&stores.master, &stores.slave, &stores.catalog, &config)
        .await
        .unwrap_err();
    assert!(matches!(
        failure.source,
        MergeError::AmbiguousNaturalKey { .. }
    ));
    let slave_synonym = stores.slave.get("Synonyms", id(60)).await.unwrap().unwrap();
    assert_eq!(slave_synonym.value("entity").as_identity(), Some(id(3)));

    // The operator resolves the duplicate in master and runs the merge again.
    let master = MemoryStore::new(&stores.catalog);
    insert(
        &master,
        "SensorTypes",
        vec![named(3, "ST_Shared_1"), named(1, "GPS")],
    )
    .await;
    merge_all(&master, &stores.slave, &stores.catalog, &config)
        .await
        .unwrap();

    let master_synonym = master.get("Synonyms", id(60)).await.unwrap().unwrap();
    assert_eq!(master_synonym.value("entity").as_identity(), Some(id(3)));
    assert!(master.dangling_references().await.is_empty());
}
