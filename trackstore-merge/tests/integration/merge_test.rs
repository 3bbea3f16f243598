use std::collections::{BTreeMap, HashSet};

use trackstore_config::shared::MergeConfig;
use trackstore_merge::merge_all;
use trackstore_merge::report::TableOutcome;
use trackstore_merge::store::EntityStore;
use trackstore_merge::test_utils::fixtures::{TrackStores, id};
use trackstore_merge::types::{Identity, TableKind};
use trackstore_telemetry::tracing::init_test_tracing;

use crate::common::{overlapping_stores, sorted};

async fn master_counts(stores: &TrackStores) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for table in stores.catalog.tables() {
        let count = stores.master.count(&table.name).await.unwrap();
        counts.insert(table.name.clone(), count);
    }
    counts
}

#[tokio::test(flavor = "multi_thread")]
async fn second_merge_changes_nothing_test() {
    init_test_tracing();
    let (stores, _) = overlapping_stores().await;
    let config = MergeConfig::default();

    let first = merge_all(&stores.master, &stores.slave, &stores.catalog, &config)
        .await
        .unwrap();
    assert!(!first.is_noop());
    let counts = master_counts(&stores).await;

    let second = merge_all(&stores.master, &stores.slave, &stores.catalog, &config)
        .await
        .unwrap();

    assert!(second.is_noop());
    for summary in second.tables() {
        if let TableOutcome::Merged(report) = &summary.outcome {
            assert!(report.added().is_empty(), "{} added rows", summary.table);
            assert!(report.modified().is_empty(), "{} remapped rows", summary.table);
        }
    }
    assert_eq!(master_counts(&stores).await, counts);
}

#[tokio::test(flavor = "multi_thread")]
async fn every_slave_row_is_classified_exactly_once_test() {
    init_test_tracing();
    let (stores, _) = overlapping_stores().await;
    let mut before = BTreeMap::new();
    for table in stores.catalog.tables() {
        let rows = stores.slave.rows(&table.name).await.unwrap();
        let identities: Vec<Identity> = rows.iter().map(|row| row.identity()).collect();
        before.insert(table.name.clone(), identities);
    }

    let summary = merge_all(
        &stores.master,
        &stores.slave,
        &stores.catalog,
        &MergeConfig::default(),
    )
    .await
    .unwrap();

    let mut merged = 0;
    for table in summary.tables() {
        let TableOutcome::Merged(report) = &table.outcome else {
            continue;
        };
        merged += 1;
        let identities = report.slave_identities();
        let distinct: HashSet<Identity> = identities.iter().copied().collect();

        assert_eq!(distinct.len(), identities.len(), "{} overlaps", table.table);
        assert_eq!(
            sorted(identities),
            sorted(before[&table.table].clone()),
            "{} is not partitioned",
            table.table
        );
    }
    assert!(merged > 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn no_reference_is_left_dangling_test() {
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

    let slave = stores.slave.dangling_references().await;
    let master = stores.master.dangling_references().await;

    assert!(slave.is_empty(), "dangling slave references: {slave:?}");
    assert!(master.is_empty(), "dangling master references: {master:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn master_holds_the_data_of_every_merged_slave_row_test() {
    init_test_tracing();
    let (stores, _) = overlapping_stores().await;
    let config = MergeConfig::default();

    let summary = merge_all(&stores.master, &stores.slave, &stores.catalog, &config)
        .await
        .unwrap();

    for table in summary.tables() {
        if !matches!(table.outcome, TableOutcome::Merged(_)) {
            continue;
        }
        for row in stores.slave.rows(&table.table).await.unwrap() {
            let master_row = stores
                .master
                .get(&table.table, row.identity())
                .await
                .unwrap()
                .unwrap_or_else(|| panic!("{} row {} missing", table.table, row.identity()));

            assert!(
                master_row.same_data(&row, &config.volatile_columns),
                "{} row {} differs",
                table.table,
                row.identity()
            );
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicates_are_remapped_and_new_rows_keep_their_identity_test() {
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

    let platforms = summary.report("Platforms").unwrap();
    assert_eq!(platforms.modified()[0].from, id(50));
    assert_eq!(platforms.modified()[0].to, id(40));
    assert_eq!(platforms.added_identities(), vec![id(51)]);

    let sensors = summary.report("Sensors").unwrap();
    assert_eq!(sensors.modified()[0].from, id(52));
    assert_eq!(sensors.modified()[0].to, id(41));
    assert_eq!(sensors.added_identities(), vec![id(53)]);

    let radar = stores.master.get("Sensors", id(53)).await.unwrap().unwrap();
    assert_eq!(radar.value("host").as_identity(), Some(id(51)));
    assert_eq!(stores.master.count("Platforms").await.unwrap(), 2);

    let statistics = summary.statistics(TableKind::Metadata);
    assert_eq!(statistics[0].0, "Platforms");
    assert_eq!(statistics[1].0, "Sensors");
}

#[tokio::test(flavor = "multi_thread")]
async fn synonyms_and_logs_follow_remapped_entities_test() {
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

    let adrian = stores.master.get("Synonyms", id(60)).await.unwrap().unwrap();
    assert_eq!(adrian.value("entity").as_identity(), Some(id(40)));
    let nelson = stores.master.get("Synonyms", id(61)).await.unwrap().unwrap();
    assert_eq!(nelson.value("entity").as_identity(), Some(id(51)));
    assert_eq!(summary.report("Synonyms").unwrap().added().len(), 2);

    let log = stores.slave.get("Logs", id(98)).await.unwrap().unwrap();
    assert_eq!(log.value("id").as_identity(), Some(id(40)));
    assert_eq!(stores.master.count("Logs").await.unwrap(), 0);
    assert_eq!(stores.master.count("Changes").await.unwrap(), 0);
    assert!(summary.report("Logs").is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_stores_merge_to_an_empty_summary_test() {
    init_test_tracing();
    let stores = TrackStores::new();

    let summary = merge_all(
        &stores.master,
        &stores.slave,
        &stores.catalog,
        &MergeConfig::default(),
    )
    .await
    .unwrap();

    assert!(summary.is_noop());
    for table in summary.tables() {
        match &table.outcome {
            TableOutcome::Merged(report) => assert!(report.is_empty()),
            TableOutcome::Copied { added } => assert_eq!(*added, 0),
        }
    }
    assert!(master_counts(&stores).await.values().all(|count| *count == 0));
}
