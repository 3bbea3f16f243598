use trackstore_merge::merger::TableMerger;
use trackstore_merge::store::EntityStore;
use trackstore_merge::test_utils::fixtures::{TrackStores, id, named};
use trackstore_merge::types::Row;
use trackstore_telemetry::tracing::init_test_tracing;

use crate::common::{insert, sorted};

const SHARED_GUID: u128 = 4;

/// Seeds the sensor type tables and one slave sensor typed `ST_Shared_1`.
async fn sensor_type_stores() -> TrackStores {
    let stores = TrackStores::new();
    insert(
        &stores.master,
        "SensorTypes",
        vec![
            named(1, "ST_Master_1"),
            named(2, "ST_Master_2"),
            named(3, "ST_Shared_1"),
            named(SHARED_GUID, "ST_Shared_2GUIDMatch"),
        ],
    )
    .await;
    insert(
        &stores.slave,
        "SensorTypes",
        vec![
            named(11, "ST_Slave_1"),
            named(12, "ST_Slave_2"),
            named(13, "ST_Shared_1"),
            named(SHARED_GUID, "ST_Shared_2GUIDMatch"),
        ],
    )
    .await;
    insert(
        &stores.slave,
        "Sensors",
        vec![
            Row::new(id(20))
                .with_value("name", "SENSOR-1")
                .with_value("sensor_type_id", id(13)),
        ],
    )
    .await;

    stores
}

#[tokio::test(flavor = "multi_thread")]
async fn reference_rows_are_added_matched_and_remapped_test() {
    init_test_tracing();
    let stores = sensor_type_stores().await;
    let volatile = vec!["created_date".to_string(), "privacy_id".to_string()];
    let merger = TableMerger::new(&stores.master, &stores.slave, &stores.catalog, &volatile);

    let report = merger
        .merge_table(stores.catalog.require("SensorTypes").unwrap())
        .await
        .unwrap();

    assert_eq!(stores.master.count("SensorTypes").await.unwrap(), 6);
    for slave_only in [11, 12] {
        assert!(
            stores
                .master
                .get("SensorTypes", id(slave_only))
                .await
                .unwrap()
                .is_some()
        );
    }
    assert_eq!(sorted(report.added_identities()), vec![id(11), id(12)]);
    assert_eq!(report.already_there()[0].identity, id(SHARED_GUID));
    assert_eq!(report.modified().len(), 1);
    assert_eq!(report.modified()[0].from, id(13));
    assert_eq!(report.modified()[0].to, id(3));
    assert_eq!(report.modified()[0].name, "ST_Shared_1");

    // The shared row now carries master's identity in the slave, and so does its dependent.
    assert!(stores.slave.get("SensorTypes", id(13)).await.unwrap().is_none());
    assert!(stores.slave.get("SensorTypes", id(3)).await.unwrap().is_some());
    let sensor = stores.slave.get("Sensors", id(20)).await.unwrap().unwrap();
    assert_eq!(sensor.value("sensor_type_id").as_identity(), Some(id(3)));
}

#[tokio::test(flavor = "multi_thread")]
async fn remerging_a_reference_table_changes_nothing_test() {
    init_test_tracing();
    let stores = sensor_type_stores().await;
    let volatile = vec!["created_date".to_string()];
    let merger = TableMerger::new(&stores.master, &stores.slave, &stores.catalog, &volatile);
    let table = stores.catalog.require("SensorTypes").unwrap();
    merger.merge_table(table).await.unwrap();

    let report = merger.merge_table(table).await.unwrap();

    assert_eq!(report.already_there().len(), 4);
    assert!(report.added().is_empty());
    assert!(report.modified().is_empty());
    assert_eq!(stores.master.count("SensorTypes").await.unwrap(), 6);
}

#[tokio::test(flavor = "multi_thread")]
async fn sub_types_match_within_their_parent_test() {
    init_test_tracing();
    let stores = TrackStores::new();
    stores
        .insert_shared(
            "GeometryTypes",
            vec![named(1, "Zone"), named(2, "Track")],
        )
        .await;
    insert(
        &stores.master,
        "GeometrySubTypes",
        vec![named(10, "Circle").with_value("parent", id(1))],
    )
    .await;
    insert(
        &stores.slave,
        "GeometrySubTypes",
        vec![
            named(20, "Circle").with_value("parent", id(1)),
            named(21, "Circle").with_value("parent", id(2)),
        ],
    )
    .await;
    let volatile = vec!["created_date".to_string()];
    let merger = TableMerger::new(&stores.master, &stores.slave, &stores.catalog, &volatile);

    let report = merger
        .merge_table(stores.catalog.require("GeometrySubTypes").unwrap())
        .await
        .unwrap();

    assert_eq!(report.modified()[0].from, id(20));
    assert_eq!(report.modified()[0].to, id(10));
    assert_eq!(report.added_identities(), vec![id(21)]);
}
