use trackstore_merge::store::EntityStore;
use trackstore_merge::test_utils::fixtures::{
    Baseline, TrackStores, datafile, extraction, id, platform, sensor, state, synonym, timestamp,
};
use trackstore_merge::types::{Identity, Row};

pub const D1: u128 = 70;
pub const D2: u128 = 71;

/// A master and slave pair that overlap on some platforms, sensors and one datafile.
///
/// Master holds platform `ADRI` (40), its sensor `GPS` (41) and datafile D1 with two states.
/// Slave holds the same platform and sensor under identities 50 and 52, a new platform `NELSON`
/// (51) with sensor `Radar` (53), D1 under the same identity plus a new datafile D2 with three
/// states, synonyms for both platforms, one extraction per datafile and an audit log entry.
pub async fn overlapping_stores() -> (TrackStores, Baseline) {
    let stores = TrackStores::new();
    let baseline = stores.seed_shared_baseline().await;
    let Baseline {
        privacy,
        nationality,
        platform_type,
        sensor_type,
        datafile_type,
    } = baseline;

    insert(
        &stores.master,
        "Platforms",
        vec![platform(40, "ADRI", nationality, platform_type, privacy)],
    )
    .await;
    insert(
        &stores.master,
        "Sensors",
        vec![sensor(41, "GPS", sensor_type, id(40), privacy)],
    )
    .await;
    insert(
        &stores.master,
        "Datafiles",
        vec![datafile(D1, "rep_test1.rep", 100, "h1", datafile_type, privacy)],
    )
    .await;
    insert(
        &stores.master,
        "States",
        vec![state(80, id(D1), id(41), 0), state(81, id(D1), id(41), 60)],
    )
    .await;

    insert(
        &stores.slave,
        "Platforms",
        vec![
            platform(50, "ADRI", nationality, platform_type, privacy),
            platform(51, "NELSON", nationality, platform_type, privacy),
        ],
    )
    .await;
    insert(
        &stores.slave,
        "Sensors",
        vec![
            sensor(52, "GPS", sensor_type, id(50), privacy),
            sensor(53, "Radar", sensor_type, id(51), privacy),
        ],
    )
    .await;
    insert(
        &stores.slave,
        "Datafiles",
        vec![
            datafile(D1, "rep_test1.rep", 100, "h1", datafile_type, privacy),
            datafile(D2, "rep_test2.rep", 200, "h2", datafile_type, privacy),
        ],
    )
    .await;
    insert(
        &stores.slave,
        "States",
        vec![
            state(80, id(D1), id(52), 0),
            state(81, id(D1), id(52), 60),
            state(90, id(D2), id(52), 120),
            state(91, id(D2), id(53), 180),
            state(92, id(D2), id(53), 240),
        ],
    )
    .await;
    insert(
        &stores.slave,
        "Synonyms",
        vec![
            synonym(60, "Platforms", id(50), "ADRIAN"),
            synonym(61, "Platforms", id(51), "HMS NELSON"),
        ],
    )
    .await;
    insert(
        &stores.slave,
        "Extractions",
        vec![extraction(95, id(D1), "ADRI 01"), extraction(96, id(D2), "NELSON 02")],
    )
    .await;
    insert(
        &stores.slave,
        "Changes",
        vec![
            Row::new(id(97))
                .with_value("user", "analyst")
                .with_value("modified", timestamp(0).date())
                .with_value("reason", "Importing rep_test2.rep"),
        ],
    )
    .await;
    insert(
        &stores.slave,
        "Logs",
        vec![
            Row::new(id(98))
                .with_value("table", "Platforms")
                .with_value("id", id(50))
                .with_value("change_id", id(97)),
        ],
    )
    .await;

    (stores, baseline)
}

pub async fn insert<S: EntityStore>(store: &S, table: &str, rows: Vec<Row>) {
    store
        .insert_rows(table, rows)
        .await
        .expect("failed to insert test rows");
}

pub fn sorted(mut identities: Vec<Identity>) -> Vec<Identity> {
    identities.sort();
    identities
}
