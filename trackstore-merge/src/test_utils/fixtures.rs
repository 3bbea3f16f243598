use chrono::{NaiveDate, NaiveDateTime};

use crate::catalog::{Catalog, standard_catalog};
use crate::store::EntityStore;
use crate::store::memory::MemoryStore;
use crate::types::{Identity, Row};

/// Returns a deterministic identity.
pub fn id(value: u128) -> Identity {
    Identity::from_u128(value)
}

/// Returns a timestamp on 2020-01-01 at the given number of seconds past midnight.
pub fn timestamp(seconds: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 1, 1)
        .and_then(|date| date.and_hms_opt(seconds / 3600, (seconds / 60) % 60, seconds % 60))
        .expect("valid test timestamp")
}

/// Builds a row of a reference table keyed on `name`.
pub fn named(identity: u128, name: &str) -> Row {
    Row::new(id(identity)).with_value("name", name)
}

pub fn platform(
    identity: u128,
    name: &str,
    nationality: Identity,
    platform_type: Identity,
    privacy: Identity,
) -> Row {
    Row::new(id(identity))
        .with_value("name", name)
        .with_value("nationality_id", nationality)
        .with_value("platform_type_id", platform_type)
        .with_value("privacy_id", privacy)
}

pub fn sensor(
    identity: u128,
    name: &str,
    sensor_type: Identity,
    host: Identity,
    privacy: Identity,
) -> Row {
    Row::new(id(identity))
        .with_value("name", name)
        .with_value("sensor_type_id", sensor_type)
        .with_value("host", host)
        .with_value("privacy_id", privacy)
}

pub fn datafile(
    identity: u128,
    reference: &str,
    size: i64,
    hash: &str,
    datafile_type: Identity,
    privacy: Identity,
) -> Row {
    Row::new(id(identity))
        .with_value("simulated", false)
        .with_value("reference", reference)
        .with_value("size", size)
        .with_value("hash", hash)
        .with_value("datafile_type_id", datafile_type)
        .with_value("privacy_id", privacy)
}

pub fn state(identity: u128, source: Identity, sensor: Identity, seconds: u32) -> Row {
    Row::new(id(identity))
        .with_value("source_id", source)
        .with_value("sensor_id", sensor)
        .with_value("time", timestamp(seconds))
        .with_value("speed", 4.5)
}

pub fn synonym(identity: u128, table: &str, entity: Identity, synonym: &str) -> Row {
    Row::new(id(identity))
        .with_value("table", table)
        .with_value("entity", entity)
        .with_value("synonym", synonym)
}

pub fn extraction(identity: u128, datafile: Identity, chars: &str) -> Row {
    Row::new(id(identity))
        .with_value("table", "States")
        .with_value("field", "location")
        .with_value("chars", chars)
        .with_value("datafile_id", datafile)
}

/// Identities of the reference rows [`TrackStores::seed_shared_baseline`] writes to both stores.
#[derive(Debug, Clone, Copy)]
pub struct Baseline {
    pub privacy: Identity,
    pub nationality: Identity,
    pub platform_type: Identity,
    pub sensor_type: Identity,
    pub datafile_type: Identity,
}

/// A master and a slave store over the standard catalog.
#[derive(Debug, Clone)]
pub struct TrackStores {
    pub catalog: Catalog,
    pub master: MemoryStore,
    pub slave: MemoryStore,
}

impl TrackStores {
    pub fn new() -> Self {
        let catalog = standard_catalog();
        let master = MemoryStore::new(&catalog);
        let slave = MemoryStore::new(&catalog);

        Self {
            catalog,
            master,
            slave,
        }
    }

    /// Inserts the same rows, with the same identities, into both stores.
    pub async fn insert_shared(&self, table: &str, rows: Vec<Row>) {
        self.master
            .insert_rows(table, rows.clone())
            .await
            .expect("failed to seed master");
        self.slave
            .insert_rows(table, rows)
            .await
            .expect("failed to seed slave");
    }

    /// Seeds both stores with the reference rows every imported file needs.
    pub async fn seed_shared_baseline(&self) -> Baseline {
        let baseline = Baseline {
            privacy: id(9_001),
            nationality: id(9_002),
            platform_type: id(9_003),
            sensor_type: id(9_004),
            datafile_type: id(9_005),
        };

        self.insert_shared("Privacies", vec![named(9_001, "Public").with_value("level", 0)])
            .await;
        self.insert_shared("Nationalities", vec![named(9_002, "United Kingdom")])
            .await;
        self.insert_shared("PlatformTypes", vec![named(9_003, "Naval - frigate")])
            .await;
        self.insert_shared("SensorTypes", vec![named(9_004, "Position")])
            .await;
        self.insert_shared("DatafileTypes", vec![named(9_005, ".rep")])
            .await;

        baseline
    }
}

impl Default for TrackStores {
    fn default() -> Self {
        Self::new()
    }
}
