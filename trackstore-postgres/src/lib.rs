//! [`EntityStore`](trackstore_merge::store::EntityStore) over a Postgres/PostGIS track store.

pub mod sql;
mod store;

pub use store::PostgresStore;
