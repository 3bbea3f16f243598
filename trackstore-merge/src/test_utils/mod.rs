//! Helpers for testing merges against in-memory track stores.
//!
//! - [`fixtures`] builds rows of the standard catalog and seeds master/slave pairs.
//! - [`faulty_store`] wraps a store and fails selected operations as if the store were down.

pub mod faulty_store;
pub mod fixtures;
