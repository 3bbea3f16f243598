//! Reconciliation of a slave track store into a master track store.
//!
//! Reference and metadata rows are matched against master by identity, natural key, unique
//! constraint or data columns. Matches are remapped in the slave, new rows are copied. Measurement
//! rows are copied only for datafiles added during the same run.

pub mod catalog;
pub mod classifier;
pub mod error;
pub mod matcher;
pub mod measurement;
pub mod merger;
pub mod orchestrator;
pub mod remap;
pub mod report;
pub mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;

pub use orchestrator::{MergeFailure, Orchestrator, merge_all};
