//! Entity store adapters.
//!
//! [`EntityStore`] is the only way the merge engine reads or writes a track store.

mod base;
mod error;
pub mod memory;

pub use base::{DependentColumn, EntityStore, IdentityRewrite};
pub use error::{StoreError, StoreResult};
