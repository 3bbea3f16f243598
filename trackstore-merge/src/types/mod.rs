//! Core data types shared by the store adapters and the merge engine.

mod cell;
mod identity;
mod predicate;
mod row;
mod table;

pub use cell::*;
pub use identity::*;
pub use predicate::*;
pub use row::*;
pub use table::*;
