//! Tracing initialisation shared by the merge binaries and tests.

pub mod tracing;
