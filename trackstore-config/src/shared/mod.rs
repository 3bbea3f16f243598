//! Shared configuration types for the merge tooling.

mod admin;
mod base;
mod connection;
mod merge;

pub use admin::AdminConfig;
pub use base::ValidationError;
pub use connection::{
    IntoConnectOptions, MERGE_SESSION_OPTIONS, PgConnectionConfig, PgConnectionOptions,
    TlsConfig,
};
pub use merge::{MergeConfig, MergeOrderConfig};
