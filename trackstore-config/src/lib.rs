//! Configuration for the track store merge tooling.
//!
//! Configuration is loaded from `configuration/base.*`, then from the environment specific file
//! and finally from `APP_` prefixed environment variables.

mod environment;
mod load;
pub mod shared;

pub use environment::Environment;
pub use load::{Config, LoadConfigError, load_config, load_config_from_directory};
