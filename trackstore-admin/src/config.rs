use trackstore_config::load_config;
use trackstore_config::shared::AdminConfig;

use crate::error::{AdminError, AdminResult};

/// Loads and validates the admin configuration.
pub fn load_admin_config() -> AdminResult<AdminConfig> {
    let config = load_config::<AdminConfig>().map_err(AdminError::config)?;
    config.validate().map_err(AdminError::config)?;

    Ok(config)
}
