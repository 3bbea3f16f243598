use serde::Deserialize;

use crate::Config;
use crate::shared::{MergeConfig, PgConnectionConfig, ValidationError};

/// Complete configuration for the merge admin binary.
///
/// This intentionally does not implement [`serde::Serialize`] to avoid leaking the store
/// passwords into serialized forms.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// The authoritative store the slave is merged into.
    pub master: PgConnectionConfig,
    /// The store being reconciled. Its identities are rewritten in place.
    pub slave: PgConnectionConfig,
    #[serde(default)]
    pub merge: MergeConfig,
}

impl AdminConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.master.validate()?;
        self.slave.validate()?;
        self.merge.validate()
    }
}

impl Config for AdminConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[
        "merge.volatile_columns",
        "merge.order.reference_priority",
        "merge.order.metadata_priority",
        "merge.order.excluded_tables",
        "merge.order.gated_tables",
    ];
}
