use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Settings controlling one merge run.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct MergeConfig {
    /// Maximum number of parent identities bound into a single measurement copy query.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Columns ignored when comparing rows by their full data column set.
    #[serde(default = "default_volatile_columns")]
    pub volatile_columns: Vec<String>,
    /// Table ordering exceptions applied on top of the tier classification.
    #[serde(default)]
    pub order: MergeOrderConfig,
}

impl MergeConfig {
    /// Default number of parent identities per measurement copy batch.
    pub const DEFAULT_BATCH_SIZE: usize = 100;

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_volatile_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.volatile_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_order(mut self, order: MergeOrderConfig) -> Self {
        self.order = order;
        self
    }

    /// Validates the merge settings.
    ///
    /// Ensures the batch size is non-zero and that the ordering lists are consistent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.batch_size == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "merge.batch_size".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        if self.volatile_columns.iter().any(|c| c.trim().is_empty()) {
            return Err(ValidationError::InvalidFieldValue {
                field: "merge.volatile_columns".to_string(),
                constraint: "must not contain empty column names".to_string(),
            });
        }

        self.order.validate()
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            volatile_columns: default_volatile_columns(),
            order: MergeOrderConfig::default(),
        }
    }
}

/// Explicit ordering exceptions for the table classifier.
///
/// Priority lists are processed first within their tier, in the given order. The datafile,
/// synonym and excluded tables are taken out of the generic metadata ordering entirely.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct MergeOrderConfig {
    #[serde(default = "default_reference_priority")]
    pub reference_priority: Vec<String>,
    #[serde(default = "default_metadata_priority")]
    pub metadata_priority: Vec<String>,
    /// Metadata table whose added identities gate the measurement copy.
    #[serde(default = "default_datafile_table")]
    pub datafile_table: String,
    /// Aliasing table, merged after every other metadata table.
    #[serde(default = "default_synonym_table")]
    pub synonym_table: String,
    /// Tables that are never merged.
    #[serde(default = "default_excluded_tables")]
    pub excluded_tables: Vec<String>,
    /// Metadata tables copied like measurement tables, gated on added datafiles.
    #[serde(default = "default_gated_tables")]
    pub gated_tables: Vec<String>,
}

impl MergeOrderConfig {
    pub fn with_reference_priority<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reference_priority = tables.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata_priority<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata_priority = tables.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_excluded_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_tables = tables.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_gated_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.gated_tables = tables.into_iter().map(Into::into).collect();
        self
    }

    /// Returns `true` when the table is handled at a fixed point rather than by tier ordering.
    pub fn is_deferred(&self, table: &str) -> bool {
        table == self.datafile_table
            || table == self.synonym_table
            || self.excluded_tables.iter().any(|t| t == table)
            || self.gated_tables.iter().any(|t| t == table)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("merge.order.datafile_table", &self.datafile_table),
            ("merge.order.synonym_table", &self.synonym_table),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidFieldValue {
                    field: field.to_string(),
                    constraint: "must not be empty".to_string(),
                });
            }
        }

        // Priority lists are independent of each other, the fixed-point tables are not.
        let mut seen = HashSet::new();
        let fixed = [&self.datafile_table, &self.synonym_table]
            .into_iter()
            .chain(self.excluded_tables.iter())
            .chain(self.gated_tables.iter())
            .chain(self.metadata_priority.iter());
        for table in fixed {
            if table.trim().is_empty() {
                return Err(ValidationError::InvalidFieldValue {
                    field: "merge.order".to_string(),
                    constraint: "table names must not be empty".to_string(),
                });
            }
            if !seen.insert(table.as_str()) {
                return Err(ValidationError::DuplicateOrderedTable {
                    table: table.clone(),
                });
            }
        }

        let mut seen = HashSet::new();
        for table in &self.reference_priority {
            if !seen.insert(table.as_str()) {
                return Err(ValidationError::DuplicateOrderedTable {
                    table: table.clone(),
                });
            }
        }

        Ok(())
    }
}

impl Default for MergeOrderConfig {
    fn default() -> Self {
        Self {
            reference_priority: default_reference_priority(),
            metadata_priority: default_metadata_priority(),
            datafile_table: default_datafile_table(),
            synonym_table: default_synonym_table(),
            excluded_tables: default_excluded_tables(),
            gated_tables: default_gated_tables(),
        }
    }
}

fn default_batch_size() -> usize {
    MergeConfig::DEFAULT_BATCH_SIZE
}

fn default_volatile_columns() -> Vec<String> {
    vec!["created_date".to_string(), "privacy_id".to_string()]
}

fn default_reference_priority() -> Vec<String> {
    vec!["GeometryTypes".to_string()]
}

fn default_metadata_priority() -> Vec<String> {
    vec!["Platforms".to_string(), "Sensors".to_string()]
}

fn default_datafile_table() -> String {
    "Datafiles".to_string()
}

fn default_synonym_table() -> String {
    "Synonyms".to_string()
}

fn default_excluded_tables() -> Vec<String> {
    vec!["Logs".to_string(), "Changes".to_string()]
}

fn default_gated_tables() -> Vec<String> {
    vec!["Extractions".to_string()]
}
