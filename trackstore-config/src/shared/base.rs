use thiserror::Error;

/// Errors raised while validating loaded configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A field holds a value outside of its allowed range.
    #[error("invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
    /// TLS is enabled but no trusted root certificates are provided.
    #[error("Invalid TLS config: `trusted_root_certs` must be set when `enabled` is true")]
    MissingTrustedRootCerts,
    /// The same table is named in two mutually exclusive ordering lists.
    #[error("table `{table}` is listed more than once in the merge ordering configuration")]
    DuplicateOrderedTable { table: String },
}
