use crate::store::StoreResult;
use crate::types::{Cell, Identity, Predicate, Row, TableDefinition, TableKind};

/// A foreign key column that must follow an identity rewrite of the table it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentColumn {
    pub table: String,
    pub column: String,
}

impl DependentColumn {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

/// Rewrite of one row's primary key together with every column referencing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRewrite {
    pub table: String,
    pub from: Identity,
    pub to: Identity,
    pub dependents: Vec<DependentColumn>,
}

impl IdentityRewrite {
    pub fn new(table: impl Into<String>, from: Identity, to: Identity) -> Self {
        Self {
            table: table.into(),
            from,
            to,
            dependents: Vec::new(),
        }
    }

    pub fn with_dependents(mut self, dependents: Vec<DependentColumn>) -> Self {
        self.dependents = dependents;
        self
    }
}

/// Uniform access to the tables and rows of one track store.
///
/// The merge engine awaits every call before issuing the next one, so implementations only need
/// to guarantee that a call observes the effects of the calls completed before it.
pub trait EntityStore {
    /// Returns the definitions of the tables of the given tier present in this store.
    fn list_tables(
        &self,
        kind: TableKind,
    ) -> impl Future<Output = StoreResult<Vec<TableDefinition>>> + Send;

    /// Returns the row with the given identity, if any.
    fn get(
        &self,
        table: &str,
        identity: Identity,
    ) -> impl Future<Output = StoreResult<Option<Row>>> + Send;

    /// Returns every row matching the predicate, in a stable order.
    fn find(
        &self,
        table: &str,
        predicate: &Predicate,
    ) -> impl Future<Output = StoreResult<Vec<Row>>> + Send;

    /// Inserts all rows, or none of them if any is rejected.
    fn insert_rows(
        &self,
        table: &str,
        rows: Vec<Row>,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Inserts a single row.
    fn insert(&self, table: &str, row: Row) -> impl Future<Output = StoreResult<()>> + Send {
        self.insert_rows(table, vec![row])
    }

    /// Rewrites a primary key and every listed dependent column in one atomic step.
    fn update_identity(
        &self,
        rewrite: &IdentityRewrite,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Sets one column of one row.
    fn update_column(
        &self,
        table: &str,
        identity: Identity,
        column: &str,
        value: Cell,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Returns the number of rows in the table.
    fn count(&self, table: &str) -> impl Future<Output = StoreResult<usize>> + Send;
}
