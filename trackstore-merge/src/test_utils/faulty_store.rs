use std::io;

use crate::store::{EntityStore, IdentityRewrite, StoreError, StoreResult};
use crate::types::{Cell, Identity, Predicate, Row, TableDefinition, TableKind};

/// Operation of a [`FaultyStore`] that fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    ListTables,
    Find(String),
    Insert(String),
    UpdateIdentity(String),
}

/// Store wrapper that reports [`StoreError::Unavailable`] for the configured operations.
#[derive(Debug, Clone)]
pub struct FaultyStore<S> {
    inner: S,
    faults: Vec<Fault>,
}

impl<S> FaultyStore<S> {
    pub fn wrap(inner: S) -> Self {
        Self {
            inner,
            faults: Vec::new(),
        }
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn check(&self, fault: Fault) -> StoreResult<()> {
        if self.faults.contains(&fault) {
            return Err(StoreError::unavailable(io::Error::new(
                io::ErrorKind::ConnectionReset,
                format!("injected fault: {fault:?}"),
            )));
        }

        Ok(())
    }
}

impl<S> EntityStore for FaultyStore<S>
where
    S: EntityStore + Sync,
{
    async fn list_tables(&self, kind: TableKind) -> StoreResult<Vec<TableDefinition>> {
        self.check(Fault::ListTables)?;
        self.inner.list_tables(kind).await
    }

    async fn get(&self, table: &str, identity: Identity) -> StoreResult<Option<Row>> {
        self.check(Fault::Find(table.to_string()))?;
        self.inner.get(table, identity).await
    }

    async fn find(&self, table: &str, predicate: &Predicate) -> StoreResult<Vec<Row>> {
        self.check(Fault::Find(table.to_string()))?;
        self.inner.find(table, predicate).await
    }

    async fn insert_rows(&self, table: &str, rows: Vec<Row>) -> StoreResult<()> {
        self.check(Fault::Insert(table.to_string()))?;
        self.inner.insert_rows(table, rows).await
    }

    async fn update_identity(&self, rewrite: &IdentityRewrite) -> StoreResult<()> {
        self.check(Fault::UpdateIdentity(rewrite.table.clone()))?;
        self.inner.update_identity(rewrite).await
    }

    async fn update_column(
        &self,
        table: &str,
        identity: Identity,
        column: &str,
        value: Cell,
    ) -> StoreResult<()> {
        self.inner.update_column(table, identity, column, value).await
    }

    async fn count(&self, table: &str) -> StoreResult<usize> {
        self.inner.count(table).await
    }
}
