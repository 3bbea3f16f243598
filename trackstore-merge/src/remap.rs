//! Identity rewrites in the slave store.

use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::error::{MergeError, MergeResult};
use crate::report::Remap;
use crate::store::{DependentColumn, EntityStore, IdentityRewrite};
use crate::types::{Cell, Identity, Predicate, PolymorphicReference};

/// Rewrites slave identities to the identities of matching master rows.
///
/// Every foreign key column the catalog knows to reference the table is rewritten in the same
/// store call, so the slave never holds a reference to the old identity.
#[derive(Debug)]
pub struct IdentityRemapper<'a, S> {
    slave: &'a S,
    catalog: &'a Catalog,
}

impl<'a, S> IdentityRemapper<'a, S>
where
    S: EntityStore,
{
    pub fn new(slave: &'a S, catalog: &'a Catalog) -> Self {
        Self { slave, catalog }
    }

    /// Returns the columns that follow a rewrite of `table`.
    pub fn dependents(&self, table: &str) -> Vec<DependentColumn> {
        self.catalog.dependents_of(table)
    }

    pub async fn remap(&self, table: &str, from: Identity, to: Identity) -> MergeResult<()> {
        let rewrite = IdentityRewrite::new(table, from, to).with_dependents(self.dependents(table));

        self.slave
            .update_identity(&rewrite)
            .await
            .map_err(|source| {
                if source.is_unavailable() {
                    MergeError::StoreUnavailable(source)
                } else {
                    MergeError::RemapConflict {
                        table: table.to_string(),
                        from,
                        to,
                        source,
                    }
                }
            })?;

        debug!(
            table,
            %from,
            %to,
            dependents = rewrite.dependents.len(),
            "remapped slave identity"
        );

        Ok(())
    }
}

/// Keeps polymorphic references in the slave store pointing at live identities.
///
/// Synonyms and audit log entries name their target by `(table, identity)`, which no foreign key
/// covers, so they are rewritten explicitly after each table's remaps.
#[derive(Debug)]
pub struct SynonymPropagator<'a, S> {
    slave: &'a S,
    references: &'a [PolymorphicReference],
}

impl<'a, S> SynonymPropagator<'a, S>
where
    S: EntityStore,
{
    pub fn new(slave: &'a S, references: &'a [PolymorphicReference]) -> Self {
        Self { slave, references }
    }

    /// Points every reference to a remapped identity of `table` at its new identity.
    ///
    /// Returns the number of rewritten rows. Running it again with the same remaps rewrites
    /// nothing.
    pub async fn propagate(&self, table: &str, remaps: &[Remap]) -> MergeResult<usize> {
        if remaps.is_empty() {
            return Ok(0);
        }

        let mut rewritten = 0;
        for reference in self.references {
            for remap in remaps {
                let predicate = Predicate::all()
                    .with_eq(reference.discriminator_column.as_str(), table)
                    .with_eq(reference.identity_column.as_str(), remap.from);

                let rows = self.slave.find(&reference.table, &predicate).await?;
                for row in rows {
                    self.slave
                        .update_column(
                            &reference.table,
                            row.identity(),
                            &reference.identity_column,
                            Cell::from(remap.to),
                        )
                        .await?;
                    rewritten += 1;
                }
            }
        }

        if rewritten > 0 {
            info!(
                table,
                rewritten, "pointed polymorphic references at remapped identities"
            );
        }

        Ok(rewritten)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::standard_catalog;
    use crate::store::memory::MemoryStore;
    use crate::types::Row;

    #[tokio::test]
    async fn remap_rewrites_dependents_through_the_catalog() {
        let catalog = standard_catalog();
        let slave = MemoryStore::new(&catalog);
        let from = Identity::from_u128(1);
        let to = Identity::from_u128(2);
        slave
            .insert("Platforms", Row::new(from).with_value("name", "ADRI"))
            .await
            .unwrap();
        slave
            .insert(
                "Sensors",
                Row::new(Identity::from_u128(3))
                    .with_value("name", "GPS")
                    .with_value("host", from),
            )
            .await
            .unwrap();

        IdentityRemapper::new(&slave, &catalog)
            .remap("Platforms", from, to)
            .await
            .unwrap();

        let sensor = slave.get("Sensors", Identity::from_u128(3)).await.unwrap().unwrap();
        assert_eq!(sensor.value("host").as_identity(), Some(to));
    }

    #[tokio::test]
    async fn rejected_remap_is_a_conflict() {
        let catalog = standard_catalog();
        let slave = MemoryStore::new(&catalog);

        let err = IdentityRemapper::new(&slave, &catalog)
            .remap("Platforms", Identity::from_u128(1), Identity::from_u128(2))
            .await
            .unwrap_err();

        assert!(matches!(err, MergeError::RemapConflict { .. }));
    }

    #[tokio::test]
    async fn propagation_is_idempotent() {
        let catalog = standard_catalog();
        let slave = MemoryStore::new(&catalog);
        let from = Identity::from_u128(1);
        let to = Identity::from_u128(2);
        slave
            .insert_rows(
                "Synonyms",
                vec![
                    Row::new(Identity::from_u128(10))
                        .with_value("table", "Platforms")
                        .with_value("entity", from)
                        .with_value("synonym", "ADRIAN"),
                    Row::new(Identity::from_u128(11))
                        .with_value("table", "Sensors")
                        .with_value("entity", from)
                        .with_value("synonym", "GPS-1"),
                ],
            )
            .await
            .unwrap();
        let remaps = vec![Remap {
            from,
            to,
            name: "ADRI".into(),
        }];
        let propagator = SynonymPropagator::new(&slave, catalog.polymorphic_references());

        assert_eq!(propagator.propagate("Platforms", &remaps).await.unwrap(), 1);
        assert_eq!(propagator.propagate("Platforms", &remaps).await.unwrap(), 0);

        let synonyms = slave.rows("Synonyms").await.unwrap();
        assert_eq!(synonyms[0].value("entity").as_identity(), Some(to));
        assert_eq!(synonyms[1].value("entity").as_identity(), Some(from));
    }
}
