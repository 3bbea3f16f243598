//! Classification of one slave row against the master store.

use tracing::debug;

use crate::error::{MergeError, MergeResult};
use crate::store::EntityStore;
use crate::types::{Identity, Predicate, Row, TableDefinition, TableKind};

/// How a slave row relates to the master store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// A master row has the same identity.
    AlreadyThere,
    /// No master row describes the same entity; the row is copied with its identity.
    New,
    /// A master row describes the same entity under another identity.
    Duplicate { target: Identity },
}

/// Columns used to find a master row describing the same entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Equality on the natural key columns, null matching null.
    NaturalKey(Vec<String>),
    /// Equality on the declared uniqueness constraint, null matching null.
    UniqueConstraint(Vec<String>),
    /// Equality on every data column the slave row has a value for.
    DataColumns(Vec<String>),
}

impl MatchStrategy {
    /// Selects the strategy for a table.
    ///
    /// Reference tables and tables with a natural key match on it. Other metadata tables match on
    /// their uniqueness constraint if they declare one, and on all non-volatile columns otherwise.
    pub fn for_table(table: &TableDefinition, volatile_columns: &[String]) -> Self {
        if !table.natural_key.is_empty() {
            return MatchStrategy::NaturalKey(table.natural_key.clone());
        }
        if table.kind == TableKind::Metadata
            && let Some(columns) = &table.unique_constraint
        {
            return MatchStrategy::UniqueConstraint(columns.clone());
        }

        MatchStrategy::DataColumns(
            table
                .column_names()
                .filter(|column| {
                    !volatile_columns
                        .iter()
                        .any(|volatile| volatile.as_str() == *column)
                })
                .map(ToString::to_string)
                .collect(),
        )
    }

    /// Builds the predicate selecting master candidates for `row`.
    pub fn predicate(&self, row: &Row) -> Predicate {
        match self {
            MatchStrategy::NaturalKey(columns) | MatchStrategy::UniqueConstraint(columns) => {
                columns.iter().fold(Predicate::all(), |predicate, column| {
                    predicate.with_eq(column.as_str(), row.value(column).clone())
                })
            }
            // Null slave values are not compared, matching on whatever the slave row knows.
            MatchStrategy::DataColumns(columns) => columns
                .iter()
                .filter(|column| !row.value(column).is_null())
                .fold(Predicate::all(), |predicate, column| {
                    predicate.with_eq(column.as_str(), row.value(column).clone())
                }),
        }
    }

    fn ambiguity(&self, table: &str, row: &Row, matches: Vec<Identity>) -> MergeError {
        match self {
            MatchStrategy::NaturalKey(columns) | MatchStrategy::UniqueConstraint(columns) => {
                MergeError::AmbiguousNaturalKey {
                    table: table.to_string(),
                    identity: row.identity(),
                    columns: columns.clone(),
                    matches,
                }
            }
            MatchStrategy::DataColumns(_) => MergeError::AmbiguousDataMatch {
                table: table.to_string(),
                identity: row.identity(),
                matches,
            },
        }
    }
}

/// Classifies slave rows of one table against the master store.
///
/// Rows staged for insertion into master but not yet written are passed alongside the store and
/// are treated as if they were already there.
#[derive(Debug)]
pub struct EntityMatcher<'a> {
    table: &'a TableDefinition,
    strategy: MatchStrategy,
}

impl<'a> EntityMatcher<'a> {
    pub fn new(table: &'a TableDefinition, volatile_columns: &[String]) -> Self {
        Self {
            table,
            strategy: MatchStrategy::for_table(table, volatile_columns),
        }
    }

    pub fn strategy(&self) -> &MatchStrategy {
        &self.strategy
    }

    pub async fn classify<M>(
        &self,
        master: &M,
        staged: &[Row],
        row: &Row,
    ) -> MergeResult<MatchOutcome>
    where
        M: EntityStore,
    {
        let table = self.table.name.as_str();

        let by_identity = Predicate::identity(row.identity());
        let same_identity = self.candidates(master, staged, &by_identity).await?;
        match same_identity.len() {
            0 => {}
            1 => {
                debug!(table, identity = %row.identity(), "row already present");
                return Ok(MatchOutcome::AlreadyThere);
            }
            count => {
                return Err(MergeError::AmbiguousIdentity {
                    table: table.to_string(),
                    identity: row.identity(),
                    count,
                });
            }
        }

        let predicate = self.strategy.predicate(row);
        let candidates = self.candidates(master, staged, &predicate).await?;
        match candidates.len() {
            0 => {
                debug!(table, identity = %row.identity(), "row is new");
                Ok(MatchOutcome::New)
            }
            1 => {
                let target = candidates[0];
                debug!(table, from = %row.identity(), to = %target, "row duplicates a master row");
                Ok(MatchOutcome::Duplicate { target })
            }
            _ => Err(self.strategy.ambiguity(table, row, candidates)),
        }
    }

    async fn candidates<M>(
        &self,
        master: &M,
        staged: &[Row],
        predicate: &Predicate,
    ) -> MergeResult<Vec<Identity>>
    where
        M: EntityStore,
    {
        let mut identities: Vec<Identity> = master
            .find(&self.table.name, predicate)
            .await?
            .iter()
            .map(Row::identity)
            .collect();
        identities.extend(
            staged
                .iter()
                .filter(|row| predicate.matches(row))
                .map(Row::identity),
        );

        Ok(identities)
    }
}
