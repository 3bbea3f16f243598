use crate::types::{Cell, Identity, Row};

/// A single condition of a [`Predicate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// The row's primary key equals the identity.
    Identity(Identity),
    /// The column equals the value. [`Cell::Null`] matches only null values, like `IS NULL`.
    Eq { column: String, value: Cell },
    /// The column equals one of the values. Null never matches, like SQL `IN`.
    In { column: String, values: Vec<Cell> },
}

impl Condition {
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Condition::Identity(identity) => row.identity() == *identity,
            Condition::Eq { column, value } => row.value(column) == value,
            Condition::In { column, values } => {
                let actual = row.value(column);
                !actual.is_null() && values.contains(actual)
            }
        }
    }
}

/// Conjunction of equality conditions used to query a store.
///
/// An empty predicate matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    conditions: Vec<Condition>,
}

impl Predicate {
    /// Returns a predicate matching every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// Returns a predicate matching rows with the given primary key.
    pub fn identity(identity: Identity) -> Self {
        Self {
            conditions: vec![Condition::Identity(identity)],
        }
    }

    pub fn with_eq(mut self, column: impl Into<String>, value: impl Into<Cell>) -> Self {
        self.conditions.push(Condition::Eq {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_in<I>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Cell>,
    {
        self.conditions.push(Condition::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.conditions
            .iter()
            .all(|condition| condition.matches(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_equality_behaves_like_is_null() {
        let row = Row::new(Identity::from_u128(1)).with_value("name", "NELSON");
        let by_missing_trigraph = Predicate::all()
            .with_eq("name", "NELSON")
            .with_eq("trigraph", Cell::Null);

        assert!(by_missing_trigraph.matches(&row));
        assert!(!Predicate::all().with_eq("name", Cell::Null).matches(&row));
    }

    #[test]
    fn in_condition_never_matches_null() {
        let source = Identity::from_u128(9);
        let with_source = Row::new(Identity::from_u128(1)).with_value("source_id", source);
        let without_source = Row::new(Identity::from_u128(2));
        let predicate = Predicate::all().with_in("source_id", [Cell::from(source), Cell::Null]);

        assert!(predicate.matches(&with_source));
        assert!(!predicate.matches(&without_source));
    }

    #[test]
    fn empty_predicate_matches_everything() {
        assert!(Predicate::all().matches(&Row::new(Identity::random())));
    }
}
