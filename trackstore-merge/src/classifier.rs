//! Table classification and merge ordering.
//!
//! Tables are partitioned by [`TableKind`] and ordered so that a table is merged after every
//! table of the same tier it references. The fixed exceptions (priority tables, the datafile
//! table, the synonym table, excluded and gated tables) come from [`MergeOrderConfig`].

use std::collections::HashSet;
use std::fmt;

use trackstore_config::shared::MergeOrderConfig;

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::types::{TableDefinition, TableKind};

/// Stage of a merge run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MergeStage {
    Planning,
    Reference,
    Metadata,
    Datafile,
    Synonym,
    Measurement,
}

impl MergeStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStage::Planning => "planning",
            MergeStage::Reference => "reference",
            MergeStage::Metadata => "metadata",
            MergeStage::Datafile => "datafile",
            MergeStage::Synonym => "synonym",
            MergeStage::Measurement => "measurement",
        }
    }
}

impl fmt::Display for MergeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered list of the tables a merge run processes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePlan {
    pub reference: Vec<String>,
    pub metadata: Vec<String>,
    pub datafile: Option<String>,
    pub synonym: Option<String>,
    /// Metadata tables copied per added datafile, before the measurement tables.
    pub gated: Vec<String>,
    pub measurement: Vec<String>,
    /// Tables that are never merged.
    pub excluded: Vec<String>,
}

impl MergePlan {
    /// Returns every table to process together with the stage it belongs to, in order.
    pub fn steps(&self) -> Vec<(MergeStage, &str)> {
        let mut steps = Vec::new();
        steps.extend(
            self.reference
                .iter()
                .map(|table| (MergeStage::Reference, table.as_str())),
        );
        steps.extend(
            self.metadata
                .iter()
                .map(|table| (MergeStage::Metadata, table.as_str())),
        );
        steps.extend(
            self.datafile
                .iter()
                .map(|table| (MergeStage::Datafile, table.as_str())),
        );
        steps.extend(
            self.synonym
                .iter()
                .map(|table| (MergeStage::Synonym, table.as_str())),
        );
        steps.extend(
            self.gated
                .iter()
                .chain(self.measurement.iter())
                .map(|table| (MergeStage::Measurement, table.as_str())),
        );

        steps
    }
}

/// Builds the merge plan for the catalog.
///
/// Fails if a priority table belongs to another tier or depends on a table merged after it, if a
/// table handled at a fixed point is not a metadata table, or if the tables of a tier reference
/// each other cyclically.
pub fn plan_merge(catalog: &Catalog, order: &MergeOrderConfig) -> Result<MergePlan, CatalogError> {
    let present = |name: &str| catalog.table(name).is_some();

    // Only the metadata tier leaves these tables out, any other tier would still process them.
    let fixed_points = [
        ("datafile", &order.datafile_table),
        ("synonym", &order.synonym_table),
    ]
    .into_iter()
    .chain(order.excluded_tables.iter().map(|table| ("excluded", table)))
    .chain(order.gated_tables.iter().map(|table| ("gated", table)));
    for (role, name) in fixed_points {
        if let Some(table) = catalog.table(name)
            && table.kind != TableKind::Metadata
        {
            return Err(CatalogError::FixedPointTableInWrongTier {
                table: name.clone(),
                role,
                actual: table.kind,
            });
        }
    }

    let reference = order_tier(
        catalog,
        TableKind::Reference,
        &order.reference_priority,
        &HashSet::new(),
    )?;

    let deferred: HashSet<&str> = catalog
        .tables_of_kind(TableKind::Metadata)
        .map(|table| table.name.as_str())
        .filter(|name| order.is_deferred(name))
        .collect();
    let metadata = order_tier(
        catalog,
        TableKind::Metadata,
        &order.metadata_priority,
        &deferred,
    )?;

    let measurement = order_tier(catalog, TableKind::Measurement, &[], &HashSet::new())?;

    let mut gated = Vec::new();
    for name in order.gated_tables.iter().filter(|name| present(name.as_str())) {
        let table = catalog.require(name)?;
        if table.parent_column.is_none() {
            return Err(CatalogError::MissingParentColumn(name.clone()));
        }
        gated.push(name.clone());
    }
    for name in &measurement {
        if catalog.require(name)?.parent_column.is_none() {
            return Err(CatalogError::MissingParentColumn(name.clone()));
        }
    }

    Ok(MergePlan {
        reference,
        metadata,
        datafile: Some(order.datafile_table.clone()).filter(|name| present(name.as_str())),
        synonym: Some(order.synonym_table.clone()).filter(|name| present(name.as_str())),
        gated,
        measurement,
        excluded: order
            .excluded_tables
            .iter()
            .filter(|name| present(name.as_str()))
            .cloned()
            .collect(),
    })
}

/// Orders one tier: priority tables first, then the rest in dependency order.
fn order_tier(
    catalog: &Catalog,
    kind: TableKind,
    priority: &[String],
    deferred: &HashSet<&str>,
) -> Result<Vec<String>, CatalogError> {
    let candidates: Vec<&TableDefinition> = catalog
        .tables_of_kind(kind)
        .filter(|table| !deferred.contains(table.name.as_str()))
        .collect();
    let in_tier: HashSet<&str> = candidates.iter().map(|table| table.name.as_str()).collect();

    // Same-tier tables a table references, excluding itself.
    let dependencies = |table: &TableDefinition| -> Vec<String> {
        table
            .foreign_keys
            .iter()
            .map(|fk| fk.references.clone())
            .filter(|references| *references != table.name && in_tier.contains(references.as_str()))
            .collect()
    };

    let mut ordered: Vec<String> = Vec::with_capacity(candidates.len());

    for name in priority {
        let Some(table) = catalog.table(name) else {
            continue;
        };
        if table.kind != kind {
            return Err(CatalogError::PriorityTableInWrongTier {
                table: name.clone(),
                expected: kind,
                actual: table.kind,
            });
        }
        if !in_tier.contains(name.as_str()) || ordered.contains(name) {
            continue;
        }
        if let Some(dependency) = dependencies(table)
            .into_iter()
            .find(|dependency| !ordered.contains(dependency))
        {
            return Err(CatalogError::PriorityConflict {
                table: name.clone(),
                dependency,
            });
        }
        ordered.push(name.clone());
    }

    let mut remaining: Vec<&TableDefinition> = candidates
        .into_iter()
        .filter(|table| !ordered.contains(&table.name))
        .collect();

    while !remaining.is_empty() {
        let ready = remaining.iter().position(|table| {
            dependencies(*table)
                .iter()
                .all(|dependency| ordered.contains(dependency))
        });

        match ready {
            Some(index) => {
                let table = remaining.remove(index);
                ordered.push(table.name.clone());
            }
            None => {
                return Err(CatalogError::Cycle {
                    kind,
                    tables: remaining.iter().map(|table| table.name.clone()).collect(),
                });
            }
        }
    }

    Ok(ordered)
}
