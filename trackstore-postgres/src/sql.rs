//! SQL text for the track store tables.
//!
//! Identifiers are quoted with [`quote_identifier`]; values are always passed as parameters.
//! Geometry columns travel as extended WKT and are converted by PostGIS on both sides.

use pg_escape::quote_identifier;
use trackstore_merge::store::IdentityRewrite;
use trackstore_merge::types::{
    Cell, ColumnType, Condition, Identity, Predicate, Row, TableDefinition,
};

/// Postgres refuses statements with more bind parameters than this.
pub const MAX_BIND_PARAMETERS: usize = 65_535;

/// A value bound to a statement, with the column type used to bind nulls.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlParam {
    pub value: Cell,
    pub typ: ColumnType,
}

impl SqlParam {
    pub fn new(value: Cell, typ: ColumnType) -> Self {
        Self { value, typ }
    }
}

/// SQL text together with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl Statement {
    fn new(sql: String) -> Self {
        Self {
            sql,
            params: Vec::new(),
        }
    }

    /// Appends a parameter and returns its placeholder.
    fn push(&mut self, value: Cell, typ: ColumnType) -> String {
        self.params.push(SqlParam::new(value, typ));
        format!("${}", self.params.len())
    }
}

/// Returns `schema.table`, both quoted.
pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_identifier(schema), quote_identifier(table))
}

/// Returns the select list of a table: the primary key followed by every column.
fn select_list(table: &TableDefinition) -> String {
    let mut columns = vec![quote_identifier(&table.primary_key).to_string()];
    for column in &table.columns {
        let quoted = quote_identifier(&column.name);
        if column.typ == ColumnType::Geometry {
            columns.push(format!("ST_AsEWKT({quoted}) AS {quoted}"));
        } else {
            columns.push(quoted.to_string());
        }
    }

    columns.join(", ")
}

fn column_type(table: &TableDefinition, column: &str) -> ColumnType {
    if column == table.primary_key {
        return ColumnType::Uuid;
    }

    table
        .column(column)
        .map(|definition| definition.typ)
        .unwrap_or(ColumnType::String)
}

/// Returns the SQL expression a condition compares, converting geometries to text.
fn compared_column(table: &TableDefinition, column: &str) -> String {
    let quoted = quote_identifier(column);
    if column_type(table, column) == ColumnType::Geometry {
        format!("ST_AsEWKT({quoted})")
    } else {
        quoted.to_string()
    }
}

/// Builds the query returning every row of `table` matching `predicate`, ordered by primary key.
pub fn select(schema: &str, table: &TableDefinition, predicate: &Predicate) -> Statement {
    let mut statement = Statement::new(String::new());
    let mut clauses = Vec::new();

    for condition in predicate.conditions() {
        let clause = match condition {
            Condition::Identity(identity) => {
                let placeholder = statement.push(Cell::from(*identity), ColumnType::Uuid);
                format!("{} = {placeholder}", quote_identifier(&table.primary_key))
            }
            Condition::Eq { column, value } if value.is_null() => {
                format!("{} IS NULL", compared_column(table, column))
            }
            Condition::Eq { column, value } => {
                let placeholder = statement.push(value.clone(), column_type(table, column));
                format!("{} = {placeholder}", compared_column(table, column))
            }
            Condition::In { values, .. } if values.is_empty() => "FALSE".to_string(),
            Condition::In { column, values } => {
                let typ = column_type(table, column);
                let placeholders: Vec<String> = values
                    .iter()
                    .map(|value| statement.push(value.clone(), typ))
                    .collect();
                format!(
                    "{} IN ({})",
                    compared_column(table, column),
                    placeholders.join(", ")
                )
            }
        };
        clauses.push(clause);
    }

    let mut sql = format!(
        "SELECT {} FROM {}",
        select_list(table),
        qualified_table(schema, &table.name)
    );
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY ");
    sql.push_str(&quote_identifier(&table.primary_key));

    statement.sql = sql;
    statement
}

/// Returns how many rows fit in one insert statement.
pub fn rows_per_insert(table: &TableDefinition) -> usize {
    (MAX_BIND_PARAMETERS / (table.columns.len() + 1)).max(1)
}

/// Builds one multi-row insert. Columns a row has no value for are inserted as null.
pub fn insert(schema: &str, table: &TableDefinition, rows: &[Row]) -> Statement {
    let mut statement = Statement::new(String::new());

    let mut columns = vec![quote_identifier(&table.primary_key).to_string()];
    columns.extend(
        table
            .columns
            .iter()
            .map(|column| quote_identifier(&column.name).to_string()),
    );

    let mut tuples = Vec::with_capacity(rows.len());
    for row in rows {
        let mut values = vec![statement.push(Cell::from(row.identity()), ColumnType::Uuid)];
        for column in &table.columns {
            let placeholder = statement.push(row.value(&column.name).clone(), column.typ);
            if column.typ == ColumnType::Geometry {
                values.push(format!("ST_GeomFromEWKT({placeholder})"));
            } else {
                values.push(placeholder);
            }
        }
        tuples.push(format!("({})", values.join(", ")));
    }

    statement.sql = format!(
        "INSERT INTO {} ({}) VALUES {}",
        qualified_table(schema, &table.name),
        columns.join(", "),
        tuples.join(", ")
    );
    statement
}

/// Builds the statements of an identity rewrite: the primary key first, then every dependent.
///
/// The statements must run in one transaction with constraints deferred. On schemas that cascade
/// key updates the dependent updates match no rows.
pub fn update_identity(
    schema: &str,
    primary_key: &str,
    rewrite: &IdentityRewrite,
) -> Vec<Statement> {
    let mut statements = vec![update_reference(
        schema,
        &rewrite.table,
        primary_key,
        rewrite,
    )];
    statements.extend(rewrite.dependents.iter().map(|dependent| {
        update_reference(schema, &dependent.table, &dependent.column, rewrite)
    }));

    statements
}

fn update_reference(
    schema: &str,
    table: &str,
    column: &str,
    rewrite: &IdentityRewrite,
) -> Statement {
    let column = quote_identifier(column);
    let mut statement = Statement::new(format!(
        "UPDATE {} SET {column} = $1 WHERE {column} = $2",
        qualified_table(schema, table)
    ));
    statement.push(Cell::from(rewrite.to), ColumnType::Uuid);
    statement.push(Cell::from(rewrite.from), ColumnType::Uuid);

    statement
}

/// Builds the update of one column of one row.
pub fn update_column(
    schema: &str,
    table: &TableDefinition,
    identity: Identity,
    column: &str,
    value: Cell,
) -> Statement {
    let typ = column_type(table, column);
    let mut statement = Statement::new(String::new());
    let placeholder = statement.push(value, typ);
    let target = if typ == ColumnType::Geometry {
        format!("ST_GeomFromEWKT({placeholder})")
    } else {
        placeholder
    };
    let key = statement.push(Cell::from(identity), ColumnType::Uuid);

    statement.sql = format!(
        "UPDATE {} SET {} = {target} WHERE {} = {key}",
        qualified_table(schema, &table.name),
        quote_identifier(column),
        quote_identifier(&table.primary_key)
    );
    statement
}

pub fn count(schema: &str, table: &str) -> String {
    format!("SELECT count(*) FROM {}", qualified_table(schema, table))
}

/// Lists the base tables of a schema. Binds the schema name as `$1`.
pub const LIST_TABLES: &str = r#"
    SELECT table_name
    FROM information_schema.tables
    WHERE table_schema = $1
        AND table_type = 'BASE TABLE'
"#;

pub const DEFER_CONSTRAINTS: &str = "SET CONSTRAINTS ALL DEFERRED";
