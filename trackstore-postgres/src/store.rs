use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row as _};
use tracing::{debug, info};
use trackstore_config::shared::{IntoConnectOptions, MERGE_SESSION_OPTIONS, PgConnectionConfig};
use trackstore_merge::catalog::Catalog;
use trackstore_merge::store::{EntityStore, IdentityRewrite, StoreError, StoreResult};
use trackstore_merge::types::{
    Cell, ColumnDefinition, ColumnType, Identity, Predicate, Row, TableDefinition, TableKind,
};
use uuid::Uuid;

use crate::sql::{self, SqlParam, Statement};

/// SQLSTATE class of integrity constraint violations.
const INTEGRITY_CONSTRAINT_VIOLATION_CLASS: &str = "23";
const UNDEFINED_TABLE: &str = "42P01";

/// Track store held in a Postgres/PostGIS database.
///
/// The pool holds a single connection, so every call observes the writes of the calls before it.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    schema: String,
    catalog: Catalog,
}

impl PostgresStore {
    pub fn new(pool: PgPool, schema: impl Into<String>, catalog: Catalog) -> Self {
        Self {
            pool,
            schema: schema.into(),
            catalog,
        }
    }

    /// Connects to the store described by `config`.
    pub async fn connect(
        config: &PgConnectionConfig,
        catalog: Catalog,
    ) -> Result<Self, sqlx::Error> {
        let options = config.with_db(Some(&MERGE_SESSION_OPTIONS));

        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .connect_with(options)
            .await?;

        info!(
            host = %config.host,
            database = %config.name,
            schema = %config.schema,
            "connected to track store"
        );

        Ok(Self::new(pool, config.schema.clone(), catalog))
    }

    fn definition(&self, table: &str) -> StoreResult<&TableDefinition> {
        self.catalog
            .table(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))
    }

    async fn fetch(
        &self,
        table: &TableDefinition,
        predicate: &Predicate,
    ) -> StoreResult<Vec<Row>> {
        let statement = sql::select(&self.schema, table, predicate);

        let rows = bind_all(&statement)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| store_error(&table.name, err))?;

        rows.iter()
            .map(|row| decode_row(table, row).map_err(|err| store_error(&table.name, err)))
            .collect()
    }
}

impl EntityStore for PostgresStore {
    async fn list_tables(&self, kind: TableKind) -> StoreResult<Vec<TableDefinition>> {
        let names: Vec<String> = sqlx::query_scalar(sql::LIST_TABLES)
            .bind(&self.schema)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::unavailable)?;
        let present: HashSet<String> = names.into_iter().collect();

        Ok(self
            .catalog
            .tables_of_kind(kind)
            .filter(|table| present.contains(&table.name))
            .cloned()
            .collect())
    }

    async fn get(&self, table: &str, identity: Identity) -> StoreResult<Option<Row>> {
        let definition = self.definition(table)?;

        let mut rows = self.fetch(definition, &Predicate::identity(identity)).await?;

        Ok(rows.pop())
    }

    async fn find(&self, table: &str, predicate: &Predicate) -> StoreResult<Vec<Row>> {
        let definition = self.definition(table)?;

        self.fetch(definition, predicate).await
    }

    async fn insert_rows(&self, table: &str, rows: Vec<Row>) -> StoreResult<()> {
        let definition = self.definition(table)?;
        if rows.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(StoreError::unavailable)?;
        for chunk in rows.chunks(sql::rows_per_insert(definition)) {
            let statement = sql::insert(&self.schema, definition, chunk);
            bind_all(&statement)
                .execute(&mut *tx)
                .await
                .map_err(|err| store_error(table, err))?;
        }
        tx.commit().await.map_err(|err| store_error(table, err))?;

        debug!(table, rows = rows.len(), "inserted rows");

        Ok(())
    }

    async fn update_identity(&self, rewrite: &IdentityRewrite) -> StoreResult<()> {
        let definition = self.definition(&rewrite.table)?;
        let statements = sql::update_identity(&self.schema, &definition.primary_key, rewrite);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(StoreError::unavailable)?;
        sqlx::query(sql::DEFER_CONSTRAINTS)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::unavailable)?;

        let mut updated = Vec::with_capacity(statements.len());
        for statement in &statements {
            let result = bind_all(statement)
                .execute(&mut *tx)
                .await
                .map_err(|err| store_error(&rewrite.table, err))?;
            updated.push(result.rows_affected());
        }
        if updated.first().copied().unwrap_or_default() == 0 {
            // Dropping the transaction rolls it back.
            return Err(StoreError::RowNotFound {
                table: rewrite.table.clone(),
                identity: rewrite.from,
            });
        }
        tx.commit()
            .await
            .map_err(|err| store_error(&rewrite.table, err))?;

        debug!(
            table = %rewrite.table,
            from = %rewrite.from,
            to = %rewrite.to,
            dependents = updated.iter().skip(1).sum::<u64>(),
            "rewrote identity"
        );

        Ok(())
    }

    async fn update_column(
        &self,
        table: &str,
        identity: Identity,
        column: &str,
        value: Cell,
    ) -> StoreResult<()> {
        let definition = self.definition(table)?;
        let statement = sql::update_column(&self.schema, definition, identity, column, value);

        let result = bind_all(&statement)
            .execute(&self.pool)
            .await
            .map_err(|err| store_error(table, err))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::RowNotFound {
                table: table.to_string(),
                identity,
            });
        }

        Ok(())
    }

    async fn count(&self, table: &str) -> StoreResult<usize> {
        self.definition(table)?;

        let count: i64 = sqlx::query_scalar(&sql::count(&self.schema, table))
            .fetch_one(&self.pool)
            .await
            .map_err(|err| store_error(table, err))?;

        Ok(usize::try_from(count).unwrap_or_default())
    }
}

/// Maps a database error to the store error taxonomy.
///
/// Integrity violations become [`StoreError::ConstraintViolation`]; anything else means the store
/// could not do its job and is reported as [`StoreError::Unavailable`].
fn store_error(table: &str, err: sqlx::Error) -> StoreError {
    if let Some(db_err) = err.as_database_error()
        && let Some(code) = db_err.code()
    {
        if code.starts_with(INTEGRITY_CONSTRAINT_VIOLATION_CLASS) {
            return StoreError::constraint_violation(table, db_err.message());
        }
        if code == UNDEFINED_TABLE {
            return StoreError::UnknownTable(table.to_string());
        }
    }

    StoreError::unavailable(err)
}

fn bind_all(statement: &Statement) -> Query<'_, Postgres, PgArguments> {
    statement
        .params
        .iter()
        .fold(sqlx::query(&statement.sql), bind_param)
}

fn bind_param<'q>(
    query: Query<'q, Postgres, PgArguments>,
    param: &SqlParam,
) -> Query<'q, Postgres, PgArguments> {
    match &param.value {
        Cell::Null => bind_null(query, param.typ),
        Cell::Bool(value) => query.bind(*value),
        Cell::I32(value) => query.bind(*value),
        Cell::I64(value) => query.bind(*value),
        Cell::F64(value) => query.bind(*value),
        Cell::String(value) | Cell::Geometry(value) => query.bind(value.clone()),
        Cell::Uuid(value) => query.bind(*value),
        Cell::Date(value) => query.bind(*value),
        Cell::Timestamp(value) => query.bind(*value),
        Cell::TimestampTz(value) => query.bind(*value),
        Cell::Bytes(value) => query.bind(value.clone()),
    }
}

/// Binds a null of the column's type so Postgres does not have to guess it.
fn bind_null(
    query: Query<'_, Postgres, PgArguments>,
    typ: ColumnType,
) -> Query<'_, Postgres, PgArguments> {
    match typ {
        ColumnType::Bool => query.bind(None::<bool>),
        ColumnType::I32 => query.bind(None::<i32>),
        ColumnType::I64 => query.bind(None::<i64>),
        ColumnType::F64 => query.bind(None::<f64>),
        ColumnType::String | ColumnType::Geometry => query.bind(None::<String>),
        ColumnType::Uuid => query.bind(None::<Uuid>),
        ColumnType::Date => query.bind(None::<NaiveDate>),
        ColumnType::Timestamp => query.bind(None::<NaiveDateTime>),
        ColumnType::TimestampTz => query.bind(None::<DateTime<Utc>>),
        ColumnType::Bytes => query.bind(None::<Vec<u8>>),
    }
}

fn decode_row(table: &TableDefinition, row: &PgRow) -> Result<Row, sqlx::Error> {
    let identity: Uuid = row.try_get(table.primary_key.as_str())?;

    table
        .columns
        .iter()
        .try_fold(Row::new(Identity::new(identity)), |decoded, column| {
            Ok(decoded.with_value(column.name.clone(), decode_cell(row, column)?))
        })
}

fn decode_cell(row: &PgRow, column: &ColumnDefinition) -> Result<Cell, sqlx::Error> {
    let name = column.name.as_str();

    let cell = match column.typ {
        ColumnType::Bool => row.try_get::<Option<bool>, _>(name)?.into(),
        ColumnType::I32 => row.try_get::<Option<i32>, _>(name)?.into(),
        ColumnType::I64 => row.try_get::<Option<i64>, _>(name)?.into(),
        ColumnType::F64 => row.try_get::<Option<f64>, _>(name)?.into(),
        ColumnType::String => row.try_get::<Option<String>, _>(name)?.into(),
        ColumnType::Uuid => row.try_get::<Option<Uuid>, _>(name)?.into(),
        ColumnType::Date => row.try_get::<Option<NaiveDate>, _>(name)?.into(),
        ColumnType::Timestamp => row.try_get::<Option<NaiveDateTime>, _>(name)?.into(),
        ColumnType::TimestampTz => row.try_get::<Option<DateTime<Utc>>, _>(name)?.into(),
        ColumnType::Bytes => row
            .try_get::<Option<Vec<u8>>, _>(name)?
            .map_or(Cell::Null, Cell::Bytes),
        ColumnType::Geometry => row
            .try_get::<Option<String>, _>(name)?
            .map_or(Cell::Null, Cell::Geometry),
    };

    Ok(cell)
}
