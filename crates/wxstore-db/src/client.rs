//! Connection handle and statement execution

use std::path::{Path, PathBuf};

use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Batch, Connection, Row, Statement};
use tracing::{debug, info, instrument, warn};
use wxstore_core::{FieldValue, Frame};

use crate::{DbError, DbResult, StatementKind};

const IN_MEMORY: &str = ":memory:";

/// One open session against a local SQLite file.
///
/// The connection is released when the store is dropped, or earlier via
/// [`DataStore::close`]. Any operation after `close` returns
/// [`DbError::ConnectionClosed`].
pub struct DataStore {
    conn: Option<Connection>,
    path: PathBuf,
}

impl DataStore {
    /// Open (or create) the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening database");
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Some(conn),
            path: path.to_path_buf(),
        })
    }

    /// Private in-memory database, mostly for tests
    pub fn open_in_memory() -> DbResult<Self> {
        debug!("opening in-memory database");
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Some(conn),
            path: PathBuf::from(IN_MEMORY),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Close the connection now instead of at drop.
    ///
    /// Closing an already closed store returns [`DbError::ConnectionClosed`].
    pub fn close(&mut self) -> DbResult<()> {
        let conn = self.conn.take().ok_or(DbError::ConnectionClosed)?;
        conn.close().map_err(|(_, e)| DbError::Execution(e))?;
        info!(path = %self.path.display(), "database closed");
        Ok(())
    }

    fn conn(&self) -> DbResult<&Connection> {
        self.conn.as_ref().ok_or(DbError::ConnectionClosed)
    }

    fn conn_mut(&mut self) -> DbResult<&mut Connection> {
        self.conn.as_mut().ok_or(DbError::ConnectionClosed)
    }

    /// Run a literal CREATE statement
    #[instrument(skip(self))]
    pub fn create_table(&self, sql: &str) -> DbResult<()> {
        prepare_single(self.conn()?, sql)?.execute([])?;
        info!("created table");
        Ok(())
    }

    /// Run a literal DROP statement
    #[instrument(skip(self))]
    pub fn drop_table(&self, sql: &str) -> DbResult<()> {
        prepare_single(self.conn()?, sql)?.execute([])?;
        info!("dropped table");
        Ok(())
    }

    /// Insert or update with one tuple of bound values.
    ///
    /// Runs in its own transaction; on failure nothing is committed.
    /// Returns the number of changed rows.
    #[instrument(skip(self, values))]
    pub fn execute_one(
        &mut self,
        kind: StatementKind,
        sql: &str,
        values: &[FieldValue],
    ) -> DbResult<usize> {
        let conn = self.conn_mut()?;
        check_mutation(kind, sql)?;
        let tx = conn.transaction()?;
        let changed = match execute_single(&tx, sql, values) {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "statement failed, rolling back");
                return Err(e);
            }
        };
        tx.commit()?;
        log_mutation(kind, changed);
        Ok(changed)
    }

    /// Insert or update once per tuple, all in one transaction.
    ///
    /// A failing tuple rolls back the whole batch.
    #[instrument(skip(self, rows), fields(batch = rows.len()))]
    pub fn execute_many(
        &mut self,
        kind: StatementKind,
        sql: &str,
        rows: &[Vec<FieldValue>],
    ) -> DbResult<usize> {
        let conn = self.conn_mut()?;
        check_mutation(kind, sql)?;
        if rows.is_empty() {
            return Ok(0);
        }
        let tx = conn.transaction()?;
        let changed = match run_batch(&tx, sql, rows) {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "batch failed, rolling back");
                return Err(e);
            }
        };
        tx.commit()?;
        log_mutation(kind, changed);
        Ok(changed)
    }

    /// Run a DELETE statement, refusing anything else
    #[instrument(skip(self))]
    pub fn delete(&self, sql: &str) -> DbResult<usize> {
        let conn = self.conn()?;
        if let Err(e) = StatementKind::Delete.check(sql) {
            warn!(error = %e, "refusing non-delete statement");
            return Err(e);
        }
        let deleted = prepare_single(conn, sql)?.execute([])?;
        info!(rows = deleted, "deleted");
        Ok(deleted)
    }

    /// First row of a query, if any
    #[instrument(skip(self, params))]
    pub fn query_one(
        &self,
        sql: &str,
        params: &[FieldValue],
    ) -> DbResult<Option<Vec<FieldValue>>> {
        let mut stmt = self.prepare_query(sql)?;
        let width = stmt.column_count();
        let mut rows = stmt.query(params_from_iter(params.iter().map(to_sql)))?;
        let row = rows.next()?.map(|r| read_row(r, width)).transpose()?;
        debug!(found = row.is_some(), "selected one");
        Ok(row)
    }

    /// All rows of a query, in engine order
    #[instrument(skip(self, params))]
    pub fn query_many(
        &self,
        sql: &str,
        params: &[FieldValue],
    ) -> DbResult<Vec<Vec<FieldValue>>> {
        Ok(self.query_frame(sql, params)?.into_rows())
    }

    /// All rows of a query labeled with the result's column names
    #[instrument(skip(self, params))]
    pub fn query_frame(&self, sql: &str, params: &[FieldValue]) -> DbResult<Frame> {
        let mut stmt = self.prepare_query(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut out = Vec::new();
        let mut rows = stmt.query(params_from_iter(params.iter().map(to_sql)))?;
        while let Some(row) = rows.next()? {
            out.push(read_row(row, width)?);
        }
        debug!(rows = out.len(), "selected many");
        Ok(Frame::new(columns, out)?)
    }

    /// A query must read as a select and must not write to the database
    fn prepare_query(&self, sql: &str) -> DbResult<Statement<'_>> {
        let conn = self.conn()?;
        StatementKind::Select.check(sql)?;
        let stmt = prepare_single(conn, sql)?;
        if !stmt.readonly() {
            return Err(DbError::Validation(
                "query statements must not modify the database".to_string(),
            ));
        }
        Ok(stmt)
    }
}

impl Drop for DataStore {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            match conn.close() {
                Ok(()) => debug!(path = %self.path.display(), "database released"),
                Err((_, e)) => {
                    warn!(path = %self.path.display(), error = %e, "failed to close database")
                }
            }
        }
    }
}

fn check_mutation(kind: StatementKind, sql: &str) -> DbResult<()> {
    match kind {
        StatementKind::Insert | StatementKind::Update => kind.check(sql),
        other => Err(DbError::Validation(format!(
            "{other} statements cannot be executed as insert/update"
        ))),
    }
}

/// Prepare exactly one statement; trailing statements are rejected
fn prepare_single<'c>(conn: &'c Connection, sql: &str) -> DbResult<Statement<'c>> {
    let mut batch = Batch::new(conn, sql);
    let stmt = batch
        .next()?
        .ok_or_else(|| DbError::Validation("empty statement".to_string()))?;
    if batch.next()?.is_some() {
        return Err(DbError::Validation(
            "only one statement may be executed per call".to_string(),
        ));
    }
    Ok(stmt)
}

fn execute_single(conn: &Connection, sql: &str, values: &[FieldValue]) -> DbResult<usize> {
    let mut stmt = prepare_single(conn, sql)?;
    Ok(stmt.execute(params_from_iter(values.iter().map(to_sql)))?)
}

fn run_batch(conn: &Connection, sql: &str, rows: &[Vec<FieldValue>]) -> DbResult<usize> {
    let mut stmt = prepare_single(conn, sql)?;
    let mut changed = 0;
    for row in rows {
        changed += stmt.execute(params_from_iter(row.iter().map(to_sql)))?;
    }
    Ok(changed)
}

fn log_mutation(kind: StatementKind, rows: usize) {
    match kind {
        StatementKind::Update => info!(rows, "updated"),
        _ => info!(rows, "inserted"),
    }
}

fn to_sql(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Integer(v) => Value::Integer(*v),
        FieldValue::Real(v) => Value::Real(*v),
        FieldValue::Text(s) => Value::Text(s.clone()),
        FieldValue::Blob(b) => Value::Blob(b.clone()),
    }
}

fn read_row(row: &Row<'_>, width: usize) -> rusqlite::Result<Vec<FieldValue>> {
    (0..width)
        .map(|i| -> rusqlite::Result<FieldValue> {
            Ok(match row.get_ref(i)? {
                ValueRef::Null => FieldValue::Null,
                ValueRef::Integer(v) => FieldValue::Integer(v),
                ValueRef::Real(v) => FieldValue::Real(v),
                ValueRef::Text(t) => FieldValue::Text(String::from_utf8_lossy(t).into_owned()),
                ValueRef::Blob(b) => FieldValue::Blob(b.to_vec()),
            })
        })
        .collect()
}
