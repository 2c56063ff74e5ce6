//! SQLite output store.
//!
//! The `matrix` and `simulation` tables are created up front. Data tables are
//! created on first insert from the column list of the row being written.

use std::collections::HashSet;
use std::path::Path;

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, ToSql};
use tracing::debug;

use super::columns::{Column, ColumnValue};
use super::rows::TableRow;
use super::store::{MatrixRecord, OutputStore, SimulationRecord};
use super::table::Table;
use crate::error::EfiscenError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS matrix (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    country_id  INTEGER NOT NULL,
    region      INTEGER NOT NULL,
    owner       INTEGER NOT NULL,
    site        INTEGER NOT NULL,
    species     INTEGER NOT NULL,
    UNIQUE (country_id, region, owner, site, species)
);
CREATE TABLE IF NOT EXISTS simulation (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    scenario_id INTEGER NOT NULL,
    country_id  INTEGER NOT NULL,
    project_id  INTEGER NOT NULL,
    param_file  TEXT NOT NULL,
    base_year   INTEGER NOT NULL,
    step_length INTEGER NOT NULL
);
";

impl ToSql for ColumnValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            ColumnValue::Int(v) => ToSqlOutput::from(*v),
            ColumnValue::Real(v) => ToSqlOutput::from(*v),
            ColumnValue::Text(v) => ToSqlOutput::from(v.as_str()),
        })
    }
}

fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// Writes export sessions into a SQLite database.
pub struct DatabaseWriter {
    conn: Connection,
    created: HashSet<Table>,
}

impl DatabaseWriter {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EfiscenError> {
        let conn = Connection::open(path.as_ref())?;
        // WAL is a no-op for in-memory databases.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Self::with_connection(conn)
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> Result<Self, EfiscenError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, EfiscenError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            created: HashSet::new(),
        })
    }

    fn ensure_table(&mut self, table: Table, columns: &[Column]) -> Result<(), EfiscenError> {
        if self.created.contains(&table) {
            return Ok(());
        }
        let mut defs: Vec<String> = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
        defs.extend(
            columns
                .iter()
                .map(|c| format!("{} {} NOT NULL", quote(&c.name), c.value.sql_type())),
        );
        defs.push("FOREIGN KEY (simulation_id) REFERENCES simulation(id)".to_string());
        if table.is_per_stratum() {
            defs.push("FOREIGN KEY (matrix_id) REFERENCES matrix(id)".to_string());
        }
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote(table.table_name()),
            defs.join(", ")
        );
        self.conn.execute_batch(&sql)?;
        debug!(table = table.table_name(), "created output table");
        self.created.insert(table);
        Ok(())
    }

    /// Number of rows currently stored in a data table.
    pub fn count_rows(&self, table: Table) -> Result<usize, EfiscenError> {
        let exists: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![table.table_name()],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Ok(0);
        }
        let sql = format!("SELECT COUNT(*) FROM {}", quote(table.table_name()));
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn count_matrices(&self) -> Result<usize, EfiscenError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM matrix", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// All rows of a data table as named columns, in insertion order.
    /// The surrogate `id` column is left out.
    pub fn fetch_rows(&self, table: Table) -> Result<Vec<Vec<Column>>, EfiscenError> {
        let sql = format!("SELECT * FROM {} ORDER BY id", quote(table.table_name()));
        let mut stmt = self.conn.prepare(&sql)?;
        let names: Vec<String> = stmt.column_names().iter().map(|n| n.to_string()).collect();
        let rows = stmt.query_map([], |row| {
            let mut columns = Vec::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
                if name == "id" {
                    continue;
                }
                let value = match row.get_ref(i)? {
                    ValueRef::Integer(v) => ColumnValue::Int(v),
                    ValueRef::Real(v) => ColumnValue::Real(v),
                    ValueRef::Text(t) => ColumnValue::Text(String::from_utf8_lossy(t).to_string()),
                    ValueRef::Null | ValueRef::Blob(_) => continue,
                };
                columns.push(Column {
                    name: name.clone(),
                    value,
                });
            }
            Ok(columns)
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn simulation(&self, id: i64) -> Result<Option<SimulationRecord>, EfiscenError> {
        self.conn
            .query_row(
                "SELECT scenario_id, country_id, project_id, param_file, base_year, step_length
                 FROM simulation WHERE id = ?1",
                params![id],
                |row| {
                    Ok(SimulationRecord {
                        scenario_id: row.get(0)?,
                        country_id: row.get(1)?,
                        project_id: row.get(2)?,
                        param_file: row.get(3)?,
                        base_year: row.get(4)?,
                        step_length: row.get(5)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }
}

impl OutputStore for DatabaseWriter {
    fn find_matrix(&mut self, record: &MatrixRecord) -> Result<Option<i64>, EfiscenError> {
        self.conn
            .query_row(
                "SELECT id FROM matrix
                 WHERE country_id = ?1 AND region = ?2 AND owner = ?3 AND site = ?4 AND species = ?5",
                params![
                    record.country_id,
                    record.region,
                    record.owner,
                    record.site,
                    record.species
                ],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    fn insert_matrix(&mut self, record: &MatrixRecord) -> Result<i64, EfiscenError> {
        let result = self.conn.execute(
            "INSERT INTO matrix (country_id, region, owner, site, species)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.country_id,
                record.region,
                record.owner,
                record.site,
                record.species
            ],
        );
        match result {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(e) if is_constraint_violation(&e) => Err(EfiscenError::DuplicateKey(format!(
                "matrix {}/{}/{}/{}/{}",
                record.country_id, record.region, record.owner, record.site, record.species
            ))),
            Err(e) => Err(e.into()),
        }
    }

    fn insert_simulation(&mut self, record: &SimulationRecord) -> Result<i64, EfiscenError> {
        self.conn.execute(
            "INSERT INTO simulation (scenario_id, country_id, project_id, param_file, base_year, step_length)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.scenario_id,
                record.country_id,
                record.project_id,
                record.param_file,
                record.base_year,
                record.step_length
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_row(&mut self, row: &dyn TableRow) -> Result<(), EfiscenError> {
        let columns = row.to_columns()?;
        let table = row.table();
        self.ensure_table(table, &columns)?;
        let names: Vec<String> = columns.iter().map(|c| quote(&c.name)).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(table.table_name()),
            names.join(", "),
            placeholders.join(", ")
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        stmt.execute(params_from_iter(columns.iter().map(|c| &c.value)))?;
        Ok(())
    }
}
