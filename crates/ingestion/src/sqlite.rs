//! SQLite-backed table source.

use crate::source::TableSource;
use predchart_core::{Error, RawTable, Result, Scalar};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::path::Path;

/// Read-only view over the tables of a SQLite database.
pub struct SqliteSource {
    conn: Connection,
}

impl SqliteSource {
    /// Open an existing database file read-only.
    ///
    /// Fails with an I/O `NotFound` error when the file is missing and with a
    /// database error when the file is not a SQLite database.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("database file {} does not exist", path.display()),
            )));
        }

        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| Error::database(format!("failed to open {}: {e}", path.display())))?;

        // SQLite opens lazily; touch the schema to validate the file header.
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
            .map_err(|e| {
                Error::database(format!(
                    "{} is not a valid SQLite database: {e}",
                    path.display()
                ))
            })?;

        tracing::debug!(path = %path.display(), "opened sqlite source");
        Ok(Self { conn })
    }

    /// Wrap an already-open connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Name of a table as stored in the schema.
    ///
    /// SQLite resolves identifiers ignoring ASCII case, so the lookup does too.
    fn stored_name(&self, name: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT name FROM sqlite_master \
                 WHERE type IN ('table', 'view') AND name = ?1 COLLATE NOCASE",
                [name],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| Error::database(e.to_string()))
    }
}

/// Quote an identifier for interpolation into SQL.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn db_err(table: &str, e: rusqlite::Error) -> Error {
    Error::database(format!("table '{table}': {e}"))
}

impl TableSource for SqliteSource {
    fn list_tables(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .map_err(|e| Error::database(e.to_string()))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| Error::database(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::database(e.to_string()))?;
        Ok(names)
    }

    fn read_table(&self, name: &str) -> Result<RawTable> {
        let stored = self
            .stored_name(name)?
            .ok_or_else(|| Error::table_not_found(name))?;
        let name = stored.as_str();

        let sql = format!("SELECT * FROM {}", quote_ident(name));
        let mut stmt = self.conn.prepare(&sql).map_err(|e| db_err(name, e))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();
        let mut table = RawTable::new(name, columns);

        let mut rows = stmt.query([]).map_err(|e| db_err(name, e))?;
        while let Some(row) = rows.next().map_err(|e| db_err(name, e))? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                let cell = match row.get_ref(i).map_err(|e| db_err(name, e))? {
                    ValueRef::Null => Scalar::Null,
                    ValueRef::Integer(v) => Scalar::Integer(v),
                    ValueRef::Real(v) => Scalar::Real(v),
                    ValueRef::Text(t) => Scalar::Text(String::from_utf8_lossy(t).into_owned()),
                    ValueRef::Blob(_) => {
                        return Err(Error::schema(format!(
                            "table '{name}': BLOB value in column {i} is not supported"
                        )))
                    }
                };
                cells.push(cell);
            }
            table.push_row(cells)?;
        }

        tracing::debug!(table = %name, rows = table.len(), "loaded table");
        Ok(table)
    }

    fn has_table(&self, name: &str) -> Result<bool> {
        Ok(self.stored_name(name)?.is_some())
    }

    fn is_internal(&self, name: &str) -> bool {
        name.starts_with("sqlite_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn source() -> SqliteSource {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE NIFTY50 (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                Datetime TEXT,
                Open REAL, High REAL, Low REAL, Close REAL
            );
            INSERT INTO NIFTY50 (Datetime, Open, High, Low, Close)
                VALUES ('2024-01-01 09:15:00', 100, 105, 99, 103.5);
            INSERT INTO NIFTY50 (Datetime, Open, High, Low, Close)
                VALUES ('2024-01-01 09:16:00', 103, 106, 102, NULL);
            CREATE TABLE "odd ""name""" (Datetime TEXT);
            "#,
        )
        .unwrap();
        SqliteSource::from_connection(conn)
    }

    #[test]
    fn test_list_tables_sorted_with_internal() {
        let src = source();
        let tables = src.list_tables().unwrap();
        assert_eq!(tables, vec!["NIFTY50", "odd \"name\"", "sqlite_sequence"]);
        assert!(src.is_internal("sqlite_sequence"));
        assert!(!src.is_internal("NIFTY50"));
    }

    #[test]
    fn test_read_table_values() {
        let table = source().read_table("NIFTY50").unwrap();
        assert_eq!(table.columns, vec!["id", "Datetime", "Open", "High", "Low", "Close"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][0], Scalar::Integer(1));
        assert_eq!(table.rows[0][1], Scalar::from("2024-01-01 09:15:00"));
        assert_relative_eq!(table.rows[0][5].as_f64().unwrap(), 103.5);
        assert!(table.rows[1][5].is_null());
    }

    #[test]
    fn test_quoted_identifier() {
        let table = source().read_table("odd \"name\"").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_missing_table() {
        let err = source().read_table("NIFTY50_predictions").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_table_lookup_ignores_case() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE nifty50_predictions (Datetime TEXT, Predicted_Close REAL);
            INSERT INTO nifty50_predictions VALUES ('2024-01-01 09:15:00', 102.0);
            "#,
        )
        .unwrap();
        let src = SqliteSource::from_connection(conn);
        assert!(src.has_table("NIFTY50_predictions").unwrap());
        let table = src.read_table("NIFTY50_predictions").unwrap();
        assert_eq!(table.name, "nifty50_predictions");
        assert_eq!(table.len(), 1);
        assert_relative_eq!(table.rows[0][1].as_f64().unwrap(), 102.0);
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SqliteSource::open(dir.path().join("absent.db")).err().unwrap();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
    }

    #[test]
    fn test_open_not_a_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.db");
        std::fs::write(&path, vec![b'x'; 4096]).unwrap();
        let err = SqliteSource::open(&path).err().unwrap();
        assert!(matches!(err, Error::Database(_)));
    }
}
