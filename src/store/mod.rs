//! SQLite persistence and CSV export for accumulated reviews.

use crate::reviews::models::Review;
use chrono::Local;
use rusqlite::{params, Connection};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from the review store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid table name: '{0}'. Use letters, digits and underscores.")]
    InvalidTableName(String),
    #[error("No such table: {0}")]
    NoSuchTable(String),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Local relational store keyed by table name.
///
/// Connections are scoped: open, write, drop. The store never updates rows;
/// every write is an append.
pub struct ReviewStore {
    conn: Connection,
}

impl ReviewStore {
    /// Opens (or creates) the store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        // journal_mode reports the resulting mode as a row
        conn.query_row("PRAGMA journal_mode=WAL", [], |_| Ok(()))?;
        Ok(Self { conn })
    }

    /// Opens an in-memory store, for tests.
    pub fn in_memory() -> Result<Self, StoreError> {
        Ok(Self { conn: Connection::open_in_memory()? })
    }

    /// Appends rows to the named table, creating it if missing.
    pub fn append(&mut self, table: &str, rows: &[Review]) -> Result<usize, StoreError> {
        validate_table_name(table)?;

        self.conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    record_id       TEXT NOT NULL,
                    item_id         TEXT NOT NULL,
                    rating          INTEGER NOT NULL,
                    link            TEXT NOT NULL,
                    title           TEXT NOT NULL,
                    author          TEXT NOT NULL,
                    author_profile  TEXT NOT NULL,
                    review_date     TEXT NOT NULL,
                    review          TEXT NOT NULL,
                    image_available INTEGER NOT NULL,
                    helpful         INTEGER NOT NULL
                )",
                table
            ),
            [],
        )?;

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                table,
                Review::COLUMNS.join(", ")
            ))?;

            for row in rows {
                stmt.execute(params![
                    row.record_id,
                    row.item_id,
                    row.rating,
                    row.link,
                    row.title,
                    row.author,
                    row.author_profile,
                    row.review_date,
                    row.review,
                    row.image_available,
                    row.helpful,
                ])?;
            }
        }
        tx.commit()?;

        info!("Appended {} rows to table '{}'", rows.len(), table);
        Ok(rows.len())
    }

    /// Lists user tables with their row counts.
    pub fn tables(&self) -> Result<Vec<(String, u64)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )?;
        let names: Vec<String> =
            stmt.query_map([], |row| row.get(0))?.collect::<Result<_, _>>()?;

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let count: u64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", name), [], |row| row.get(0))?;
            tables.push((name, count));
        }
        Ok(tables)
    }

    /// Exports all rows of a table to `<table>-<timestamp>.csv` in `dir`,
    /// in the fixed column order. Returns the path written.
    pub fn export_csv(&self, table: &str, dir: impl AsRef<Path>) -> Result<PathBuf, StoreError> {
        validate_table_name(table)?;

        if !self.tables()?.iter().any(|(name, _)| name == table) {
            return Err(StoreError::NoSuchTable(table.to_string()));
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM {} ORDER BY rowid",
            Review::COLUMNS.join(", "),
            table
        ))?;
        let rows: Vec<Review> = stmt
            .query_map([], |row| {
                Ok(Review {
                    record_id: row.get(0)?,
                    item_id: row.get(1)?,
                    rating: row.get(2)?,
                    link: row.get(3)?,
                    title: row.get(4)?,
                    author: row.get(5)?,
                    author_profile: row.get(6)?,
                    review_date: row.get(7)?,
                    review: row.get(8)?,
                    image_available: row.get(9)?,
                    helpful: row.get(10)?,
                })
            })?
            .collect::<Result<_, _>>()?;

        let timestamp = Local::now().format("%Y%m%d%H%M%S");
        let path = dir.as_ref().join(format!("{}-{}.csv", table, timestamp));
        debug!("Exporting {} rows to {}", rows.len(), path.display());

        let mut file = std::fs::File::create(&path)?;
        writeln!(file, "{}", Review::COLUMNS.join(","))?;
        for row in &rows {
            writeln!(file, "{}", csv_row(row))?;
        }

        Ok(path)
    }
}

/// Table names are interpolated into SQL, so they are restricted to
/// identifier characters.
fn validate_table_name(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidTableName(name.to_string()))
    }
}

fn csv_row(row: &Review) -> String {
    [
        csv_escape(&row.record_id),
        csv_escape(&row.item_id),
        row.rating.to_string(),
        csv_escape(&row.link),
        csv_escape(&row.title),
        csv_escape(&row.author),
        csv_escape(&row.author_profile),
        csv_escape(&row.review_date),
        csv_escape(&row.review),
        row.image_available.to_string(),
        row.helpful.to_string(),
    ]
    .join(",")
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
