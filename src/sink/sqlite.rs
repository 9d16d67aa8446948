//! SQLite sink with transactional batching.
//!
//! Buffers rows up to the configured batch size, then inserts the
//! whole batch in one transaction with bound parameters (sqlx's
//! statement cache reuses the prepared INSERT across rows). A failed
//! batch is logged and dropped, and processing continues: a deliberate
//! completion-over-atomicity trade-off for bulk imports. Callers that
//! need strict durability should use the jsonl or mysql-sql sink.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::Path;

use log::{debug, error, info, warn};
use sqlx::SqlitePool;

use crate::error_handling::{ResourceError, SinkError};
use crate::fold::Record;

/// Batched writer into a `records`-shaped SQLite table.
pub struct SqliteSink {
    pool: SqlitePool,
    table: String,
    batch_size: usize,
    flush_on_cancel: bool,
    buffer: Vec<(String, String)>,
    inserted: u64,
    dropped_batches: u64,
}

impl SqliteSink {
    /// Creates the database file if needed, connects with WAL mode,
    /// and ensures the records table exists.
    ///
    /// `table` must already be identifier-validated (config layer).
    pub async fn open(
        db_path: &Path,
        table: &str,
        batch_size: usize,
        flush_on_cancel: bool,
    ) -> Result<Self, ResourceError> {
        let db_path_str = db_path.to_string_lossy().to_string();
        match OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&db_path_str)
        {
            Ok(_) => info!("Database file created successfully."),
            Err(ref e) if e.kind() == ErrorKind::AlreadyExists => {
                info!("Database file already exists.")
            }
            Err(e) => {
                error!("Failed to create database file: {e}");
                return Err(ResourceError::DbFileCreation(e.to_string()));
            }
        }

        let pool = SqlitePool::connect(&format!("sqlite:{}", db_path_str)).await?;

        // Enable WAL mode
        sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;

        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS \"{table}\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tag TEXT,
                json TEXT NOT NULL,
                added_at TEXT DEFAULT (datetime('now'))
            )"
        ))
        .execute(&pool)
        .await?;

        Ok(SqliteSink {
            pool,
            table: table.to_string(),
            batch_size,
            flush_on_cancel,
            buffer: Vec::new(),
            inserted: 0,
            dropped_batches: 0,
        })
    }

    /// Buffers one record, flushing a full batch in one transaction.
    pub async fn write(&mut self, record: &Record) -> Result<(), SinkError> {
        let json = record.to_json(false)?;
        self.buffer.push((record.tag.clone(), json));
        if self.buffer.len() >= self.batch_size {
            self.flush().await;
        }
        Ok(())
    }

    /// Flushes the remaining rows and closes the pool.
    ///
    /// On a cancelled run the partial batch is flushed by default;
    /// `flush_on_cancel = false` drops it instead (the original
    /// behavior, opted into explicitly).
    pub async fn close(mut self, cancelled: bool) -> Result<(u64, u64), SinkError> {
        if cancelled && !self.flush_on_cancel {
            if !self.buffer.is_empty() {
                warn!(
                    "dropping {} buffered row(s) on cancellation (--no-flush-on-cancel)",
                    self.buffer.len()
                );
                self.buffer.clear();
            }
        } else {
            self.flush().await;
        }
        self.pool.close().await;
        Ok((self.inserted, self.dropped_batches))
    }

    /// Rows committed so far.
    pub fn inserted(&self) -> u64 {
        self.inserted
    }

    /// Batches dropped after a failed transaction.
    pub fn dropped_batches(&self) -> u64 {
        self.dropped_batches
    }

    async fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let rows = std::mem::take(&mut self.buffer);
        debug!("Flushing batch of {} records to database", rows.len());
        match self.try_flush(&rows).await {
            Ok(()) => self.inserted += rows.len() as u64,
            Err(e) => {
                // Log-and-drop: one bad batch must not end the import.
                self.dropped_batches += 1;
                error!("Failed to flush batch of {} records, dropping it: {e}", rows.len());
            }
        }
    }

    async fn try_flush(&self, rows: &[(String, String)]) -> Result<(), sqlx::Error> {
        let sql = format!("INSERT INTO \"{}\"(tag, json) VALUES (?, ?)", self.table);
        let mut tx = self.pool.begin().await?;
        for (tag, json) in rows {
            sqlx::query(&sql)
                .bind(tag)
                .bind(json)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await
    }
}
