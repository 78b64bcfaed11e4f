//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `track.db` file in the configured output directory with
//! three tables: `marker_samples`, `marker_events` and `frame_summaries`.

use std::path::Path;

use rusqlite::Connection;

use crate::writer::TrackWriter;
use crate::{FrameSummaryRow, MarkerEventRow, MarkerSampleRow, OutputResult};

/// Writes track output to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `track.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join("track.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS marker_samples (
                 at_ms    INTEGER NOT NULL,
                 resource TEXT    NOT NULL,
                 lat      REAL    NOT NULL,
                 lng      REAL    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS marker_events (
                 at_ms    INTEGER NOT NULL,
                 resource TEXT    NOT NULL,
                 event    TEXT    NOT NULL,
                 epoch_ms INTEGER,
                 lat      REAL,
                 lng      REAL
             );
             CREATE TABLE IF NOT EXISTS frame_summaries (
                 frame  INTEGER PRIMARY KEY,
                 at_ms  INTEGER NOT NULL,
                 moving INTEGER NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl TrackWriter for SqliteWriter {
    fn write_samples(&mut self, rows: &[MarkerSampleRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO marker_samples (at_ms, resource, lat, lng) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![row.at_ms, row.resource, row.lat, row.lng])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_event(&mut self, row: &MarkerEventRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO marker_events (at_ms, resource, event, epoch_ms, lat, lng) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                row.at_ms,
                row.resource,
                row.kind.as_str(),
                row.epoch_ms,
                row.position.map(|(lat, _)| lat),
                row.position.map(|(_, lng)| lng),
            ],
        )?;
        Ok(())
    }

    fn write_frame_summary(&mut self, row: &FrameSummaryRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO frame_summaries (frame, at_ms, moving) VALUES (?1, ?2, ?3)",
            rusqlite::params![row.frame as i64, row.at_ms, row.moving as i64],
        )?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
