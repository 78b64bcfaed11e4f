//! `dx-output`: track export for the rust_dispatch animator.
//!
//! Two backends are provided, the second behind a Cargo feature:
//!
//! | Feature   | Backend | Files created                                                       |
//! |-----------|---------|---------------------------------------------------------------------|
//! | *(none)*  | CSV     | `marker_samples.csv`, `marker_events.csv`, `frame_summaries.csv`    |
//! | `sqlite`  | SQLite  | `track.db`                                                          |
//!
//! Both implement [`TrackWriter`] and are driven by [`TrackObserver`], which
//! implements `dx_animator::AnimatorObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use dx_output::{CsvWriter, TrackObserver};
//!
//! let writer = CsvWriter::new(Path::new("./track/client-0"))?;
//! let mut obs = TrackObserver::new(writer, 10);
//! client.run(&mut obs, shutdown).await?;
//! obs.finish()?;
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::TrackObserver;
pub use row::{FrameSummaryRow, MarkerEventKind, MarkerEventRow, MarkerSampleRow};
pub use writer::TrackWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;
