//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `marker_samples.csv`
//! - `marker_events.csv`
//! - `frame_summaries.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::TrackWriter;
use crate::{FrameSummaryRow, MarkerEventRow, MarkerSampleRow, OutputResult};

/// Writes track output to three CSV files.
pub struct CsvWriter {
    samples:  Writer<File>,
    events:   Writer<File>,
    frames:   Writer<File>,
    finished: bool,
}

impl CsvWriter {
    /// Create `dir` if needed, open the three CSV files and write the header
    /// rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;

        let mut samples = Writer::from_path(dir.join("marker_samples.csv"))?;
        samples.write_record(["at_ms", "resource", "lat", "lng"])?;

        let mut events = Writer::from_path(dir.join("marker_events.csv"))?;
        events.write_record(["at_ms", "resource", "event", "epoch_ms", "lat", "lng"])?;

        let mut frames = Writer::from_path(dir.join("frame_summaries.csv"))?;
        frames.write_record(["frame", "at_ms", "moving"])?;

        Ok(Self { samples, events, frames, finished: false })
    }
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl TrackWriter for CsvWriter {
    fn write_samples(&mut self, rows: &[MarkerSampleRow]) -> OutputResult<()> {
        for row in rows {
            self.samples.write_record(&[
                row.at_ms.to_string(),
                row.resource.clone(),
                row.lat.to_string(),
                row.lng.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_event(&mut self, row: &MarkerEventRow) -> OutputResult<()> {
        self.events.write_record(&[
            row.at_ms.to_string(),
            row.resource.clone(),
            row.kind.to_string(),
            opt(row.epoch_ms),
            opt(row.position.map(|(lat, _)| lat)),
            opt(row.position.map(|(_, lng)| lng)),
        ])?;
        Ok(())
    }

    fn write_frame_summary(&mut self, row: &FrameSummaryRow) -> OutputResult<()> {
        self.frames.write_record(&[
            row.frame.to_string(),
            row.at_ms.to_string(),
            row.moving.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.samples.flush()?;
        self.events.flush()?;
        self.frames.flush()?;
        Ok(())
    }
}
