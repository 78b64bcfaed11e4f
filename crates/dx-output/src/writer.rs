//! The `TrackWriter` trait implemented by all backend writers.

use crate::{FrameSummaryRow, MarkerEventRow, MarkerSampleRow, OutputResult};

/// Trait implemented by the CSV and SQLite writers.
///
/// All methods are infallible from the observer's perspective: errors are
/// stored internally and retrieved with [`TrackObserver::take_error`][crate::TrackObserver::take_error].
pub trait TrackWriter {
    /// Write a batch of marker samples.
    fn write_samples(&mut self, rows: &[MarkerSampleRow]) -> OutputResult<()>;

    fn write_event(&mut self, row: &MarkerEventRow) -> OutputResult<()>;

    fn write_frame_summary(&mut self, row: &FrameSummaryRow) -> OutputResult<()>;

    /// Flush and close all underlying handles.
    ///
    /// Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}
