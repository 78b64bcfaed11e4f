//! `TrackObserver<W>` bridges `AnimatorObserver` to a `TrackWriter`.

use dx_animator::AnimatorObserver;
use dx_core::{Epoch, GeoPoint, ResourceId};

use crate::row::{FrameSummaryRow, MarkerEventKind, MarkerEventRow, MarkerSampleRow};
use crate::writer::TrackWriter;
use crate::{OutputError, OutputResult};

/// An [`AnimatorObserver`] that records one client's markers to any
/// [`TrackWriter`] backend.
///
/// Marker samples are buffered per frame and written every
/// `sample_every` frames; events and frame summaries are written as they
/// happen.  Errors are stored because observer methods have no return value;
/// check them with [`take_error`][Self::take_error].
pub struct TrackObserver<W: TrackWriter> {
    writer:       W,
    sample_every: u64,
    frame:        u64,
    /// Instant of the current or most recent frame.
    now:          Epoch,
    pending:      Vec<MarkerSampleRow>,
    last_error:   Option<OutputError>,
}

impl<W: TrackWriter> TrackObserver<W> {
    /// `sample_every` of 0 is treated as 1.
    pub fn new(writer: W, sample_every: u64) -> Self {
        Self {
            writer,
            sample_every: sample_every.max(1),
            frame:        0,
            now:          Epoch::ZERO,
            pending:      Vec::new(),
            last_error:   None,
        }
    }

    /// Take the stored write error (if any).
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Flush the writer.  Returns the first stored error, if any, before
    /// the flush result.
    pub fn finish(&mut self) -> OutputResult<()> {
        let result = self.writer.finish();
        self.store_err(result);
        match self.last_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Frames observed so far.
    pub fn frames(&self) -> u64 {
        self.frame
    }

    fn event(
        &mut self,
        resource: &ResourceId,
        kind:     MarkerEventKind,
        epoch:    Option<Epoch>,
        at:       Option<GeoPoint>,
    ) {
        let row = MarkerEventRow {
            at_ms:    self.now.as_millis(),
            resource: resource.to_string(),
            kind,
            epoch_ms: epoch.map(Epoch::as_millis),
            position: at.map(|p| (p.lat, p.lng)),
        };
        let result = self.writer.write_event(&row);
        self.store_err(result);
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: TrackWriter> AnimatorObserver for TrackObserver<W> {
    fn on_frame_start(&mut self, now: Epoch) {
        self.now = now;
        self.pending.clear();
    }

    fn on_position(&mut self, resource: &ResourceId, position: GeoPoint, now: Epoch) {
        if self.frame % self.sample_every == 0 {
            self.pending.push(MarkerSampleRow {
                at_ms:    now.as_millis(),
                resource: resource.to_string(),
                lat:      position.lat,
                lng:      position.lng,
            });
        }
    }

    fn on_arrival(&mut self, resource: &ResourceId, epoch: Epoch, at: GeoPoint, _now: Epoch) {
        self.event(resource, MarkerEventKind::Arrived, Some(epoch), Some(at));
    }

    fn on_settled(&mut self, resource: &ResourceId, position: GeoPoint) {
        self.event(resource, MarkerEventKind::Settled, None, Some(position));
    }

    fn on_removed(&mut self, resource: &ResourceId) {
        self.event(resource, MarkerEventKind::Removed, None, None);
    }

    fn on_frame_end(&mut self, now: Epoch, moving: usize) {
        if !self.pending.is_empty() {
            let rows = std::mem::take(&mut self.pending);
            let result = self.writer.write_samples(&rows);
            self.store_err(result);
        }
        let row = FrameSummaryRow { frame: self.frame, at_ms: now.as_millis(), moving: moving as u64 };
        let result = self.writer.write_frame_summary(&row);
        self.store_err(result);
        self.frame += 1;
    }
}
