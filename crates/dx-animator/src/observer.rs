//! Animator observer trait: the seam where a map surface or a recorder
//! attaches.

use dx_core::{Epoch, GeoPoint, ResourceId};

/// Callbacks invoked by [`Animator`][crate::Animator] while it draws frames
/// and applies replicated changes.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: arrival printer
///
/// ```rust,ignore
/// struct ArrivalPrinter;
///
/// impl AnimatorObserver for ArrivalPrinter {
///     fn on_arrival(&mut self, resource: &ResourceId, _epoch: Epoch, at: GeoPoint, _now: Epoch) {
///         println!("{resource} arrived at {at}");
///     }
/// }
/// ```
pub trait AnimatorObserver {
    /// Called before any marker of the frame is drawn.
    fn on_frame_start(&mut self, _now: Epoch) {}

    /// A moving resource's marker was drawn at `position`.
    fn on_position(&mut self, _resource: &ResourceId, _position: GeoPoint, _now: Epoch) {}

    /// The movement started at `epoch` reached its destination on this
    /// client.  Reported once per epoch.
    fn on_arrival(&mut self, _resource: &ResourceId, _epoch: Epoch, _at: GeoPoint, _now: Epoch) {}

    /// A replicated `DEPLOYED` row placed the marker at `position`.
    fn on_settled(&mut self, _resource: &ResourceId, _position: GeoPoint) {}

    /// The resource is back at its station; its marker is gone.
    fn on_removed(&mut self, _resource: &ResourceId) {}

    /// Called after the last marker of the frame.  `moving` is the number of
    /// resources drawn.
    fn on_frame_end(&mut self, _now: Epoch, _moving: usize) {}
}

/// An [`AnimatorObserver`] that does nothing.
pub struct NoopObserver;

impl AnimatorObserver for NoopObserver {}
