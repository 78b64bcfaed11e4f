//! Movement-engine configuration.

use crate::{DxError, DxResult, GeoPoint};

/// Last-resort origin when neither a live position, a replicated coordinate,
/// nor a home station is known (Oslo city centre).
pub const DEFAULT_ANCHOR: GeoPoint = GeoPoint::new(59.9139, 10.7522);

/// Tunables shared by the dispatcher, the route resolver and the animator.
///
/// Every client of a session should run with the same values; positions are
/// only consistent across clients when speed and tolerance agree.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SyncConfig {
    /// Speed written into a movement when the operator gives none (m/s).
    pub default_speed_mps: f64,

    /// A movement counts as arrived once the remaining distance is at most
    /// this many metres.
    pub arrival_tolerance_m: f64,

    /// Origin of last resort for redirects and missing route endpoints.
    pub default_anchor: GeoPoint,

    /// Target frame period of the animation loop (ms).  16 ≈ 60 fps.
    pub frame_interval_ms: u64,

    /// Capacity of the per-client route-resolution request queue.
    pub route_queue_capacity: usize,

    /// Capacity of the per-client finalization proposal queue.
    pub finalize_queue_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_speed_mps:       20.0,
            arrival_tolerance_m:     5.0,
            default_anchor:          DEFAULT_ANCHOR,
            frame_interval_ms:       16,
            route_queue_capacity:    256,
            finalize_queue_capacity: 256,
        }
    }
}

impl SyncConfig {
    /// Reject values that would stall or corrupt the animation.
    pub fn validate(&self) -> DxResult<()> {
        if !(self.default_speed_mps.is_finite() && self.default_speed_mps > 0.0) {
            return Err(DxError::Config(format!(
                "default_speed_mps must be positive, got {}",
                self.default_speed_mps
            )));
        }
        if !(self.arrival_tolerance_m.is_finite() && self.arrival_tolerance_m >= 0.0) {
            return Err(DxError::Config(format!(
                "arrival_tolerance_m must be non-negative, got {}",
                self.arrival_tolerance_m
            )));
        }
        if !self.default_anchor.is_finite() {
            return Err(DxError::Config("default_anchor must be finite".into()));
        }
        if self.frame_interval_ms == 0 {
            return Err(DxError::Config("frame_interval_ms must be at least 1".into()));
        }
        if self.route_queue_capacity == 0 || self.finalize_queue_capacity == 0 {
            return Err(DxError::Config("queue capacities must be at least 1".into()));
        }
        Ok(())
    }
}
