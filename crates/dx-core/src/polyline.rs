//! Constant-speed interpolation along a polyline.
//!
//! The free functions are the kernel every client runs each frame:
//!
//! ```text
//! cumulative[0] = 0
//! cumulative[i] = cumulative[i-1] + distance(points[i-1], points[i])
//! ```
//!
//! `position_at_distance` clamps to the first point for `d <= 0`, to the last
//! point for `d >= total`, and otherwise blends linearly inside the first
//! segment whose cumulative end reaches `d`.  The scan is deterministic, so
//! two clients given the same points and distance produce the same position.

use crate::GeoPoint;

/// Cumulative travelled distance (metres) at each vertex of `points`.
///
/// The result has the same length as `points` and is non-decreasing.
pub fn cumulative_distances(points: &[GeoPoint]) -> Vec<f64> {
    let mut out = Vec::with_capacity(points.len());
    let mut total = 0.0;
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            total += points[i - 1].distance_m(*p);
        }
        out.push(total);
    }
    out
}

/// Position after travelling `distance_m` metres along `points`.
///
/// `cumulative` must come from [`cumulative_distances`] over the same points.
/// Returns `None` only for an empty polyline.
pub fn position_at_distance(
    points:     &[GeoPoint],
    cumulative: &[f64],
    distance_m: f64,
) -> Option<GeoPoint> {
    let first = *points.first()?;
    let last = *points.last()?;
    let total = cumulative.last().copied().unwrap_or(0.0);

    if distance_m <= 0.0 || total <= 0.0 {
        return Some(first);
    }
    if distance_m >= total {
        return Some(last);
    }

    for i in 1..points.len().min(cumulative.len()) {
        if cumulative[i] < distance_m {
            continue;
        }
        let segment = cumulative[i] - cumulative[i - 1];
        if segment <= 0.0 {
            continue;
        }
        let t = (distance_m - cumulative[i - 1]) / segment;
        return Some(points[i - 1].lerp(points[i], t));
    }
    Some(last)
}

// ── Polyline ──────────────────────────────────────────────────────────────────

/// A travel path with its cumulative-distance table precomputed.
///
/// Always holds at least two points.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Polyline {
    points:     Vec<GeoPoint>,
    cumulative: Vec<f64>,
}

impl Polyline {
    /// Build from travel-ordered points.  Returns `None` for fewer than two
    /// points or any non-finite coordinate.
    pub fn new(points: Vec<GeoPoint>) -> Option<Self> {
        if points.len() < 2 || points.iter().any(|p| !p.is_finite()) {
            return None;
        }
        let cumulative = cumulative_distances(&points);
        Some(Self { points, cumulative })
    }

    /// The two-point straight line `[from, to]`.
    pub fn straight(from: GeoPoint, to: GeoPoint) -> Self {
        let points = vec![from, to];
        let cumulative = cumulative_distances(&points);
        Self { points, cumulative }
    }

    #[inline]
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    #[inline]
    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    /// Total length in metres.
    #[inline]
    pub fn total_m(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn start(&self) -> GeoPoint {
        self.points[0]
    }

    #[inline]
    pub fn end(&self) -> GeoPoint {
        self.points[self.points.len() - 1]
    }

    /// Position after travelling `distance_m` metres (see
    /// [`position_at_distance`]).
    pub fn position_at(&self, distance_m: f64) -> GeoPoint {
        position_at_distance(&self.points, &self.cumulative, distance_m)
            .unwrap_or_else(|| self.start())
    }
}
