//! Routing trait and the offline straight-line provider.
//!
//! # Pluggability
//!
//! The resolver calls providers through the [`Router`] trait, so the drill
//! and the tests can swap the HTTP provider for an offline one (or a
//! counting fake) without touching the resolver.
//!
//! # Coordinates
//!
//! Inputs and outputs are internal `(lat, lng)` [`GeoPoint`]s.  Adapters for
//! providers that speak `(lng, lat)` transpose at their boundary.

use std::sync::Arc;

use async_trait::async_trait;

use dx_core::GeoPoint;

use crate::SpatialResult;

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable road-routing provider.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`; one provider is shared by every
/// route task of a process.
#[async_trait]
pub trait Router: Send + Sync {
    /// Travel-ordered points of a driving route from `from` to `to`.
    ///
    /// An empty geometry is an error, not an empty `Vec`.
    async fn route(&self, from: GeoPoint, to: GeoPoint) -> SpatialResult<Vec<GeoPoint>>;
}

#[async_trait]
impl<R: Router + ?Sized> Router for Arc<R> {
    async fn route(&self, from: GeoPoint, to: GeoPoint) -> SpatialResult<Vec<GeoPoint>> {
        (**self).route(from, to).await
    }
}

#[async_trait]
impl<R: Router + ?Sized> Router for Box<R> {
    async fn route(&self, from: GeoPoint, to: GeoPoint) -> SpatialResult<Vec<GeoPoint>> {
        (**self).route(from, to).await
    }
}

// ── StraightLineRouter ────────────────────────────────────────────────────────

/// Always answers with `[from, to]`.  Used when no routing service is
/// configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct StraightLineRouter;

#[async_trait]
impl Router for StraightLineRouter {
    async fn route(&self, from: GeoPoint, to: GeoPoint) -> SpatialResult<Vec<GeoPoint>> {
        Ok(vec![from, to])
    }
}
