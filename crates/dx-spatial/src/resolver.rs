//! Memoized, single-flight route resolution keyed by movement epoch.
//!
//! A movement's route never changes while its epoch is current, so the cache
//! key is `(resource, epoch, destination)`.  A redirect writes a new epoch,
//! which makes the old key unreachable; the animator calls
//! [`RouteResolver::prune`] to drop such entries.
//!
//! Each key owns a `tokio::sync::OnceCell`.  The first caller runs the
//! provider request inside the cell; concurrent callers for the same key
//! await that same initialization instead of issuing their own request.

use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use dx_core::{Epoch, GeoPoint, Polyline, ResourceId};

use crate::{Router, SpatialError};

// ── RouteKey ──────────────────────────────────────────────────────────────────

/// Identity of one movement attempt's route.
///
/// Destinations compare by bit pattern, so two keys are equal only when the
/// replicated coordinates are identical.
#[derive(Clone, Debug)]
pub struct RouteKey {
    pub resource:    ResourceId,
    pub epoch:       Epoch,
    pub destination: GeoPoint,
}

impl RouteKey {
    pub fn new(resource: ResourceId, epoch: Epoch, destination: GeoPoint) -> Self {
        Self { resource, epoch, destination }
    }

    #[inline]
    fn destination_bits(&self) -> (u64, u64) {
        (self.destination.lat.to_bits(), self.destination.lng.to_bits())
    }
}

impl PartialEq for RouteKey {
    fn eq(&self, other: &Self) -> bool {
        self.resource == other.resource
            && self.epoch == other.epoch
            && self.destination_bits() == other.destination_bits()
    }
}

impl Eq for RouteKey {}

impl Hash for RouteKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.resource.hash(state);
        self.epoch.hash(state);
        self.destination_bits().hash(state);
    }
}

// ── ResolvedRoute ─────────────────────────────────────────────────────────────

/// A route ready for interpolation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolvedRoute {
    pub polyline: Polyline,
    /// `true` when the provider failed and this is the straight line between
    /// the endpoints.
    pub fallback: bool,
}

impl ResolvedRoute {
    pub fn straight(from: GeoPoint, to: GeoPoint) -> Self {
        Self { polyline: Polyline::straight(from, to), fallback: true }
    }

    #[inline]
    pub fn total_m(&self) -> f64 {
        self.polyline.total_m()
    }

    #[inline]
    pub fn position_at(&self, distance_m: f64) -> GeoPoint {
        self.polyline.position_at(distance_m)
    }
}

// ── RouteResolver ─────────────────────────────────────────────────────────────

type Slot = Arc<OnceCell<Arc<ResolvedRoute>>>;

/// Wraps a [`Router`] with the per-key cache and the fallback policy.
///
/// [`resolve`](Self::resolve) never fails.
pub struct RouteResolver<R: Router> {
    router: R,
    /// Substituted for a missing or non-finite endpoint.
    anchor: GeoPoint,
    cache:  Mutex<HashMap<RouteKey, Slot>>,
}

impl<R: Router> RouteResolver<R> {
    pub fn new(router: R, anchor: GeoPoint) -> Self {
        Self { router, anchor, cache: Mutex::new(HashMap::new()) }
    }

    #[inline]
    pub fn router(&self) -> &R {
        &self.router
    }

    /// The route for `key`, starting at `origin`.
    ///
    /// The destination is `key.destination`.  Only the first call for a key
    /// reaches the provider; later and concurrent calls share its result.
    pub async fn resolve(&self, key: &RouteKey, origin: Option<GeoPoint>) -> Arc<ResolvedRoute> {
        let slot = {
            let mut cache = self.lock();
            Arc::clone(cache.entry(key.clone()).or_default())
        };

        if let Some(hit) = slot.get() {
            debug!(resource = %key.resource, epoch = %key.epoch, "route cache hit");
            return Arc::clone(hit);
        }

        let route = slot.get_or_init(|| self.fetch(key, origin)).await;
        Arc::clone(route)
    }

    /// Non-blocking peek used by the frame loop.
    pub fn cached(&self, key: &RouteKey) -> Option<Arc<ResolvedRoute>> {
        self.lock().get(key).and_then(|slot| slot.get().cloned())
    }

    /// Drop every entry whose key is not in `live`.  Returns the number of
    /// entries removed.
    pub fn prune(&self, live: &HashSet<RouteKey>) -> usize {
        let mut cache = self.lock();
        let before = cache.len();
        cache.retain(|key, _| live.contains(key));
        before - cache.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    async fn fetch(&self, key: &RouteKey, origin: Option<GeoPoint>) -> Arc<ResolvedRoute> {
        let origin = origin.filter(|p| p.is_finite());
        let destination = Some(key.destination).filter(|p| p.is_finite());

        let (Some(from), Some(to)) = (origin, destination) else {
            warn!(
                resource = %key.resource,
                epoch    = %key.epoch,
                "route endpoint missing, substituting default anchor"
            );
            return Arc::new(ResolvedRoute::straight(
                origin.unwrap_or(self.anchor),
                destination.unwrap_or(self.anchor),
            ));
        };

        let error = match self.router.route(from, to).await {
            Ok(points) => match Polyline::new(points) {
                Some(polyline) => {
                    debug!(
                        resource = %key.resource,
                        epoch    = %key.epoch,
                        points   = polyline.points().len(),
                        length_m = polyline.total_m(),
                        "route resolved"
                    );
                    return Arc::new(ResolvedRoute { polyline, fallback: false });
                }
                None => SpatialError::EmptyGeometry,
            },
            Err(e) => e,
        };

        warn!(
            resource = %key.resource,
            epoch    = %key.epoch,
            error    = %error,
            "routing failed, falling back to straight line"
        );
        Arc::new(ResolvedRoute::straight(from, to))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RouteKey, Slot>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
