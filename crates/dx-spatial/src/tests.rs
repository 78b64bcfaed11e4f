//! Unit tests for dx-spatial.

#[cfg(test)]
mod support {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use dx_core::GeoPoint;

    use crate::{Router, SpatialError, SpatialResult};

    /// Counts provider calls; answers with a fixed geometry or an error.
    pub struct CountingRouter {
        pub calls:  Arc<AtomicUsize>,
        pub answer: Option<Vec<GeoPoint>>,
        pub delay:  Duration,
    }

    impl CountingRouter {
        pub fn ok(points: Vec<GeoPoint>) -> Self {
            Self {
                calls:  Arc::new(AtomicUsize::new(0)),
                answer: Some(points),
                delay:  Duration::from_millis(0),
            }
        }

        pub fn failing() -> Self {
            Self {
                calls:  Arc::new(AtomicUsize::new(0)),
                answer: None,
                delay:  Duration::from_millis(0),
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Router for CountingRouter {
        async fn route(&self, _from: GeoPoint, _to: GeoPoint) -> SpatialResult<Vec<GeoPoint>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.answer.clone().ok_or(SpatialError::Status(503))
        }
    }

    pub fn road() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(59.70, 10.80),
            GeoPoint::new(59.71, 10.82),
            GeoPoint::new(59.72, 10.84),
        ]
    }
}

#[cfg(test)]
mod key {
    use std::collections::HashSet;

    use dx_core::{Epoch, GeoPoint, ResourceId};

    use crate::RouteKey;

    #[test]
    fn epoch_distinguishes_keys() {
        let dest = GeoPoint::new(59.72, 10.84);
        let a = RouteKey::new(ResourceId::from("S11"), Epoch(1), dest);
        let b = RouteKey::new(ResourceId::from("S11"), Epoch(2), dest);
        assert_ne!(a, b);

        let mut set = HashSet::new();
        set.insert(a.clone());
        assert!(set.contains(&a));
        assert!(!set.contains(&b));
    }

    #[test]
    fn destination_distinguishes_keys() {
        let a = RouteKey::new(ResourceId::from("S11"), Epoch(1), GeoPoint::new(59.72, 10.84));
        let b = RouteKey::new(ResourceId::from("S11"), Epoch(1), GeoPoint::new(59.72, 10.8401));
        assert_ne!(a, b);
    }
}

#[cfg(test)]
mod straight {
    use dx_core::GeoPoint;

    use crate::{Router, StraightLineRouter};

    #[tokio::test]
    async fn answers_endpoints() {
        let a = GeoPoint::new(59.70, 10.80);
        let b = GeoPoint::new(59.72, 10.84);
        assert_eq!(StraightLineRouter.route(a, b).await.unwrap(), vec![a, b]);
    }
}

#[cfg(test)]
mod resolver {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;

    use dx_core::{DEFAULT_ANCHOR, Epoch, GeoPoint, ResourceId};

    use super::support::{CountingRouter, road};
    use crate::{RouteKey, RouteResolver};

    fn key(epoch: i64) -> RouteKey {
        RouteKey::new(ResourceId::from("S11"), Epoch(epoch), GeoPoint::new(59.72, 10.84))
    }

    #[tokio::test]
    async fn provider_geometry_used() {
        let resolver = RouteResolver::new(CountingRouter::ok(road()), DEFAULT_ANCHOR);
        let route = resolver.resolve(&key(1), Some(GeoPoint::new(59.70, 10.80))).await;
        assert!(!route.fallback);
        assert_eq!(route.polyline.points().len(), 3);
    }

    #[tokio::test]
    async fn second_resolve_is_cache_hit() {
        let resolver = RouteResolver::new(CountingRouter::ok(road()), DEFAULT_ANCHOR);
        let origin = Some(GeoPoint::new(59.70, 10.80));

        let first = resolver.resolve(&key(1), origin).await;
        let second = resolver.resolve(&key(1), origin).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(resolver.router().calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_resolves_share_one_request() {
        let router = CountingRouter::ok(road()).with_delay(Duration::from_millis(50));
        let resolver = Arc::new(RouteResolver::new(router, DEFAULT_ANCHOR));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let resolver = Arc::clone(&resolver);
            handles.push(tokio::spawn(async move {
                resolver.resolve(&key(7), Some(GeoPoint::new(59.70, 10.80))).await
            }));
        }
        for handle in handles {
            assert!(!handle.await.unwrap().fallback);
        }

        assert_eq!(resolver.router().calls(), 1);
    }

    #[tokio::test]
    async fn provider_error_falls_back_to_straight_line() {
        let resolver = RouteResolver::new(CountingRouter::failing(), DEFAULT_ANCHOR);
        let origin = GeoPoint::new(59.70, 10.80);
        let route = resolver.resolve(&key(1), Some(origin)).await;

        assert!(route.fallback);
        assert_eq!(route.polyline.points(), &[origin, GeoPoint::new(59.72, 10.84)]);
    }

    #[tokio::test]
    async fn single_point_geometry_falls_back() {
        let router = CountingRouter::ok(vec![GeoPoint::new(59.70, 10.80)]);
        let resolver = RouteResolver::new(router, DEFAULT_ANCHOR);
        let route = resolver.resolve(&key(1), Some(GeoPoint::new(59.70, 10.80))).await;
        assert!(route.fallback);
        assert_eq!(route.polyline.points().len(), 2);
    }

    #[tokio::test]
    async fn missing_origin_uses_anchor_without_provider() {
        let resolver = RouteResolver::new(CountingRouter::ok(road()), DEFAULT_ANCHOR);
        let route = resolver.resolve(&key(1), None).await;

        assert!(route.fallback);
        assert_eq!(route.polyline.start(), DEFAULT_ANCHOR);
        assert_eq!(resolver.router().calls(), 0);
    }

    #[tokio::test]
    async fn non_finite_destination_uses_anchor() {
        let resolver = RouteResolver::new(CountingRouter::ok(road()), DEFAULT_ANCHOR);
        let bad = RouteKey::new(ResourceId::from("S11"), Epoch(1), GeoPoint::new(f64::NAN, 10.0));
        let route = resolver.resolve(&bad, Some(GeoPoint::new(59.70, 10.80))).await;

        assert!(route.fallback);
        assert_eq!(route.polyline.end(), DEFAULT_ANCHOR);
    }

    #[tokio::test]
    async fn cached_peek_and_prune() {
        let resolver = RouteResolver::new(CountingRouter::ok(road()), DEFAULT_ANCHOR);
        let origin = Some(GeoPoint::new(59.70, 10.80));

        assert!(resolver.cached(&key(1)).is_none());
        resolver.resolve(&key(1), origin).await;
        resolver.resolve(&key(2), origin).await;
        assert!(resolver.cached(&key(1)).is_some());

        let live: HashSet<RouteKey> = [key(2)].into_iter().collect();
        assert_eq!(resolver.prune(&live), 1);
        assert!(resolver.cached(&key(1)).is_none());
        assert!(resolver.cached(&key(2)).is_some());
        assert_eq!(resolver.len(), 1);
    }
}

#[cfg(test)]
mod osrm {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::Json;
    use axum::http::{StatusCode, Uri};
    use serde_json::{Value, json};

    use dx_core::{DEFAULT_ANCHOR, Epoch, GeoPoint, ResourceId};

    use crate::{OsrmRouter, RouteKey, RouteResolver, Router, SpatialError};

    // Fake routing service on an ephemeral port; records every request URI.
    async fn fake_service(status: StatusCode, body: Value) -> (String, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_handler = Arc::clone(&seen);
        let app = axum::Router::new().fallback(move |uri: Uri| {
            let seen = Arc::clone(&seen_handler);
            let body = body.clone();
            async move {
                seen.lock().unwrap().push(uri.to_string());
                (status, Json(body))
            }
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), seen)
    }

    fn router(base: &str) -> OsrmRouter {
        OsrmRouter::new(base, Duration::from_millis(1500)).unwrap()
    }

    #[tokio::test]
    async fn transposes_geojson_coordinates() {
        let body = json!({
            "code": "Ok",
            "routes": [{ "geometry": { "coordinates": [[10.80, 59.70], [10.82, 59.71], [10.84, 59.72]] } }]
        });
        let (base, seen) = fake_service(StatusCode::OK, body).await;

        let points = router(&base)
            .route(GeoPoint::new(59.70, 10.80), GeoPoint::new(59.72, 10.84))
            .await
            .unwrap();

        assert_eq!(points.len(), 3);
        assert_eq!(points[1], GeoPoint::new(59.71, 10.82));

        let uri = seen.lock().unwrap()[0].clone();
        assert!(uri.starts_with("/route/v1/driving/10.8,59.7;10.84,59.72"), "{uri}");
        assert!(uri.contains("overview=full"));
        assert!(uri.contains("geometries=geojson"));
    }

    #[tokio::test]
    async fn empty_geometry_is_error() {
        let body = json!({ "code": "Ok", "routes": [{ "geometry": { "coordinates": [] } }] });
        let (base, _) = fake_service(StatusCode::OK, body).await;
        let err = router(&base)
            .route(GeoPoint::new(59.70, 10.80), GeoPoint::new(59.72, 10.84))
            .await
            .unwrap_err();
        assert!(matches!(err, SpatialError::EmptyGeometry));
    }

    #[tokio::test]
    async fn provider_code_is_error() {
        let body = json!({ "code": "NoRoute", "routes": [] });
        let (base, _) = fake_service(StatusCode::OK, body).await;
        let err = router(&base)
            .route(GeoPoint::new(59.70, 10.80), GeoPoint::new(59.72, 10.84))
            .await
            .unwrap_err();
        assert!(matches!(err, SpatialError::ProviderCode(ref c) if c == "NoRoute"));
    }

    #[tokio::test]
    async fn http_status_is_error() {
        let (base, _) = fake_service(StatusCode::SERVICE_UNAVAILABLE, json!({})).await;
        let err = router(&base)
            .route(GeoPoint::new(59.70, 10.80), GeoPoint::new(59.72, 10.84))
            .await
            .unwrap_err();
        assert!(matches!(err, SpatialError::Status(503)));
    }

    #[tokio::test]
    async fn empty_geometry_resolves_to_fallback() {
        let body = json!({ "code": "Ok", "routes": [{ "geometry": { "coordinates": [] } }] });
        let (base, _) = fake_service(StatusCode::OK, body).await;
        let resolver = RouteResolver::new(router(&base), DEFAULT_ANCHOR);

        let origin = GeoPoint::new(59.70, 10.80);
        let destination = GeoPoint::new(59.72, 10.84);
        let key = RouteKey::new(ResourceId::from("T11"), Epoch(1), destination);
        let route = resolver.resolve(&key, Some(origin)).await;

        assert!(route.fallback);
        assert_eq!(route.polyline.points(), &[origin, destination]);
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        assert_eq!(router("http://localhost:5000/").base_url(), "http://localhost:5000");
    }
}
