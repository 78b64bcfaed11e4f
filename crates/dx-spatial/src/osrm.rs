//! OSRM-compatible HTTP routing provider.
//!
//! Request:
//!
//! ```text
//! GET {base}/route/v1/driving/{lng},{lat};{lng},{lat}?overview=full&geometries=geojson
//! ```
//!
//! Only `routes[0].geometry.coordinates` is read.  It is a GeoJSON
//! LineString, so every pair is `[lng, lat]`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use dx_core::GeoPoint;

use crate::{Router, SpatialError, SpatialResult};

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code:   String,
    #[serde(default)]
    routes: Vec<RouteBody>,
}

#[derive(Debug, Deserialize)]
struct RouteBody {
    geometry: LineString,
}

#[derive(Debug, Deserialize)]
struct LineString {
    #[serde(default)]
    coordinates: Vec<[f64; 2]>,
}

// Thin reqwest client for the routing service.
#[derive(Clone, Debug)]
pub struct OsrmRouter {
    http:     reqwest::Client,
    base_url: String,
}

impl OsrmRouter {
    /// `base_url` is the service root, e.g. `https://router.project-osrm.org`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> SpatialResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn route_url(&self, from: GeoPoint, to: GeoPoint) -> String {
        format!(
            "{}/route/v1/driving/{},{};{},{}?overview=full&geometries=geojson",
            self.base_url, from.lng, from.lat, to.lng, to.lat
        )
    }
}

#[async_trait]
impl Router for OsrmRouter {
    async fn route(&self, from: GeoPoint, to: GeoPoint) -> SpatialResult<Vec<GeoPoint>> {
        let response = self.http.get(self.route_url(from, to)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpatialError::Status(status.as_u16()));
        }

        let body = response
            .json::<RouteResponse>()
            .await
            .map_err(|e| SpatialError::Decode(e.to_string()))?;

        if body.code != "Ok" {
            return Err(SpatialError::ProviderCode(body.code));
        }

        let coordinates = body
            .routes
            .into_iter()
            .next()
            .map(|r| r.geometry.coordinates)
            .unwrap_or_default();
        if coordinates.is_empty() {
            return Err(SpatialError::EmptyGeometry);
        }

        Ok(coordinates
            .into_iter()
            .map(|[lng, lat]| GeoPoint::new(lat, lng))
            .collect())
    }
}
