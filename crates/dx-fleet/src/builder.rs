//! Fluent builder for constructing a validated [`Fleet`].
//!
//! # Usage
//!
//! ```rust
//! use dx_core::{GeoPoint, ResourceKind};
//! use dx_fleet::FleetBuilder;
//!
//! let fleet = FleetBuilder::new()
//!     .station("S1", "S1 Ski", GeoPoint::new(59.7195, 10.8350))
//!     .resource("S11", "S11", ResourceKind::Engine, "S1")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(fleet.resource_count(), 1);
//! ```

use std::collections::BTreeMap;

use dx_core::{GeoPoint, ResourceId, ResourceKind, StationId};

use crate::{Fleet, FleetError, FleetResult, Resource, Station};

/// Collects stations and resources, then checks the catalog invariants in
/// [`build`](Self::build).
#[derive(Default)]
pub struct FleetBuilder {
    stations:  Vec<Station>,
    resources: Vec<Resource>,
}

impl FleetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a station.
    pub fn station(
        mut self,
        id:       impl Into<StationId>,
        name:     impl Into<String>,
        position: GeoPoint,
    ) -> Self {
        self.stations.push(Station { id: id.into(), name: name.into(), position });
        self
    }

    /// Add a resource housed at `station`.
    pub fn resource(
        mut self,
        id:        impl Into<ResourceId>,
        call_sign: impl Into<String>,
        kind:      ResourceKind,
        station:   impl Into<StationId>,
    ) -> Self {
        self.resources.push(Resource {
            id:        id.into(),
            call_sign: call_sign.into(),
            kind,
            station:   station.into(),
        });
        self
    }

    pub(crate) fn push_station(&mut self, station: Station) {
        self.stations.push(station);
    }

    pub(crate) fn push_resource(&mut self, resource: Resource) {
        self.resources.push(resource);
    }

    /// Validate and freeze the catalog.
    ///
    /// # Errors
    ///
    /// Duplicate station or resource ids, non-finite station coordinates, and
    /// resources whose home station is not in the catalog.
    pub fn build(self) -> FleetResult<Fleet> {
        let mut stations = BTreeMap::new();
        for station in self.stations {
            if !station.position.is_finite() {
                return Err(FleetError::InvalidPosition(station.id));
            }
            if stations.contains_key(&station.id) {
                return Err(FleetError::DuplicateStation(station.id));
            }
            stations.insert(station.id.clone(), station);
        }

        let mut resources = BTreeMap::new();
        for resource in self.resources {
            if !stations.contains_key(&resource.station) {
                return Err(FleetError::UnknownStation {
                    resource: resource.id,
                    station:  resource.station,
                });
            }
            if resources.contains_key(&resource.id) {
                return Err(FleetError::DuplicateResource(resource.id));
            }
            resources.insert(resource.id.clone(), resource);
        }

        Ok(Fleet { stations, resources })
    }
}
