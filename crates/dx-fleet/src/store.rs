//! Read-only catalog of stations and the resources housed at them.

use std::collections::BTreeMap;

use dx_core::{GeoPoint, ResourceId, ResourceKind, StationId};

/// A home station.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Station {
    pub id:       StationId,
    pub name:     String,
    pub position: GeoPoint,
}

/// A movable resource (vehicle).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Resource {
    pub id:        ResourceId,
    /// Display call-sign shown on the map label.
    pub call_sign: String,
    pub kind:      ResourceKind,
    /// Station the resource returns to on recall.
    pub station:   StationId,
}

/// The validated catalog.  Construct via [`FleetBuilder`][crate::FleetBuilder].
///
/// Every resource's `station` is guaranteed to exist in `stations`.
#[derive(Debug, Clone, Default)]
pub struct Fleet {
    pub(crate) stations:  BTreeMap<StationId, Station>,
    pub(crate) resources: BTreeMap<ResourceId, Resource>,
}

impl Fleet {
    #[inline]
    pub fn resource(&self, id: &ResourceId) -> Option<&Resource> {
        self.resources.get(id)
    }

    #[inline]
    pub fn station(&self, id: &StationId) -> Option<&Station> {
        self.stations.get(id)
    }

    /// Coordinate of the resource's home station, if the resource is known.
    pub fn home_position(&self, id: &ResourceId) -> Option<GeoPoint> {
        let resource = self.resources.get(id)?;
        self.stations.get(&resource.station).map(|s| s.position)
    }

    /// All resources in identifier order.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// All stations in identifier order.
    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    /// Resources housed at `station`, sorted by call-sign.
    pub fn at_station(&self, station: &StationId) -> Vec<&Resource> {
        let mut out: Vec<&Resource> = self
            .resources
            .values()
            .filter(|r| &r.station == station)
            .collect();
        out.sort_by(|a, b| a.call_sign.cmp(&b.call_sign));
        out
    }

    #[inline]
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    #[inline]
    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
