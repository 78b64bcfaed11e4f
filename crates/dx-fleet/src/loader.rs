//! CSV fleet loader.
//!
//! # CSV format
//!
//! Two files, one for stations and one for resources:
//!
//! ```csv
//! id,name,lat,lng
//! T1,T1 Lørenskog,59.9326,10.9650
//! S1,S1 Ski,59.7195,10.8350
//! ```
//!
//! ```csv
//! id,call_sign,kind,station_id
//! T11,T11,Mannskapsbil,T1
//! S13,S13,aerial,S1
//! ```
//!
//! **`kind`** accepts the labels understood by
//! [`ResourceKind::from_str`][dx_core::ResourceKind]: `engine`, `aerial`,
//! `tanker`, `other`, or the Norwegian vehicle names.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use dx_core::{GeoPoint, ResourceId, ResourceKind, StationId};

use crate::{Fleet, FleetBuilder, FleetError, FleetResult, Resource, Station};

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct StationRecord {
    id:   String,
    name: String,
    lat:  f64,
    lng:  f64,
}

#[derive(Deserialize)]
struct ResourceRecord {
    id:         String,
    call_sign:  String,
    kind:       String,
    station_id: String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a fleet from a stations CSV and a resources CSV.
pub fn load_fleet_csv(stations: &Path, resources: &Path) -> FleetResult<Fleet> {
    let stations = std::fs::File::open(stations).map_err(FleetError::Io)?;
    let resources = std::fs::File::open(resources).map_err(FleetError::Io)?;
    load_fleet_readers(stations, resources)
}

/// Like [`load_fleet_csv`] but accepts any `Read` sources.
///
/// Useful for testing (pass a `std::io::Cursor`) or embedding rosters.
pub fn load_fleet_readers<S: Read, R: Read>(stations: S, resources: R) -> FleetResult<Fleet> {
    let mut builder = FleetBuilder::new();

    let mut station_reader = csv::Reader::from_reader(stations);
    for result in station_reader.deserialize::<StationRecord>() {
        let row = result.map_err(|e| FleetError::Parse(e.to_string()))?;
        builder.push_station(Station {
            id:       StationId::new(row.id.trim()),
            name:     row.name.trim().to_owned(),
            position: GeoPoint::new(row.lat, row.lng),
        });
    }

    let mut resource_reader = csv::Reader::from_reader(resources);
    for result in resource_reader.deserialize::<ResourceRecord>() {
        let row = result.map_err(|e| FleetError::Parse(e.to_string()))?;
        let kind = row
            .kind
            .parse::<ResourceKind>()
            .map_err(|e| FleetError::Parse(e.to_string()))?;
        builder.push_resource(Resource {
            id:        ResourceId::new(row.id.trim()),
            call_sign: row.call_sign.trim().to_owned(),
            kind,
            station:   StationId::new(row.station_id.trim()),
        });
    }

    builder.build()
}
