//! The built-in three-station roster used by the drill and the tests.

use dx_core::{GeoPoint, ResourceKind};

use crate::{Fleet, FleetBuilder, FleetResult};

// (station id, display name, lat, lng)
const STATIONS: [(&str, &str, f64, f64); 3] = [
    ("T1", "T1 Lørenskog", 59.9326, 10.9650),
    ("S1", "S1 Ski",       59.7195, 10.8350),
    ("M1", "M1 Moss",      59.4370, 10.6570),
];

// Each station houses an engine (x11), an aerial (x13) and a tanker (x14).
const UNITS: [(&str, ResourceKind); 3] = [
    ("11", ResourceKind::Engine),
    ("13", ResourceKind::Aerial),
    ("14", ResourceKind::Tanker),
];

/// Three stations south and east of Oslo with three resources each.
pub fn default_roster() -> FleetResult<Fleet> {
    let mut builder = FleetBuilder::new();
    for (id, name, lat, lng) in STATIONS {
        builder = builder.station(id, name, GeoPoint::new(lat, lng));
        let prefix = &id[..1];
        for (suffix, kind) in UNITS {
            let call_sign = format!("{prefix}{suffix}");
            builder = builder.resource(call_sign.as_str(), call_sign.clone(), kind, id);
        }
    }
    builder.build()
}
