//! Resource category enum shared by the fleet catalog and output writers.

use std::str::FromStr;

use crate::DxError;

/// The category of a movable resource.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ResourceKind {
    /// Crew-carrying fire engine.
    #[default]
    Engine,
    /// Aerial ladder / platform.
    Aerial,
    /// Water tanker.
    Tanker,
    /// Anything else the catalog declares.
    Other,
}

impl ResourceKind {
    /// Human-readable label, useful for CSV column values.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Engine => "engine",
            ResourceKind::Aerial => "aerial",
            ResourceKind::Tanker => "tanker",
            ResourceKind::Other  => "other",
        }
    }
}

impl FromStr for ResourceKind {
    type Err = DxError;

    /// Accepts the English labels and the Norwegian vehicle names used by
    /// the station rosters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "engine" | "mannskapsbil" => Ok(ResourceKind::Engine),
            "aerial" | "høyde"        => Ok(ResourceKind::Aerial),
            "tanker" | "tankbil"      => Ok(ResourceKind::Tanker),
            "other"                   => Ok(ResourceKind::Other),
            other => Err(DxError::Parse(format!("unknown resource kind {other:?}"))),
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
