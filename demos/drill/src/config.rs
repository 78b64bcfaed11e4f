//! Drill settings from the environment (optionally seeded from `.env`).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use dx_core::SyncConfig;

/// Frames between two recorded marker samples in the track export.
pub const SAMPLE_EVERY_FRAMES: u64 = 10;

/// Slowest and fastest pace of a simulated operator.
pub const ACTION_PERIOD_MS: (u64, u64) = (1_500, 4_000);

#[derive(Debug, Clone)]
pub struct DrillConfig {
    /// OSRM-compatible base URL; `None` routes along straight lines.
    pub routing_url:     Option<String>,
    pub routing_timeout: Duration,
    pub clients:         u32,
    pub seed:            u64,
    pub duration:        Duration,
    pub speed_mps:       f64,
    /// SQLite database path; `None` keeps the session in memory.
    pub db:              Option<PathBuf>,
    /// Track export directory; `None` disables export.
    pub output:          Option<PathBuf>,
    /// Directory holding `stations.csv` and `resources.csv`; `None` uses the
    /// built-in roster.
    pub fleet_dir:       Option<PathBuf>,
}

impl DrillConfig {
    pub fn from_env() -> Self {
        Self {
            routing_url:     non_empty("ROUTING_URL"),
            routing_timeout: Duration::from_millis(parsed("ROUTING_TIMEOUT_MS", 1_500)),
            clients:         parsed("DRILL_CLIENTS", 3),
            seed:            parsed("DRILL_SEED", 42),
            duration:        Duration::from_secs(parsed("DRILL_SECONDS", 60)),
            speed_mps:       parsed("DRILL_SPEED_MPS", 20.0),
            db:              non_empty("DRILL_DB").map(PathBuf::from),
            output:          non_empty("DRILL_OUTPUT").map(PathBuf::from),
            fleet_dir:       non_empty("DRILL_FLEET_DIR").map(PathBuf::from),
        }
    }

    /// Engine settings shared by every client of the drill.
    pub fn sync(&self) -> SyncConfig {
        SyncConfig { default_speed_mps: self.speed_mps, ..SyncConfig::default() }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
