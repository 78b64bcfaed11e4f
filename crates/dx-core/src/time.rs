//! Shared clock reference and movement epochs.
//!
//! # Design
//!
//! Every client computes positions from wall-clock time, so time is plain
//! Unix milliseconds.  An [`Epoch`] is the instant one specific movement
//! attempt began.  It doubles as the version token for that movement: the
//! finalization write only applies while the stored epoch still equals the
//! one the client computed arrival against.
//!
//! Two movements of the same resource must never share an epoch, so a new
//! epoch is `max(now, previous + 1)` rather than just `now`.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

// ── Epoch ─────────────────────────────────────────────────────────────────────

/// A Unix timestamp in milliseconds.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Epoch(pub i64);

impl Epoch {
    pub const ZERO: Epoch = Epoch(0);

    #[inline]
    pub fn from_millis(ms: i64) -> Epoch {
        Epoch(ms)
    }

    #[inline]
    pub fn as_millis(self) -> i64 {
        self.0
    }

    /// The instant `ms` milliseconds after `self`.
    #[inline]
    pub fn offset_ms(self, ms: i64) -> Epoch {
        Epoch(self.0.saturating_add(ms))
    }

    /// Seconds elapsed from `start` to `self`, clamped to `>= 0`.
    #[inline]
    pub fn secs_since(self, start: Epoch) -> f64 {
        self.0.saturating_sub(start.0).max(0) as f64 / 1000.0
    }

    /// A fresh epoch for a new movement at `now`, strictly after `previous`.
    #[inline]
    pub fn next_after(now: Epoch, previous: Option<Epoch>) -> Epoch {
        match previous {
            Some(prev) if prev.0 >= now.0 => Epoch(prev.0 + 1),
            _ => now,
        }
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

// ── Clock ─────────────────────────────────────────────────────────────────────

/// Port for the shared clock reference.
pub trait Clock: Send + Sync {
    fn now(&self) -> Epoch;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Epoch {
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Epoch(i64::try_from(ms).unwrap_or(i64::MAX))
    }
}

/// A clock that only moves when told to.  Clones share the same instant.
#[derive(Clone, Debug, Default)]
pub struct ManualClock(Arc<AtomicI64>);

impl ManualClock {
    pub fn new(start: Epoch) -> Self {
        Self(Arc::new(AtomicI64::new(start.0)))
    }

    pub fn set(&self, now: Epoch) {
        self.0.store(now.0, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: i64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Epoch {
        Epoch(self.0.load(Ordering::SeqCst))
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Epoch {
        (**self).now()
    }
}
