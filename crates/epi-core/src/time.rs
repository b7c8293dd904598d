//! Simulation time model.
//!
//! # Design
//!
//! Time is a monotonically increasing `Tick` counter.  `SimClock` maps ticks
//! to a time of day so that daily routines (testing opening hours, the manual
//! tracing desk) can be expressed in wall-clock terms:
//!
//!   seconds_of_day(t) = (start_secs_of_day + t * tick_duration_secs) mod 86_400
//!
//! Integer ticks keep all interval arithmetic exact.

use std::fmt;

pub const SECS_PER_DAY: u64 = 86_400;
pub const SECS_PER_HOUR: u64 = 3_600;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`, saturating at `u64::MAX`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0.saturating_add(n))
    }

    /// Ticks elapsed from `earlier` to `self`, saturating at zero.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        self.offset(rhs)
    }
}

impl std::ops::Sub for Tick {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Tick) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Converts between tick counts and the simulated time of day.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Time of day (seconds after midnight) of tick 0.
    pub start_secs_of_day: u32,
    /// How many simulated seconds one tick represents.  Default: 3600.
    pub tick_duration_secs: u32,
    /// The current tick, reset by the scheduler at the start of each run.
    pub current_tick: Tick,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(0, SECS_PER_HOUR as u32)
    }
}

impl SimClock {
    pub fn new(start_secs_of_day: u32, tick_duration_secs: u32) -> Self {
        Self {
            start_secs_of_day,
            tick_duration_secs: tick_duration_secs.max(1),
            current_tick: Tick::ZERO,
        }
    }

    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    #[inline]
    pub fn reset(&mut self) {
        self.current_tick = Tick::ZERO;
    }

    /// Simulated seconds since midnight of day 0 at the start of `tick`.
    #[inline]
    fn absolute_secs(&self, tick: Tick) -> u64 {
        self.start_secs_of_day as u64 + tick.0 * self.tick_duration_secs as u64
    }

    /// Seconds after midnight at the start of `tick`.
    #[inline]
    pub fn seconds_of_day(&self, tick: Tick) -> u64 {
        self.absolute_secs(tick) % SECS_PER_DAY
    }

    /// Fractional hour of day at the start of `tick`, in `[0, 24)`.
    #[inline]
    pub fn hour_of_day(&self, tick: Tick) -> f64 {
        self.seconds_of_day(tick) as f64 / SECS_PER_HOUR as f64
    }

    /// Zero-based simulated day that `tick` falls on.
    #[inline]
    pub fn day(&self, tick: Tick) -> u64 {
        self.absolute_secs(tick) / SECS_PER_DAY
    }

    /// `true` if the interval covered by `tick` contains the time of day
    /// `secs_of_day`.  Exactly one tick per day satisfies this when the tick
    /// duration is at most one day.
    pub fn contains_time_of_day(&self, tick: Tick, secs_of_day: u64) -> bool {
        let dur = self.tick_duration_secs as u64;
        if dur >= SECS_PER_DAY {
            return true;
        }
        let start = self.seconds_of_day(tick);
        let target = secs_of_day % SECS_PER_DAY;
        let offset = (target + SECS_PER_DAY - start) % SECS_PER_DAY;
        offset < dur
    }

    // ── Tick-count helpers ────────────────────────────────────────────────

    /// How many ticks span `secs` seconds (rounds up).
    #[inline]
    pub fn ticks_for_secs(&self, secs: u64) -> u64 {
        secs.div_ceil(self.tick_duration_secs as u64)
    }

    #[inline]
    pub fn ticks_for_hours(&self, hours: u64) -> u64 {
        self.ticks_for_secs(hours * SECS_PER_HOUR)
    }

    #[inline]
    pub fn ticks_per_day(&self) -> u64 {
        self.ticks_for_secs(SECS_PER_DAY)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.seconds_of_day(self.current_tick);
        write!(
            f,
            "{} (day {} {:02}:{:02})",
            self.current_tick,
            self.day(self.current_tick),
            secs / SECS_PER_HOUR,
            (secs % SECS_PER_HOUR) / 60
        )
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level run configuration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Time of day of tick 0, in seconds after midnight.
    pub start_secs_of_day: u32,

    /// Seconds per tick.  Default: 3600.
    pub tick_duration_secs: u32,

    /// Step budget for a run.  `None` runs until the caller stops iterating.
    pub total_ticks: Option<u64>,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_secs_of_day: 0,
            tick_duration_secs: SECS_PER_HOUR as u32,
            total_ticks: None,
            seed: 0,
        }
    }
}

impl SimConfig {
    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.start_secs_of_day, self.tick_duration_secs)
    }
}
