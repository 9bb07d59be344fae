//! Elapsed-time accounting from a free-running down-counter.
//!
//! The hardware counter decrements at a fixed rate and wraps through zero.
//! [`TimeBase`] turns successive raw samples into whole tenth-second ticks,
//! carrying the sub-tenth remainder forward so nothing is lost or counted
//! twice across any number of wraps.
//!
//! # Example
//!
//! ```rust
//! use train_console::timebase::TimeBase;
//!
//! let mut time = TimeBase::new(10_000, 200);
//!
//! // Not enough ticks yet
//! assert_eq!(time.accumulate(9_900), 0);
//!
//! // 450 raw ticks since the last accounted sample: two tenths, 50 carried
//! assert_eq!(time.accumulate(9_550), 2);
//! assert_eq!(time.elapsed_tenths(), 2);
//! assert_eq!(time.carry_ticks(), 50);
//! ```

use core::fmt;

/// Monotonic elapsed-time tracker.
///
/// Holds the last accounted raw sample, the sub-tenth remainder, and the
/// running total of tenths. Only [`accumulate`](Self::accumulate) mutates it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeBase {
    last_sample: u32,
    carry_ticks: u32,
    elapsed_tenths: u32,
    ticks_per_tenth: u32,
}

impl TimeBase {
    /// Creates a time base anchored at `initial_sample`.
    ///
    /// `ticks_per_tenth` is raised to 1 if zero.
    pub fn new(initial_sample: u32, ticks_per_tenth: u32) -> Self {
        Self {
            last_sample: initial_sample,
            carry_ticks: 0,
            elapsed_tenths: 0,
            ticks_per_tenth: ticks_per_tenth.max(1),
        }
    }

    /// Raw ticks between the last accounted sample and `raw_sample`.
    ///
    /// The counter counts down, so a sample above the last one means it
    /// wrapped past zero in between.
    pub fn raw_delta(&self, raw_sample: u32) -> u32 {
        if raw_sample > self.last_sample {
            self.last_sample + (u32::MAX - raw_sample) + 1
        } else {
            self.last_sample - raw_sample
        }
    }

    /// Account a new raw counter sample.
    ///
    /// Returns the number of whole tenths that elapsed since the previous
    /// accounted sample. Below one tenth, nothing changes and 0 is returned;
    /// the next call measures from the same anchor so the partial interval
    /// is still counted later.
    pub fn accumulate(&mut self, raw_sample: u32) -> u32 {
        let delta = self.raw_delta(raw_sample);
        if delta < self.ticks_per_tenth {
            return 0;
        }

        // carry < ticks_per_tenth, so this only overflows for deltas within
        // one tenth of a full counter period
        self.carry_ticks = self.carry_ticks.saturating_add(delta);
        let tenths = self.carry_ticks / self.ticks_per_tenth;
        self.carry_ticks %= self.ticks_per_tenth;
        self.elapsed_tenths = self.elapsed_tenths.wrapping_add(tenths);
        self.last_sample = raw_sample;

        tracing::trace!(raw_sample, delta, tenths, total = self.elapsed_tenths, "time accounted");
        tenths
    }

    /// Total tenths accounted since creation.
    pub fn elapsed_tenths(&self) -> u32 {
        self.elapsed_tenths
    }

    /// Sub-tenth remainder carried into the next crossing.
    pub fn carry_ticks(&self) -> u32 {
        self.carry_ticks
    }

    /// The raw sample the next delta is measured from.
    pub fn last_sample(&self) -> u32 {
        self.last_sample
    }

    /// Elapsed time split into minutes, seconds and tenths.
    pub fn clock(&self) -> ElapsedClock {
        ElapsedClock::from_tenths(self.elapsed_tenths)
    }
}

/// Elapsed time as `minutes:seconds,tenths`.
///
/// ```rust
/// use train_console::timebase::ElapsedClock;
///
/// let clock = ElapsedClock::from_tenths(1234);
/// assert_eq!((clock.minutes, clock.seconds, clock.tenths), (2, 3, 4));
/// assert_eq!(format!("{}", clock), "2:03,4");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElapsedClock {
    /// Whole minutes.
    pub minutes: u32,
    /// Seconds within the minute.
    pub seconds: u32,
    /// Tenths within the second.
    pub tenths: u32,
}

impl ElapsedClock {
    /// Split a tenth-second total.
    pub const fn from_tenths(total: u32) -> Self {
        Self {
            minutes: total / 600,
            seconds: (total % 600) / 10,
            tenths: total % 10,
        }
    }
}

impl fmt::Display for ElapsedClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02},{}", self.minutes, self.seconds, self.tenths)
    }
}
