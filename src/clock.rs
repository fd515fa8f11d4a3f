//! Phase Clock
//!
//! A fixed-point phase accumulator that divides the sample rate down to an
//! event rate. Each [`PhaseClock::advance`] adds the increment to the phase
//! and reports whether it wrapped.
//!
//! On wrap the clock subtracts [`PHASE_MAX`] rather than resetting to zero,
//! so the truncation error of the increment is carried into the next period
//! and the long-run rate stays exact.

/// Fractional bits of the phase accumulator.
pub const PHASE_BITS: u32 = 24;

/// One full period of phase. `phase` is always below this.
pub const PHASE_MAX: u32 = 1 << PHASE_BITS;

/// Default audio sample rate in hertz.
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Divides the sample rate down to an event rate.
///
/// `phase < PHASE_MAX` always holds; `increment` never exceeds `PHASE_MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseClock {
    phase: u32,
    increment: u32,
    rate: u32,
    sample_rate: u32,
}

impl PhaseClock {
    /// A stopped clock (rate zero) at `sample_rate` hertz, clamped to >= 1.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            phase: 0,
            increment: 0,
            rate: 0,
            sample_rate: sample_rate.max(1),
        }
    }

    /// Set the event rate in centihertz.
    ///
    /// Recomputes the increment, truncating. The phase is left alone. Rates at
    /// or above the sample rate clamp to one wrap per tick.
    pub fn set_rate(&mut self, rate_centihertz: u32) {
        self.rate = rate_centihertz;
        self.increment = increment_for(rate_centihertz, self.sample_rate);
    }

    /// Change the sample rate, keeping the configured event rate.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate.max(1);
        self.increment = increment_for(self.rate, self.sample_rate);
    }

    /// Advance one tick. Returns `true` if the phase wrapped.
    #[inline]
    pub fn advance(&mut self) -> bool {
        // phase < PHASE_MAX and increment <= PHASE_MAX, so this cannot overflow
        let next = self.phase + self.increment;
        if next >= PHASE_MAX {
            self.phase = next - PHASE_MAX;
            true
        } else {
            self.phase = next;
            false
        }
    }

    /// Zero the phase. Rate and increment are kept.
    pub fn reset(&mut self) {
        self.phase = 0;
    }

    /// Current phase, in `0..PHASE_MAX`.
    #[inline]
    pub fn phase(&self) -> u32 {
        self.phase
    }

    /// Phase added per tick.
    #[inline]
    pub fn increment(&self) -> u32 {
        self.increment
    }

    /// Event rate in centihertz, as last set.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Sample rate in hertz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl Default for PhaseClock {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

/// `rate * PHASE_MAX / (sample_rate * 100)`, truncated and clamped to `PHASE_MAX`.
#[inline]
pub fn increment_for(rate_centihertz: u32, sample_rate: u32) -> u32 {
    let denom = sample_rate.max(1) as u64 * 100;
    let inc = (rate_centihertz as u64 * PHASE_MAX as u64) / denom;
    inc.min(PHASE_MAX as u64) as u32
}
