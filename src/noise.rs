//! Noise Source
//!
//! Produces the raw 12-bit noise sample that feeds the filter. Four modes:
//!
//! - **White**: a fresh uniform draw on each clock wrap
//! - **BitFlip**: toggles one random bit of the previous sample on each wrap
//! - **Crackle**: sparse bursts with geometric decay, evaluated every tick
//! - **LineIn**: samples the external input on each wrap
//!
//! The generator is passed in by the owning voice, so the source itself only
//! holds the current value.

use crate::clock::PHASE_MAX;
use crate::rng::Rng;
use serde::{Deserialize, Serialize};

/// Smallest noise value.
pub const NOISE_MIN: i32 = -2048;

/// Largest noise value. Bursts saturate here.
pub const NOISE_MAX: i32 = 2047;

/// Offset that maps the signed range onto `0..4096`.
pub const NOISE_BIAS: i32 = 2048;

/// Number of bits in the biased representation.
pub const NOISE_BITS: u32 = 12;

/// Noise generation algorithm, one per `NoiseMode` parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoiseMode {
    #[default]
    White,
    BitFlip,
    Crackle,
    LineIn,
}

impl NoiseMode {
    /// Mode for a `NoiseMode` parameter value. Values past the end clamp.
    pub const fn from_param(p: u8) -> Self {
        match p {
            0 => NoiseMode::White,
            1 => NoiseMode::BitFlip,
            2 => NoiseMode::Crackle,
            _ => NoiseMode::LineIn,
        }
    }

    /// Parameter value that selects this mode.
    pub const fn to_param(self) -> u8 {
        self as u8
    }
}

/// Burst and decay constants for [`NoiseMode::Crackle`].
///
/// A burst has magnitude `min(ceiling, increment / eta) * (NOISE_BIAS / ceiling)`.
/// Between bursts the value is multiplied by `decay_num / decay_den` each tick.
///
/// `ceiling` lies in `1..=NOISE_BIAS` and `decay_num` in `0..=decay_den`.
/// Deserialized configs may break that; [`CrackleConfig::normalized`] restores
/// it and [`crackle`] tolerates any value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrackleConfig {
    pub ceiling: u32,
    pub decay_num: i32,
    pub decay_den: i32,
}

impl CrackleConfig {
    /// Set the burst ceiling, clamped to `1..=NOISE_BIAS`.
    pub fn with_ceiling(mut self, ceiling: u32) -> Self {
        self.ceiling = ceiling.clamp(1, NOISE_BIAS as u32);
        self
    }

    /// Set the decay ratio. `den` is at least one and `num` stays in `0..=den`.
    pub fn with_decay(mut self, num: i32, den: i32) -> Self {
        self.decay_den = den.max(1);
        self.decay_num = num.clamp(0, self.decay_den);
        self
    }

    /// Clamp every field into range.
    pub fn normalized(self) -> Self {
        self.with_ceiling(self.ceiling)
            .with_decay(self.decay_num, self.decay_den)
    }
}

impl Default for CrackleConfig {
    fn default() -> Self {
        Self {
            ceiling: 8,
            decay_num: 3,
            decay_den: 4,
        }
    }
}

/// Per-channel noise state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoiseSource {
    mode: NoiseMode,
    value: i32,
    crackle: CrackleConfig,
}

impl NoiseSource {
    /// A silent source in `mode` with default crackle constants.
    pub fn new(mode: NoiseMode) -> Self {
        Self {
            mode,
            value: 0,
            crackle: CrackleConfig::default(),
        }
    }

    /// Use custom crackle constants. Out-of-range fields are clamped.
    pub fn with_crackle(mut self, crackle: CrackleConfig) -> Self {
        self.crackle = crackle.normalized();
        self
    }

    /// Crackle constants in use, already clamped.
    pub fn crackle(&self) -> &CrackleConfig {
        &self.crackle
    }

    /// Active mode.
    pub fn mode(&self) -> NoiseMode {
        self.mode
    }

    /// Switch modes. The current value carries over.
    pub fn set_mode(&mut self, mode: NoiseMode) {
        self.mode = mode;
    }

    /// Sample produced by the last [`next`](Self::next).
    #[inline]
    pub fn value(&self) -> i32 {
        self.value
    }

    /// Back to silence. The mode and crackle constants are kept.
    pub fn reset(&mut self) {
        self.value = 0;
    }

    /// Produce this tick's sample.
    ///
    /// `wrapped` is the clock's wrap flag and `increment` its per-tick step.
    /// Crackle ignores `wrapped` and runs its own test every tick.
    #[inline]
    pub fn next(&mut self, wrapped: bool, increment: u32, line_in: i16, rng: &mut Rng) -> i32 {
        self.value = match self.mode {
            NoiseMode::Crackle => crackle(self.value, increment, &self.crackle, rng),
            _ if !wrapped => self.value,
            NoiseMode::White => white(rng),
            NoiseMode::BitFlip => bit_flip(self.value, rng),
            NoiseMode::LineIn => line_level(line_in),
        };
        self.value
    }
}

/// Uniform draw over the full signed range.
#[inline]
pub fn white(rng: &mut Rng) -> i32 {
    rng.next_below(1 << NOISE_BITS) as i32 - NOISE_BIAS
}

/// Flip one random bit of the biased sample.
///
/// The XOR happens on the non-negative biased value so the sign never gets
/// mangled; the bias is removed afterwards.
#[inline]
pub fn bit_flip(value: i32, rng: &mut Rng) -> i32 {
    let mask = (1 << NOISE_BITS) - 1;
    let biased = (value.clamp(NOISE_MIN, NOISE_MAX) + NOISE_BIAS) & mask;
    let bit = rng.next_below(NOISE_BITS);
    (biased ^ (1 << bit)) - NOISE_BIAS
}

/// One tick of the burst/decay process.
#[inline]
pub fn crackle(value: i32, increment: u32, config: &CrackleConfig, rng: &mut Rng) -> i32 {
    let eta = rng.next_below(PHASE_MAX);
    if eta < increment {
        let ceiling = config.ceiling.clamp(1, NOISE_BIAS as u32);
        let amount = (increment / eta.max(1)).min(ceiling) as i32;
        let step = NOISE_BIAS / ceiling as i32;
        let burst = (amount * step).min(NOISE_MAX);
        if rng.next_bool() {
            burst
        } else {
            -burst
        }
    } else {
        // Never grows: |result| <= |value|
        let den = config.decay_den.max(1) as i64;
        let num = (config.decay_num as i64).clamp(0, den);
        (value as i64 * num / den) as i32
    }
}

/// Rescale a full-scale `i16` onto the noise range.
#[inline]
pub fn line_level(input: i16) -> i32 {
    input as i32 * NOISE_BIAS / 32768
}

/// Freezes a channel's sample while its gate is high.
///
/// Sits between the noise source and the filter so gate reading stays out
/// of the noise logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Hold {
    held: i32,
}

impl Hold {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pass `sample` through while `gate` is low; while it is high, keep
    /// returning the last sample seen with the gate low.
    #[inline]
    pub fn apply(&mut self, sample: i32, gate: bool) -> i32 {
        if !gate {
            self.held = sample;
        }
        self.held
    }

    pub fn reset(&mut self) {
        self.held = 0;
    }
}
