//! Parameter Mapping
//!
//! The control surface speaks in small bounded integers. This module turns
//! them into the units the DSP needs: centihertz for the clock and the
//! filter cutoff, device units for resonance.
//!
//! Two strategies exist:
//!
//! - **Proportional** ([`scale`]): `p * out_max / p_max + offset`
//! - **Table lookup** ([`lookup`]): a fixed, monotonically increasing table
//!   indexed by the clamped parameter
//!
//! Neither ever fails. Out-of-range input saturates to the nearest valid
//! value.

use serde::{Deserialize, Serialize};

/// Number of UI parameters a voice exposes.
pub const PARAM_COUNT: usize = 8;

/// Full scale of the resonance control in device units.
pub const RESONANCE_MAX: u32 = 1000;

/// Clock rates in centihertz, 20 Hz to 48 kHz on an exponential curve.
///
/// Index 63 equals the default sample rate, so at that setting the noise
/// refreshes every tick.
pub const RATE_TABLE: [u32; 64] = [
    2000, 2263, 2561, 2897, 3278, 3709, 4197, 4749, 5374, 6080, 6880, 7784, 8808, 9966, 11277,
    12760, 14438, 16336, 18484, 20915, 23665, 26777, 30299, 34283, 38791, 43892, 49664, 56194,
    63584, 71945, 81406, 92110, 104223, 117928, 133435, 150982, 170836, 193301, 218720, 247481,
    280024, 316847, 358512, 405656, 459000, 519358, 587653, 664928, 752366, 851301, 963246,
    1089912, 1233234, 1395403, 1578897, 1786521, 2021446, 2287264, 2588037, 2928361, 3313438,
    3749151, 4242160, 4800000,
];

/// Filter cutoffs in centihertz, one entry per semitone (MIDI notes 16..=127).
pub const CUTOFF_TABLE: [u32; 112] = [
    2060, 2183, 2312, 2450, 2596, 2750, 2914, 3087, 3270, 3465, 3671, 3889, 4120, 4365, 4625,
    4900, 5191, 5500, 5827, 6174, 6541, 6930, 7342, 7778, 8241, 8731, 9250, 9800, 10383, 11000,
    11654, 12347, 13081, 13859, 14683, 15556, 16481, 17461, 18500, 19600, 20765, 22000, 23308,
    24694, 26163, 27718, 29366, 31113, 32963, 34923, 36999, 39200, 41530, 44000, 46616, 49388,
    52325, 55437, 58733, 62225, 65926, 69846, 73999, 78399, 83061, 88000, 93233, 98777, 104650,
    110873, 117466, 124451, 131851, 139691, 147998, 156798, 166122, 176000, 186466, 197553,
    209300, 221746, 234932, 248902, 263702, 279383, 295996, 313596, 332244, 352000, 372931,
    395107, 418601, 443492, 469864, 497803, 527404, 558765, 591991, 627193, 664488, 704000,
    745862, 790213, 837202, 886984, 939727, 995606, 1054808, 1117530, 1183982, 1254385,
];

/// Proportional mapping: `p * out_max / p_max + offset`.
///
/// `p` is clamped to `p_max`; a `p_max` of zero is treated as one.
#[inline]
pub const fn scale(p: u32, p_max: u32, out_max: u32, offset: u32) -> u32 {
    let p_max = if p_max == 0 { 1 } else { p_max };
    let p = if p > p_max { p_max } else { p };
    ((p as u64 * out_max as u64) / p_max as u64) as u32 + offset
}

/// Table lookup with the index clamped to the last entry.
///
/// An empty table maps everything to zero.
#[inline]
pub fn lookup(table: &[u32], index: usize) -> u32 {
    match table.len() {
        0 => 0,
        len => table[index.min(len - 1)],
    }
}

/// Clock rate in centihertz for a `Rate` parameter value.
#[inline]
pub fn rate_for(p: u8) -> u32 {
    lookup(&RATE_TABLE, p as usize)
}

/// Filter cutoff in centihertz for a `Cutoff` parameter value.
#[inline]
pub fn cutoff_for(p: u8) -> u32 {
    lookup(&CUTOFF_TABLE, p as usize)
}

/// Resonance in device units for a `Resonance` parameter value.
#[inline]
pub fn resonance_for(p: u8) -> u32 {
    scale(p as u32, ParamId::Resonance.max() as u32, RESONANCE_MAX, 0)
}

/// Identifies one of the voice's UI parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamId {
    /// Noise clock rate, table-mapped
    Rate,
    /// Filter cutoff, table-mapped
    Cutoff,
    /// Filter resonance, proportional
    Resonance,
    /// Wavefolder drive
    Drive,
    /// Output level, 63 is unity
    Level,
    /// Selects a [`NoiseMode`](crate::noise::NoiseMode)
    NoiseMode,
    /// Selects a [`FilterMode`](crate::filter::FilterMode)
    FilterMode,
    /// Selects a [`FoldMode`](crate::fold::FoldMode)
    FoldMode,
}

impl ParamId {
    pub const ALL: [ParamId; PARAM_COUNT] = [
        ParamId::Rate,
        ParamId::Cutoff,
        ParamId::Resonance,
        ParamId::Drive,
        ParamId::Level,
        ParamId::NoiseMode,
        ParamId::FilterMode,
        ParamId::FoldMode,
    ];

    /// Position of this parameter in [`ParamId::ALL`] and in packed slots.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`index`](Self::index).
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Largest value the parameter accepts.
    pub const fn max(self) -> u8 {
        match self {
            ParamId::Rate => 63,
            ParamId::Cutoff => 111,
            ParamId::Resonance => 63,
            ParamId::Drive => 63,
            ParamId::Level => 63,
            ParamId::NoiseMode => 3,
            ParamId::FilterMode => 4,
            ParamId::FoldMode => 3,
        }
    }

    /// Power-on value.
    pub const fn default_value(self) -> u8 {
        match self {
            ParamId::Rate => 40,
            ParamId::Cutoff => 80,
            ParamId::Resonance => 16,
            ParamId::Drive => 0,
            ParamId::Level => 63,
            ParamId::NoiseMode => 0,
            ParamId::FilterMode => 1,
            ParamId::FoldMode => 0,
        }
    }

    /// Short display name.
    pub const fn name(self) -> &'static str {
        match self {
            ParamId::Rate => "rate",
            ParamId::Cutoff => "cutoff",
            ParamId::Resonance => "resonance",
            ParamId::Drive => "drive",
            ParamId::Level => "level",
            ParamId::NoiseMode => "noise_mode",
            ParamId::FilterMode => "filter_mode",
            ParamId::FoldMode => "fold_mode",
        }
    }

    /// Clamp `value` into `0..=max()`.
    #[inline]
    pub const fn clamp(self, value: u8) -> u8 {
        let max = self.max();
        if value > max {
            max
        } else {
            value
        }
    }
}

/// Current values of all UI parameters, each within its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameters {
    values: [u8; PARAM_COUNT],
}

impl Parameters {
    pub fn new() -> Self {
        let mut values = [0; PARAM_COUNT];
        for id in ParamId::ALL {
            values[id.index()] = id.default_value();
        }
        Self { values }
    }

    /// Stored value for `id`, always in range.
    #[inline]
    pub fn get(&self, id: ParamId) -> u8 {
        self.values[id.index()]
    }

    /// Store a value, clamped to the parameter's range. Returns what was stored.
    #[inline]
    pub fn set(&mut self, id: ParamId, value: u8) -> u8 {
        let value = id.clamp(value);
        self.values[id.index()] = value;
        value
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, id: ParamId, value: u8) -> Self {
        self.set(id, value);
        self
    }

    /// Values in `ParamId` order.
    pub fn to_bytes(&self) -> [u8; PARAM_COUNT] {
        self.values
    }

    /// Build from packed bytes. Missing trailing bytes keep their defaults,
    /// out-of-range bytes are clamped.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut params = Self::new();
        for (id, &b) in ParamId::ALL.iter().zip(bytes) {
            params.set(*id, b);
        }
        params
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamId, u8)> + '_ {
        ParamId::ALL.iter().map(move |&id| (id, self.get(id)))
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::new()
    }
}
