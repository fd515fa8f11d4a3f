//! Lock-free Parameter Sharing
//!
//! The control surface and the audio callback may live on different
//! threads. [`ParamBank`] holds one atomic byte per parameter: the control
//! side stores, the audio side loads at the top of each tick through
//! [`Voice::sync`](crate::voice::Voice::sync). Relaxed ordering is enough;
//! a write that lands one tick late is harmless.

use crate::mapper::{ParamId, Parameters, PARAM_COUNT};
use core::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug)]
pub struct ParamBank {
    values: [AtomicU8; PARAM_COUNT],
}

impl ParamBank {
    /// Bank holding the default parameter values.
    pub fn new() -> Self {
        Self::from_parameters(&Parameters::new())
    }

    /// Bank seeded from an existing parameter set.
    pub fn from_parameters(params: &Parameters) -> Self {
        let bytes = params.to_bytes();
        Self {
            values: core::array::from_fn(|i| AtomicU8::new(bytes[i])),
        }
    }

    /// Latest stored value for `id`.
    #[inline]
    pub fn get(&self, id: ParamId) -> u8 {
        self.values[id.index()].load(Ordering::Relaxed)
    }

    /// Store a value, clamped to the parameter's range. Returns what was stored.
    #[inline]
    pub fn set(&self, id: ParamId, value: u8) -> u8 {
        let value = id.clamp(value);
        self.values[id.index()].store(value, Ordering::Relaxed);
        value
    }

    /// Copy out the current values.
    pub fn snapshot(&self) -> Parameters {
        let mut params = Parameters::new();
        for id in ParamId::ALL {
            params.set(id, self.get(id));
        }
        params
    }
}

impl Default for ParamBank {
    fn default() -> Self {
        Self::new()
    }
}
