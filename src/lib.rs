//! # Grit: Clocked Noise Voice
//!
//! `grit` is a fixed-point, per-sample synthesis chain for a single voice:
//! a clocked noise generator feeding a resonant multi-mode filter and an
//! optional wavefolder. Every tick has bounded cost, no allocation and no
//! failure path, so the voice can run straight inside an audio interrupt.
//!
//! ## Architecture
//!
//! - **Mapper** - bounded UI integers to centihertz and resonance units
//! - **Phase Clock** - divides the sample rate down to the noise rate
//! - **Noise Source** - white, bit-flip, crackle and line-in modes
//! - **State Variable Filter** - lowpass, bandpass, highpass and notch taps
//! - **Wavefolder** - reflect, modulo and interpolated-table folds
//! - **Voice** - the caller-owned object that runs the chain each tick
//!
//! The core is `no_std`. The `alloc` feature adds the [`rack`] host adapter
//! with JSON persistence; `std` (default) adds entropy seeding.
//!
//! ## Quick Start
//!
//! ```rust
//! use grit::prelude::*;
//!
//! let mut voice = Voice::new(VoiceConfig::default().with_seed(7));
//! voice.set_parameter(ParamId::NoiseMode, NoiseMode::Crackle.to_param());
//! voice.set_parameter(ParamId::FilterMode, FilterMode::BandPass.to_param());
//! voice.set_parameter(ParamId::FoldMode, FoldMode::Table.to_param());
//!
//! let inputs = [ChannelInputs::IDLE; CHANNELS];
//! let mut buffer = [Frame::default(); 64];
//! voice.render(&inputs, &mut buffer);
//! assert!(voice.clock().phase() < PHASE_MAX);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod clock;
pub mod control;
pub mod filter;
pub mod fold;
pub mod mapper;
pub mod noise;
#[cfg(feature = "alloc")]
pub mod rack;
pub mod rng;
pub mod state;
pub mod voice;

/// Prelude module for convenient imports
pub mod prelude {
    // Parameters
    pub use crate::mapper::{
        cutoff_for, lookup, rate_for, resonance_for, scale, ParamId, Parameters, CUTOFF_TABLE,
        PARAM_COUNT, RATE_TABLE, RESONANCE_MAX,
    };

    // Signal chain
    pub use crate::clock::{PhaseClock, DEFAULT_SAMPLE_RATE, PHASE_MAX};
    pub use crate::filter::{Coefficients, FilterMode, Svf};
    pub use crate::fold::{modulo_fold, reflect_fold, FoldMode, InterpolationFolder};
    pub use crate::noise::{CrackleConfig, Hold, NoiseMode, NoiseSource};
    pub use crate::rng::Rng;

    // Voice
    pub use crate::control::ParamBank;
    pub use crate::state::{StateError, SLOT_SIZE};
    pub use crate::voice::{ChannelInputs, Frame, Voice, VoiceConfig, CHANNELS};

    // Host adapter
    #[cfg(feature = "alloc")]
    pub use crate::rack::{Rack, RackDef, RackError, VoiceDef, VoiceId};
}

// Re-export key types at crate root for convenience
pub use prelude::*;
