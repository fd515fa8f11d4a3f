//! Voice
//!
//! A caller-owned synthesizer voice. Per tick:
//!
//! ```text
//! clock.advance ─▶ noise.next ─▶ hold ─▶ svf.feed ─▶ tap ─▶ fold ─▶ level/2 ─▶ i16
//! ```
//!
//! Two channels share the clock and the parameters. Each channel owns its
//! noise source, hold, filter and random stream, so left and right are
//! decorrelated and a mono host can run only the left channel.
//!
//! Nothing in the tick path allocates, blocks or fails.

use crate::clock::{PhaseClock, DEFAULT_SAMPLE_RATE};
use crate::control::ParamBank;
use crate::filter::{Coefficients, FilterMode, Svf};
use crate::fold::{FoldMode, InterpolationFolder};
use crate::mapper::{cutoff_for, rate_for, resonance_for, ParamId, Parameters};
use crate::noise::{CrackleConfig, Hold, NoiseMode, NoiseSource};
use crate::rng::Rng;
use crate::state::{self, StateError};
use serde::{Deserialize, Serialize};

/// Output channels per voice.
pub const CHANNELS: usize = 2;

/// Level value that passes the signal at unity.
const LEVEL_UNITY: i64 = ParamId::Level.max() as i64;

/// Construction-time settings of a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Audio sample rate in hertz
    pub sample_rate: u32,
    /// Seed of the left channel's random stream
    pub seed: u64,
    pub crackle: CrackleConfig,
}

impl VoiceConfig {
    /// Sample rate in hertz, clamped to >= 1.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate.max(1);
        self
    }

    /// Seed of the left channel; the right channel jumps ahead of it.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Crackle constants, clamped into range.
    pub fn with_crackle(mut self, crackle: CrackleConfig) -> Self {
        self.crackle = crackle.normalized();
        self
    }

    /// Seed from the thread RNG (std only).
    #[cfg(feature = "std")]
    pub fn with_random_seed(mut self) -> Self {
        self.seed = rand::random();
        self
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            seed: 0x6772_6974,
            crackle: CrackleConfig::default(),
        }
    }
}

/// Per-channel external input for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelInputs {
    /// Freeze the noise sample this tick
    pub hold: bool,
    /// External audio, read in `LineIn` mode
    pub line_in: i16,
}

impl ChannelInputs {
    pub const IDLE: Self = Self {
        hold: false,
        line_in: 0,
    };

    pub fn with_hold(mut self, hold: bool) -> Self {
        self.hold = hold;
        self
    }

    pub fn with_line_in(mut self, line_in: i16) -> Self {
        self.line_in = line_in;
        self
    }
}

/// One stereo output sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame {
    pub left: i16,
    pub right: i16,
}

impl Frame {
    /// Channel-wise sum, saturating at the `i16` rails.
    pub fn saturating_add(self, other: Frame) -> Frame {
        Frame {
            left: self.left.saturating_add(other.left),
            right: self.right.saturating_add(other.right),
        }
    }
}

/// Values read once per tick and shared by both channels.
#[derive(Clone, Copy)]
struct TickContext {
    wrapped: bool,
    increment: u32,
    filter_mode: FilterMode,
    coeffs: Coefficients,
    fold_mode: FoldMode,
    drive: u8,
    level: u8,
}

#[derive(Debug, Clone, Copy)]
struct Channel {
    rng: Rng,
    noise: NoiseSource,
    hold: Hold,
    filter: Svf,
    last_noise: i32,
}

impl Channel {
    fn new(config: &VoiceConfig, index: usize) -> Self {
        Self {
            rng: channel_rng(config.seed, index),
            noise: NoiseSource::default().with_crackle(config.crackle),
            hold: Hold::new(),
            filter: Svf::new(config.sample_rate),
            last_noise: 0,
        }
    }

    #[inline]
    fn process(
        &mut self,
        ctx: &TickContext,
        input: &ChannelInputs,
        folder: &InterpolationFolder,
    ) -> i16 {
        let raw = self
            .noise
            .next(ctx.wrapped, ctx.increment, input.line_in, &mut self.rng);
        self.last_noise = raw;
        let sample = self.hold.apply(raw, input.hold);

        let tap = match ctx.filter_mode {
            FilterMode::Off => sample,
            mode => {
                self.filter.feed_coefficients(sample, ctx.coeffs);
                self.filter.tap(mode)
            }
        };

        let folded = ctx.fold_mode.apply(tap, ctx.drive, folder);
        output_level(folded, ctx.level)
    }
}

/// Left channel uses the seed directly; each further channel jumps ahead.
fn channel_rng(seed: u64, index: usize) -> Rng {
    let mut rng = Rng::from_seed(seed);
    for _ in 0..index {
        rng.jump();
    }
    rng
}

/// `x * level / 63`, halved for fold headroom, saturated to `i16`.
#[inline]
pub fn output_level(x: i32, level: u8) -> i16 {
    let scaled = x as i64 * level as i64 / LEVEL_UNITY / 2;
    scaled.clamp(i16::MIN as i64, i16::MAX as i64) as i16
}

/// A clocked noise voice.
#[derive(Debug, Clone)]
pub struct Voice {
    config: VoiceConfig,
    params: Parameters,
    clock: PhaseClock,
    channels: [Channel; CHANNELS],
    folder: InterpolationFolder,
}

impl Voice {
    /// Build a voice at power-on state. The config is clamped first, so
    /// a deserialized one cannot push the tick path out of range.
    pub fn new(config: VoiceConfig) -> Self {
        let config = config
            .with_sample_rate(config.sample_rate)
            .with_crackle(config.crackle);
        let mut voice = Self {
            config,
            params: Parameters::new(),
            clock: PhaseClock::new(config.sample_rate),
            channels: [Channel::new(&config, 0), Channel::new(&config, 1)],
            folder: InterpolationFolder::default(),
        };
        voice.init();
        voice
    }

    /// Power-on state: default parameters and cleared signal state.
    pub fn init(&mut self) {
        self.params = Parameters::new();
        for id in ParamId::ALL {
            self.apply(id);
        }
        self.reset();
    }

    /// Start/reset event: clears clock, noise, hold and filter state and
    /// restarts the random streams. Parameters are kept.
    pub fn reset(&mut self) {
        self.clock.reset();
        for (index, channel) in self.channels.iter_mut().enumerate() {
            channel.rng = channel_rng(self.config.seed, index);
            channel.noise.reset();
            channel.hold.reset();
            channel.filter.reset();
            channel.last_noise = 0;
        }
    }

    /// Store a parameter, clamped to its range. Returns the stored value.
    pub fn set_parameter(&mut self, id: ParamId, value: u8) -> u8 {
        let stored = self.params.set(id, value);
        self.apply(id);
        stored
    }

    /// Stored value of a parameter.
    pub fn parameter(&self, id: ParamId) -> u8 {
        self.params.get(id)
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    /// Replace every parameter at once.
    pub fn set_parameters(&mut self, params: Parameters) {
        for (id, value) in params.iter() {
            self.set_parameter(id, value);
        }
    }

    /// Pull changed values from a shared bank. Call at the top of a tick.
    pub fn sync(&mut self, bank: &ParamBank) {
        for id in ParamId::ALL {
            let value = bank.get(id);
            if value != self.params.get(id) {
                self.set_parameter(id, value);
            }
        }
    }

    fn apply(&mut self, id: ParamId) {
        let value = self.params.get(id);
        match id {
            ParamId::Rate => self.clock.set_rate(rate_for(value)),
            ParamId::NoiseMode => {
                let mode = NoiseMode::from_param(value);
                for channel in self.channels.iter_mut() {
                    channel.noise.set_mode(mode);
                }
            }
            // Read directly from `params` each tick
            _ => {}
        }
    }

    /// Produce one stereo frame.
    pub fn tick(&mut self, inputs: &[ChannelInputs; CHANNELS]) -> Frame {
        let ctx = self.begin_tick();
        let folder = &self.folder;
        let mut out = [0i16; CHANNELS];
        for ((sample, channel), input) in out.iter_mut().zip(self.channels.iter_mut()).zip(inputs) {
            *sample = channel.process(&ctx, input, folder);
        }
        Frame {
            left: out[0],
            right: out[1],
        }
    }

    /// Produce one sample from the left channel only.
    pub fn tick_mono(&mut self, input: &ChannelInputs) -> i16 {
        let ctx = self.begin_tick();
        self.channels[0].process(&ctx, input, &self.folder)
    }

    /// Fill `out` with consecutive frames using the same inputs for each.
    pub fn render(&mut self, inputs: &[ChannelInputs; CHANNELS], out: &mut [Frame]) {
        for frame in out.iter_mut() {
            *frame = self.tick(inputs);
        }
    }

    #[inline]
    fn begin_tick(&mut self) -> TickContext {
        let wrapped = self.clock.advance();
        let filter_mode = FilterMode::from_param(self.params.get(ParamId::FilterMode));
        let coeffs = match filter_mode {
            FilterMode::Off => Coefficients::default(),
            _ => Coefficients::from_params(
                cutoff_for(self.params.get(ParamId::Cutoff)),
                resonance_for(self.params.get(ParamId::Resonance)),
                self.config.sample_rate,
            ),
        };
        TickContext {
            wrapped,
            increment: self.clock.increment(),
            filter_mode,
            coeffs,
            fold_mode: FoldMode::from_param(self.params.get(ParamId::FoldMode)),
            drive: self.params.get(ParamId::Drive),
            level: self.params.get(ParamId::Level),
        }
    }

    /// Retune clock and filters for a new sample rate. Phase and state are kept.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.config = self.config.with_sample_rate(sample_rate);
        self.clock.set_sample_rate(self.config.sample_rate);
        for channel in self.channels.iter_mut() {
            channel.filter.set_sample_rate(self.config.sample_rate);
        }
    }

    /// Swap the curve used by `FoldMode::Table`.
    pub fn set_folder(&mut self, folder: InterpolationFolder) {
        self.folder = folder;
    }

    pub fn with_folder(mut self, folder: InterpolationFolder) -> Self {
        self.folder = folder;
        self
    }

    /// Config in effect, after clamping.
    pub fn config(&self) -> &VoiceConfig {
        &self.config
    }

    pub fn clock(&self) -> &PhaseClock {
        &self.clock
    }

    /// Raw noise generated on the last tick, before hold.
    ///
    /// # Panics
    /// If `channel >= CHANNELS`.
    pub fn last_noise(&self, channel: usize) -> i32 {
        self.channels[channel].last_noise
    }

    /// # Panics
    /// If `channel >= CHANNELS`.
    pub fn filter(&self, channel: usize) -> &Svf {
        &self.channels[channel].filter
    }

    /// Write the save slot. Returns the number of bytes written.
    pub fn save(&self, slot: &mut [u8]) -> Result<usize, StateError> {
        state::pack(&self.params, slot)
    }

    /// Restore from a save slot. An empty slot leaves everything as is.
    pub fn restore(&mut self, slot: &[u8]) -> Result<(), StateError> {
        if let Some(params) = state::unpack(slot)? {
            self.set_parameters(params);
        }
        Ok(())
    }
}

impl Default for Voice {
    fn default() -> Self {
        Self::new(VoiceConfig::default())
    }
}
