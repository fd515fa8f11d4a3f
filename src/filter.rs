//! State Variable Filter (SVF)
//!
//! A fixed-point two-integrator loop with simultaneous lowpass, bandpass,
//! highpass and notch taps. Coefficients are Q16, integrator states carry
//! [`STATE_SHIFT`] extra fractional bits on top of the signal.
//!
//! `feed` must be called exactly once per tick: `lp` and `bp` accumulate.
//!
//! There is no stability clamp on the `f * q` product. At the extreme
//! corner of the parameter range the loop can ring hard or run away.
//! Arithmetic is widened and the stored states saturate at the `i32` rails
//! so a runaway pins instead of overflowing.

use crate::mapper::RESONANCE_MAX;
use serde::{Deserialize, Serialize};

/// Q16 unity.
pub const COEFF_ONE: i32 = 1 << 16;

/// Upper bound on the cutoff coefficient (0.99).
pub const F_MAX: i32 = 64_880;

/// Damping at full resonance (0.1).
pub const Q_MIN: i32 = 6_554;

/// 2π in Q16.
const TWO_PI_Q16: u64 = 411_775;

/// Extra fractional bits held in the integrators.
pub const STATE_SHIFT: u32 = 8;

/// Which tap a channel reads. `Off` bypasses the filter entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterMode {
    Off,
    #[default]
    LowPass,
    BandPass,
    HighPass,
    Notch,
}

impl FilterMode {
    /// Mode for a `FilterMode` parameter value. Values past the end clamp.
    pub const fn from_param(p: u8) -> Self {
        match p {
            0 => FilterMode::Off,
            1 => FilterMode::LowPass,
            2 => FilterMode::BandPass,
            3 => FilterMode::HighPass,
            _ => FilterMode::Notch,
        }
    }

    pub const fn to_param(self) -> u8 {
        self as u8
    }
}

/// Q16 cutoff and damping coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Coefficients {
    pub f: i32,
    pub q: i32,
}

impl Coefficients {
    /// Raw Q16 coefficients, used as given.
    pub const fn new(f: i32, q: i32) -> Self {
        Self { f, q }
    }

    /// Map a cutoff in centihertz and a resonance in device units.
    ///
    /// `f` grows linearly with the cutoff (`2π·fc/fs`) up to [`F_MAX`];
    /// `q` falls from 1.0 at zero resonance to [`Q_MIN`] at full scale.
    pub fn from_params(frequency: u32, resonance: u32, sample_rate: u32) -> Self {
        let denom = sample_rate.max(1) as u64 * 100;
        let f = (frequency as u64 * TWO_PI_Q16 / denom).min(F_MAX as u64) as i32;

        let resonance = resonance.min(RESONANCE_MAX) as i64;
        let span = (COEFF_ONE - Q_MIN) as i64;
        let q = COEFF_ONE - (resonance * span / RESONANCE_MAX as i64) as i32;

        Self { f, q }
    }
}

/// Per-channel filter state: the two integrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Svf {
    lp: i32,
    bp: i32,
    hp: i32,
    input: i32,
    sample_rate: u32,
}

impl Svf {
    /// A filter at rest, computing coefficients for `sample_rate` hertz.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            ..Self::default()
        }
    }

    /// Affects coefficients computed by [`feed`](Self::feed) from now on. State is kept.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate.max(1);
    }

    /// Run one tick from a cutoff (centihertz) and resonance (device units).
    #[inline]
    pub fn feed(&mut self, input: i32, frequency: u32, resonance: u32) {
        let coeffs = Coefficients::from_params(frequency, resonance, self.sample_rate);
        self.feed_coefficients(input, coeffs);
    }

    /// Run one tick with precomputed coefficients.
    #[inline]
    pub fn feed_coefficients(&mut self, input: i32, coeffs: Coefficients) {
        let x = (input as i64) << STATE_SHIFT;
        let f = coeffs.f as i64;
        let q = coeffs.q as i64;

        let delta = x - self.lp as i64 - ((q * self.bp as i64) >> 16);
        self.bp = saturate(self.bp as i64 + ((f * delta) >> 16));
        self.lp = saturate(self.lp as i64 + ((f * self.bp as i64) >> 16));
        self.hp = saturate(x - self.lp as i64 - ((q * self.bp as i64) >> 16));
        self.input = input;
    }

    /// Lowpass tap, at input scale.
    #[inline]
    pub fn lp(&self) -> i32 {
        self.lp >> STATE_SHIFT
    }

    #[inline]
    pub fn bp(&self) -> i32 {
        self.bp >> STATE_SHIFT
    }

    #[inline]
    pub fn hp(&self) -> i32 {
        self.hp >> STATE_SHIFT
    }

    /// Notch is `hp + lp`, derived rather than stored.
    #[inline]
    pub fn notch(&self) -> i32 {
        saturate(self.hp as i64 + self.lp as i64) >> STATE_SHIFT
    }

    /// Read the tap for `mode`. `Off` returns the last input unfiltered.
    #[inline]
    pub fn tap(&self, mode: FilterMode) -> i32 {
        match mode {
            FilterMode::Off => self.input,
            FilterMode::LowPass => self.lp(),
            FilterMode::BandPass => self.bp(),
            FilterMode::HighPass => self.hp(),
            FilterMode::Notch => self.notch(),
        }
    }

    /// Clear both integrators and the derived taps.
    pub fn reset(&mut self) {
        self.lp = 0;
        self.bp = 0;
        self.hp = 0;
        self.input = 0;
    }
}

#[inline]
fn saturate(x: i64) -> i32 {
    x.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Rng;

    #[test]
    fn test_mode_from_param() {
        assert_eq!(FilterMode::from_param(0), FilterMode::Off);
        assert_eq!(FilterMode::from_param(4), FilterMode::Notch);
        assert_eq!(FilterMode::from_param(17), FilterMode::Notch);
        assert_eq!(FilterMode::HighPass.to_param(), 3);
    }

    #[test]
    fn test_coefficients_mapping() {
        // 1 kHz at 48 kHz: 2π/48 = 0.1309
        let c = Coefficients::from_params(100_000, 0, 48_000);
        assert_eq!(c.f, 8_578);
        assert_eq!(c.q, COEFF_ONE);

        let c = Coefficients::from_params(100_000, RESONANCE_MAX, 48_000);
        assert_eq!(c.q, Q_MIN);

        // Resonance beyond full scale saturates
        let c = Coefficients::from_params(100_000, 5 * RESONANCE_MAX, 48_000);
        assert_eq!(c.q, Q_MIN);
    }

    #[test]
    fn test_cutoff_coefficient_bounded() {
        let c = Coefficients::from_params(2_000_000, 0, 48_000);
        assert_eq!(c.f, F_MAX);
        let c = Coefficients::from_params(u32::MAX, 0, 1);
        assert_eq!(c.f, F_MAX);
    }

    #[test]
    fn test_zero_coefficients_inject_no_energy() {
        let mut svf = Svf::new(48_000);
        let mut rng = Rng::from_seed(1);
        for _ in 0..1_000 {
            let x = rng.next_below(4096) as i32 - 2048;
            svf.feed_coefficients(x, Coefficients::new(0, 0));
            assert_eq!(svf.lp(), 0);
            assert_eq!(svf.bp(), 0);
        }
    }

    #[test]
    fn test_lowpass_settles_to_dc() {
        let mut svf = Svf::new(48_000);
        for _ in 0..5_000 {
            svf.feed(1000, 100_000, 0);
        }
        assert!((svf.lp() - 1000).abs() <= 2, "lp = {}", svf.lp());
        assert!(svf.bp().abs() <= 2, "bp = {}", svf.bp());
        assert!(svf.hp().abs() <= 2, "hp = {}", svf.hp());
        assert!((svf.notch() - 1000).abs() <= 4);
    }

    #[test]
    fn test_highpass_rejects_dc_passes_step() {
        let mut svf = Svf::new(48_000);
        svf.feed(1000, 100_000, 0);
        // The first sample of a step goes straight through the highpass
        assert!(svf.hp() > 800);
        for _ in 0..5_000 {
            svf.feed(1000, 100_000, 0);
        }
        assert!(svf.tap(FilterMode::HighPass).abs() <= 2);
    }

    #[test]
    fn test_lowpass_attenuates_nyquist() {
        let mut svf = Svf::new(48_000);
        let mut peak = 0;
        for n in 0..4_000 {
            let x = if n % 2 == 0 { 2000 } else { -2000 };
            svf.feed(x, 20_000, 0); // 200 Hz
            if n > 2_000 {
                peak = peak.max(svf.lp().abs());
            }
        }
        assert!(peak < 100, "peak = {}", peak);
    }

    #[test]
    fn test_resonance_rings_longer() {
        let ring = |resonance: u32| {
            let mut svf = Svf::new(48_000);
            svf.feed(2000, 200_000, resonance);
            let mut energy = 0i64;
            for _ in 0..2_000 {
                svf.feed(0, 200_000, resonance);
                energy += (svf.bp() as i64).abs();
            }
            energy
        };
        assert!(ring(RESONANCE_MAX) > ring(0) * 3);
    }

    #[test]
    fn test_extreme_settings_do_not_panic() {
        // No stability guard: top cutoff with full resonance is allowed to
        // run away, but stored state must stay inside the i32 rails.
        let mut svf = Svf::new(8_000);
        let mut rng = Rng::from_seed(2);
        for _ in 0..100_000 {
            let x = rng.next_below(4096) as i32 - 2048;
            svf.feed(x, 1_254_385, RESONANCE_MAX);
        }
        let _ = svf.notch();
    }

    #[test]
    fn test_tap_off_returns_input() {
        let mut svf = Svf::new(48_000);
        svf.feed(-777, 100_000, 0);
        assert_eq!(svf.tap(FilterMode::Off), -777);
    }

    #[test]
    fn test_reset_clears_integrators() {
        let mut svf = Svf::new(48_000);
        for _ in 0..100 {
            svf.feed(1500, 300_000, 500);
        }
        svf.reset();
        assert_eq!(svf.lp(), 0);
        assert_eq!(svf.bp(), 0);
        assert_eq!(svf.tap(FilterMode::Notch), 0);
    }
}
