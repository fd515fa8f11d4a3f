//! Wavefolders
//!
//! Three stateless folding algorithms over integer samples:
//!
//! - [`reflect_fold`]: a single reflection at `±limit`
//! - [`modulo_fold`]: a full triangle fold for arbitrarily large input
//! - [`InterpolationFolder`]: piecewise-linear lookup into a fixed curve
//!
//! [`FoldMode::apply`] adds the drive gain in front and picks the algorithm.

use serde::{Deserialize, Serialize};

/// Number of points in a fold curve.
pub const FOLD_POINTS: usize = 33;

/// Input magnitude covered by the default fold curve.
pub const FOLD_RANGE: i32 = 16_384;

/// Threshold used by the reflect and modulo folders.
pub const FOLD_LIMIT: i32 = 2048;

/// Drive gain denominator: gain is `(DRIVE_UNITY + drive) / DRIVE_UNITY`.
pub const DRIVE_UNITY: i32 = 16;

/// `2047 · sin(5π/2 · t)` for `t` in `0..=1`.
///
/// Positive half only; the folder mirrors it for negative input. Slope at
/// the origin is close to one so quiet signals pass nearly untouched.
pub const SINE_FOLD: [i32; FOLD_POINTS] = [
    0, 497, 965, 1375, 1702, 1927, 2037, 2025, 1891, 1644, 1299, 875, 399, -100, -594, -1052,
    -1447, -1756, -1959, -2045, -2008, -1850, -1582, -1219, -783, -300, 201, 690, 1137, 1517,
    1805, 1986, 2047,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FoldMode {
    #[default]
    Off,
    Reflect,
    Modulo,
    Table,
}

impl FoldMode {
    /// Mode for a `FoldMode` parameter value. Values past the end clamp.
    pub const fn from_param(p: u8) -> Self {
        match p {
            0 => FoldMode::Off,
            1 => FoldMode::Reflect,
            2 => FoldMode::Modulo,
            _ => FoldMode::Table,
        }
    }

    pub const fn to_param(self) -> u8 {
        self as u8
    }

    /// Apply drive gain, then fold. `Off` returns the input unchanged.
    #[inline]
    pub fn apply(self, x: i32, drive: u8, table: &InterpolationFolder) -> i32 {
        if self == FoldMode::Off {
            return x;
        }
        let driven = saturate(x as i64 * (DRIVE_UNITY + drive as i32) as i64 / DRIVE_UNITY as i64);
        match self {
            FoldMode::Off => x,
            FoldMode::Reflect => reflect_fold(driven, FOLD_LIMIT),
            FoldMode::Modulo => modulo_fold(driven, FOLD_LIMIT),
            FoldMode::Table => table.fold(driven),
        }
    }
}

/// Reflect once about `±limit`: `2·limit - x` above, `-2·limit - x` below.
///
/// Not iterated, so input beyond `3·limit` lands outside the range.
#[inline]
pub fn reflect_fold(x: i32, limit: i32) -> i32 {
    let limit = limit.max(1) as i64;
    let x = x as i64;
    let y = if x > limit {
        2 * limit - x
    } else if x < -limit {
        -2 * limit - x
    } else {
        x
    };
    saturate(y)
}

/// Triangle fold for any input.
///
/// Inside `[-limit, limit)` the signal passes unchanged. Outside, the input
/// is shifted by `limit`, reduced modulo `2·limit`, and every other period
/// is inverted. Moving the input by `2·limit` therefore negates the output:
/// `modulo_fold(x + 2·limit·k) == modulo_fold(x)` only for even `k`, and odd
/// `k` gives `-modulo_fold(x)`. The full period is `4·limit`.
#[inline]
pub fn modulo_fold(x: i32, limit: i32) -> i32 {
    let limit = limit.max(1) as i64;
    let period = 2 * limit;
    let t = x as i64 + limit;
    let r = t.rem_euclid(period) - limit;
    if t.div_euclid(period) & 1 == 1 {
        (-r) as i32
    } else {
        r as i32
    }
}

/// Odd-symmetric piecewise-linear folder over a fixed curve.
///
/// The curve holds the positive half of the transfer function at evenly
/// spaced points `dx` apart. Negative input is folded through the mirror
/// image, so `fold(-x) == -fold(x)`. Only the bucket index is clamped: input
/// past the curve's range continues the slope of the last segment, saturated
/// to `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpolationFolder {
    table: [i32; FOLD_POINTS],
    dx: i32,
}

impl InterpolationFolder {
    /// `range` is rounded down to a whole number of buckets.
    pub const fn new(table: [i32; FOLD_POINTS], range: i32) -> Self {
        let dx = range / (FOLD_POINTS as i32 - 1);
        Self {
            table,
            dx: if dx < 1 { 1 } else { dx },
        }
    }

    /// Sample `amplitude · curve(t)` at `t = k / (FOLD_POINTS - 1)`.
    ///
    /// `curve(0)` should be zero or the transfer function jumps at the origin.
    pub fn from_fn(range: i32, amplitude: i32, curve: impl Fn(f64) -> f64) -> Self {
        let mut table = [0; FOLD_POINTS];
        for (k, point) in table.iter_mut().enumerate() {
            let t = k as f64 / (FOLD_POINTS - 1) as f64;
            *point = libm::round(amplitude as f64 * curve(t)) as i32;
        }
        Self::new(table, range)
    }

    /// A sine fold passing through `half_periods` half-waves over the range.
    pub fn sine(range: i32, amplitude: i32, half_periods: f64) -> Self {
        Self::from_fn(range, amplitude, |t| {
            libm::sin(core::f64::consts::FRAC_PI_2 * half_periods * t)
        })
    }

    /// Input distance between curve points.
    #[inline]
    pub fn dx(&self) -> i32 {
        self.dx
    }

    /// Input magnitude at the last curve point.
    #[inline]
    pub fn range(&self) -> i32 {
        self.dx * (FOLD_POINTS as i32 - 1)
    }

    pub fn table(&self) -> &[i32; FOLD_POINTS] {
        &self.table
    }

    /// Interpolated transfer function at `x`.
    #[inline]
    pub fn fold(&self, x: i32) -> i32 {
        let dx = self.dx as i64;
        let mag = (x as i64).abs();
        let i = ((mag / dx) as usize).min(FOLD_POINTS - 2);
        // Exceeds dx past the range
        let frac = mag - i as i64 * dx;

        let y = (self.table[i] as i64 * (dx - frac) + self.table[i + 1] as i64 * frac) / dx;
        saturate(if x < 0 { -y } else { y })
    }
}

impl Default for InterpolationFolder {
    fn default() -> Self {
        Self::new(SINE_FOLD, FOLD_RANGE)
    }
}

#[inline]
fn saturate(x: i64) -> i32 {
    x.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect_fold() {
        assert_eq!(reflect_fold(100, 1000), 100);
        assert_eq!(reflect_fold(1000, 1000), 1000);
        assert_eq!(reflect_fold(1200, 1000), 800);
        assert_eq!(reflect_fold(-1200, 1000), -800);
        // Single reflection only
        assert_eq!(reflect_fold(3500, 1000), -1500);
    }

    #[test]
    fn test_modulo_fold_identity_inside_limit() {
        for x in -1000..1000 {
            assert_eq!(modulo_fold(x, 1000), x);
        }
    }

    #[test]
    fn test_modulo_fold_reflects() {
        assert_eq!(modulo_fold(1200, 1000), 800);
        assert_eq!(modulo_fold(-1200, 1000), -800);
        assert_eq!(modulo_fold(3000, 1000), -1000);
        assert_eq!(modulo_fold(3500, 1000), -500);
    }

    #[test]
    fn test_modulo_fold_bounded_and_continuous() {
        let limit = 500;
        let mut prev = modulo_fold(-20_000, limit);
        for x in -19_999..20_000 {
            let y = modulo_fold(x, limit);
            assert!((-limit..=limit).contains(&y));
            assert!((y - prev).abs() <= 1, "jump at {}", x);
            prev = y;
        }
    }

    #[test]
    fn test_modulo_fold_periodicity() {
        let limit = 700;
        for x in (-3000..3000).step_by(37) {
            let base = modulo_fold(x, limit);
            for k in -5i32..=5 {
                let shifted = modulo_fold(x + 2 * limit * k, limit);
                // Each 2·limit shift lands on the alternate, inverted period
                let expected = if k.rem_euclid(2) == 0 { base } else { -base };
                assert_eq!(shifted, expected, "x={} k={}", x, k);
            }
        }
    }

    #[test]
    fn test_modulo_fold_extreme_input() {
        let y = modulo_fold(i32::MAX, FOLD_LIMIT);
        assert!(y.abs() <= FOLD_LIMIT);
        let y = modulo_fold(i32::MIN, FOLD_LIMIT);
        assert!(y.abs() <= FOLD_LIMIT);
    }

    #[test]
    fn test_table_fold_hits_points_exactly() {
        let folder = InterpolationFolder::default();
        assert_eq!(folder.dx(), 512);
        for (i, &point) in SINE_FOLD.iter().enumerate() {
            assert_eq!(folder.fold(i as i32 * folder.dx()), point);
        }
    }

    #[test]
    fn test_table_fold_odd_symmetry() {
        let folder = InterpolationFolder::default();
        for x in (-20_000..20_000).step_by(13) {
            assert_eq!(folder.fold(-x), -folder.fold(x), "x={}", x);
        }
        assert_eq!(folder.fold(-i32::MAX), -folder.fold(i32::MAX));
    }

    #[test]
    fn test_table_fold_interpolates_between_points() {
        let folder = InterpolationFolder::default();
        // Halfway between 0 and 497
        assert_eq!(folder.fold(256), 248);
        let y = folder.fold(3 * 512 + 100);
        assert!(y > SINE_FOLD[3] && y < SINE_FOLD[4]);
    }

    #[test]
    fn test_table_fold_extrapolates_past_range() {
        let folder = InterpolationFolder::default();
        assert_eq!(folder.fold(FOLD_RANGE), 2047);
        // Last segment rises 61 per 512
        assert_eq!(folder.fold(FOLD_RANGE + 512), 2108);
        assert_eq!(folder.fold(20_000), 2477);
        assert_eq!(folder.fold(FOLD_RANGE * 4), 7903);
        assert_eq!(folder.fold(-FOLD_RANGE * 4), -7903);

        let mut prev = folder.fold(FOLD_RANGE);
        for x in (FOLD_RANGE..FOLD_RANGE * 8).step_by(97) {
            let y = folder.fold(x);
            assert!(y >= prev, "x={}", x);
            prev = y;
        }
    }

    #[test]
    fn test_table_fold_saturates_extreme_input() {
        let mut table = [0; FOLD_POINTS];
        table[FOLD_POINTS - 1] = i32::MAX;
        let steep = InterpolationFolder::new(table, 32);
        assert_eq!(steep.dx(), 1);
        assert_eq!(steep.fold(i32::MAX), i32::MAX);
        assert_eq!(steep.fold(i32::MIN), i32::MIN);

        let folder = InterpolationFolder::default();
        assert!(folder.fold(i32::MAX) > SINE_FOLD[FOLD_POINTS - 1]);
        assert!(folder.fold(i32::MIN) < -SINE_FOLD[FOLD_POINTS - 1]);
    }

    #[test]
    fn test_table_fold_zero_at_origin() {
        let folder = InterpolationFolder::default();
        assert_eq!(folder.fold(0), 0);
        assert_eq!(FoldMode::Table.apply(0, 32, &folder), 0);
    }

    #[test]
    fn test_generated_sine_matches_builtin() {
        let generated = InterpolationFolder::sine(FOLD_RANGE, 2047, 5.0);
        assert_eq!(generated, InterpolationFolder::default());
    }

    #[test]
    fn test_from_fn_rounds_range_to_buckets() {
        let folder = InterpolationFolder::from_fn(1000, 100, |t| t);
        assert_eq!(folder.dx(), 31);
        assert_eq!(folder.range(), 992);
        assert_eq!(folder.fold(992), 100);

        let tiny = InterpolationFolder::from_fn(0, 100, |t| t);
        assert_eq!(tiny.dx(), 1);
    }

    #[test]
    fn test_fold_mode_drive_gain() {
        let folder = InterpolationFolder::default();
        assert_eq!(FoldMode::Off.apply(5000, 63, &folder), 5000);
        // Drive 16 doubles the input before folding
        assert_eq!(FoldMode::Reflect.apply(1500, 16, &folder), 1096);
        assert_eq!(FoldMode::Modulo.apply(1500, 0, &folder), 1500);
        assert_eq!(FoldMode::Table.apply(512, 0, &folder), 497);
    }

    #[test]
    fn test_fold_mode_from_param() {
        assert_eq!(FoldMode::from_param(0), FoldMode::Off);
        assert_eq!(FoldMode::from_param(3), FoldMode::Table);
        assert_eq!(FoldMode::from_param(99), FoldMode::Table);
        assert_eq!(FoldMode::Modulo.to_param(), 2);
    }
}
