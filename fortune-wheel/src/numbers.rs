//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

use crate::constants::{FULL_TURN_DEGREES, SEGMENT_DEGREE_PRECISION};

/// Convert a count or index to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Convert u64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

/// Convert u32 to f64 (always exact).
#[must_use]
pub fn u32_to_f64(value: u32) -> f64 {
    f64::from(value)
}

/// Floor a non-negative f64 into a usize, returning 0 for NaN or negative values.
#[must_use]
pub fn floor_f64_to_usize(value: f64) -> usize {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    cast::<f64, usize>(value.floor()).unwrap_or(usize::MAX)
}

/// Round a f64 and clamp it to the u64 range, returning 0 for NaN or negative values.
#[must_use]
pub fn round_f64_to_u64(value: f64) -> u64 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    cast::<f64, u64>(value.round()).unwrap_or(u64::MAX)
}

/// Round to a fixed number of decimal places.
#[must_use]
pub fn round_to_places(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let scale = 10_f64.powi(i32::try_from(places).unwrap_or(0));
    (value * scale).round() / scale
}

/// Angular width of one segment, rounded to the engine's layout precision.
///
/// A wheel with no segments has no width; callers treat `0.0` as "no target".
#[must_use]
pub fn segment_degrees(segment_count: usize) -> f64 {
    if segment_count == 0 {
        return 0.0;
    }
    round_to_places(
        FULL_TURN_DEGREES / usize_to_f64(segment_count),
        SEGMENT_DEGREE_PRECISION,
    )
}

/// Reduce an angle of either sign into `[0, 360)`.
#[must_use]
pub fn normalize_degrees(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let reduced = angle.rem_euclid(FULL_TURN_DEGREES);
    if reduced >= FULL_TURN_DEGREES {
        0.0
    } else {
        reduced
    }
}
