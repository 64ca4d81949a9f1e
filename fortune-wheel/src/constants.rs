//! Shared tuning constants for the wheel engine.

/// Degrees in one full turn of the wheel.
pub const FULL_TURN_DEGREES: f64 = 360.0;

/// Decimal places kept when computing a segment's angular width.
pub const SEGMENT_DEGREE_PRECISION: u32 = 4;

/// Fraction of a segment's width excluded on each side when picking a landing offset.
pub const SAFE_ZONE_MARGIN_RATIO: f64 = 0.10;

/// Default animation length of a spin.
pub const DEFAULT_ANIMATION_DURATION_MS: u64 = 5_000;

/// Default number of whole turns before the wheel settles.
pub const DEFAULT_WHEEL_ROTATIONS: u32 = 5;

/// Rim colour used when a wheel does not choose one.
pub const DEFAULT_WHEEL_BORDER_COLOR: &str = "#FFFFFF";

/// Delay used for the commit step that follows the instantaneous reset.
pub const COMMIT_DELAY_MS: u64 = 0;

/// Upper bound on whole turns accepted from configuration.
pub const MAX_WHEEL_ROTATIONS: u32 = 100;

/// Label rotation applied to prizes displayed horizontally.
pub const HORIZONTAL_LABEL_ROTATION: f64 = 270.0;

/// Distance of a horizontal label from the rim, as a fraction of the radius.
pub const HORIZONTAL_LABEL_INSET: f64 = 0.15;

/// Distance of a vertical label from the rim, as a fraction of the radius.
pub const VERTICAL_LABEL_INSET: f64 = 0.10;

/// Domain tag for the winner-selection RNG stream.
pub const SELECTION_STREAM_TAG: &[u8] = b"selection";

/// Domain tag for the landing-offset RNG stream.
pub const OFFSET_STREAM_TAG: &[u8] = b"offset";
