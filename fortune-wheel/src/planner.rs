//! Rotation planning: the cumulative angle that lands the wheel on a winner.
use serde::{Deserialize, Serialize};

use crate::constants::{FULL_TURN_DEGREES, SAFE_ZONE_MARGIN_RATIO};
use crate::error::SpinError;
use crate::numbers::{
    floor_f64_to_usize, normalize_degrees, segment_degrees, u32_to_f64, usize_to_f64,
};
use crate::random::RandomSource;

const LANDING_EDGE_RATIO: f64 = 1e-6;

/// Computed landing of one spin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationPlan {
    /// Cumulative rotation to animate to; negative is the spin direction.
    pub final_rotation: f64,
    /// Angle of the landing point measured from the start of segment 0.
    pub target_angle: f64,
    /// Start angle of the winning segment.
    pub base_angle: f64,
    /// Landing point inside the winning segment.
    pub offset: f64,
    /// Rounded angular width of every segment.
    pub segment_degrees: f64,
    pub full_rotations: u32,
}

/// Inset landing range of a segment, in degrees from the start of segment 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafeZone {
    pub start: f64,
    pub end: f64,
}

impl SafeZone {
    /// Whether `angle` lies strictly inside the zone.
    #[must_use]
    pub fn contains(&self, angle: f64) -> bool {
        angle > self.start && angle < self.end
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Safe landing range of segment `index` on a wheel of `segment_count` segments.
///
/// # Errors
///
/// Returns [`SpinError::EmptyCatalog`] or [`SpinError::IndexOutOfRange`].
pub fn safe_zone(index: usize, segment_count: usize) -> Result<SafeZone, SpinError> {
    let segment = checked_segment_degrees(index, segment_count)?;
    let margin = segment * SAFE_ZONE_MARGIN_RATIO;
    let base = usize_to_f64(index) * segment;
    Ok(SafeZone {
        start: base + margin,
        end: base + segment - margin,
    })
}

/// Plan the rotation that lands the wheel on `winning_index`.
///
/// Every spin starts from a zero baseline, so `_previous_rotation` does not
/// influence the result; consecutive spins always cover the same distance
/// range. The landing offset is drawn inside the middle 80% of the segment.
///
/// # Errors
///
/// Returns [`SpinError::EmptyCatalog`] when `segment_count` is zero and
/// [`SpinError::IndexOutOfRange`] when the index is not a segment.
pub fn plan_rotation<R: RandomSource + ?Sized>(
    winning_index: usize,
    segment_count: usize,
    full_rotations: u32,
    _previous_rotation: f64,
    rng: &mut R,
) -> Result<RotationPlan, SpinError> {
    let segment = checked_segment_degrees(winning_index, segment_count)?;
    let margin = segment * SAFE_ZONE_MARGIN_RATIO;
    let span = segment - margin * 2.0;
    // Keep extreme draws off the margins themselves.
    let edge = span * LANDING_EDGE_RATIO;
    let offset = (margin + rng.next_unit() * span).clamp(margin + edge, segment - margin - edge);
    let base_angle = usize_to_f64(winning_index) * segment;
    let target_angle = base_angle + offset;
    let final_rotation = -(FULL_TURN_DEGREES * u32_to_f64(full_rotations) + target_angle);

    log::debug!(
        "planned rotation {final_rotation:.4} for segment {winning_index}/{segment_count} (offset {offset:.4})"
    );

    Ok(RotationPlan {
        final_rotation,
        target_angle,
        base_angle,
        offset,
        segment_degrees: segment,
        full_rotations,
    })
}

/// Segment under the pointer once the wheel rests at `final_rotation`.
#[must_use]
pub fn landing_index(final_rotation: f64, segment_count: usize) -> Option<usize> {
    let segment = segment_degrees(segment_count);
    if segment <= 0.0 {
        return None;
    }
    let landed = normalize_degrees(-final_rotation);
    let idx = floor_f64_to_usize(landed / segment);
    Some(idx.min(segment_count - 1))
}

fn checked_segment_degrees(index: usize, segment_count: usize) -> Result<f64, SpinError> {
    if segment_count == 0 {
        return Err(SpinError::EmptyCatalog);
    }
    if index >= segment_count {
        return Err(SpinError::IndexOutOfRange {
            index,
            count: segment_count,
        });
    }
    Ok(segment_degrees(segment_count))
}
