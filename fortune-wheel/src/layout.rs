//! Render-facing geometry: what a presentation layer needs to draw the wheel.
use serde::{Deserialize, Serialize};

use crate::constants::{HORIZONTAL_LABEL_INSET, HORIZONTAL_LABEL_ROTATION, VERTICAL_LABEL_INSET};
use crate::numbers::usize_to_f64;
use crate::prize::{DisplayOrientation, PrizeCatalog, PrizeColor};

/// Rotation and transition to apply to the wheel element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelFrame {
    pub rotation_degrees: f64,
    /// False right after a trigger: the reset to `0` must not animate.
    pub animate: bool,
    pub transition_secs: u64,
    /// Colour of the wheel rim.
    pub border_color: PrizeColor,
}

impl WheelFrame {
    #[must_use]
    pub const fn new(
        rotation_degrees: f64,
        animate: bool,
        transition_secs: u64,
        border_color: PrizeColor,
    ) -> Self {
        Self {
            rotation_degrees,
            animate,
            transition_secs,
            border_color,
        }
    }

    /// CSS `transform` value, e.g. `rotate(-1926deg)`.
    #[must_use]
    pub fn transform_css(&self) -> String {
        format!("rotate({}deg)", self.rotation_degrees)
    }

    /// CSS `transition` value: `none` while suppressed, otherwise an ease-out
    /// over the whole animation.
    #[must_use]
    pub fn transition_css(&self) -> String {
        if self.animate {
            format!("transform {}s ease-out", self.transition_secs)
        } else {
            "none".to_string()
        }
    }
}

/// Label placement for a display orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelStyle {
    /// Extra rotation applied to the label text.
    pub rotation: f64,
    /// Distance from the rim as a fraction of the radius.
    pub inset: f64,
}

impl From<DisplayOrientation> for LabelStyle {
    fn from(orientation: DisplayOrientation) -> Self {
        match orientation {
            DisplayOrientation::Horizontal => Self {
                rotation: HORIZONTAL_LABEL_ROTATION,
                inset: HORIZONTAL_LABEL_INSET,
            },
            DisplayOrientation::Vertical => Self {
                rotation: 0.0,
                inset: VERTICAL_LABEL_INSET,
            },
        }
    }
}

/// One drawable wedge of the wheel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentArc {
    pub index: usize,
    pub key: String,
    pub color: PrizeColor,
    pub start: f64,
    pub end: f64,
    /// Rotation that points the label at the middle of the wedge.
    pub label_rotation: f64,
    pub label: LabelStyle,
    pub content: Option<String>,
}

impl SegmentArc {
    #[must_use]
    pub fn sweep(&self) -> f64 {
        self.end - self.start
    }
}

/// Lay the catalog out clockwise from angle `0`, one equal wedge per prize.
#[must_use]
pub fn segment_arcs(catalog: &PrizeCatalog) -> Vec<SegmentArc> {
    let segment = catalog.segment_degrees();
    catalog
        .iter()
        .enumerate()
        .map(|(index, prize)| {
            let start = usize_to_f64(index) * segment;
            SegmentArc {
                index,
                key: prize.key.clone(),
                color: prize.color.clone(),
                start,
                end: start + segment,
                label_rotation: start + segment / 2.0,
                label: LabelStyle::from(prize.orientation()),
                content: prize.content.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prize::Prize;

    #[test]
    fn css_follows_animation_flag() {
        let white = PrizeColor::parse("#FFFFFF").unwrap();
        let frame = WheelFrame::new(-1926.0, true, 5, white.clone());
        assert_eq!(frame.transform_css(), "rotate(-1926deg)");
        assert_eq!(frame.transition_css(), "transform 5s ease-out");
        let reset = WheelFrame::new(0.0, false, 5, white);
        assert_eq!(reset.transform_css(), "rotate(0deg)");
        assert_eq!(reset.transition_css(), "none");
        assert_eq!(reset.border_color.as_str(), "#FFFFFF");
    }

    #[test]
    fn arcs_cover_the_wheel_in_order() {
        let color = PrizeColor::parse("rgb(10, 20, 30)").unwrap();
        let catalog = PrizeCatalog::new(vec![
            Prize::new("a", color.clone()).with_orientation(DisplayOrientation::Horizontal),
            Prize::new("b", color.clone()),
            Prize::new("c", color).with_content("bonus"),
        ])
        .unwrap();
        let arcs = segment_arcs(&catalog);
        assert_eq!(arcs.len(), 3);
        assert!((arcs[0].label_rotation - 60.0).abs() < 1e-9);
        assert!((arcs[2].start - 240.0).abs() < 1e-9);
        assert!((arcs[2].end - 360.0).abs() < 1e-9);
        assert!((arcs[1].sweep() - 120.0).abs() < 1e-9);
        assert!((arcs[0].label.rotation - 270.0).abs() < f64::EPSILON);
        assert!((arcs[0].label.inset - 0.15).abs() < f64::EPSILON);
        assert!((arcs[1].label.inset - 0.10).abs() < f64::EPSILON);
        assert_eq!(arcs[2].content.as_deref(), Some("bonus"));
    }

    #[test]
    fn empty_catalog_has_no_arcs() {
        assert!(segment_arcs(&PrizeCatalog::empty()).is_empty());
    }
}
