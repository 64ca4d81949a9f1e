//! Prize catalog: the immutable list of wheel segments.
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::Hasher;
use thiserror::Error;
use twox_hash::XxHash64;

use crate::numbers::segment_degrees;

/// Errors raised when a prize catalog violates its invariants.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("prize key \"{key}\" appears more than once")]
    DuplicateKey { key: String },
    #[error("prize at position {index} has an empty key")]
    EmptyKey { index: usize },
    #[error("probability for \"{key}\" must be between 0 and 1 (got {value})")]
    ProbabilityOutOfRange { key: String, value: f64 },
    #[error("\"{value}\" is not a #hex, rgb() or hsl() colour")]
    InvalidColor { value: String },
    #[error("catalog JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Segment colour in one of the notations the presentation layer accepts:
/// `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)` or `hsl(h, s%, l%)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PrizeColor(String);

impl PrizeColor {
    /// Parse and validate a colour string.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidColor`] when the notation is not recognised
    /// or a channel is out of range.
    pub fn parse(value: &str) -> Result<Self, CatalogError> {
        let trimmed = value.trim();
        if is_hex_color(trimmed) || is_rgb_color(trimmed) || is_hsl_color(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(CatalogError::InvalidColor {
                value: value.to_string(),
            })
        }
    }

    /// Wrap a literal known to be a valid colour.
    pub(crate) fn from_trusted(value: &str) -> Self {
        Self(value.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrizeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PrizeColor {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PrizeColor> for String {
    fn from(value: PrizeColor) -> Self {
        value.0
    }
}

static HEX_COLOR: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").ok());

static RGB_COLOR: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^rgb\s*\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*\)$").ok()
});

static HSL_COLOR: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"^hsl\s*\(\s*(-?\d+(?:\.\d+)?)\s*,\s*(\d+(?:\.\d+)?)\s*%\s*,\s*(\d+(?:\.\d+)?)\s*%\s*\)$",
    )
    .ok()
});

fn is_hex_color(value: &str) -> bool {
    HEX_COLOR.as_ref().is_some_and(|re| re.is_match(value))
}

fn is_rgb_color(value: &str) -> bool {
    let Some(caps) = RGB_COLOR.as_ref().and_then(|re| re.captures(value)) else {
        return false;
    };
    (1..=3).all(|group| {
        caps.get(group)
            .is_some_and(|channel| channel.as_str().parse::<u8>().is_ok())
    })
}

fn is_hsl_color(value: &str) -> bool {
    let Some(caps) = HSL_COLOR.as_ref().and_then(|re| re.captures(value)) else {
        return false;
    };
    let hue_ok = caps
        .get(1)
        .and_then(|hue| hue.as_str().parse::<f64>().ok())
        .is_some_and(f64::is_finite);
    let percent_ok = |group: usize| {
        caps.get(group)
            .and_then(|number| number.as_str().parse::<f64>().ok())
            .is_some_and(|number| (0.0..=100.0).contains(&number))
    };
    hue_ok && percent_ok(2) && percent_ok(3)
}

/// How the prize label is laid out inside its segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayOrientation {
    Horizontal,
    #[default]
    Vertical,
}

/// One slice of the wheel and one possible spin outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prize {
    /// Unique identifier within the catalog.
    pub key: String,
    pub color: PrizeColor,
    /// Relative weight for probability-based selection, in `[0, 1]`.
    #[serde(default, alias = "weight", skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_orientation: Option<DisplayOrientation>,
    /// Opaque reference the presentation layer resolves to visual content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Prize {
    /// Build a prize with no probability, orientation or content.
    #[must_use]
    pub fn new(key: impl Into<String>, color: PrizeColor) -> Self {
        Self {
            key: key.into(),
            color,
            probability: None,
            display_orientation: None,
            content: None,
        }
    }

    #[must_use]
    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = Some(probability);
        self
    }

    #[must_use]
    pub fn with_orientation(mut self, orientation: DisplayOrientation) -> Self {
        self.display_orientation = Some(orientation);
        self
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Weight used by the weighted policy; absent or invalid weights never win.
    #[must_use]
    pub fn selection_weight(&self) -> f64 {
        self.probability
            .filter(|weight| weight.is_finite() && *weight > 0.0)
            .unwrap_or(0.0)
    }

    #[must_use]
    pub fn orientation(&self) -> DisplayOrientation {
        self.display_orientation.unwrap_or_default()
    }
}

/// Validated, read-only list of prizes in wheel order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Prize>", into = "Vec<Prize>")]
pub struct PrizeCatalog {
    prizes: Vec<Prize>,
}

impl PrizeCatalog {
    /// Validate a list of prizes.
    ///
    /// # Errors
    ///
    /// Returns an error when a key is empty or repeated, or a probability is
    /// outside `[0, 1]`.
    pub fn new(prizes: Vec<Prize>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(prizes.len());
        for (index, prize) in prizes.iter().enumerate() {
            if prize.key.trim().is_empty() {
                return Err(CatalogError::EmptyKey { index });
            }
            if !seen.insert(prize.key.as_str()) {
                return Err(CatalogError::DuplicateKey {
                    key: prize.key.clone(),
                });
            }
            if let Some(value) = prize.probability
                && !(value.is_finite() && (0.0..=1.0).contains(&value))
            {
                return Err(CatalogError::ProbabilityOutOfRange {
                    key: prize.key.clone(),
                    value,
                });
            }
        }
        Ok(Self { prizes })
    }

    /// Create an empty catalog (useful for tests)
    #[must_use]
    pub const fn empty() -> Self {
        Self { prizes: Vec::new() }
    }

    /// Load a catalog from a JSON array of prizes.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the prizes are invalid.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let prizes: Vec<Prize> = serde_json::from_str(json)?;
        Self::new(prizes)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.prizes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prizes.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Prize> {
        self.prizes.get(index)
    }

    /// Index of the prize with the given key.
    #[must_use]
    pub fn position(&self, key: &str) -> Option<usize> {
        self.prizes.iter().position(|prize| prize.key == key)
    }

    #[must_use]
    pub fn prizes(&self) -> &[Prize] {
        &self.prizes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Prize> {
        self.prizes.iter()
    }

    /// Sum of selection weights; the weighted policy normalizes against it.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.prizes.iter().map(Prize::selection_weight).sum()
    }

    /// Angular width of each segment, rounded to layout precision.
    #[must_use]
    pub fn segment_degrees(&self) -> f64 {
        segment_degrees(self.prizes.len())
    }

    /// Stable hash over keys and probabilities, used to label reports.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        for prize in &self.prizes {
            hasher.write(prize.key.as_bytes());
            hasher.write_u8(0);
            hasher.write_u64(prize.probability.map_or(u64::MAX, f64::to_bits));
        }
        hasher.finish()
    }
}

impl TryFrom<Vec<Prize>> for PrizeCatalog {
    type Error = CatalogError;

    fn try_from(value: Vec<Prize>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PrizeCatalog> for Vec<Prize> {
    fn from(value: PrizeCatalog) -> Self {
        value.prizes
    }
}

impl<'a> IntoIterator for &'a PrizeCatalog {
    type Item = &'a Prize;
    type IntoIter = std::slice::Iter<'a, Prize>;

    fn into_iter(self) -> Self::IntoIter {
        self.prizes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(value: &str) -> PrizeColor {
        PrizeColor::parse(value).unwrap()
    }

    #[test]
    fn colour_notations_validate() {
        for ok in [
            "#fff",
            "#ff2056",
            "#1abc9c80",
            "rgb(255, 0, 12)",
            "rgb(0,0,0)",
            "hsl(210, 50%, 40%)",
            "hsl(-30.5, 0%, 100%)",
        ] {
            assert!(PrizeColor::parse(ok).is_ok(), "{ok} should parse");
        }
        for bad in [
            "red",
            "#ggg",
            "#12345",
            "rgb(256, 0, 0)",
            "rgb(1, 2)",
            "hsl(10, 50, 40%)",
            "hsl(10, 150%, 40%)",
            "rgb(1, 2, 3, 4)",
            "#ff2056x",
            "hsl(a, 50%, 40%)",
        ] {
            assert!(
                matches!(
                    PrizeColor::parse(bad),
                    Err(CatalogError::InvalidColor { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn colour_parse_trims_and_checks_every_channel() {
        assert_eq!(color("  #FFFFFF ").as_str(), "#FFFFFF");
        assert_eq!(color("rgb( 1 , 2 , 3 )").as_str(), "rgb( 1 , 2 , 3 )");
        assert!(PrizeColor::parse("rgb(0, 0, 300)").is_err());
        assert!(PrizeColor::parse("hsl(0, 0%, 100.5%)").is_err());
        assert!(PrizeColor::parse("hsl(359.9, 100%, 0%)").is_ok());
    }

    #[test]
    fn catalog_rejects_duplicate_and_empty_keys() {
        let dup = PrizeCatalog::new(vec![
            Prize::new("a", color("#fff")),
            Prize::new("a", color("#000")),
        ]);
        assert!(matches!(dup, Err(CatalogError::DuplicateKey { key }) if key == "a"));

        let empty = PrizeCatalog::new(vec![Prize::new("  ", color("#fff"))]);
        assert!(matches!(empty, Err(CatalogError::EmptyKey { index: 0 })));
    }

    #[test]
    fn catalog_rejects_out_of_range_probability() {
        let result = PrizeCatalog::new(vec![
            Prize::new("a", color("#fff")).with_probability(1.5),
        ]);
        assert!(matches!(
            result,
            Err(CatalogError::ProbabilityOutOfRange { .. })
        ));
        let nan = PrizeCatalog::new(vec![
            Prize::new("a", color("#fff")).with_probability(f64::NAN),
        ]);
        assert!(nan.is_err());
    }

    #[test]
    fn json_accepts_weight_alias_and_orientation() {
        let json = r##"[
            {"key": "Prize 1", "color": "#e74c3c", "probability": 0.25, "displayOrientation": "horizontal"},
            {"key": "Prize 2", "color": "rgb(1, 2, 3)", "weight": 0.75, "content": "icons/gift"}
        ]"##;
        let catalog = PrizeCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.position("Prize 2"), Some(1));
        assert!((catalog.total_weight() - 1.0).abs() < 1e-12);
        let first = catalog.get(0).unwrap();
        assert_eq!(first.orientation(), DisplayOrientation::Horizontal);
        let second = catalog.get(1).unwrap();
        assert_eq!(second.orientation(), DisplayOrientation::Vertical);
        assert_eq!(second.content.as_deref(), Some("icons/gift"));
    }

    #[test]
    fn json_rejects_bad_colour() {
        let json = r#"[{"key": "x", "color": "blue"}]"#;
        assert!(matches!(
            PrizeCatalog::from_json(json),
            Err(CatalogError::Json(_))
        ));
    }

    #[test]
    fn missing_weight_never_counts() {
        let catalog = PrizeCatalog::new(vec![
            Prize::new("a", color("#fff")),
            Prize::new("b", color("#fff")).with_probability(0.0),
        ])
        .unwrap();
        assert!(catalog.total_weight().abs() < f64::EPSILON);
    }

    #[test]
    fn fingerprint_tracks_keys_and_weights() {
        let base = PrizeCatalog::new(vec![
            Prize::new("a", color("#fff")).with_probability(0.5),
            Prize::new("b", color("#000")),
        ])
        .unwrap();
        let same = base.clone();
        let reweighted = PrizeCatalog::new(vec![
            Prize::new("a", color("#fff")).with_probability(0.4),
            Prize::new("b", color("#000")),
        ])
        .unwrap();
        assert_eq!(base.fingerprint(), same.fingerprint());
        assert_ne!(base.fingerprint(), reweighted.fingerprint());
    }
}
