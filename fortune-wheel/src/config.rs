//! Inbound wheel configuration.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_ANIMATION_DURATION_MS, DEFAULT_WHEEL_BORDER_COLOR, DEFAULT_WHEEL_ROTATIONS,
    MAX_WHEEL_ROTATIONS,
};
use crate::numbers::{round_f64_to_u64, u64_to_f64};
use crate::prize::{CatalogError, Prize, PrizeCatalog, PrizeColor};
use crate::selector::WinnerPolicy;

/// Errors raised when wheel configuration invariants are violated.
#[derive(Debug, Error)]
pub enum WheelConfigError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("animationDurationInMs must be positive")]
    ZeroDuration,
    #[error("wheelRotationsCount must be at most {max} (got {value})")]
    RotationsOutOfRange { value: u32, max: u32 },
    #[error("wheel configuration JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-instance wheel inputs, named after the presentation layer's props.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelConfig {
    #[serde(default)]
    pub prizes: PrizeCatalog,
    #[serde(default = "WheelConfig::default_animation_duration_ms")]
    pub animation_duration_in_ms: u64,
    #[serde(default = "WheelConfig::default_wheel_rotations_count")]
    pub wheel_rotations_count: u32,
    #[serde(default)]
    pub use_probabilities_to_calculate_winner: bool,
    /// Empty means no fixed winner.
    #[serde(default)]
    pub default_winner_key: String,
    #[serde(default = "WheelConfig::default_wheel_border_color")]
    pub wheel_border_color: PrizeColor,
}

impl WheelConfig {
    const fn default_animation_duration_ms() -> u64 {
        DEFAULT_ANIMATION_DURATION_MS
    }

    const fn default_wheel_rotations_count() -> u32 {
        DEFAULT_WHEEL_ROTATIONS
    }

    fn default_wheel_border_color() -> PrizeColor {
        PrizeColor::from_trusted(DEFAULT_WHEEL_BORDER_COLOR)
    }

    /// Configuration with default timing and uniform selection.
    #[must_use]
    pub fn new(prizes: PrizeCatalog) -> Self {
        Self {
            prizes,
            ..Self::default()
        }
    }

    /// Validate raw prizes and wrap them in a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the prizes do not form a valid catalog.
    pub fn from_prizes(prizes: Vec<Prize>) -> Result<Self, WheelConfigError> {
        Ok(Self::new(PrizeCatalog::new(prizes)?))
    }

    /// Parse and validate configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, the catalog is invalid or
    /// a timing value is out of range.
    pub fn from_json(json: &str) -> Result<Self, WheelConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_animation_duration_ms(mut self, duration_ms: u64) -> Self {
        self.animation_duration_in_ms = duration_ms;
        self
    }

    #[must_use]
    pub fn with_rotations(mut self, rotations: u32) -> Self {
        self.wheel_rotations_count = rotations;
        self
    }

    #[must_use]
    pub fn with_probabilities(mut self, enabled: bool) -> Self {
        self.use_probabilities_to_calculate_winner = enabled;
        self
    }

    #[must_use]
    pub fn with_default_winner(mut self, key: impl Into<String>) -> Self {
        self.default_winner_key = key.into();
        self
    }

    #[must_use]
    pub fn with_border_color(mut self, color: PrizeColor) -> Self {
        self.wheel_border_color = color;
        self
    }

    /// Check timing invariants; the catalog validates itself on construction.
    ///
    /// # Errors
    ///
    /// Returns an error when the duration is zero or too many rotations are requested.
    pub fn validate(&self) -> Result<(), WheelConfigError> {
        if self.animation_duration_in_ms == 0 {
            return Err(WheelConfigError::ZeroDuration);
        }
        if self.wheel_rotations_count > MAX_WHEEL_ROTATIONS {
            return Err(WheelConfigError::RotationsOutOfRange {
                value: self.wheel_rotations_count,
                max: MAX_WHEEL_ROTATIONS,
            });
        }
        Ok(())
    }

    /// Selection policy implied by the current inputs.
    #[must_use]
    pub fn policy(&self) -> WinnerPolicy {
        WinnerPolicy::resolve(
            &self.default_winner_key,
            self.use_probabilities_to_calculate_winner,
        )
    }

    /// Animation length in whole seconds, as used by the CSS transition.
    #[must_use]
    pub fn transition_secs(&self) -> u64 {
        round_f64_to_u64(u64_to_f64(self.animation_duration_in_ms) / 1000.0)
    }
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            prizes: PrizeCatalog::empty(),
            animation_duration_in_ms: Self::default_animation_duration_ms(),
            wheel_rotations_count: Self::default_wheel_rotations_count(),
            use_probabilities_to_calculate_winner: false,
            default_winner_key: String::new(),
            wheel_border_color: Self::default_wheel_border_color(),
        }
    }
}
