//! Reference wheels shipped with the crate.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{WheelConfig, WheelConfigError};

const CASH_PRIZES_DATA: &str = include_str!("../data/cash_prizes.json");
const WEIGHTED_PRIZES_DATA: &str = include_str!("../data/weighted_prizes.json");

/// Named reference wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// Ten alternating cash prizes, uniform selection.
    CashPrizes,
    /// Six prizes with one heavy favourite, weighted selection.
    WeightedPrizes,
}

impl Preset {
    pub const ALL: [Self; 2] = [Self::CashPrizes, Self::WeightedPrizes];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CashPrizes => "cash-prizes",
            Self::WeightedPrizes => "weighted-prizes",
        }
    }

    const fn data(self) -> &'static str {
        match self {
            Self::CashPrizes => CASH_PRIZES_DATA,
            Self::WeightedPrizes => WEIGHTED_PRIZES_DATA,
        }
    }

    /// Parse the embedded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error only if the embedded data is corrupt.
    pub fn load(self) -> Result<WheelConfig, WheelConfigError> {
        WheelConfig::from_json(self.data())
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown preset: {s}"))
    }
}
