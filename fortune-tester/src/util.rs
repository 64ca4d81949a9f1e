use anyhow::{Context, Result};
use std::path::Path;

use fortune_wheel::{PrizeCatalog, WheelConfig};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

pub fn parse_seeds(s: &str) -> Result<Vec<u64>> {
    split_csv(s)
        .iter()
        .map(|token| {
            token
                .parse::<u64>()
                .with_context(|| format!("invalid seed: {token}"))
        })
        .collect()
}

/// Load a wheel from disk. Accepts a full wheel configuration object or a
/// bare array of prizes.
pub fn load_catalog(path: &Path) -> Result<WheelConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config = if raw.trim_start().starts_with('[') {
        WheelConfig::new(PrizeCatalog::from_json(&raw)?)
    } else {
        WheelConfig::from_json(&raw)?
    };
    log::info!(
        "loaded {} prizes from {}",
        config.prizes.len(),
        path.display()
    );
    Ok(config)
}
