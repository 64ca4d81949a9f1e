//! Winner selection under the fixed, weighted and uniform policies.
use serde::{Deserialize, Serialize};

use crate::error::SpinError;
use crate::numbers::{floor_f64_to_usize, usize_to_f64};
use crate::prize::{Prize, PrizeCatalog};
use crate::random::RandomSource;

/// Rule used to pick the winning prize of a spin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "policy", content = "key")]
pub enum WinnerPolicy {
    /// Always land on the prize with this key.
    Fixed(String),
    /// Draw proportionally to prize probabilities.
    Weighted,
    /// Every prize equally likely.
    Uniform,
}

impl WinnerPolicy {
    /// Resolve the policy from wheel inputs: a non-empty fixed key wins over
    /// the probability flag, which wins over uniform selection.
    #[must_use]
    pub fn resolve(default_winner_key: &str, use_probabilities: bool) -> Self {
        if !default_winner_key.is_empty() {
            Self::Fixed(default_winner_key.to_string())
        } else if use_probabilities {
            Self::Weighted
        } else {
            Self::Uniform
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Fixed(_) => "fixed",
            Self::Weighted => "weighted",
            Self::Uniform => "uniform",
        }
    }
}

/// Winning segment of a spin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinOutcome {
    pub index: usize,
    pub prize: Prize,
}

/// Verify that `policy` can produce a winner for `catalog` without drawing.
///
/// # Errors
///
/// Returns the same error [`select`] would return for this catalog and policy.
pub fn check_eligible(catalog: &PrizeCatalog, policy: &WinnerPolicy) -> Result<(), SpinError> {
    if catalog.is_empty() {
        return Err(SpinError::EmptyCatalog);
    }
    match policy {
        WinnerPolicy::Fixed(key) => catalog
            .position(key)
            .map(|_| ())
            .ok_or_else(|| SpinError::NotFound { key: key.clone() }),
        WinnerPolicy::Weighted if catalog.total_weight() <= 0.0 => {
            Err(SpinError::NoEligibleSegment)
        }
        WinnerPolicy::Weighted | WinnerPolicy::Uniform => Ok(()),
    }
}

/// Pick the winning prize of a spin.
///
/// # Errors
///
/// Returns [`SpinError::EmptyCatalog`] for an empty catalog,
/// [`SpinError::NotFound`] when a fixed key matches nothing and
/// [`SpinError::NoEligibleSegment`] when weighted selection has no positive weight.
pub fn select<R: RandomSource + ?Sized>(
    catalog: &PrizeCatalog,
    policy: &WinnerPolicy,
    rng: &mut R,
) -> Result<SpinOutcome, SpinError> {
    let index = match policy {
        WinnerPolicy::Fixed(key) => select_fixed(catalog, key)?,
        WinnerPolicy::Weighted => select_weighted(catalog, rng)?,
        WinnerPolicy::Uniform => select_uniform(catalog, rng)?,
    };
    let prize = catalog
        .get(index)
        .cloned()
        .ok_or(SpinError::IndexOutOfRange {
            index,
            count: catalog.len(),
        })?;
    log::debug!(
        "selected prize {} ({}) with {} policy",
        index,
        prize.key,
        policy.label()
    );
    Ok(SpinOutcome { index, prize })
}

/// Index of the prize keyed `key`.
///
/// # Errors
///
/// Returns [`SpinError::EmptyCatalog`] or [`SpinError::NotFound`].
pub fn select_fixed(catalog: &PrizeCatalog, key: &str) -> Result<usize, SpinError> {
    if catalog.is_empty() {
        return Err(SpinError::EmptyCatalog);
    }
    catalog.position(key).ok_or_else(|| SpinError::NotFound {
        key: key.to_string(),
    })
}

/// Index drawn proportionally to prize probabilities.
///
/// Probabilities need not sum to one; the draw is taken against their total.
///
/// # Errors
///
/// Returns [`SpinError::EmptyCatalog`] or [`SpinError::NoEligibleSegment`].
pub fn select_weighted<R: RandomSource + ?Sized>(
    catalog: &PrizeCatalog,
    rng: &mut R,
) -> Result<usize, SpinError> {
    if catalog.is_empty() {
        return Err(SpinError::EmptyCatalog);
    }
    let total_weight = catalog.total_weight();
    if total_weight <= 0.0 {
        return Err(SpinError::NoEligibleSegment);
    }

    let roll = rng.next_unit() * total_weight;
    let mut cumulative = 0.0;
    let mut last_eligible = None;
    for (idx, prize) in catalog.iter().enumerate() {
        let weight = prize.selection_weight();
        if weight <= 0.0 {
            continue;
        }
        cumulative += weight;
        last_eligible = Some(idx);
        if cumulative > roll {
            return Ok(idx);
        }
    }

    // Rounding can leave the roll at the very top of the range.
    last_eligible.ok_or(SpinError::NoEligibleSegment)
}

/// Index drawn uniformly over the catalog.
///
/// # Errors
///
/// Returns [`SpinError::EmptyCatalog`].
pub fn select_uniform<R: RandomSource + ?Sized>(
    catalog: &PrizeCatalog,
    rng: &mut R,
) -> Result<usize, SpinError> {
    let count = catalog.len();
    if count == 0 {
        return Err(SpinError::EmptyCatalog);
    }
    let idx = floor_f64_to_usize(rng.next_unit() * usize_to_f64(count));
    Ok(idx.min(count - 1))
}
