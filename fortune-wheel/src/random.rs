//! Injectable random draws for winner selection and landing offsets.
use hmac::{Hmac, Mac};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use sha2::Sha256;

use crate::constants::{OFFSET_STREAM_TAG, SELECTION_STREAM_TAG};

/// Source of uniform draws in `[0, 1)`.
///
/// Every `rand` generator is a source; tests can also inject a closure with
/// [`DrawFn`] to pin exact values.
pub trait RandomSource {
    /// Next uniform value in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

impl<R: RngCore + ?Sized> RandomSource for R {
    fn next_unit(&mut self) -> f64 {
        self.r#gen::<f64>()
    }
}

/// Adapter turning a `FnMut() -> f64` into a [`RandomSource`].
///
/// Values are clamped into `[0, 1)` so a misbehaving closure cannot push a
/// draw outside the unit interval.
pub struct DrawFn<F>(pub F);

impl<F: FnMut() -> f64> RandomSource for DrawFn<F> {
    fn next_unit(&mut self) -> f64 {
        clamp_unit((self.0)())
    }
}

impl<F> std::fmt::Debug for DrawFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DrawFn")
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() || value < 0.0 {
        0.0
    } else if value >= 1.0 {
        1.0 - f64::EPSILON
    } else {
        value
    }
}

/// The two draw streams a spin consumes.
pub trait SpinDraws {
    /// Stream used to pick the winning prize.
    fn selection(&mut self) -> &mut dyn RandomSource;
    /// Stream used to pick the landing offset inside the winning segment.
    fn offset(&mut self) -> &mut dyn RandomSource;
}

impl<F: FnMut() -> f64> SpinDraws for DrawFn<F> {
    fn selection(&mut self) -> &mut dyn RandomSource {
        self
    }

    fn offset(&mut self) -> &mut dyn RandomSource {
        self
    }
}

/// Deterministic bundle of RNG streams segregated by spin domain.
#[derive(Debug, Clone)]
pub struct SpinRng {
    selection: CountingRng<SmallRng>,
    offset: CountingRng<SmallRng>,
}

impl SpinRng {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            selection: CountingRng::new(derive_stream_seed(seed, SELECTION_STREAM_TAG)),
            offset: CountingRng::new(derive_stream_seed(seed, OFFSET_STREAM_TAG)),
        }
    }

    /// Construct the bundle from operating-system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::from_user_seed(rand::random())
    }

    /// Access the selection stream.
    #[must_use]
    pub const fn selection_stream(&self) -> &CountingRng<SmallRng> {
        &self.selection
    }

    /// Access the offset stream.
    #[must_use]
    pub const fn offset_stream(&self) -> &CountingRng<SmallRng> {
        &self.offset
    }
}

impl SpinDraws for SpinRng {
    fn selection(&mut self) -> &mut dyn RandomSource {
        &mut self.selection
    }

    fn offset(&mut self) -> &mut dyn RandomSource {
        &mut self.offset
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()).expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streams_are_deterministic_per_seed() {
        let mut a = SpinRng::from_user_seed(42);
        let mut b = SpinRng::from_user_seed(42);
        let draws_a: Vec<f64> = (0..4).map(|_| a.selection().next_unit()).collect();
        let draws_b: Vec<f64> = (0..4).map(|_| b.selection().next_unit()).collect();
        assert_eq!(draws_a, draws_b);
        assert_eq!(a.selection_stream().draws(), 4);
        assert_eq!(a.offset_stream().draws(), 0);
    }

    #[test]
    fn streams_are_separated_by_domain() {
        let mut bundle = SpinRng::from_user_seed(7);
        let selection = bundle.selection().next_unit();
        let offset = bundle.offset().next_unit();
        assert!((selection - offset).abs() > f64::EPSILON);
    }

    #[test]
    fn unit_draws_stay_in_range() {
        let mut rng = SmallRng::seed_from_u64(0xFACE);
        for _ in 0..1_000 {
            let value = rng.next_unit();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn draw_fn_clamps_out_of_range_values() {
        let mut values = vec![1.5, -0.2, f64::NAN, 0.25].into_iter();
        let mut draw = DrawFn(move || values.next().unwrap_or(0.0));
        assert!(draw.next_unit() < 1.0);
        assert!(draw.next_unit().abs() < f64::EPSILON);
        assert!(draw.next_unit().abs() < f64::EPSILON);
        assert!((draw.next_unit() - 0.25).abs() < f64::EPSILON);
    }
}
