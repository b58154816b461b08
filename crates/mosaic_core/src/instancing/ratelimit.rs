//! Distance-based update throttling.
//!
//! Far instances are individually less important, so they update on fewer
//! cycles. Each distance band gets a prime cadence: band cadences are
//! pairwise co-prime, so distant bands rarely all land on the same cycle and
//! the update cost is spread instead of spiking.

use std::fmt;

/// Decides, per instance and per cycle, whether an update runs.
///
/// [`tick`](Self::tick) is called exactly once per scheduling pass;
/// [`should_update`](Self::should_update) depends only on the current cycle
/// and the distance.
pub trait DistanceUpdateLimiter: Send + Sync + fmt::Debug {
    /// Advances to the next cycle.
    fn tick(&mut self);

    /// Returns true if an instance at `distance_squared` updates this cycle.
    fn should_update(&self, distance_squared: f64) -> bool;
}

/// Updates everything, every cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonLimiter;

impl DistanceUpdateLimiter for NonLimiter {
    fn tick(&mut self) {}

    #[inline]
    fn should_update(&self, _distance_squared: f64) -> bool {
        true
    }
}

/// Update divisor per band: 1, then the primes.
pub const DIVISOR_SEQUENCE: [u32; 12] = [1, 2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31];

/// Width of one band, in squared blocks.
pub const BAND_WIDTH_SQUARED: u32 = 2048;

/// Banded limiter with prime cadences.
///
/// An instance in band `b` updates on cycles where
/// `cycle % DIVISOR_SEQUENCE[b] == 0`. Band 0 updates every cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct BandedPrimeLimiter {
    cycle: u32,
}

impl BandedPrimeLimiter {
    /// Creates a limiter at cycle zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { cycle: 0 }
    }

    /// Current cycle count.
    #[must_use]
    pub const fn cycle(&self) -> u32 {
        self.cycle
    }

    /// Band index for a squared distance, clamped to the last band.
    #[must_use]
    pub fn band(distance_squared: f64) -> usize {
        // NaN and negatives land in band 0; `as` saturates huge values.
        let d_sq = distance_squared.max(0.0).ceil() as u64;
        let band = d_sq / u64::from(BAND_WIDTH_SQUARED);
        usize::try_from(band)
            .unwrap_or(usize::MAX)
            .min(DIVISOR_SEQUENCE.len() - 1)
    }

    /// Update divisor for a squared distance.
    #[must_use]
    pub fn update_divisor(distance_squared: f64) -> u32 {
        DIVISOR_SEQUENCE[Self::band(distance_squared)]
    }
}

impl DistanceUpdateLimiter for BandedPrimeLimiter {
    fn tick(&mut self) {
        self.cycle = self.cycle.wrapping_add(1);
    }

    #[inline]
    fn should_update(&self, distance_squared: f64) -> bool {
        self.cycle % Self::update_divisor(distance_squared) == 0
    }
}

/// Builds the limiter selected by configuration.
#[must_use]
pub fn limiter_for(limit_updates: bool) -> Box<dyn DistanceUpdateLimiter> {
    if limit_updates {
        Box::new(BandedPrimeLimiter::new())
    } else {
        Box::new(NonLimiter)
    }
}
