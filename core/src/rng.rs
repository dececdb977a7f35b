//! Deterministic random number generation.
//!
//! RULE: nothing in the sampler may call any platform RNG. All randomness
//! flows through `ZoneRng` instances derived from the single master seed
//! carried in the run configuration.
//!
//! The derivation is two levels deep: `master seed -> per-PD seed -> per-zone
//! seed`. A zone's draws therefore depend only on its own child generator,
//! independent of the order zones happen to be visited in, and independent of
//! which thread runs which planning district.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

const PD_MIX: u64 = 0x9e37_79b9_7f4a_7c15;
const ZONE_MIX: u64 = 0xbf58_476d_1ce4_e5b9;

/// A zone-local deterministic RNG.
pub struct ZoneRng {
    inner: Pcg64Mcg,
}

impl ZoneRng {
    fn from_seed(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Draw `u ~ U(0, upper)`. `upper` must be positive.
    pub fn uniform(&mut self, upper: f64) -> f64 {
        self.inner.gen::<f64>() * upper
    }
}

/// Derives a child RNG for each planning district from a single master seed,
/// and in turn a child RNG for each zone from its planning district's seed.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// Derive the planning district's own seed. Stable across runs and
    /// independent of how many other PDs exist or what order they're
    /// processed in.
    pub fn pd_seed(&self, pd: i64) -> u64 {
        self.master_seed ^ (pd as u64).wrapping_mul(PD_MIX)
    }

    /// Derive one child RNG per zone in `zones`, in order. The draw from the
    /// PD-level generator to seed zone `i` happens in `zones` order, so
    /// changing the order of `zones` changes which seed each zone gets;
    /// callers must pass zones in a stable, documented order.
    pub fn zone_rngs(&self, pd: i64, zones: &[i64]) -> Vec<ZoneRng> {
        let mut pd_rng = Pcg64Mcg::seed_from_u64(self.pd_seed(pd));
        zones
            .iter()
            .map(|&zone| {
                let draw: u64 = pd_rng.gen();
                let zone_seed = draw ^ (zone as u64).wrapping_mul(ZONE_MIX);
                ZoneRng::from_seed(zone_seed)
            })
            .collect()
    }
}
