//! Per-planning-district weighted-without-replacement household sampler.

use crate::error::{SynthError, SynthResult};
use crate::rng::ZoneRng;
use crate::seed_store::SeedHousehold;
use crate::types::{PlanningDistrict, SeedHouseholdId, Zone};

const NUMBER_OF_ATTEMPTS: u32 = 3;
const WEIGHT_FLOOR: f64 = 0.01;

/// Draws households for every zone in one planning district until each
/// zone's remaining-persons counter reaches zero or below.
pub struct DistrictSampler {
    pd: PlanningDistrict,
    pool: Vec<SeedHousehold>,
    weights: Vec<f64>,
    base_weights: Vec<f64>,
    total: f64,
    zones: Vec<Zone>,
    remaining: Vec<i64>,
    zone_rngs: Vec<ZoneRng>,
}

impl DistrictSampler {
    /// `pool` must already be sorted by `HouseholdID` ascending. `zones` and
    /// `targets` must be the same length and in the land-use table's
    /// insertion order for this PD.
    pub fn new(
        pd: PlanningDistrict,
        pool: Vec<(SeedHousehold, f64)>,
        zones: Vec<Zone>,
        targets: Vec<f64>,
        zone_rngs: Vec<ZoneRng>,
    ) -> Self {
        let base_weights: Vec<f64> = pool.iter().map(|(_, f)| *f).collect();
        let weights = base_weights.clone();
        let total = weights.iter().sum();
        let remaining = targets.iter().map(|t| t.round() as i64).collect();
        let pool = pool.into_iter().map(|(h, _)| h).collect();
        Self {
            pd,
            pool,
            weights,
            base_weights,
            total,
            zones,
            remaining,
            zone_rngs,
        }
    }

    /// Run the draw loop to completion, yielding `(seedHouseholdId, zone)`
    /// pairs in the order they were drawn.
    pub fn run(mut self) -> SynthResult<Vec<(SeedHouseholdId, Zone)>> {
        let mut out = Vec::new();

        loop {
            let mut any_remaining = false;
            for i in 0..self.zones.len() {
                if self.remaining[i] <= 0 {
                    continue;
                }
                any_remaining = true;
                let drawn = self.draw_one(i)?;
                out.push((drawn, self.zones[i]));
            }
            if !any_remaining {
                break;
            }
        }

        Ok(out)
    }

    fn draw_one(&mut self, zone_idx: usize) -> SynthResult<SeedHouseholdId> {
        for attempt in 0..NUMBER_OF_ATTEMPTS {
            if let Some(k) = self.try_select(zone_idx) {
                let household_id = self.pool[k].household_id;
                self.apply_draw(zone_idx, k);
                return Ok(household_id);
            }
            if attempt + 1 < NUMBER_OF_ATTEMPTS {
                log::warn!(
                    "pd={} zone={}: draw attempt {} found no fit, resetting residual weights",
                    self.pd,
                    self.zones[zone_idx],
                    attempt + 1
                );
                self.reset_weights();
            }
        }
        Err(self.diagnose(zone_idx))
    }

    /// Walk `pool` accumulating weight until the cumulative sum first
    /// crosses `u`. Selection succeeds only if, at that crossing index, the
    /// weight is positive and the household still fits in the zone's
    /// remaining capacity.
    fn try_select(&mut self, zone_idx: usize) -> Option<usize> {
        let u = self.zone_rngs[zone_idx].uniform(self.total);
        let remaining = self.remaining[zone_idx];

        let mut acc = 0.0;
        for (k, w) in self.weights.iter().enumerate() {
            acc += w;
            if acc >= u {
                if *w > 0.0 && self.pool[k].number_of_persons <= remaining {
                    return Some(k);
                }
                return None;
            }
        }
        None
    }

    fn apply_draw(&mut self, zone_idx: usize, k: usize) {
        self.remaining[zone_idx] -= self.pool[k].number_of_persons;
        let prev = self.weights[k];
        let mut next = prev - 1.0;
        if next < WEIGHT_FLOOR {
            next = 0.0;
        }
        self.weights[k] = next;
        self.total -= prev - next;
    }

    fn reset_weights(&mut self) {
        self.weights = self.base_weights.clone();
        self.total = self.weights.iter().sum();
    }

    fn diagnose(&self, zone_idx: usize) -> SynthError {
        let zone = self.zones[zone_idx];
        let remaining = self.remaining[zone_idx];

        if self.pool.is_empty() {
            return SynthError::EmptyPool { pd: self.pd };
        }
        if !self.pool.iter().any(|h| h.number_of_persons <= remaining) {
            return SynthError::SizeInfeasible {
                pd: self.pd,
                zone,
                remaining,
            };
        }
        if self.total <= 0.0 {
            return SynthError::WeightsExhausted { pd: self.pd, zone };
        }
        SynthError::SamplerFailure { pd: self.pd, zone }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RngBank;

    fn household(id: i64, persons: i64) -> SeedHousehold {
        SeedHousehold {
            household_id: id,
            household_pd: 1,
            dwelling_type: 1,
            number_of_persons: persons,
            number_of_vehicles: 1,
            income: 3,
        }
    }

    #[test]
    fn minimal_draw_satisfies_population_target() {
        let pool = vec![(household(1, 2), 10.0), (household(2, 3), 1.0)];
        let bank = RngBank::new(42);
        let rngs = bank.zone_rngs(1, &[100]);

        let sampler = DistrictSampler::new(1, pool, vec![100], vec![5.0], rngs);
        let draws = sampler.run().unwrap();

        let total_persons: i64 = draws
            .iter()
            .map(|(id, _)| if *id == 1 { 2 } else { 3 })
            .sum();
        assert!(total_persons >= 5);
        assert!(draws.len() >= 2);
    }

    #[test]
    fn rerunning_with_same_seed_is_deterministic() {
        let pool = || vec![(household(1, 2), 10.0), (household(2, 3), 1.0)];
        let bank_a = RngBank::new(7);
        let bank_b = RngBank::new(7);

        let draws_a = DistrictSampler::new(1, pool(), vec![100], vec![5.0], bank_a.zone_rngs(1, &[100]))
            .run()
            .unwrap();
        let draws_b = DistrictSampler::new(1, pool(), vec![100], vec![5.0], bank_b.zone_rngs(1, &[100]))
            .run()
            .unwrap();

        assert_eq!(draws_a, draws_b);
    }

    #[test]
    fn zero_population_zone_never_draws() {
        let pool = vec![(household(1, 2), 10.0)];
        let bank = RngBank::new(1);
        let rngs = bank.zone_rngs(1, &[100]);
        let sampler = DistrictSampler::new(1, pool, vec![100], vec![0.0], rngs);
        assert!(sampler.run().unwrap().is_empty());
    }

    #[test]
    fn empty_pool_is_reported_as_empty_pool_error() {
        let bank = RngBank::new(1);
        let rngs = bank.zone_rngs(1, &[100]);
        let sampler = DistrictSampler::new(1, vec![], vec![100], vec![5.0], rngs);
        match sampler.run() {
            Err(SynthError::EmptyPool { pd }) => assert_eq!(pd, 1),
            other => panic!("expected EmptyPool, got {other:?}"),
        }
    }

    #[test]
    fn size_infeasible_when_no_household_fits_remaining() {
        let pool = vec![(household(1, 10), 5.0)];
        let bank = RngBank::new(1);
        let rngs = bank.zone_rngs(1, &[100]);
        let sampler = DistrictSampler::new(1, pool, vec![100], vec![3.0], rngs);
        match sampler.run() {
            Err(SynthError::SizeInfeasible { remaining, .. }) => assert_eq!(remaining, 3),
            other => panic!("expected SizeInfeasible, got {other:?}"),
        }
    }
}
