//! Zone -> planning-district membership and zone -> forecast-population lookup.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{SynthError, SynthResult};
use crate::types::{PlanningDistrict, Zone};

/// Holds the zone system (zone -> PD) and the forecast population for each
/// zone. Built once at load time and treated as immutable afterward.
#[derive(Debug, Clone)]
pub struct LandUseTable {
    zone_pd: BTreeMap<Zone, PlanningDistrict>,
    population: BTreeMap<Zone, f64>,
    pd_zones: BTreeMap<PlanningDistrict, Vec<Zone>>,
}

impl LandUseTable {
    /// Build from parsed `(zone, pd)` and `(zone, population)` rows.
    ///
    /// `zone_pd_rows` preserves file order within each PD's zone list.
    /// Fails if the forecast references a zone absent from the zone system.
    pub fn build(
        zone_pd_rows: Vec<(Zone, PlanningDistrict)>,
        population_rows: Vec<(Zone, f64)>,
    ) -> SynthResult<Self> {
        let mut zone_pd = BTreeMap::new();
        let mut pd_zones: BTreeMap<PlanningDistrict, Vec<Zone>> = BTreeMap::new();

        for (zone, pd) in zone_pd_rows {
            zone_pd.insert(zone, pd);
            pd_zones.entry(pd).or_default().push(zone);
        }

        let mut population = BTreeMap::new();
        for (zone, pop) in population_rows {
            if !zone_pd.contains_key(&zone) {
                return Err(SynthError::UnknownZoneInForecast { zone });
            }
            population.insert(zone, pop);
        }

        Ok(Self {
            zone_pd,
            population,
            pd_zones,
        })
    }

    /// Planning districts, sorted ascending, each appearing once.
    pub fn planning_districts(&self) -> Vec<PlanningDistrict> {
        self.pd_zones.keys().copied().collect()
    }

    /// Zones belonging to `pd`, in the order they first appeared in the zone
    /// system file.
    pub fn zones_in_pd(&self, pd: PlanningDistrict) -> SynthResult<&[Zone]> {
        self.pd_zones
            .get(&pd)
            .map(Vec::as_slice)
            .ok_or(SynthError::UnknownPlanningDistrict { pd })
    }

    /// Forecast population for `zone`. 0 if the zone exists but carries no
    /// forecast row.
    pub fn population(&self, zone: Zone) -> SynthResult<f64> {
        if !self.zone_pd.contains_key(&zone) {
            return Err(SynthError::UnknownZone { zone });
        }
        Ok(self.population.get(&zone).copied().unwrap_or(0.0))
    }

    /// The planning district `zone` belongs to.
    pub fn pd_of(&self, zone: Zone) -> SynthResult<PlanningDistrict> {
        self.zone_pd
            .get(&zone)
            .copied()
            .ok_or(SynthError::UnknownZone { zone })
    }
}

fn io_error(path: &Path, source: csv::Error) -> SynthError {
    SynthError::Io {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::Other, source),
    }
}

/// Reads `ZoneSystem.csv`: columns `Zone, PD`.
pub fn load_zone_system(path: &Path) -> SynthResult<Vec<(Zone, PlanningDistrict)>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| io_error(path, e))?;

    let mut out = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let zone = parse_field(&record, 0, "Zone", "ZoneSystem.csv", row)?;
        let pd = parse_field(&record, 1, "PD", "ZoneSystem.csv", row)?;
        out.push((zone, pd));
    }
    Ok(out)
}

/// Reads a forecast file: columns `Zone, Population`.
pub fn load_population(path: &Path) -> SynthResult<Vec<(Zone, f64)>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| io_error(path, e))?;

    let mut out = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let zone = parse_field(&record, 0, "Zone", "Population.csv", row)?;
        let population = parse_field(&record, 1, "Population", "Population.csv", row)?;
        out.push((zone, population));
    }
    Ok(out)
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    idx: usize,
    column: &'static str,
    file: &str,
    row: usize,
) -> SynthResult<T> {
    record
        .get(idx)
        .ok_or_else(|| SynthError::Schema {
            file: file.to_string(),
            column,
            row,
            message: "missing field".into(),
        })?
        .trim()
        .parse::<T>()
        .map_err(|_| SynthError::Schema {
            file: file.to_string(),
            column,
            row,
            message: "failed to parse".into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LandUseTable {
        let zone_pd = vec![
            (1, 1),
            (2, 1),
            (3, 1),
            (41, 4),
            (42, 4),
            (51, 5),
            (52, 5),
            (61, 6),
        ];
        let population = vec![
            (1, 5.0),
            (2, 6.0),
            (3, 7.0),
            (41, 105.0),
            (42, 106.0),
            (51, 201.0),
            (52, 202.0),
            (61, 0.0),
        ];
        LandUseTable::build(zone_pd, population).unwrap()
    }

    #[test]
    fn planning_districts_sorted_ascending() {
        assert_eq!(sample().planning_districts(), vec![1, 4, 5, 6]);
    }

    #[test]
    fn zones_in_pd_counts() {
        assert_eq!(sample().zones_in_pd(1).unwrap().len(), 3);
    }

    #[test]
    fn population_lookup() {
        let table = sample();
        assert_eq!(table.population(52).unwrap(), 202.0);
        assert_eq!(table.population(61).unwrap(), 0.0);
    }

    #[test]
    fn population_of_unknown_zone_fails() {
        assert!(sample().population(-1).is_err());
    }

    #[test]
    fn forecast_referencing_unknown_zone_fails_construction() {
        let zone_pd = vec![(1, 1)];
        let population = vec![(1, 5.0), (99, 50.0)];
        assert!(LandUseTable::build(zone_pd, population).is_err());
    }

    #[test]
    fn zone_without_forecast_row_defaults_to_zero() {
        let zone_pd = vec![(1, 1), (2, 1)];
        let population = vec![(1, 5.0)];
        let table = LandUseTable::build(zone_pd, population).unwrap();
        assert_eq!(table.population(2).unwrap(), 0.0);
    }
}
