//! Synthesis driver: wires the land-use table, seed store, and per-district
//! samplers together, assigns output ids, and writes the final CSVs.

use rayon::prelude::*;

use crate::config::SynthConfig;
use crate::error::{SynthError, SynthResult};
use crate::land_use::{self, LandUseTable};
use crate::rng::RngBank;
use crate::sampler::DistrictSampler;
use crate::seed_store::{self, SeedStore};
use crate::types::{PlanningDistrict, SeedHouseholdId, Zone};
use crate::worker_category::{PersonWorkerFacts, WorkerCategoryAggregator};

const HOUSEHOLDS_HEADER: [&str; 7] = [
    "HouseholdID",
    "Zone",
    "ExpansionFactor",
    "DwellingType",
    "NumberOfPersons",
    "NumberOfVehicles",
    "Income",
];

// Header preserves the original EmploymentZone/SchoolZone naming even
// though the values underneath are EmploymentPD/SchoolPD.
const PERSONS_HEADER: [&str; 13] = [
    "HouseholdID",
    "PersonNumber",
    "Age",
    "Sex",
    "License",
    "TransitPass",
    "EmploymentStatus",
    "Occupation",
    "FreeParking",
    "StudentStatus",
    "EmploymentZone",
    "SchoolZone",
    "ExpansionFactor",
];

/// Read inputs, run the samplers for every planning district, assign fresh
/// sequential ids, write `HouseholdData/*.csv`, and feed the worker-category
/// aggregator.
pub fn synthesize(config: &SynthConfig) -> SynthResult<()> {
    let zone_pd_rows = land_use::load_zone_system(&config.zone_system_path())?;
    let population_rows = land_use::load_population(&config.population_forecast_file)?;
    let land_use = LandUseTable::build(zone_pd_rows, population_rows)?;

    let households = seed_store::load_households(&config.seed_households_path())?;
    let persons = seed_store::load_persons(&config.seed_persons_path())?;
    let seed_store = SeedStore::new(households, persons);

    let rng_bank = RngBank::new(config.random_seed);
    let pds = land_use.planning_districts();

    log::info!("synthesize: {} planning districts to sample", pds.len());

    let per_pd_draws: Vec<Vec<(SeedHouseholdId, Zone)>> = pds
        .par_iter()
        .map(|&pd| run_district(&land_use, &seed_store, &rng_bank, pd))
        .collect::<SynthResult<Vec<_>>>()?;

    for (&pd, draws) in pds.iter().zip(per_pd_draws.iter()) {
        log::info!("pd={pd}: drew {} households", draws.len());
    }

    let draws: Vec<(SeedHouseholdId, Zone)> = per_pd_draws.into_iter().flatten().collect();
    log::info!("synthesize: {} households total", draws.len());

    let mut aggregator = WorkerCategoryAggregator::new();
    let households_dir = config.output_directory.join("HouseholdData");
    std::fs::create_dir_all(&households_dir).map_err(|e| io_error(&households_dir, e))?;

    let households_path = config.households_output_path();
    let mut households_writer =
        csv::Writer::from_path(&households_path).map_err(|e| io_error(&households_path, e.into()))?;
    households_writer.write_record(HOUSEHOLDS_HEADER)?;

    let persons_path = config.persons_output_path();
    let mut persons_writer =
        csv::Writer::from_path(&persons_path).map_err(|e| io_error(&persons_path, e.into()))?;
    persons_writer.write_record(PERSONS_HEADER)?;

    for (idx, (seed_id, zone)) in draws.into_iter().enumerate() {
        let household_id = (idx + 1) as i64;
        let seed_household = seed_store.household(seed_id)?;
        let seed_persons = seed_store.persons(seed_id);

        households_writer.write_record([
            household_id.to_string(),
            zone.to_string(),
            "1".to_string(),
            seed_household.dwelling_type.to_string(),
            seed_household.number_of_persons.to_string(),
            seed_household.number_of_vehicles.to_string(),
            seed_household.income.to_string(),
        ])?;

        let mean_factor = if seed_persons.is_empty() {
            1.0
        } else {
            seed_persons.iter().map(|p| p.expansion_factor).sum::<f64>() / seed_persons.len() as f64
        };

        for (person_number, person) in seed_persons.iter().enumerate() {
            persons_writer.write_record([
                household_id.to_string(),
                (person_number + 1).to_string(),
                person.age.to_string(),
                person.sex.clone(),
                person.license.clone(),
                person.transit_pass.clone(),
                person.employment_status.clone(),
                person.occupation.clone(),
                if person.free_parking { "Y" } else { "N" }.to_string(),
                person.student_status.clone(),
                person.employment_pd.to_string(),
                person.school_pd.to_string(),
                (person.expansion_factor / mean_factor).to_string(),
            ])?;
        }

        let licenses = seed_persons.iter().filter(|p| p.has_license()).count() as i64;
        let facts: Vec<PersonWorkerFacts> = seed_persons
            .iter()
            .map(|p| PersonWorkerFacts {
                occupation: &p.occupation,
                employment_status: &p.employment_status,
            })
            .collect();
        let household_expansion = seed_store.expansion_factor(seed_id)?;
        aggregator.record(
            zone,
            household_expansion,
            licenses,
            seed_household.number_of_vehicles,
            &facts,
        );
    }

    households_writer.flush().map_err(|e| io_error(&households_path, e))?;
    persons_writer.flush().map_err(|e| io_error(&persons_path, e))?;
    log::info!("synthesize: wrote {}", households_path.display());
    log::info!("synthesize: wrote {}", persons_path.display());

    let output_dir = config.output_directory.clone();
    let (zonal_result, category_result) = rayon::join(
        || aggregator.write_zonal_residence(&output_dir),
        || aggregator.write_worker_categories(&output_dir),
    );
    zonal_result?;
    category_result?;

    Ok(())
}

fn run_district(
    land_use: &LandUseTable,
    seed_store: &SeedStore,
    rng_bank: &RngBank,
    pd: PlanningDistrict,
) -> SynthResult<Vec<(SeedHouseholdId, Zone)>> {
    let pool = seed_store.pool_for_pd(pd);
    let zones = land_use.zones_in_pd(pd)?.to_vec();
    let targets = zones
        .iter()
        .map(|&zone| land_use.population(zone))
        .collect::<SynthResult<Vec<_>>>()?;
    let zone_rngs = rng_bank.zone_rngs(pd, &zones);

    DistrictSampler::new(pd, pool, zones, targets, zone_rngs).run()
}

/// Bypass sampling: read an already-synthesized `HouseholdData/*` directory
/// and run only the worker-category aggregator, using each household's
/// planning district (looked up from its output `Zone` via the zone system)
/// in place of a zone.
pub fn regenerate_worker_categories(config: &SynthConfig) -> SynthResult<()> {
    let zone_pd_rows = land_use::load_zone_system(&config.zone_system_path())?;
    let land_use = LandUseTable::build(zone_pd_rows, Vec::new())?;

    let households = read_output_households(&config.households_output_path())?;
    let persons = read_output_persons(&config.persons_output_path())?;
    log::info!(
        "regenerate_worker_categories: {} households, {} persons",
        households.len(),
        persons.len()
    );

    let mut aggregator = WorkerCategoryAggregator::new();
    for household in &households {
        let pd = land_use.pd_of(household.zone)?;
        let own_persons: Vec<&OutputPerson> = persons
            .iter()
            .filter(|p| p.household_id == household.household_id)
            .collect();

        let licenses = own_persons.iter().filter(|p| p.license == "Y").count() as i64;
        let facts: Vec<PersonWorkerFacts> = own_persons
            .iter()
            .map(|p| PersonWorkerFacts {
                occupation: &p.occupation,
                employment_status: &p.employment_status,
            })
            .collect();

        aggregator.record(pd, household.expansion_factor, licenses, household.number_of_vehicles, &facts);
    }

    let (zonal_result, category_result) = rayon::join(
        || aggregator.write_zonal_residence(&config.output_directory),
        || aggregator.write_worker_categories(&config.output_directory),
    );
    zonal_result?;
    category_result?;

    Ok(())
}

struct OutputHousehold {
    household_id: i64,
    zone: Zone,
    expansion_factor: f64,
    number_of_vehicles: i64,
}

struct OutputPerson {
    household_id: i64,
    license: String,
    employment_status: String,
    occupation: String,
}

fn read_output_households(path: &std::path::Path) -> SynthResult<Vec<OutputHousehold>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| io_error(path, e))?;

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record?;
        out.push(OutputHousehold {
            household_id: record.get(0).unwrap_or_default().parse().unwrap_or_default(),
            zone: record.get(1).unwrap_or_default().parse().unwrap_or_default(),
            expansion_factor: record.get(2).unwrap_or_default().parse().unwrap_or(1.0),
            number_of_vehicles: record.get(5).unwrap_or_default().parse().unwrap_or_default(),
        });
    }
    Ok(out)
}

fn read_output_persons(path: &std::path::Path) -> SynthResult<Vec<OutputPerson>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| io_error(path, e))?;

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record?;
        out.push(OutputPerson {
            household_id: record.get(0).unwrap_or_default().parse().unwrap_or_default(),
            license: record.get(4).unwrap_or_default().to_string(),
            employment_status: record.get(6).unwrap_or_default().to_string(),
            occupation: record.get(7).unwrap_or_default().to_string(),
        });
    }
    Ok(out)
}

fn io_error(path: &std::path::Path, source: csv::Error) -> SynthError {
    SynthError::Io {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::Other, source),
    }
}
