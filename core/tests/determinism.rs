//! THE MOST IMPORTANT TEST IN THE PROJECT.
//!
//! Two runs, same seed, same inputs. They must produce byte-identical
//! output files. Any divergence is a blocker — do not merge until fixed.

use popsynth_core::config::SynthConfig;
use popsynth_core::driver::synthesize;
use std::fs;
use tempfile::tempdir;

fn write_inputs(dir: &std::path::Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join("ZoneSystem.csv"),
        "Zone,PD\n1,1\n2,1\n41,4\n",
    )
    .unwrap();
    fs::write(
        dir.join("SeedHouseholds.csv"),
        "HouseholdID,HouseholdPD,ExpansionFactor,DwellingType,NumberOfPersons,NumberOfVehicles,Income\n\
         1,1,12,1,2,1,3\n\
         2,1,4,1,3,2,2\n\
         3,1,2,2,1,0,1\n\
         4,4,6,1,4,2,3\n",
    )
    .unwrap();
    fs::write(
        dir.join("SeedPersons.csv"),
        "HouseholdID,PersonNumber,Age,Sex,License,TransitPass,EmploymentStatus,Occupation,FreeParking,StudentStatus,EmploymentPD,SchoolPD,ExpansionFactor\n\
         1,1,40,M,Y,N,F,P,N,O,1,0,12\n\
         1,2,38,F,Y,N,F,G,N,O,1,0,12\n\
         2,1,45,M,Y,N,F,S,Y,O,1,0,4\n\
         2,2,44,F,N,N,H,O,N,O,0,0,4\n\
         2,3,16,M,N,N,O,O,N,F,0,1,4\n\
         3,1,29,F,Y,N,F,M,N,O,1,0,2\n\
         4,1,50,M,Y,N,F,P,N,O,4,0,6\n\
         4,2,48,F,Y,N,F,P,Y,O,4,0,6\n\
         4,3,20,M,N,N,O,O,N,F,0,4,6\n\
         4,4,18,F,N,N,O,O,N,F,0,4,6\n",
    )
    .unwrap();
}

fn run(seed: u64, root: &std::path::Path, label: &str) -> SynthConfig {
    let input = root.join("in");
    write_inputs(&input);
    fs::write(root.join("Population.csv"), "Zone,Population\n1,8\n2,10\n41,30\n").unwrap();

    let config = SynthConfig {
        population_forecast_file: root.join("Population.csv"),
        input_directory: input,
        output_directory: root.join(label),
        random_seed: seed,
    };
    synthesize(&config).expect("synthesize");
    config
}

#[test]
fn same_seed_produces_identical_output_files() {
    const SEED: u64 = 0xDEAD_BEEF;

    let dir_a = tempdir().unwrap();
    let config_a = run(SEED, dir_a.path(), "out");
    let dir_b = tempdir().unwrap();
    let config_b = run(SEED, dir_b.path(), "out");

    let households_a = fs::read_to_string(config_a.households_output_path()).unwrap();
    let households_b = fs::read_to_string(config_b.households_output_path()).unwrap();
    assert_eq!(households_a, households_b);

    let persons_a = fs::read_to_string(config_a.persons_output_path()).unwrap();
    let persons_b = fs::read_to_string(config_b.persons_output_path()).unwrap();
    assert_eq!(persons_a, persons_b);
}

#[test]
fn different_seeds_produce_different_draws() {
    let dir_a = tempdir().unwrap();
    let config_a = run(1, dir_a.path(), "out");
    let dir_b = tempdir().unwrap();
    let config_b = run(2, dir_b.path(), "out");

    let households_a = fs::read_to_string(config_a.households_output_path()).unwrap();
    let households_b = fs::read_to_string(config_b.households_output_path()).unwrap();

    assert_ne!(
        households_a, households_b,
        "different seeds produced identical output — seed is not being used"
    );
}
