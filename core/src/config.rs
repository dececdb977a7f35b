//! Run configuration: input/output locations and the master random seed.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Everything a synthesis run needs to know. Loaded from a JSON file on the
/// CLI side; `core` only cares about the resolved paths and seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthConfig {
    pub population_forecast_file: PathBuf,
    pub input_directory: PathBuf,
    pub output_directory: PathBuf,
    pub random_seed: u64,
}

impl SynthConfig {
    /// Load from a JSON configuration file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {}: {e}", path.display()))?;
        Ok(config)
    }

    pub fn zone_system_path(&self) -> PathBuf {
        self.input_directory.join("ZoneSystem.csv")
    }

    pub fn seed_households_path(&self) -> PathBuf {
        self.input_directory.join("SeedHouseholds.csv")
    }

    pub fn seed_persons_path(&self) -> PathBuf {
        self.input_directory.join("SeedPersons.csv")
    }

    pub fn households_output_path(&self) -> PathBuf {
        self.output_directory.join("HouseholdData").join("Households.csv")
    }

    pub fn persons_output_path(&self) -> PathBuf {
        self.output_directory.join("HouseholdData").join("Persons.csv")
    }
}
