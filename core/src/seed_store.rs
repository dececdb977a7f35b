//! Seed households and persons, as read from the travel survey.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SynthError, SynthResult};
use crate::types::{PlanningDistrict, SeedHouseholdId};

/// Column counts the loader accepts; rows with a different count are
/// silently dropped rather than treated as a parse failure.
const HOUSEHOLD_COLUMNS: usize = 7;
const PERSON_COLUMNS: usize = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedHousehold {
    pub household_id: SeedHouseholdId,
    pub household_pd: PlanningDistrict,
    pub dwelling_type: i64,
    pub number_of_persons: i64,
    pub number_of_vehicles: i64,
    pub income: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedPerson {
    pub age: i64,
    pub sex: String,
    pub license: String,
    pub transit_pass: String,
    pub employment_status: String,
    pub occupation: String,
    pub free_parking: bool,
    pub student_status: String,
    pub employment_pd: i64,
    pub school_pd: i64,
    pub expansion_factor: f64,
}

impl SeedPerson {
    pub fn has_license(&self) -> bool {
        self.license == "Y"
    }
}

/// Households keyed by id, and their residual expansion-factor weight
/// (copied from `ExpansionFactor` at load time), plus persons keyed by the
/// same household id in file order.
pub struct SeedStore {
    households: BTreeMap<SeedHouseholdId, (SeedHousehold, f64)>,
    persons: BTreeMap<SeedHouseholdId, Vec<SeedPerson>>,
}

impl SeedStore {
    pub fn new(
        households: Vec<(SeedHousehold, f64)>,
        persons: BTreeMap<SeedHouseholdId, Vec<SeedPerson>>,
    ) -> Self {
        let households = households
            .into_iter()
            .map(|(h, factor)| (h.household_id, (h, factor)))
            .collect();
        Self { households, persons }
    }

    pub fn len(&self) -> usize {
        self.households.len()
    }

    pub fn is_empty(&self) -> bool {
        self.households.is_empty()
    }

    /// All households belonging to `pd`, sorted by `HouseholdID` ascending,
    /// paired with their seed expansion factor.
    pub fn pool_for_pd(&self, pd: PlanningDistrict) -> Vec<(SeedHousehold, f64)> {
        self.households
            .values()
            .filter(|(h, _)| h.household_pd == pd)
            .cloned()
            .collect()
    }

    pub fn household(&self, id: SeedHouseholdId) -> SynthResult<&SeedHousehold> {
        self.households
            .get(&id)
            .map(|(h, _)| h)
            .ok_or_else(|| SynthError::Other(anyhow::anyhow!("unknown seed household {id}")))
    }

    /// The household's seed `ExpansionFactor`, as loaded (before any
    /// residual-weight decrementing the sampler performed on its own copy).
    pub fn expansion_factor(&self, id: SeedHouseholdId) -> SynthResult<f64> {
        self.households
            .get(&id)
            .map(|(_, factor)| *factor)
            .ok_or_else(|| SynthError::Other(anyhow::anyhow!("unknown seed household {id}")))
    }

    /// Seed persons for `id`, in file order. Empty if `id` never appeared
    /// in the persons table, or if it's an orphan group whose household id
    /// is absent from the household table (such groups are never drawn, so
    /// this is equivalent to "no persons" for sampling purposes).
    pub fn persons(&self, id: SeedHouseholdId) -> &[SeedPerson] {
        self.persons.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Reads `SeedHouseholds.csv`. Rows whose raw field count isn't exactly 7
/// are dropped; a well-formed row whose fields fail to parse as their
/// declared type is a fatal schema error.
pub fn load_households(path: &Path) -> SynthResult<Vec<(SeedHousehold, f64)>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| SynthError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e),
        })?;

    let mut out = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != HOUSEHOLD_COLUMNS {
            continue;
        }
        let household = parse_household(&record, row_idx)?;
        let factor = household.1;
        out.push((household.0, factor));
    }
    Ok(out)
}

fn parse_household(record: &csv::StringRecord, row: usize) -> SynthResult<(SeedHousehold, f64)> {
    let field = |idx: usize, name: &'static str| -> SynthResult<&str> {
        record.get(idx).ok_or_else(|| SynthError::Schema {
            file: "SeedHouseholds.csv".into(),
            column: name,
            row,
            message: "missing field".into(),
        })
    };
    let parse_i64 = |idx: usize, name: &'static str| -> SynthResult<i64> {
        field(idx, name)?
            .trim()
            .parse::<i64>()
            .map_err(|e| SynthError::Schema {
                file: "SeedHouseholds.csv".into(),
                column: name,
                row,
                message: e.to_string(),
            })
    };
    let parse_f64 = |idx: usize, name: &'static str| -> SynthResult<f64> {
        field(idx, name)?
            .trim()
            .parse::<f64>()
            .map_err(|e| SynthError::Schema {
                file: "SeedHouseholds.csv".into(),
                column: name,
                row,
                message: e.to_string(),
            })
    };

    let household_id = parse_i64(0, "HouseholdID")?;
    let household_pd = parse_i64(1, "HouseholdPD")?;
    let expansion_factor = parse_f64(2, "ExpansionFactor")?;
    let dwelling_type = parse_i64(3, "DwellingType")?;
    let number_of_persons = parse_i64(4, "NumberOfPersons")?;
    let number_of_vehicles = parse_i64(5, "NumberOfVehicles")?;
    let income = parse_i64(6, "Income")?;

    Ok((
        SeedHousehold {
            household_id,
            household_pd,
            dwelling_type,
            number_of_persons,
            number_of_vehicles,
            income,
        },
        expansion_factor,
    ))
}

/// Reads `SeedPersons.csv`, grouping by household id in file order. Rows
/// with fewer than 13 columns are dropped.
pub fn load_persons(path: &Path) -> SynthResult<BTreeMap<SeedHouseholdId, Vec<SeedPerson>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| SynthError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e),
        })?;

    let mut out: BTreeMap<SeedHouseholdId, Vec<SeedPerson>> = BTreeMap::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() < PERSON_COLUMNS {
            continue;
        }
        let (household_id, person) = parse_person(&record, row_idx)?;
        out.entry(household_id).or_default().push(person);
    }
    Ok(out)
}

fn parse_person(record: &csv::StringRecord, row: usize) -> SynthResult<(SeedHouseholdId, SeedPerson)> {
    let field = |idx: usize, name: &'static str| -> SynthResult<&str> {
        record.get(idx).ok_or_else(|| SynthError::Schema {
            file: "SeedPersons.csv".into(),
            column: name,
            row,
            message: "missing field".into(),
        })
    };
    let parse_i64 = |idx: usize, name: &'static str| -> SynthResult<i64> {
        field(idx, name)?
            .trim()
            .parse::<i64>()
            .map_err(|e| SynthError::Schema {
                file: "SeedPersons.csv".into(),
                column: name,
                row,
                message: e.to_string(),
            })
    };
    let parse_f64 = |idx: usize, name: &'static str| -> SynthResult<f64> {
        field(idx, name)?
            .trim()
            .parse::<f64>()
            .map_err(|e| SynthError::Schema {
                file: "SeedPersons.csv".into(),
                column: name,
                row,
                message: e.to_string(),
            })
    };

    let household_id = parse_i64(0, "HouseholdID")?;
    let _person_number = parse_i64(1, "PersonNumber")?;
    let age = parse_i64(2, "Age")?;
    let sex = field(3, "Sex")?.trim().to_string();
    let license = field(4, "License")?.trim().to_string();
    let transit_pass = field(5, "TransitPass")?.trim().to_string();
    let employment_status = field(6, "EmploymentStatus")?.trim().to_string();
    let occupation = field(7, "Occupation")?.trim().to_string();
    let free_parking = field(8, "FreeParking")?.trim() == "Y";
    let student_status = field(9, "StudentStatus")?.trim().to_string();
    let employment_pd = parse_i64(10, "EmploymentPD")?;
    let school_pd = parse_i64(11, "SchoolPD")?;
    let expansion_factor = parse_f64(12, "ExpansionFactor")?;

    Ok((
        household_id,
        SeedPerson {
            age,
            sex,
            license,
            transit_pass,
            employment_status,
            occupation,
            free_parking,
            student_status,
            employment_pd,
            school_pd,
            expansion_factor,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn household(id: i64, pd: i64, n: i64) -> (SeedHousehold, f64) {
        (
            SeedHousehold {
                household_id: id,
                household_pd: pd,
                dwelling_type: 1,
                number_of_persons: n,
                number_of_vehicles: 1,
                income: 3,
            },
            1.0,
        )
    }

    #[test]
    fn household_table_size_and_keys() {
        let store = SeedStore::new(
            vec![household(1, 1, 2), household(2, 1, 3), household(3, 1, 1)],
            BTreeMap::new(),
        );
        assert_eq!(store.len(), 3);
        assert!(store.household(1).is_ok());
        assert!(store.household(2).is_ok());
        assert!(store.household(3).is_ok());
    }

    #[test]
    fn person_table_keys_and_total_length() {
        let mut persons = BTreeMap::new();
        persons.insert(1, vec![sample_person()]);
        persons.insert(2, vec![sample_person(), sample_person()]);
        persons.insert(3, vec![sample_person()]);
        let store = SeedStore::new(vec![household(1, 1, 1), household(2, 1, 2), household(3, 1, 1)], persons);

        let total: usize = [1, 2, 3].iter().map(|id| store.persons(*id).len()).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn orphan_person_group_is_retrievable_but_not_linked_to_a_household() {
        let mut persons = BTreeMap::new();
        persons.insert(999, vec![sample_person()]);
        let store = SeedStore::new(vec![household(1, 1, 1)], persons);
        assert!(store.household(999).is_err());
        assert_eq!(store.persons(999).len(), 1);
    }

    fn sample_person() -> SeedPerson {
        SeedPerson {
            age: 30,
            sex: "M".into(),
            license: "Y".into(),
            transit_pass: "N".into(),
            employment_status: "F".into(),
            occupation: "P".into(),
            free_parking: false,
            student_status: "O".into(),
            employment_pd: 1,
            school_pd: 0,
            expansion_factor: 1.0,
        }
    }
}
