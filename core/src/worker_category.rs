//! Accumulates expansion-factor contributions into a per-zone matrix indexed
//! by occupation, employment class, and worker-mobility class, and emits the
//! zonal-residence and worker-category-ratio output tables.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::SynthResult;
use crate::types::Zone;

const OCCUPATIONS: [&str; 4] = ["P", "G", "S", "M"];
const EMPLOYMENTS: [&str; 2] = ["F", "P"];
const CELLS_PER_ZONE: usize = 24;

fn occupation_index(occupation: &str) -> Option<usize> {
    OCCUPATIONS.iter().position(|o| *o == occupation)
}

fn employment_index(status: &str) -> Option<usize> {
    EMPLOYMENTS.iter().position(|e| *e == status)
}

/// Worker mobility class: 0 if zero vehicles or zero licenses, 1 if
/// vehicles < licenses, 2 otherwise.
pub fn mobility_class(licenses: i64, vehicles: i64) -> usize {
    if vehicles == 0 || licenses == 0 {
        0
    } else if vehicles < licenses {
        1
    } else {
        2
    }
}

fn cell_index(occupation_idx: usize, employment_idx: usize, mobility: usize) -> usize {
    (occupation_idx + 4 * employment_idx) * 3 + mobility
}

/// A single person's occupation and employment status, as relevant to the
/// aggregation.
pub struct PersonWorkerFacts<'a> {
    pub occupation: &'a str,
    pub employment_status: &'a str,
}

pub struct WorkerCategoryAggregator {
    zones: BTreeMap<Zone, [f64; CELLS_PER_ZONE]>,
}

impl WorkerCategoryAggregator {
    pub fn new() -> Self {
        Self {
            zones: BTreeMap::new(),
        }
    }

    /// Record one sampled household's contribution. `household_expansion`
    /// is added to each valid person's cell; the mobility class is computed
    /// once per household from `licenses`/`vehicles`.
    pub fn record(
        &mut self,
        zone: Zone,
        household_expansion: f64,
        licenses: i64,
        vehicles: i64,
        persons: &[PersonWorkerFacts],
    ) {
        let mobility = mobility_class(licenses, vehicles);
        for person in persons {
            let Some(o) = occupation_index(person.occupation) else {
                continue;
            };
            let Some(e) = employment_index(person.employment_status) else {
                continue;
            };
            let cells = self.zones.entry(zone).or_insert([0.0; CELLS_PER_ZONE]);
            cells[cell_index(o, e, mobility)] += household_expansion;
        }
    }

    /// Write `ZonalResidence/<OE>.csv` for all eight occupation/employment
    /// pairs.
    pub fn write_zonal_residence(&self, output_dir: &Path) -> SynthResult<()> {
        let dir = output_dir.join("ZonalResidence");
        std::fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;

        for (o_idx, o) in OCCUPATIONS.iter().enumerate() {
            for (e_idx, e) in EMPLOYMENTS.iter().enumerate() {
                let path = dir.join(format!("{o}{e}.csv"));
                let mut writer = csv::Writer::from_path(&path).map_err(|e| io_error(&path, e.into()))?;
                writer.write_record(["HomeZone", "WorkerCategory", "Data"])?;
                for (zone, cells) in &self.zones {
                    let total: f64 = (0..3).map(|w| cells[cell_index(o_idx, e_idx, w)]).sum();
                    writer.write_record([zone.to_string(), total.to_string()])?;
                }
                writer.flush().map_err(|e| io_error(&path, e))?;
            }
        }
        Ok(())
    }

    /// Write `WorkerCategories/<OE>.csv` for all eight occupation/employment
    /// pairs.
    pub fn write_worker_categories(&self, output_dir: &Path) -> SynthResult<()> {
        let dir = output_dir.join("WorkerCategories");
        std::fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;

        for (o_idx, o) in OCCUPATIONS.iter().enumerate() {
            for (e_idx, e) in EMPLOYMENTS.iter().enumerate() {
                let path = dir.join(format!("{o}{e}.csv"));
                let mut writer = csv::Writer::from_path(&path).map_err(|e| io_error(&path, e.into()))?;
                writer.write_record(["HomeZone", "WorkerCategory", "Data"])?;
                for (zone, cells) in &self.zones {
                    let per_w: [f64; 3] = std::array::from_fn(|w| cells[cell_index(o_idx, e_idx, w)]);
                    let total: f64 = per_w.iter().sum();
                    if total == 0.0 {
                        continue;
                    }
                    for (w, value) in per_w.iter().enumerate() {
                        if *value > 0.0 {
                            writer.write_record([
                                zone.to_string(),
                                (w + 1).to_string(),
                                (*value / total).to_string(),
                            ])?;
                        }
                    }
                }
                writer.flush().map_err(|e| io_error(&path, e))?;
            }
        }
        Ok(())
    }
}

impl Default for WorkerCategoryAggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn io_error(path: &Path, source: std::io::Error) -> crate::error::SynthError {
    crate::error::SynthError::Io {
        path: path.to_path_buf(),
        source,
    }
}
