use std::path::PathBuf;
use thiserror::Error;

use crate::types::{PlanningDistrict, Zone};

#[derive(Error, Debug)]
pub enum SynthError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}: column '{column}' in row {row} failed to parse: {message}")]
    Schema {
        file: String,
        column: &'static str,
        row: usize,
        message: String,
    },

    #[error("forecast file references zone {zone}, which is absent from the zone system")]
    UnknownZoneInForecast { zone: Zone },

    #[error("unknown planning district {pd}")]
    UnknownPlanningDistrict { pd: PlanningDistrict },

    #[error("unknown zone {zone}")]
    UnknownZone { zone: Zone },

    #[error("planning district {pd}: no seed households are assigned to this district")]
    EmptyPool { pd: PlanningDistrict },

    #[error(
        "planning district {pd}, zone {zone}: no seed household has NumberOfPersons <= {remaining} remaining"
    )]
    SizeInfeasible {
        pd: PlanningDistrict,
        zone: Zone,
        remaining: i64,
    },

    #[error("planning district {pd}, zone {zone}: residual expansion-factor weights are exhausted")]
    WeightsExhausted { pd: PlanningDistrict, zone: Zone },

    #[error("planning district {pd}, zone {zone}: sampler failed to converge after repeated resets")]
    SamplerFailure { pd: PlanningDistrict, zone: Zone },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SynthResult<T> = Result<T, SynthError>;
