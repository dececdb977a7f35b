//! Shared primitive types used across the synthesizer.

/// A Traffic Analysis Zone identifier.
pub type Zone = i64;

/// A Planning District identifier. Groups a set of zones.
pub type PlanningDistrict = i64;

/// A seed household's `HouseholdID`, as it appears in `SeedHouseholds.csv`.
pub type SeedHouseholdId = i64;
