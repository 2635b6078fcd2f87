pub const COL_CYCLES: &'static str = "cycles";
pub const COL_FREQUENCY: &'static str = "allelicReplacementFrequency";
pub const COL_REPLACEMENTS: &'static str = "numberOfReplacements";
pub const COL_PREVALENCE: &'static str = "prevalence";
pub const COL_SCREENED: &'static str = "screenedColonies";

pub const HEADER: [&'static str; 5] = [COL_CYCLES, COL_FREQUENCY, COL_REPLACEMENTS, COL_PREVALENCE, COL_SCREENED];

/// Confidence of isolating at least one target clone
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

/// Number of targeted loci in the supplied table
pub const DEFAULT_LOCI: u32 = 3;

/// Tolerance for binomial normalization and categorical frequency matching
pub const NORM_TOL: f64 = 1.0e-9;
pub const LEVEL_TOL: f64 = 1.0e-9;

/// Placeholder for undefined screening requirements
pub const NA: &'static str = "NA";
