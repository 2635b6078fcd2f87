use std::error;
use std::fmt;
use std::result;
use std::str::FromStr;

use stats;

/// Which population fraction backs the screening requirement for k replacements.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Criterion {
    /// Clones with exactly k replacements
    Exact,
    /// Clones with k or more replacements
    AtLeast,
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let c = match *self {
            Criterion::Exact => "exact",
            Criterion::AtLeast => "at-least",
        };

        write!(f, "{}", c)
    }
}

impl FromStr for Criterion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Criterion> {
        match s {
            "exact" => Ok(Criterion::Exact),
            "at-least" | "atleast" | "at_least" => Ok(Criterion::AtLeast),
            _ => Err(Error::UnknownCriterion(s.to_owned())),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Error {
    InvalidLoci,
    InvalidFrequency(f64),
    InvalidConfidence(f64),
    ReplacementsOutOfRange { replacements: u32, loci: u32 },
    UndefinedScreening(f64),
    ScreeningOverflow(f64),
    UnknownCriterion(String),
}

pub type Result<T> = result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::InvalidLoci => write!(f, "number of targeted loci must be positive"),
            Error::InvalidFrequency(r) => write!(f, "replacement frequency {} is not in [0, 1]", r),
            Error::InvalidConfidence(c) => write!(f, "confidence {} is not in (0, 1)", c),
            Error::ReplacementsOutOfRange { replacements, loci } =>
                write!(f, "{} replacements exceed {} targeted loci", replacements, loci),
            Error::UndefinedScreening(x) =>
                write!(f, "screening is undefined for target fraction {}", x),
            Error::ScreeningOverflow(x) =>
                write!(f, "colonies to screen for target fraction {} exceed {}", x, u64::MAX),
            Error::UnknownCriterion(ref s) =>
                write!(f, "unknown criterion '{}' (expected 'exact' or 'at-least')", s),
        }
    }
}

impl error::Error for Error {}

/// Binomial model of genotype prevalence after repeated MAGE cycles.
///
/// Each cycle replaces each targeted locus independently with probability `frequency`;
/// a replaced locus stays replaced.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Model {
    /// Number of targeted loci (n)
    pub loci: u32,
    /// Per-cycle, per-locus allelic replacement frequency (R)
    pub frequency: f64,
}

impl Model {
    pub fn new(loci: u32, frequency: f64) -> Result<Model> {
        if loci == 0 {
            return Err(Error::InvalidLoci);
        }
        if !(frequency >= 0.0 && frequency <= 1.0) {
            return Err(Error::InvalidFrequency(frequency));
        }

        Ok(Model { loci: loci, frequency: frequency })
    }

    /// Probability that a single locus is replaced after N cycles: 1 - (1 - R)^N.
    pub fn single_locus_prevalence(&self, cycles: u32) -> f64 {
        if cycles == 0 {
            return 0.0;
        }

        // (1 - R)^N = exp(N ln(1 - R)); expm1 keeps precision for small R
        let p1 = -((cycles as f64) * (-self.frequency).ln_1p()).exp_m1();

        p1.max(0.0).min(1.0)
    }

    /// Expected fraction of clones with exactly k replacements after N cycles.
    pub fn prevalence(&self, cycles: u32, k: u32) -> Result<f64> {
        self.check_replacements(k)?;
        let p1 = self.single_locus_prevalence(cycles);

        Ok(stats::ln_binomial_pmf(self.loci as u64, k as u64, p1).exp())
    }

    /// Expected fraction of clones with k or more replacements after N cycles.
    pub fn cumulative_prevalence(&self, cycles: u32, k: u32) -> Result<f64> {
        self.check_replacements(k)?;
        let p1 = self.single_locus_prevalence(cycles);

        let n = self.loci as u64;
        let lps: Vec<f64> = ((k as u64) .. n + 1)
            .map(|j| stats::ln_binomial_pmf(n, j, p1))
            .collect();

        Ok(stats::log_sum_exp(&lps).exp().min(1.0))
    }

    /// Prevalence of every genotype class, indexed by number of replacements 0..=n.
    pub fn distribution(&self, cycles: u32) -> Vec<f64> {
        let p1 = self.single_locus_prevalence(cycles);
        let n = self.loci as u64;

        (0 .. n + 1)
            .map(|k| stats::ln_binomial_pmf(n, k, p1).exp())
            .collect()
    }

    /// Target fraction under the given criterion.
    pub fn fraction(&self, cycles: u32, k: u32, criterion: Criterion) -> Result<f64> {
        match criterion {
            Criterion::Exact => self.prevalence(cycles, k),
            Criterion::AtLeast => self.cumulative_prevalence(cycles, k),
        }
    }

    /// Colonies to screen for finding a clone with k replacements.
    pub fn screen(&self, cycles: u32, k: u32, criterion: Criterion, confidence: f64) -> Result<u64> {
        let f = self.fraction(cycles, k, criterion)?;
        colonies_to_screen(f, confidence)
    }

    fn check_replacements(&self, k: u32) -> Result<()> {
        if k > self.loci {
            Err(Error::ReplacementsOutOfRange { replacements: k, loci: self.loci })
        } else {
            Ok(())
        }
    }
}

/// Minimum number of colonies s such that a target genotype at population fraction f
/// is found at least once with the given confidence: s = ceil(ln(1 - c) / ln(1 - f)).
///
/// f must lie in the open interval (0, 1), and s must fit in a u64.
pub fn colonies_to_screen(f: f64, confidence: f64) -> Result<u64> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(Error::InvalidConfidence(confidence));
    }
    if !(f > 0.0 && f < 1.0) {
        return Err(Error::UndefinedScreening(f));
    }

    let s = ((-confidence).ln_1p() / (-f).ln_1p()).ceil();
    if !(s < u64::MAX as f64) {
        return Err(Error::ScreeningOverflow(f));
    }

    Ok(s.max(1.0) as u64)
}
