use std::fmt;
use std::slice;

use linked_hash_map::LinkedHashMap;

use constants::*;
use model::{self, Criterion, Model};

/// One row of the prediction table.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    /// Number of MAGE cycles (N)
    pub cycles: u32,
    /// Allelic replacement frequency per locus and cycle (R)
    pub frequency: f64,
    /// Frequency level as written in the table
    pub label: String,
    /// Number of allelic replacements per clone (k)
    pub replacements: u32,
    /// Expected fraction of the population with exactly k replacements
    pub prevalence: f64,
    /// Colonies to screen; None where the screening need is undefined
    pub screened_colonies: Option<f64>,
}

impl Row {
    #[inline]
    fn matches_frequency(&self, frequency: f64) -> bool {
        (self.frequency - frequency).abs() < LEVEL_TOL
    }
}

/// Rows sharing one cycle level and one frequency level,
/// the latter as an index into `Table::frequency_levels`.
pub type GroupKey = (u32, usize);

/// Index of the level nearest to frequency.
fn level_index(levels: &[f64], frequency: f64) -> usize {
    let mut best = 0;
    for (i, &x) in levels.iter().enumerate() {
        if (x - frequency).abs() < (levels[best] - frequency).abs() {
            best = i;
        }
    }
    best
}

/// Normalization failure of one (cycles, frequency) group.
#[derive(Clone, Debug, PartialEq)]
pub struct Violation {
    pub cycles: u32,
    pub frequency: f64,
    /// Sum of prevalence over all replacement counts in the group
    pub total: f64,
}

/// Read-only table of precomputed predictions.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Table {
        Table { rows: rows }
    }

    /// Compute the table for every combination of cycles and frequencies,
    /// ordered by cycles, then frequency, then number of replacements.
    pub fn generate(loci: u32, cycles: &[u32], frequencies: &[f64], criterion: Criterion, confidence: f64) -> model::Result<Table> {
        // fail early on bad confidence, even if every fraction turns out degenerate
        model::colonies_to_screen(0.5, confidence)?;

        let mut rows = Vec::with_capacity(cycles.len() * frequencies.len() * (loci as usize + 1));
        for &n in cycles.iter() {
            for &r in frequencies.iter() {
                let m = Model::new(loci, r)?;
                let label = r.to_string();
                for (k, &p) in m.distribution(n).iter().enumerate() {
                    let k = k as u32;
                    let s = match m.screen(n, k, criterion, confidence) {
                        Ok(s) => Some(s as f64),
                        Err(model::Error::UndefinedScreening(_)) => None,
                        Err(model::Error::ScreeningOverflow(f)) => {
                            debug!("N={} R={} k={}: fraction {} is too small to screen for", n, r, k, f);
                            None
                        },
                        Err(e) => return Err(e),
                    };
                    rows.push(Row {
                        cycles: n,
                        frequency: r,
                        label: label.clone(),
                        replacements: k,
                        prevalence: p,
                        screened_colonies: s,
                    });
                }
            }
        }

        Ok(Table::new(rows))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<Row> {
        self.rows.iter()
    }

    /// Largest number of replacements present, i.e. the number of targeted loci.
    pub fn loci(&self) -> Option<u32> {
        self.rows.iter().map(|r| r.replacements).max()
    }

    /// Select rows on the two categorical columns.
    /// A level absent from the table yields an empty table.
    pub fn filter(&self, cycles: Option<u32>, frequency: Option<f64>) -> Table {
        let rows = self.rows.iter()
            .filter(|r| cycles.map_or(true, |n| r.cycles == n))
            .filter(|r| frequency.map_or(true, |f| r.matches_frequency(f)))
            .cloned()
            .collect();
        Table::new(rows)
    }

    /// Select rows with exactly k replacements.
    pub fn with_replacements(&self, k: u32) -> Table {
        Table::new(self.rows.iter().filter(|r| r.replacements == k).cloned().collect())
    }

    /// Distinct cycle levels in ascending order.
    pub fn cycle_levels(&self) -> Vec<u32> {
        let mut xs: Vec<u32> = self.rows.iter().map(|r| r.cycles).collect();
        xs.sort();
        xs.dedup();
        xs
    }

    /// Distinct frequency levels in ascending order.
    pub fn frequency_levels(&self) -> Vec<f64> {
        let mut xs: Vec<f64> = self.rows.iter().map(|r| r.frequency).collect();
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(::std::cmp::Ordering::Equal));
        xs.dedup_by(|a, b| (*a - *b).abs() < LEVEL_TOL);
        xs
    }

    /// Rows grouped by (cycles, frequency) in order of first appearance.
    pub fn groups(&self) -> LinkedHashMap<GroupKey, Vec<&Row>> {
        let levels = self.frequency_levels();
        let mut groups: LinkedHashMap<GroupKey, Vec<&Row>> = LinkedHashMap::new();
        for row in self.rows.iter() {
            let key = (row.cycles, level_index(&levels, row.frequency));
            groups.entry(key).or_insert_with(Vec::new).push(row);
        }
        groups
    }

    /// Report groups whose prevalences do not sum to one within tol.
    pub fn check_normalization(&self, tol: f64) -> Vec<Violation> {
        self.groups().iter()
            .filter_map(|(_, rows)| {
                let total: f64 = rows.iter().map(|r| r.prevalence).sum();
                if (total - 1.0).abs() > tol {
                    Some(Violation { cycles: rows[0].cycles, frequency: rows[0].frequency, total: total })
                } else {
                    None
                }
            })
            .collect()
    }

    /// Prevalence of k replacements laid out with cycles as rows and frequencies as columns.
    pub fn pivot(&self, k: u32) -> Pivot {
        let subset = self.with_replacements(k);
        let cycles = subset.cycle_levels();
        let frequencies = subset.frequency_levels();

        let mut labels = Vec::with_capacity(frequencies.len());
        for &f in frequencies.iter() {
            let label = subset.rows.iter()
                .find(|r| r.matches_frequency(f))
                .map(|r| r.label.clone())
                .unwrap_or_else(|| f.to_string());
            labels.push(label);
        }

        let mut values = vec![None; cycles.len() * frequencies.len()];
        for row in subset.rows.iter() {
            let i = cycles.iter().position(|&n| n == row.cycles);
            let j = frequencies.iter().position(|&f| row.matches_frequency(f));
            if let (Some(i), Some(j)) = (i, j) {
                values[i * frequencies.len() + j] = Some(row.prevalence);
            }
        }

        Pivot { replacements: k, cycles: cycles, labels: labels, values: values }
    }
}

impl fmt::Display for Table {
    /// Display one block per (cycles, frequency) group
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (_, rows) in self.groups().iter() {
            writeln!(f, "# cycles {}, frequency {}", rows[0].cycles, rows[0].label)?;
            writeln!(f, "{:>4} {:>12} {:>12}", "k", COL_PREVALENCE, COL_SCREENED)?;
            for row in rows.iter() {
                match row.screened_colonies {
                    Some(s) => writeln!(f, "{:>4} {:>12.6} {:>12}", row.replacements, row.prevalence, s)?,
                    None => writeln!(f, "{:>4} {:>12.6} {:>12}", row.replacements, row.prevalence, NA)?,
                }
            }
        }
        Ok(())
    }
}

/// Prevalence of one genotype class over cycles and frequencies.
/// Values are stored in row-major order.
#[derive(Debug)]
pub struct Pivot {
    pub replacements: u32,
    pub cycles: Vec<u32>,
    pub labels: Vec<String>,
    pub values: Vec<Option<f64>>,
}

impl Pivot {
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(i * self.labels.len() + j).and_then(|x| *x)
    }
}

impl fmt::Display for Pivot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "# prevalence of clones with {} replacements", self.replacements)?;

        // header: one column per frequency level
        write!(f, "{:>6}", "N\\R")?;
        for label in self.labels.iter() {
            write!(f, " {:>10}", label)?;
        }
        writeln!(f, "")?;

        for (i, n) in self.cycles.iter().enumerate() {
            write!(f, "{:>6}", n)?;
            for j in 0 .. self.labels.len() {
                match self.get(i, j) {
                    Some(p) => write!(f, " {:>10.6}", p)?,
                    None => write!(f, " {:>10}", ".")?,
                }
            }
            writeln!(f, "")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1.0e-9;

    fn sample() -> Table {
        Table::generate(3, &[1, 10], &[0.05, 0.1], Criterion::Exact, DEFAULT_CONFIDENCE).unwrap()
    }

    #[test]
    fn test_generate() {
        let t = sample();
        assert_eq!(t.len(), 2 * 2 * 4);
        assert_eq!(t.loci(), Some(3));

        let first = t.iter().next().unwrap();
        assert_eq!(first.cycles, 1);
        assert_eq!(first.label, "0.05");
        assert_eq!(first.replacements, 0);
        assert!((first.prevalence - 0.857375).abs() < EPS);

        let full = t.filter(Some(1), Some(0.05)).with_replacements(3);
        assert_eq!(full.len(), 1);
        assert_eq!(full.iter().next().unwrap().screened_colonies, Some(23965.0));

        let full = t.filter(Some(10), Some(0.05)).with_replacements(3);
        assert_eq!(full.iter().next().unwrap().screened_colonies, Some(45.0));
    }

    #[test]
    fn test_generate_degenerate() {
        let t = Table::generate(3, &[5], &[0.0], Criterion::Exact, DEFAULT_CONFIDENCE).unwrap();
        for row in t.iter() {
            assert_eq!(row.screened_colonies, None);
        }
        assert!(Table::generate(3, &[5], &[0.1], Criterion::Exact, 1.0).is_err());
        assert!(Table::generate(3, &[5], &[1.1], Criterion::Exact, 0.95).is_err());
    }

    #[test]
    fn test_generate_unscreenable() {
        // 40 loci at R = 0.001 after one cycle: full replacement has prevalence 1e-120
        let t = Table::generate(40, &[1], &[0.001], Criterion::Exact, DEFAULT_CONFIDENCE).unwrap();
        let full = t.with_replacements(40);
        let row = full.iter().next().unwrap();
        assert!(row.prevalence > 0.0);
        assert_eq!(row.screened_colonies, None);
        assert!(t.with_replacements(0).iter().next().unwrap().screened_colonies.is_some());
    }

    #[test]
    fn test_filter() {
        let t = sample();
        assert_eq!(t.filter(Some(10), None).len(), 8);
        assert_eq!(t.filter(None, Some(0.1)).len(), 8);
        assert_eq!(t.filter(Some(10), Some(0.1)).len(), 4);
        assert_eq!(t.filter(None, None).len(), t.len());
        assert!(t.filter(Some(7), None).is_empty());
        assert!(t.filter(None, Some(0.3)).is_empty());
    }

    #[test]
    fn test_levels() {
        let t = sample();
        assert_eq!(t.cycle_levels(), vec![1, 10]);
        assert_eq!(t.frequency_levels(), vec![0.05, 0.1]);
        assert_eq!(t.groups().len(), 4);
        let keys: Vec<u32> = t.groups().keys().map(|&(n, _)| n).collect();
        assert_eq!(keys, vec![1, 1, 10, 10]);
    }

    #[test]
    fn test_groups_follow_levels() {
        let row = |f: f64, label: &str, k: u32, p: f64| Row {
            cycles: 1, frequency: f, label: label.to_owned(), replacements: k,
            prevalence: p, screened_colonies: None,
        };
        let t = Table::new(vec![
            row(0.1, "0.1", 0, 0.6),
            row(0.10000000001, "0.10000000001", 1, 0.4),
            row(0.2, "0.2", 0, 1.0),
        ]);

        assert_eq!(t.frequency_levels().len(), 2);
        let groups = t.groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.get(&(1, 0)).map(|rows| rows.len()), Some(2));
        assert!(t.check_normalization(NORM_TOL).is_empty());
    }

    #[test]
    fn test_check_normalization() {
        let t = sample();
        assert!(t.check_normalization(NORM_TOL).is_empty());

        let mut rows: Vec<Row> = t.iter().cloned().collect();
        rows[0].prevalence += 0.01;
        let violations = Table::new(rows).check_normalization(NORM_TOL);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].cycles, 1);
        assert_eq!(violations[0].frequency, 0.05);
        assert!((violations[0].total - 1.01).abs() < 1.0e-6);
    }

    #[test]
    fn test_pivot() {
        let t = sample();
        let p = t.pivot(3);
        assert_eq!(p.cycles, vec![1, 10]);
        assert_eq!(p.labels, vec!["0.05".to_owned(), "0.1".to_owned()]);
        assert!((p.get(0, 0).unwrap() - 0.000125).abs() < EPS);
        assert!((p.get(1, 0).unwrap() - 0.06460818556755253).abs() < EPS);
        assert!((p.get(0, 1).unwrap() - 0.001).abs() < EPS);

        let text = p.to_string();
        assert!(text.starts_with("# prevalence of clones with 3 replacements\n"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn test_display() {
        let t = sample().filter(Some(1), Some(0.05));
        let text = t.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "# cycles 1, frequency 0.05");
        // 85.7% of clones carry no replacement: two colonies suffice
        assert!(lines[2].trim_start().starts_with("0"));
        assert!(lines[2].ends_with(" 2"));
    }
}
