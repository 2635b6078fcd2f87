use rand::Rng;
use rand_distr::{Binomial, Distribution};

use model::Model;

/// Simulate MAGE cycles on independent clones and return the empirical
/// distribution of the number of replaced loci, indexed by 0..=n.
///
/// In each cycle, every locus not yet replaced is replaced with probability R.
pub fn simulate<R: Rng + ?Sized>(model: &Model, cycles: u32, clones: usize, rng: &mut R) -> Vec<f64> {
    let n = model.loci as usize;
    let mut counts = vec![0usize; n + 1];

    if clones == 0 {
        return vec![0.0; n + 1];
    }

    // replacements among the remaining loci follow Binomial(remaining, R);
    // frequency is already checked to lie in [0, 1]
    let dists: Vec<Option<Binomial>> = (0 .. n + 1)
        .map(|m| Binomial::new(m as u64, model.frequency).ok())
        .collect();

    for _ in 0 .. clones {
        let mut remaining = n;
        for _ in 0 .. cycles {
            if remaining == 0 {
                break;
            }
            if let Some(ref d) = dists[remaining] {
                let hits = d.sample(rng) as usize;
                remaining -= hits.min(remaining);
            }
        }
        counts[n - remaining] += 1;
    }

    counts.iter().map(|&c| c as f64 / clones as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use stats;

    #[test]
    fn test_simulate_matches_model() {
        let m = Model::new(3, 0.05).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let sim = simulate(&m, 10, 100_000, &mut rng);
        let expected = m.distribution(10);

        assert_eq!(sim.len(), 4);
        let s: f64 = sim.iter().sum();
        assert!((s - 1.0).abs() < 1.0e-9);
        for (x, y) in sim.iter().zip(expected.iter()) {
            assert!((x - y).abs() < 0.01, "simulated {} expected {}", x, y);
        }
        assert!(stats::js_divergence(&sim, &expected) < 1.0e-3);
    }

    #[test]
    fn test_simulate_boundaries() {
        let mut rng = StdRng::seed_from_u64(7);

        let m = Model::new(3, 0.0).unwrap();
        assert_eq!(simulate(&m, 10, 1000, &mut rng), vec![1.0, 0.0, 0.0, 0.0]);

        let m = Model::new(3, 1.0).unwrap();
        assert_eq!(simulate(&m, 1, 1000, &mut rng), vec![0.0, 0.0, 0.0, 1.0]);

        let m = Model::new(3, 0.5).unwrap();
        assert_eq!(simulate(&m, 0, 1000, &mut rng), vec![1.0, 0.0, 0.0, 0.0]);
        assert_eq!(simulate(&m, 5, 0, &mut rng), vec![0.0; 4]);
    }
}
