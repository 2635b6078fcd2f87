use std::f64;
use std::cmp;

/// Calculate log(sum(exp(xs))) of a real vector xs.
/// NaN values are ignored.
pub fn log_sum_exp(xs: &[f64]) -> f64 {
    // find maximum value
    let mut x_max = f64::NAN;
    for &x in xs.iter() {
        if x > x_max || x_max.is_nan() {
            x_max = x;
        }
    }

    if x_max.is_nan() {
        return f64::NAN;
    } else if x_max.is_infinite() {
        return x_max;
    }

    // sum the differences
    let mut sum = 0.0;
    for &x in xs.iter() {
        if !x.is_nan() {
            sum += (x - x_max).exp();
        }
    }

    x_max + sum.ln()
}

/// Natural log of the binomial coefficient C(n, k).
/// Returns negative infinity for k > n.
pub fn ln_choose(n: u64, k: u64) -> f64 {
    if k > n {
        return f64::NEG_INFINITY;
    }

    // C(n, k) == C(n, n - k); iterate over the shorter side
    let k = cmp::min(k, n - k);
    let mut s = 0.0;
    for i in 1 .. k + 1 {
        s += ((n - k + i) as f64).ln() - (i as f64).ln();
    }

    s
}

/// Natural log of the binomial probability mass at k for n trials with success probability p.
pub fn ln_binomial_pmf(n: u64, k: u64, p: f64) -> f64 {
    if k > n {
        return f64::NEG_INFINITY;
    }

    // exact boundaries avoid 0 * ln(0)
    if p <= 0.0 {
        return if k == 0 { 0.0 } else { f64::NEG_INFINITY };
    } else if p >= 1.0 {
        return if k == n { 0.0 } else { f64::NEG_INFINITY };
    }

    ln_choose(n, k) + (k as f64) * p.ln() + ((n - k) as f64) * (-p).ln_1p()
}

pub fn scale(xs: &[f64]) -> Vec<f64> {
    let s: f64 = xs.iter().sum();
    if s == 1.0 {
        xs.to_owned()
    } else {
        xs.iter().map(|x| x / s).collect()
    }
}

/// Kullback-Leibler Divergence using log2
pub fn kl_divergence(p: &[f64], q: &[f64]) -> f64 {
    let n = cmp::min(p.len(), q.len());
    let p = &p[..n];
    let q = &q[..n];

    let mut d = 0.0;
    for i in 0..n {
        if p[i] != 0.0 {
            d += p[i] * (p[i].log2() - q[i].log2())
        }
    }

    d
}

/// Jensen-Shannon Divergence using log2
/// bounded in [0, 1]
pub fn js_divergence(p: &[f64], q: &[f64]) -> f64 {
    // ensure that p and q are proper distributions
    let p = scale(p);
    let q = scale(q);

    let m: Vec<f64> = p.iter().zip(q.iter()).map(|(&x, &y)| 0.5 * (x + y)).collect();

    0.5 * (kl_divergence(&p, &m) + kl_divergence(&q, &m))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1.0e-6;

    #[test]
    fn test_log_sum_exp() {
        assert!((log_sum_exp(&vec![0.2, 0.3, 0.9, 1.2]) - 2.122379).abs() < EPS);
        assert!((log_sum_exp(&vec![0.0, 1.0, -5.0]) - 1.315072).abs() < EPS);
        assert!((log_sum_exp(&vec![0.0, 1.0, f64::NAN]) - 1.313262).abs() < EPS);
        assert!(log_sum_exp(&vec![0.0, f64::NEG_INFINITY]) == 0.0);
        assert!(log_sum_exp(&vec![0.0, f64::INFINITY]).is_infinite());
    }

    #[test]
    fn test_ln_choose() {
        assert_eq!(ln_choose(3, 0), 0.0);
        assert_eq!(ln_choose(3, 3), 0.0);
        assert!((ln_choose(3, 1) - 3f64.ln()).abs() < EPS);
        assert!((ln_choose(10, 4) - 210f64.ln()).abs() < EPS);
        assert!((ln_choose(50, 25) - 126410606437752f64.ln()).abs() < EPS);
        assert!(ln_choose(3, 4).is_infinite());
    }

    #[test]
    fn test_ln_binomial_pmf() {
        assert!((ln_binomial_pmf(3, 3, 0.05).exp() - 0.000125).abs() < 1.0e-12);
        assert!((ln_binomial_pmf(3, 1, 0.5).exp() - 0.375).abs() < EPS);
        assert_eq!(ln_binomial_pmf(3, 0, 0.0), 0.0);
        assert_eq!(ln_binomial_pmf(3, 1, 0.0), f64::NEG_INFINITY);
        assert_eq!(ln_binomial_pmf(3, 3, 1.0), 0.0);
        assert_eq!(ln_binomial_pmf(3, 2, 1.0), f64::NEG_INFINITY);
    }

    #[test]
    fn test_js_divergence() {
        assert!(js_divergence(&vec![0.0, 0.1, 0.9], &vec![0.0, 0.1, 0.9]) == 0.0);
        assert!((js_divergence(&vec![0.0, 0.1, 0.9], &vec![0.1, 0.2, 0.7]) - 0.0712961).abs() < EPS);
        assert!((js_divergence(&vec![0.1, 0.2, 0.7], &vec![0.0, 0.1, 0.9]) - 0.0712961).abs() < EPS);
    }

    #[test]
    fn test_kl_divergence() {
        assert!(kl_divergence(&vec![0.0, 0.1, 0.9], &vec![0.0, 0.1, 0.9]) == 0.0);
        assert!((kl_divergence(&vec![0.1, 0.1, 0.8], &vec![0.1, 0.2, 0.7]) - 0.05411606).abs() < EPS);
        assert!((kl_divergence(&vec![0.1, 0.2, 0.7], &vec![0.1, 0.1, 0.8]) - 0.06514845).abs() < EPS);
    }
}
