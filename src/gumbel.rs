//! Gumbel (extreme value type I, right-skewed) fit and threshold queries.

use std::f64::consts::PI;

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::error::StatsError;

/// Fewest distinct sample values a fit accepts.
pub const MIN_DISTINCT_VALUES: usize = 2;

const MAX_ITER: usize = 200;
const MAX_BRACKET_STEPS: usize = 200;
const REL_TOL: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GumbelParams {
    /// μ
    pub location: f64,
    /// β, always > 0 for a fitted distribution.
    pub scale: f64,
}

impl GumbelParams {
    pub fn new(location: f64, scale: f64) -> Self {
        Self { location, scale }
    }

    fn z(&self, x: f64) -> f64 {
        (x - self.location) / self.scale
    }

    /// F(x) = exp(-exp(-(x - μ) / β))
    pub fn cdf(&self, x: f64) -> f64 {
        (-(-self.z(x)).exp()).exp()
    }

    /// 1 - F(x)
    pub fn sf(&self, x: f64) -> f64 {
        // -expm1(-t) keeps precision in the far right tail where F(x) ~ 1.
        -(-(-self.z(x)).exp()).exp_m1()
    }

    pub fn pdf(&self, x: f64) -> f64 {
        let z = self.z(x);
        (-(z + (-z).exp())).exp() / self.scale
    }

    /// Inverse CDF. NaN outside [0, 1].
    pub fn quantile(&self, p: f64) -> f64 {
        if !(0.0..=1.0).contains(&p) {
            return f64::NAN;
        }
        self.location - self.scale * (-p.ln()).ln()
    }

    /// Draw `n` values by inverse transform sampling.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<f64> {
        (0..n)
            .map(|_| self.quantile(rng.gen_range(f64::MIN_POSITIVE..1.0)))
            .collect()
    }

    /// `points` evenly spaced (x, pdf(x)) pairs over [lo, hi], inclusive.
    pub fn density_curve(&self, lo: f64, hi: f64, points: usize) -> Vec<(f64, f64)> {
        match points {
            0 => Vec::new(),
            1 => vec![(lo, self.pdf(lo))],
            _ => {
                let step = (hi - lo) / (points - 1) as f64;
                (0..points)
                    .map(|i| {
                        let x = if i == points - 1 { hi } else { lo + step * i as f64 };
                        (x, self.pdf(x))
                    })
                    .collect()
            }
        }
    }
}

/// Answers to a threshold query against a fitted sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdEstimate {
    pub location: f64,
    pub scale: f64,
    pub threshold: f64,
    pub sample_size: usize,
    /// P(value > X) = 1 - F(X)
    pub p_above: f64,
    /// P(value >= X). Equal to `p_above`: the fitted law is continuous.
    pub p_at_or_above: f64,
    /// P(value <= X) = F(X)
    pub p_at_or_below: f64,
    /// Fitted share of values at or below X, F(X).
    pub fitted_share_at_or_below: f64,
    /// Sample values strictly below X.
    pub count_below: usize,
    /// `count_below / sample_size`, NaN for an empty sample.
    pub proportion_below: f64,
}

/// Maximum-likelihood Gumbel fit.
///
/// Needs at least two distinct finite values. The scale β is the root of
/// β - x̄ + Σ xᵢ e^(-xᵢ/β) / Σ e^(-xᵢ/β), which is strictly increasing in β;
/// the location follows as μ = -β ln(mean e^(-xᵢ/β)).
pub fn fit(values: &[f64]) -> Result<GumbelParams, StatsError> {
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(StatsError::NonFiniteValue { index });
    }
    let distinct = count_distinct(values);
    if distinct < MIN_DISTINCT_VALUES {
        return Err(StatsError::InsufficientData {
            distinct,
            required: MIN_DISTINCT_VALUES,
        });
    }

    // Shift so the smallest value is 0: every weight is then <= 1 and at
    // least one is exactly 1, so the weight sums never underflow.
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let shifted: Vec<f64> = values.iter().map(|v| v - min).collect();
    let n = shifted.len() as f64;
    let mean = shifted.iter().sum::<f64>() / n;
    let var = shifted.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
    let moments_scale = (6.0 * var).sqrt() / PI;
    if !(moments_scale.is_finite() && moments_scale > 0.0) {
        return Err(StatsError::DegenerateFit {
            location: f64::NAN,
            scale: moments_scale,
        });
    }

    let scale = solve_scale(&shifted, mean, moments_scale);
    let mean_weight = shifted.iter().map(|d| (-d / scale).exp()).sum::<f64>() / n;
    let location = min - scale * mean_weight.ln();
    if !(scale.is_finite() && scale > 0.0 && location.is_finite()) {
        return Err(StatsError::DegenerateFit { location, scale });
    }

    Ok(GumbelParams { location, scale })
}

/// Evaluate the threshold quantities for X under `params`, with the empirical
/// counts taken from `sample`.
pub fn query(params: GumbelParams, sample: &[f64], threshold: f64) -> ThresholdEstimate {
    let f = params.cdf(threshold);
    let tail = params.sf(threshold);
    let count_below = sample.iter().filter(|v| **v < threshold).count();
    let proportion_below = if sample.is_empty() {
        f64::NAN
    } else {
        count_below as f64 / sample.len() as f64
    };

    ThresholdEstimate {
        location: params.location,
        scale: params.scale,
        threshold,
        sample_size: sample.len(),
        p_above: tail,
        p_at_or_above: tail,
        p_at_or_below: f,
        fitted_share_at_or_below: f,
        count_below,
        proportion_below,
    }
}

/// `fit` then `query` on the same sample.
pub fn estimate(values: &[f64], threshold: f64) -> Result<ThresholdEstimate, StatsError> {
    let params = fit(values)?;
    Ok(query(params, values, threshold))
}

fn count_distinct(values: &[f64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.dedup();
    sorted.len()
}

/// g(β) and g'(β) for the scale likelihood equation over shifted data.
fn scale_equation(shifted: &[f64], mean: f64, beta: f64) -> (f64, f64) {
    let mut w_sum = 0.0;
    let mut xw_sum = 0.0;
    let mut xxw_sum = 0.0;
    for &x in shifted {
        let w = (-x / beta).exp();
        w_sum += w;
        xw_sum += x * w;
        xxw_sum += x * x * w;
    }
    let ratio = xw_sum / w_sum;
    let g = beta - mean + ratio;
    let dg = 1.0 + (xxw_sum / w_sum - ratio * ratio) / (beta * beta);
    (g, dg)
}

fn solve_scale(shifted: &[f64], mean: f64, start: f64) -> f64 {
    let eq = |beta: f64| scale_equation(shifted, mean, beta).0;

    let mut lo = start;
    for _ in 0..MAX_BRACKET_STEPS {
        if eq(lo) < 0.0 {
            break;
        }
        lo *= 0.5;
    }
    let mut hi = start;
    for _ in 0..MAX_BRACKET_STEPS {
        if eq(hi) > 0.0 {
            break;
        }
        hi *= 2.0;
    }

    let mut beta = start;
    for iter in 0..MAX_ITER {
        let (g, dg) = scale_equation(shifted, mean, beta);
        if g == 0.0 {
            debug!(iter, beta, "gumbel scale converged exactly");
            return beta;
        }
        if g < 0.0 {
            lo = beta;
        } else {
            hi = beta;
        }
        let mut next = beta - g / dg;
        if !(next > lo && next < hi) {
            next = 0.5 * (lo + hi);
        }
        if (next - beta).abs() <= REL_TOL * beta.max(1.0) {
            debug!(iter, beta = next, "gumbel scale converged");
            return next;
        }
        beta = next;
    }
    debug!(beta, "gumbel scale hit iteration cap");
    beta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_matches_reference_values() {
        let p = fit(&[10.0, 20.0, 30.0, 40.0, 50.0]).unwrap();
        assert!((p.location - 22.966078288689552).abs() < 1e-6, "{p:?}");
        assert!((p.scale - 12.666532222367499).abs() < 1e-6, "{p:?}");
    }

    #[test]
    fn fit_is_shift_equivariant() {
        let a = fit(&[1.0, 4.0, 2.0, 8.0, 3.0]).unwrap();
        let b = fit(&[101.0, 104.0, 102.0, 108.0, 103.0]).unwrap();
        assert!((b.location - a.location - 100.0).abs() < 1e-8);
        assert!((b.scale - a.scale).abs() < 1e-8);
    }

    #[test]
    fn fit_rejects_constant_and_tiny_samples() {
        assert_eq!(
            fit(&[7.0, 7.0, 7.0]),
            Err(StatsError::InsufficientData {
                distinct: 1,
                required: 2
            })
        );
        assert_eq!(
            fit(&[]),
            Err(StatsError::InsufficientData {
                distinct: 0,
                required: 2
            })
        );
        assert_eq!(
            fit(&[1.0, f64::NAN]),
            Err(StatsError::NonFiniteValue { index: 1 })
        );
    }

    #[test]
    fn fit_rejects_spreads_outside_f64_range() {
        for sample in [[0.0, 1e300], [0.0, 5e-324], [-1e308, 1e308]] {
            assert!(
                matches!(fit(&sample), Err(StatsError::DegenerateFit { .. })),
                "{sample:?}"
            );
        }
        // Large but representable spreads still fit.
        let p = fit(&[0.0, 1e100]).unwrap();
        assert!(p.scale.is_finite() && p.scale > 0.0);
        assert!(p.location.is_finite());
    }

    #[test]
    fn two_distinct_values_fit() {
        let p = fit(&[1.0, 2.0]).unwrap();
        assert!((p.location - 1.2526749812809426).abs() < 1e-6);
        assert!((p.scale - 0.4167782798004824).abs() < 1e-6);
    }

    #[test]
    fn quantile_inverts_cdf() {
        let p = GumbelParams::new(100.0, 12.0);
        for q in [0.01, 0.25, 0.5, 0.9, 0.999] {
            assert!((p.cdf(p.quantile(q)) - q).abs() < 1e-12);
        }
        assert!(p.quantile(1.5).is_nan());
    }

    #[test]
    fn sf_and_cdf_sum_to_one() {
        let p = GumbelParams::new(0.0, 1.0);
        for x in [-3.0, -0.5, 0.0, 2.0, 10.0] {
            assert!((p.sf(x) + p.cdf(x) - 1.0).abs() < 1e-12);
        }
        assert!(p.sf(60.0) > 0.0);
    }

    #[test]
    fn density_curve_spans_range() {
        let p = GumbelParams::new(0.0, 1.0);
        let curve = p.density_curve(-2.0, 6.0, 5);
        let xs: Vec<f64> = curve.iter().map(|(x, _)| *x).collect();
        assert_eq!(xs, vec![-2.0, 0.0, 2.0, 4.0, 6.0]);
        assert!(curve.iter().all(|(_, y)| *y > 0.0));
        assert!(p.density_curve(0.0, 1.0, 0).is_empty());
        assert_eq!(p.density_curve(3.0, 1.0, 1).len(), 1);
    }

    #[test]
    fn empirical_counts_saturate() {
        let sample = [10.0, 20.0, 30.0];
        let p = GumbelParams::new(20.0, 5.0);
        let low = query(p, &sample, -1000.0);
        assert_eq!(low.count_below, 0);
        assert_eq!(low.proportion_below, 0.0);
        let high = query(p, &sample, 1000.0);
        assert_eq!(high.count_below, 3);
        assert_eq!(high.proportion_below, 1.0);
        assert!(query(p, &[], 1.0).proportion_below.is_nan());
    }
}
