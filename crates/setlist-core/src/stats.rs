//! Descriptive statistics shared by the metric families.
//!
//! All spreads are population statistics (N denominator): a league is the
//! whole population being described, not a sample of one. Functions that
//! can be undefined (correlation on constant input, too few samples)
//! return `NaN`; callers normalize with [`finite_or_zero`] before handing
//! values to the presentation layer.

use num_traits::ToPrimitive;

fn as_f64<T: ToPrimitive>(v: &T) -> f64 {
    v.to_f64().unwrap_or(0.0)
}

/// Arithmetic mean. `0.0` for an empty slice.
pub fn mean<T: ToPrimitive>(values: &[T]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(as_f64).sum::<f64>() / values.len() as f64
}

/// Population variance. `0.0` for an empty slice.
pub fn variance<T: ToPrimitive>(values: &[T]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (as_f64(v) - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation. `0.0` for an empty slice.
pub fn std_dev<T: ToPrimitive>(values: &[T]) -> f64 {
    variance(values).sqrt()
}

/// `(mean, population std dev)`, or `(0.0, 0.0)` for an empty slice.
pub fn mean_std<T: ToPrimitive>(values: &[T]) -> (f64, f64) {
    (mean(values), std_dev(values))
}

/// Sample covariance (N-1 denominator). `NaN` with fewer than two pairs
/// or mismatched lengths.
pub fn sample_covariance(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.len() < 2 {
        return f64::NAN;
    }
    let mx = mean(xs);
    let my = mean(ys);
    let sum: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    sum / (xs.len() - 1) as f64
}

/// Pearson correlation coefficient.
///
/// `NaN` when either side is constant, has fewer than two values, or the
/// lengths differ.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.len() < 2 {
        return f64::NAN;
    }
    let mx = mean(xs);
    let my = mean(ys);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
}

/// 1-based ranks with ties sharing the average of the positions they span.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // Positions i..=j (0-based) share rank ((i+1)+(j+1))/2.
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = rank;
        }
        i = j + 1;
    }
    ranks
}

/// Spearman rank correlation: Pearson correlation of average ranks.
///
/// `NaN` under the same conditions as [`pearson`].
pub fn spearman(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.len() < 2 {
        return f64::NAN;
    }
    pearson(&average_ranks(xs), &average_ranks(ys))
}

/// Fraction of `population` strictly below `value`. `0.0` for an empty population.
pub fn fraction_below(population: &[f64], value: f64) -> f64 {
    if population.is_empty() {
        return 0.0;
    }
    population.iter().filter(|&&p| p < value).count() as f64 / population.len() as f64
}

/// Replace `NaN` and infinities with `0.0`.
pub fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() { x } else { 0.0 }
}
