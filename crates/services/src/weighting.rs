//! Small numeric helpers shared by the trust and verdict calculations.

/// Rounds to two decimals. Persisted aggregates go through this so that a
/// read after a recalculation returns exactly the computed values.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Weighted arithmetic mean of `(value, weight)` pairs.
/// `None` when there are no pairs or the weights sum to zero.
pub fn weighted_mean<I>(pairs: I) -> Option<f64>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let (sum, total_weight) = pairs
        .into_iter()
        .fold((0.0, 0.0), |(sum, tw), (value, weight)| {
            (sum + value * weight, tw + weight)
        });
    (total_weight > 0.0).then(|| sum / total_weight)
}

/// Plain mean over the values that are present.
pub fn mean_of_present<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    weighted_mean(values.into_iter().flatten().map(|v| (v, 1.0)))
}

/// Kish effective sample size `(Σw)² / Σw²`. Equals `n` for uniform weights
/// and approaches 1 as a single weight dominates.
pub fn effective_sample_size(weights: &[f64]) -> f64 {
    let sum: f64 = weights.iter().sum();
    let sum_sq: f64 = weights.iter().map(|w| w * w).sum();
    if sum_sq > 0.0 {
        sum * sum / sum_sq
    } else {
        0.0
    }
}
