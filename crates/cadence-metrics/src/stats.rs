//! Shared statistical helpers.
//!
//! All functions are total over empty input (returning 0.0) so algorithms
//! never divide by zero on degenerate histories. Functions taking a sorted
//! slice document that requirement; callers sort once and reuse.

/// Arithmetic mean; 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0.0 for empty input.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Coefficient of variation (stddev / mean); 0.0 when the mean is 0.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let avg = mean(values);
    if avg == 0.0 {
        return 0.0;
    }
    std_dev(values) / avg
}

/// Median of a **sorted** slice, using the standard even/odd midpoint
/// average.
pub fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Nearest-rank percentile of a **sorted** slice:
/// `index = round(p/100 × (n−1))`.
///
/// # Examples
///
/// ```
/// use cadence_metrics::stats::percentile;
///
/// let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_eq!(percentile(&sorted, 50.0), 3.0);
/// assert_eq!(percentile(&sorted, 95.0), 5.0);
/// ```
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = (p / 100.0 * (sorted.len() - 1) as f64).round() as usize;
    sorted[index.min(sorted.len() - 1)]
}

/// IQR outlier bounds `(Q1 − 1.5·IQR, Q3 + 1.5·IQR)` over a **sorted**
/// slice.
pub fn outlier_bounds(sorted: &[f64]) -> (f64, f64) {
    let q1 = percentile(sorted, 25.0);
    let q3 = percentile(sorted, 75.0);
    let iqr = q3 - q1;
    (q1 - 1.5 * iqr, q3 + 1.5 * iqr)
}

/// How many values of a **sorted** slice fall outside the IQR bounds.
pub fn count_outliers(sorted: &[f64]) -> usize {
    if sorted.len() < 4 {
        return 0;
    }
    let (low, high) = outlier_bounds(sorted);
    sorted.iter().filter(|&&v| v < low || v > high).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn std_dev_of_constant_series_is_zero() {
        assert_eq!(std_dev(&[4.0, 4.0, 4.0]), 0.0);
    }

    #[test]
    fn cov_handles_zero_mean() {
        assert_eq!(coefficient_of_variation(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn cov_of_known_series() {
        // mean 2, population stddev sqrt(2/3)
        let cov = coefficient_of_variation(&[1.0, 2.0, 3.0]);
        assert!((cov - (2.0f64 / 3.0).sqrt() / 2.0).abs() < 1e-12);
    }

    #[test]
    fn median_even_and_odd() {
        assert_eq!(median(&[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn percentile_nearest_rank_pins() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 50.0), 3.0);
        // round(0.95 * 4) = 4 -> last element
        assert_eq!(percentile(&sorted, 95.0), 5.0);
        assert_eq!(percentile(&sorted, 100.0), 5.0);
    }

    #[test]
    fn percentile_single_element() {
        assert_eq!(percentile(&[7.0], 99.0), 7.0);
    }

    #[test]
    fn outliers_detected_by_iqr_rule() {
        let sorted = [1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 100.0];
        assert_eq!(count_outliers(&sorted), 1);
    }

    #[test]
    fn no_outliers_in_tight_series() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(count_outliers(&sorted), 0);
    }
}
