use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Percentile with linear interpolation between closest ranks
///
/// `rank = pct / 100 * (n - 1)`, matching the default method of common numeric
/// libraries. Persisted baselines were computed this way, so the method must
/// not change. Returns None for an empty slice.
pub fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Population standard deviation (divides by n)
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(Statistics::population_std_dev(values.iter()))
}

/// Descriptive statistics of the current reading window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    /// std_dev / mean, in percent
    pub coefficient_of_variation: f64,
}

impl WindowStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let median = percentile(values, 50.0)?;
        let std_dev = population_std_dev(values)?;
        let mean = Statistics::mean(values.iter());

        let coefficient_of_variation = if mean.abs() < f64::EPSILON {
            0.0
        } else {
            std_dev / mean * 100.0
        };

        Some(Self {
            min: Statistics::min(values.iter()),
            max: Statistics::max(values.iter()),
            mean,
            median,
            std_dev,
            coefficient_of_variation,
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_percentile_empty() {
        assert!(percentile(&[], 75.0).is_none());
    }

    #[test]
    fn test_percentile_single_value() {
        assert_relative_eq!(percentile(&[42.0], 75.0).unwrap(), 42.0);
    }

    #[test]
    fn test_percentile_linear_interpolation() {
        // rank = 0.75 * 3 = 2.25 -> 3 + 0.25 * (4 - 3)
        let values = vec![4.0, 1.0, 3.0, 2.0];
        assert_relative_eq!(percentile(&values, 75.0).unwrap(), 3.25, epsilon = 1e-12);

        // rank = 0.75 * 4 = 3 exactly
        let values = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        assert_relative_eq!(percentile(&values, 75.0).unwrap(), 40.0, epsilon = 1e-12);
    }

    #[test]
    fn test_percentile_bounds() {
        let values = vec![5.0, 1.0, 9.0];
        assert_relative_eq!(percentile(&values, 0.0).unwrap(), 1.0);
        assert_relative_eq!(percentile(&values, 100.0).unwrap(), 9.0);
        assert_relative_eq!(percentile(&values, 50.0).unwrap(), 5.0);
    }

    #[test]
    fn test_percentile_constant_series() {
        let values = vec![1000.0; 100];
        assert_relative_eq!(percentile(&values, 75.0).unwrap(), 1000.0);
    }

    #[test]
    fn test_population_std_dev() {
        // Classic example: population std of this set is exactly 2
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(population_std_dev(&values).unwrap(), 2.0, epsilon = 1e-12);
        assert!(population_std_dev(&[]).is_none());
    }

    #[test]
    fn test_window_stats() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let stats = WindowStats::from_values(&values).unwrap();

        assert_relative_eq!(stats.min, 2.0);
        assert_relative_eq!(stats.max, 9.0);
        assert_relative_eq!(stats.mean, 5.0, epsilon = 1e-12);
        assert_relative_eq!(stats.median, 4.5, epsilon = 1e-12);
        assert_relative_eq!(stats.std_dev, 2.0, epsilon = 1e-12);
        assert_relative_eq!(stats.coefficient_of_variation, 40.0, epsilon = 1e-9);
    }

    #[test]
    fn test_window_stats_empty() {
        assert!(WindowStats::from_values(&[]).is_none());
    }
}
