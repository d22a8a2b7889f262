use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Finalized statistics over a stream of weighted values
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct WeightedMetric {
    pub count: usize,
    pub unweighted_mean: f64,
    pub weighted_mean: f64,
    /// Population standard deviation of the unweighted values
    pub std_dev: f64,
    pub median: f64,
}

impl WeightedMetric {
    pub fn builder() -> WeightedMetricBuilder {
        WeightedMetricBuilder::default()
    }
}

/// f64 ordered by `total_cmp`, for use in heaps
#[derive(Debug, Clone, Copy)]
struct TotalF64(f64);

impl Ord for TotalF64 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for TotalF64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for TotalF64 {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TotalF64 {}

/// Accumulates values one at a time; the median is tracked with a pair of heaps
#[derive(Debug, Clone, Default)]
pub struct WeightedMetricBuilder {
    count: usize,
    sum: f64,
    sum_of_squares: f64,
    weighted_sum: f64,
    total_weight: f64,
    // Lower half of the values
    lower: BinaryHeap<TotalF64>,
    // Upper half of the values
    upper: BinaryHeap<Reverse<TotalF64>>,
}

impl WeightedMetricBuilder {
    /// Add a value with weight 1
    pub fn add_unweighted(&mut self, value: f64) -> Result<&mut Self, MetricError> {
        self.add(value, 1.0)
    }

    /// Add a value with a positive weight
    pub fn add(&mut self, value: f64, weight: f64) -> Result<&mut Self, MetricError> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(MetricError::InvalidInput(format!("Weight must be positive, found {}", weight)));
        }
        self.record(value)?;
        self.weighted_sum += value * weight;
        self.total_weight += weight;
        Ok(self)
    }

    /// Add a value to the unweighted statistics only; it has no share of the weighted mean
    pub fn add_without_weight(&mut self, value: f64) -> Result<&mut Self, MetricError> {
        self.record(value)?;
        Ok(self)
    }

    fn record(&mut self, value: f64) -> Result<(), MetricError> {
        if !value.is_finite() {
            return Err(MetricError::InvalidInput(format!("Value must be finite, found {}", value)));
        }

        self.count += 1;
        self.sum += value;
        self.sum_of_squares += value * value;

        // Keep upper.len() == lower.len() or lower.len() + 1
        if self.lower.len() == self.upper.len() {
            self.lower.push(TotalF64(value));
            if let Some(top) = self.lower.pop() {
                self.upper.push(Reverse(top));
            }
        } else {
            self.upper.push(Reverse(TotalF64(value)));
            if let Some(Reverse(top)) = self.upper.pop() {
                self.lower.push(top);
            }
        }
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.count
    }

    fn median(&self) -> f64 {
        match (self.lower.peek(), self.upper.peek()) {
            (_, None) => 0.0,
            (Some(low), Some(Reverse(high))) if self.lower.len() == self.upper.len() => (low.0 + high.0) / 2.0,
            (_, Some(Reverse(high))) => high.0,
        }
    }

    pub fn build(&self) -> WeightedMetric {
        if self.count == 0 {
            return WeightedMetric::default();
        }

        let count = self.count as f64;
        let unweighted_mean = self.sum / count;
        let variance = (self.sum_of_squares / count - unweighted_mean * unweighted_mean).max(0.0);

        WeightedMetric {
            count: self.count,
            unweighted_mean,
            weighted_mean: if self.total_weight > 0.0 {
                self.weighted_sum / self.total_weight
            } else {
                0.0
            },
            std_dev: variance.sqrt(),
            median: self.median(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ERROR: f64 = 1.0e-8;

    fn build(values: &[(f64, f64)]) -> WeightedMetric {
        let mut builder = WeightedMetric::builder();
        for &(value, weight) in values {
            builder.add(value, weight).unwrap();
        }
        builder.build()
    }

    fn brute_force_median(values: &[f64]) -> f64 {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();
        if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        }
    }

    #[test]
    fn test_empty() {
        let metric = WeightedMetric::builder().build();
        assert_eq!(metric, WeightedMetric::default());
        assert_eq!(metric.median, 0.0);
        assert_eq!(metric.std_dev, 0.0);
    }

    #[test]
    fn test_one_value() {
        let metric = build(&[(2.5, 0.5)]);
        assert_eq!(metric.unweighted_mean, 2.5);
        assert_eq!(metric.weighted_mean, 2.5);
        assert_eq!(metric.std_dev, 0.0);
        assert_eq!(metric.median, 2.5);
    }

    #[test]
    fn test_two_values_different_weights() {
        let metric = build(&[(2.5, 0.75), (3.5, 0.5)]);
        assert_eq!(metric.unweighted_mean, 3.0);
        assert!((metric.weighted_mean - 2.9).abs() < ERROR);
        assert_eq!(metric.std_dev, 0.5);
        assert_eq!(metric.median, 3.0);
    }

    #[test]
    fn test_three_values() {
        let mut builder = WeightedMetric::builder();
        builder
            .add_unweighted(2.5)
            .and_then(|b| b.add_unweighted(3.5))
            .and_then(|b| b.add_unweighted(0.0))
            .unwrap();
        let metric = builder.build();

        assert_eq!(metric.count, 3);
        assert_eq!(metric.unweighted_mean, 2.0);
        assert_eq!(metric.weighted_mean, 2.0);
        assert!((metric.std_dev - 1.4719601443).abs() < ERROR);
        assert_eq!(metric.median, 2.5);
    }

    #[test]
    fn test_four_values_median() {
        let metric = build(&[(4.0, 1.0), (1.0, 1.0), (3.0, 1.0), (2.0, 1.0)]);
        assert_eq!(metric.median, 2.5);
    }

    #[test]
    fn test_rejects_bad_weight() {
        let mut builder = WeightedMetric::builder();
        assert!(builder.add(1.0, 0.0).is_err());
        assert!(builder.add(1.0, -1.0).is_err());
        assert!(builder.add(f64::NAN, 1.0).is_err());
        assert_eq!(builder.count(), 0);
    }

    #[test]
    fn test_values_without_weight() {
        let mut builder = WeightedMetric::builder();
        builder
            .add(0.8, 2.0)
            .and_then(|b| b.add_without_weight(0.2))
            .and_then(|b| b.add_without_weight(0.5))
            .unwrap();
        let metric = builder.build();

        assert_eq!(metric.count, 3);
        assert!((metric.unweighted_mean - 0.5).abs() < ERROR);
        assert!((metric.weighted_mean - 0.8).abs() < ERROR);
        assert_eq!(metric.median, 0.5);
        assert!(builder.add_without_weight(f64::INFINITY).is_err());
    }

    #[test]
    fn test_only_unweighted_values_have_zero_weighted_mean() {
        let mut builder = WeightedMetric::builder();
        builder.add_without_weight(0.4).unwrap();
        let metric = builder.build();
        assert_eq!(metric.unweighted_mean, 0.4);
        assert_eq!(metric.weighted_mean, 0.0);
    }

    proptest! {
        #[test]
        fn test_median_matches_sorting(values in prop::collection::vec(-100.0f64..100.0, 1..40)) {
            let mut builder = WeightedMetric::builder();
            for &v in &values {
                builder.add_unweighted(v).unwrap();
            }
            let metric = builder.build();
            prop_assert!((metric.median - brute_force_median(&values)).abs() < ERROR);

            let mean = values.iter().sum::<f64>() / values.len() as f64;
            prop_assert!((metric.unweighted_mean - mean).abs() < 1e-6);
        }
    }
}
