//! Statistics Calculator Module
//! Descriptive statistics, histograms, value counts, correlations and boxplot stats.

use crate::data::{numeric_values, string_values};
use polars::prelude::*;
use rayon::prelude::*;
use statrs::statistics::Statistics;
use std::collections::HashMap;

/// Tukey fence multiplier for outlier detection
pub const IQR_FENCE: f64 = 1.5;

/// One row of the summary statistics table.
#[derive(Debug, Clone)]
pub struct ColumnSummary {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl Default for ColumnSummary {
    fn default() -> Self {
        Self {
            name: String::new(),
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            q25: f64::NAN,
            median: f64::NAN,
            q75: f64::NAN,
            max: f64::NAN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl HistogramBin {
    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Pairwise Pearson correlations between numeric columns.
#[derive(Debug, Clone, Default)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(f64::NAN)
    }
}

/// Tukey boxplot statistics.
#[derive(Debug, Clone)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub mean: f64,
    pub outliers: Vec<f64>,
}

/// Handles statistical calculations with multi-threading support.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Summary statistics for a slice of values.
    pub fn summarize(name: &str, values: &[f64]) -> ColumnSummary {
        let n = values.len();
        if n == 0 {
            return ColumnSummary {
                name: name.to_string(),
                ..Default::default()
            };
        }

        let sorted = Self::sorted(values);
        let std = if n > 1 { values.std_dev() } else { f64::NAN };

        ColumnSummary {
            name: name.to_string(),
            count: n,
            mean: values.mean(),
            std,
            min: sorted[0],
            q25: Self::percentile(&sorted, 25.0),
            median: Self::percentile(&sorted, 50.0),
            q75: Self::percentile(&sorted, 75.0),
            max: sorted[n - 1],
        }
    }

    /// Summary statistics for each numeric column, computed in parallel.
    pub fn describe(df: &DataFrame, numeric_cols: &[String]) -> Vec<ColumnSummary> {
        numeric_cols
            .par_iter()
            .map(|name| Self::summarize(name, &numeric_values(df, name)))
            .collect()
    }

    /// Missing value count per column.
    pub fn missing_counts(df: &DataFrame) -> Vec<(String, usize)> {
        df.get_columns()
            .iter()
            .map(|col| (col.name().to_string(), col.null_count()))
            .collect()
    }

    pub fn sorted(values: &[f64]) -> Vec<f64> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted
    }

    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            f64::NAN
        } else {
            values.mean()
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Equal-width histogram over [min, max].
    ///
    /// The maximum lands in the last bin. A constant column gets a single
    /// unit-width bin centred on its value.
    pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
        if values.is_empty() || bins == 0 {
            return Vec::new();
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if min == max {
            return vec![HistogramBin {
                start: min - 0.5,
                end: max + 0.5,
                count: values.len(),
            }];
        }

        let width = (max - min) / bins as f64;
        let mut counts = vec![0usize; bins];
        for &v in values {
            let idx = (((v - min) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }

        counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                start: min + i as f64 * width,
                end: if i == bins - 1 {
                    max
                } else {
                    min + (i + 1) as f64 * width
                },
                count,
            })
            .collect()
    }

    /// Frequency of each non-null value, most frequent first.
    pub fn value_counts(df: &DataFrame, column: &str) -> Vec<ValueCount> {
        Self::count_values(string_values(df, column).into_iter().flatten())
    }

    pub fn count_values(values: impl IntoIterator<Item = String>) -> Vec<ValueCount> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for v in values {
            *counts.entry(v).or_default() += 1;
        }

        let mut result: Vec<ValueCount> = counts
            .into_iter()
            .map(|(value, count)| ValueCount { value, count })
            .collect();
        result.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
        result
    }

    /// Pearson correlation on pairwise-complete observations.
    pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> f64 {
        let pairs: Vec<(f64, f64)> = x
            .iter()
            .zip(y.iter())
            .filter_map(|(a, b)| match (a, b) {
                (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Some((*a, *b)),
                _ => None,
            })
            .collect();

        let n = pairs.len();
        if n < 2 {
            return f64::NAN;
        }

        let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n as f64;
        let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n as f64;

        let mut cov = 0.0;
        let mut var_x = 0.0;
        let mut var_y = 0.0;
        for (a, b) in &pairs {
            let dx = a - mean_x;
            let dy = b - mean_y;
            cov += dx * dy;
            var_x += dx * dx;
            var_y += dy * dy;
        }

        if var_x == 0.0 || var_y == 0.0 {
            return f64::NAN;
        }
        (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
    }

    /// Correlation matrix for the given numeric columns, rows in parallel.
    pub fn correlation_matrix(df: &DataFrame, numeric_cols: &[String]) -> CorrelationMatrix {
        let series: Vec<Vec<Option<f64>>> = numeric_cols
            .iter()
            .map(|name| crate::data::numeric_values_with_nulls(df, name))
            .collect();

        let values = (0..series.len())
            .into_par_iter()
            .map(|i| {
                (0..series.len())
                    .map(|j| Self::pearson(&series[i], &series[j]))
                    .collect()
            })
            .collect();

        CorrelationMatrix {
            columns: numeric_cols.to_vec(),
            values,
        }
    }

    /// Boxplot statistics with 1.5 x IQR fences.
    pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
        if values.is_empty() {
            return None;
        }

        let sorted = Self::sorted(values);
        let q1 = Self::percentile(&sorted, 25.0);
        let median = Self::percentile(&sorted, 50.0);
        let q3 = Self::percentile(&sorted, 75.0);
        let iqr = q3 - q1;
        let lower_fence = q1 - IQR_FENCE * iqr;
        let upper_fence = q3 + IQR_FENCE * iqr;

        let whisker_low = sorted
            .iter()
            .copied()
            .find(|&v| v >= lower_fence)
            .unwrap_or(q1);
        let whisker_high = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= upper_fence)
            .unwrap_or(q3);

        let outliers = sorted
            .iter()
            .copied()
            .filter(|&v| v < lower_fence || v > upper_fence)
            .collect();

        Some(BoxStats {
            q1,
            median,
            q3,
            lower_fence,
            upper_fence,
            whisker_low,
            whisker_high,
            mean: Self::mean(values),
            outliers,
        })
    }

    /// Adjusted Fisher-Pearson skewness (pandas `skew()`).
    pub fn skewness(values: &[f64]) -> f64 {
        let n = values.len() as f64;
        if n < 3.0 {
            return f64::NAN;
        }
        let mean = values.mean();
        let m2 = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let m3 = values.iter().map(|x| (x - mean).powi(3)).sum::<f64>() / n;
        if m2 == 0.0 {
            return 0.0;
        }
        let g1 = m3 / m2.powf(1.5);
        g1 * (n * (n - 1.0)).sqrt() / (n - 2.0)
    }

    /// Bias-corrected excess kurtosis (pandas `kurt()`).
    pub fn kurtosis(values: &[f64]) -> f64 {
        let n = values.len() as f64;
        if n < 4.0 {
            return f64::NAN;
        }
        let mean = values.mean();
        let m2 = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let m4 = values.iter().map(|x| (x - mean).powi(4)).sum::<f64>() / n;
        if m2 == 0.0 {
            return 0.0;
        }
        let g2 = m4 / (m2 * m2) - 3.0;
        ((n + 1.0) * g2 + 6.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0))
    }

    /// Evenly strided row indices, at most `max` of them.
    pub fn sample_indices(len: usize, max: usize) -> Vec<usize> {
        if max == 0 {
            return Vec::new();
        }
        if len <= max {
            return (0..len).collect();
        }
        let step = len as f64 / max as f64;
        (0..max).map(|i| (i as f64 * step) as usize).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_percentile_linear() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!(approx(StatsCalculator::percentile(&sorted, 25.0), 1.75));
        assert!(approx(StatsCalculator::percentile(&sorted, 50.0), 2.5));
        assert!(approx(StatsCalculator::percentile(&sorted, 100.0), 4.0));
        assert!(StatsCalculator::percentile(&[], 50.0).is_nan());
    }

    #[test]
    fn test_summarize() {
        let s = StatsCalculator::summarize("x", &[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(s.count, 4);
        assert!(approx(s.mean, 2.5));
        assert!(approx(s.std, (5.0f64 / 3.0).sqrt()));
        assert!(approx(s.min, 1.0));
        assert!(approx(s.max, 4.0));
        assert!(approx(s.median, 2.5));

        let single = StatsCalculator::summarize("y", &[7.0]);
        assert!(single.std.is_nan());
        assert!(StatsCalculator::summarize("z", &[]).mean.is_nan());
    }

    #[test]
    fn test_describe_skips_nulls() {
        let df = df!(
            "a" => [Some(1.0), None, Some(3.0)],
            "b" => [10i64, 20, 30]
        )
        .unwrap();
        let summary = StatsCalculator::describe(&df, &["a".to_string(), "b".to_string()]);
        assert_eq!(summary[0].count, 2);
        assert!(approx(summary[0].mean, 2.0));
        assert!(approx(summary[1].median, 20.0));
    }

    #[test]
    fn test_histogram_edges() {
        let bins = StatsCalculator::histogram(&[0.0, 1.0, 2.0, 3.0, 4.0], 4);
        assert_eq!(bins.len(), 4);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 5);
        // max goes into the last bin
        assert_eq!(bins[3].count, 2);
        assert!(approx(bins[3].end, 4.0));

        let constant = StatsCalculator::histogram(&[5.0, 5.0], 30);
        assert_eq!(constant.len(), 1);
        assert_eq!(constant[0].count, 2);
        assert!(approx(constant[0].width(), 1.0));

        assert!(StatsCalculator::histogram(&[], 30).is_empty());
    }

    #[test]
    fn test_value_counts_order() {
        let df = df!("c" => [Some("b"), Some("a"), Some("b"), None, Some("c"), Some("a")]).unwrap();
        let counts = StatsCalculator::value_counts(&df, "c");
        let flat: Vec<(&str, usize)> = counts.iter().map(|v| (v.value.as_str(), v.count)).collect();
        assert_eq!(flat, vec![("a", 2), ("b", 2), ("c", 1)]);
    }

    #[test]
    fn test_correlation_matrix() {
        let df = df!(
            "x" => [1.0, 2.0, 3.0, 4.0],
            "y" => [2.0, 4.0, 6.0, 8.0],
            "z" => [4.0, 3.0, 2.0, 1.0],
            "k" => [1.0, 1.0, 1.0, 1.0]
        )
        .unwrap();
        let cols: Vec<String> = ["x", "y", "z", "k"].iter().map(|s| s.to_string()).collect();
        let m = StatsCalculator::correlation_matrix(&df, &cols);
        assert!(approx(m.get(0, 0), 1.0));
        assert!(approx(m.get(0, 1), 1.0));
        assert!(approx(m.get(0, 2), -1.0));
        assert!(m.get(0, 3).is_nan());
    }

    #[test]
    fn test_pearson_pairwise_complete() {
        let x = [Some(1.0), Some(2.0), None, Some(3.0)];
        let y = [Some(1.0), Some(2.0), Some(100.0), Some(3.0)];
        assert!(approx(StatsCalculator::pearson(&x, &y), 1.0));
        assert!(StatsCalculator::pearson(&[Some(1.0)], &[Some(2.0)]).is_nan());
    }

    #[test]
    fn test_box_stats_outliers() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        let stats = StatsCalculator::box_stats(&values).unwrap();
        assert_eq!(stats.outliers, vec![100.0]);
        assert!(approx(stats.whisker_high, 5.0));
        assert!(approx(stats.whisker_low, 1.0));
        assert!(StatsCalculator::box_stats(&[]).is_none());
    }

    #[test]
    fn test_skew_and_kurtosis() {
        let symmetric = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(approx(StatsCalculator::skewness(&symmetric), 0.0));
        // pandas: pd.Series([1,2,3,4,5]).kurt() == -1.2
        assert!(approx(StatsCalculator::kurtosis(&symmetric), -1.2));
        assert!(StatsCalculator::skewness(&[1.0, 2.0]).is_nan());
        assert!(StatsCalculator::skewness(&[1.0, 1.0, 10.0]) > 0.0);
    }

    #[test]
    fn test_sample_indices() {
        assert_eq!(StatsCalculator::sample_indices(3, 10), vec![0, 1, 2]);
        let idx = StatsCalculator::sample_indices(100, 10);
        assert_eq!(idx.len(), 10);
        assert_eq!(idx[1], 10);
    }
}
