//! Dataset profiling used by the auto-generated report.

use super::calculator::{
    ColumnSummary, CorrelationMatrix, HistogramBin, StatsCalculator, ValueCount,
};
use crate::data::{column_strings, numeric_values, ColumnKind};
use polars::prelude::*;
use rayon::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct NumericProfile {
    pub summary: ColumnSummary,
    pub zeros: usize,
    pub skewness: f64,
    pub kurtosis: f64,
    pub histogram: Vec<HistogramBin>,
}

#[derive(Debug, Clone)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: String,
    pub kind: ColumnKind,
    pub count: usize,
    pub missing: usize,
    pub missing_pct: f64,
    pub distinct: usize,
    pub numeric: Option<NumericProfile>,
    pub top_values: Vec<ValueCount>,
}

#[derive(Debug, Clone)]
pub struct DatasetProfile {
    pub rows: usize,
    pub columns: usize,
    pub missing_cells: usize,
    pub duplicate_rows: usize,
    pub estimated_bytes: usize,
    pub columns_profile: Vec<ColumnProfile>,
    pub correlations: CorrelationMatrix,
}

impl DatasetProfile {
    pub fn missing_pct(&self) -> f64 {
        let cells = self.rows * self.columns;
        if cells == 0 {
            0.0
        } else {
            self.missing_cells as f64 * 100.0 / cells as f64
        }
    }

    pub fn numeric_count(&self) -> usize {
        self.columns_profile
            .iter()
            .filter(|c| c.kind == ColumnKind::Numeric)
            .count()
    }
}

/// Number of rows that repeat an earlier row exactly.
pub fn count_duplicate_rows(df: &DataFrame) -> usize {
    duplicate_mask(df).iter().filter(|&&dup| dup).count()
}

/// `true` for each row that repeats an earlier row.
pub fn duplicate_mask(df: &DataFrame) -> Vec<bool> {
    let columns: Vec<Vec<Option<String>>> = df.get_columns().iter().map(column_strings).collect();
    let mut seen: HashSet<Vec<Option<&str>>> = HashSet::with_capacity(df.height());

    (0..df.height())
        .map(|i| {
            let key: Vec<Option<&str>> = columns
                .iter()
                .map(|col| col.get(i).and_then(|v| v.as_deref()))
                .collect();
            !seen.insert(key)
        })
        .collect()
}

fn profile_column(df: &DataFrame, col: &Column, bins: usize, top_n: usize) -> ColumnProfile {
    let name = col.name().to_string();
    let kind = ColumnKind::of(col.dtype());
    let len = col.len();
    let missing = col.null_count();
    let strings: Vec<String> = column_strings(col).into_iter().flatten().collect();
    let distinct = strings.iter().collect::<HashSet<_>>().len();

    let numeric = (kind == ColumnKind::Numeric).then(|| {
        let values = numeric_values(df, &name);
        NumericProfile {
            summary: StatsCalculator::summarize(&name, &values),
            zeros: values.iter().filter(|&&v| v == 0.0).count(),
            skewness: StatsCalculator::skewness(&values),
            kurtosis: StatsCalculator::kurtosis(&values),
            histogram: StatsCalculator::histogram(&values, bins),
        }
    });

    let mut top_values = StatsCalculator::count_values(strings);
    top_values.truncate(top_n);

    ColumnProfile {
        name,
        dtype: col.dtype().to_string(),
        kind,
        count: len - missing,
        missing,
        missing_pct: if len == 0 {
            0.0
        } else {
            missing as f64 * 100.0 / len as f64
        },
        distinct,
        numeric,
        top_values,
    }
}

/// Analyze the whole dataset; columns are profiled in parallel.
pub fn profile_dataset(df: &DataFrame, bins: usize, top_n: usize) -> DatasetProfile {
    let columns_profile: Vec<ColumnProfile> = df
        .get_columns()
        .par_iter()
        .map(|col| profile_column(df, col, bins, top_n))
        .collect();

    let numeric_cols: Vec<String> = columns_profile
        .iter()
        .filter(|c| c.kind == ColumnKind::Numeric)
        .map(|c| c.name.clone())
        .collect();

    DatasetProfile {
        rows: df.height(),
        columns: df.width(),
        missing_cells: columns_profile.iter().map(|c| c.missing).sum(),
        duplicate_rows: count_duplicate_rows(df),
        estimated_bytes: df.estimated_size(),
        correlations: StatsCalculator::correlation_matrix(df, &numeric_cols),
        columns_profile,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df!(
            "score" => [Some(1.0), Some(0.0), None, Some(3.0), Some(1.0)],
            "team" => [Some("red"), Some("blue"), Some("red"), None, Some("red")],
            "id" => [1i64, 2, 3, 4, 1]
        )
        .unwrap()
    }

    #[test]
    fn test_profile_dataset() {
        let profile = profile_dataset(&sample(), 10, 5);
        assert_eq!(profile.rows, 5);
        assert_eq!(profile.columns, 3);
        assert_eq!(profile.missing_cells, 2);
        assert_eq!(profile.numeric_count(), 2);
        assert_eq!(profile.correlations.columns, vec!["score", "id"]);

        let score = &profile.columns_profile[0];
        assert_eq!(score.count, 4);
        assert_eq!(score.distinct, 3);
        assert!((score.missing_pct - 20.0).abs() < 1e-9);
        let numeric = score.numeric.as_ref().unwrap();
        assert_eq!(numeric.zeros, 1);
        assert_eq!(numeric.histogram.iter().map(|b| b.count).sum::<usize>(), 4);

        let team = &profile.columns_profile[1];
        assert!(team.numeric.is_none());
        assert_eq!(team.top_values[0].value, "red");
        assert_eq!(team.top_values[0].count, 3);
    }

    #[test]
    fn test_duplicate_rows() {
        let df = df!(
            "a" => [Some(1i64), Some(1), None, None, Some(2)],
            "b" => ["x", "x", "y", "y", "x"]
        )
        .unwrap();
        assert_eq!(duplicate_mask(&df), vec![false, true, false, true, false]);
        assert_eq!(count_duplicate_rows(&df), 2);
        assert_eq!(count_duplicate_rows(&sample()), 1);
    }
}
