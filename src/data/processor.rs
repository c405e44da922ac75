//! Data Processor Module
//! In-place cleaning operations (imputation, column drop, de-duplication)
//! and grouped aggregation.

use super::loader::{column_strings, numeric_values, ColumnKind};
use crate::stats::{duplicate_mask, StatsCalculator};
use polars::prelude::*;
use thiserror::Error;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Column not found: {0}")]
    ColumnNotFound(String),
    #[error("Column '{0}' is not numeric")]
    NotNumeric(String),
    #[error("Column '{0}' has no values to compute a fill value from")]
    NoValues(String),
    #[error("'{0}' is not a valid value for column '{1}'")]
    InvalidConstant(String, String),
    #[error("No columns selected")]
    EmptySelection,
}

/// How missing values in a column are handled.
#[derive(Debug, Clone, PartialEq)]
pub enum ImputeStrategy {
    Mean,
    Median,
    Mode,
    Constant(String),
    DropRows,
    DropColumn,
}

impl ImputeStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            ImputeStrategy::Mean => "Mean",
            ImputeStrategy::Median => "Median",
            ImputeStrategy::Mode => "Mode",
            ImputeStrategy::Constant(_) => "Constant",
            ImputeStrategy::DropRows => "Drop Rows",
            ImputeStrategy::DropColumn => "Drop Column",
        }
    }

    /// Strategies that only make sense for numeric columns.
    pub fn requires_numeric(&self) -> bool {
        matches!(self, ImputeStrategy::Mean | ImputeStrategy::Median)
    }
}

/// Aggregation applied per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggFunc {
    #[default]
    Mean,
    Sum,
    Count,
    Min,
    Max,
    Median,
    Std,
}

impl AggFunc {
    pub const ALL: [AggFunc; 7] = [
        AggFunc::Mean,
        AggFunc::Sum,
        AggFunc::Count,
        AggFunc::Min,
        AggFunc::Max,
        AggFunc::Median,
        AggFunc::Std,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AggFunc::Mean => "Mean",
            AggFunc::Sum => "Sum",
            AggFunc::Count => "Count",
            AggFunc::Min => "Min",
            AggFunc::Max => "Max",
            AggFunc::Median => "Median",
            AggFunc::Std => "Std",
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            AggFunc::Mean => "mean",
            AggFunc::Sum => "sum",
            AggFunc::Count => "count",
            AggFunc::Min => "min",
            AggFunc::Max => "max",
            AggFunc::Median => "median",
            AggFunc::Std => "std",
        }
    }

    fn expr(&self, value_col: &str) -> Expr {
        let c = col(value_col);
        match self {
            AggFunc::Mean => c.mean(),
            AggFunc::Sum => c.sum(),
            AggFunc::Count => c.count(),
            AggFunc::Min => c.min(),
            AggFunc::Max => c.max(),
            AggFunc::Median => c.median(),
            AggFunc::Std => c.std(1),
        }
    }
}

/// Result of a single imputation step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImputeOutcome {
    pub column: String,
    pub filled: usize,
    pub rows_dropped: usize,
    pub column_dropped: bool,
}

/// Typed replacement value for nulls.
#[derive(Debug, Clone, PartialEq)]
enum FillValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl FillValue {
    /// Integral numbers stay integers for integer columns.
    fn from_number(value: f64, dtype: &DataType) -> Self {
        if dtype.is_integer() && value.fract() == 0.0 {
            FillValue::Int(value as i64)
        } else {
            FillValue::Float(value)
        }
    }

    fn parse_number(text: &str, dtype: &DataType, column: &str) -> Result<Self, ProcessorError> {
        let trimmed = text.trim();
        if dtype.is_integer() {
            if let Ok(v) = trimmed.parse::<i64>() {
                return Ok(FillValue::Int(v));
            }
        }
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| Self::from_number(v, dtype))
            .ok_or_else(|| ProcessorError::InvalidConstant(text.to_string(), column.to_string()))
    }

    fn parse_bool(text: &str, column: &str) -> Result<Self, ProcessorError> {
        match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(FillValue::Bool(true)),
            "false" => Ok(FillValue::Bool(false)),
            _ => Err(ProcessorError::InvalidConstant(
                text.to_string(),
                column.to_string(),
            )),
        }
    }

    fn scalar(&self) -> Series {
        let name = PlSmallStr::from_static("fill");
        match self {
            FillValue::Int(v) => Series::new(name, [*v]),
            FillValue::Float(v) => Series::new(name, [*v]),
            FillValue::Bool(v) => Series::new(name, [*v]),
            FillValue::Text(v) => Series::new(name, [v.as_str()]),
        }
    }

    fn expr(&self) -> Expr {
        match self {
            FillValue::Int(v) => lit(*v),
            FillValue::Float(v) => lit(*v),
            FillValue::Bool(v) => lit(*v),
            FillValue::Text(v) => lit(v.clone()),
        }
    }
}

impl fmt::Display for FillValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillValue::Int(v) => write!(f, "{}", v),
            FillValue::Float(v) => write!(f, "{}", v),
            FillValue::Bool(v) => write!(f, "{}", v),
            FillValue::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Handles data cleaning and transformation operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Columns with at least one missing value, with their null counts.
    pub fn columns_with_missing(df: &DataFrame) -> Vec<(String, usize)> {
        StatsCalculator::missing_counts(df)
            .into_iter()
            .filter(|(_, missing)| *missing > 0)
            .collect()
    }

    /// Handle missing values of one column in place.
    pub fn impute(
        df: &mut DataFrame,
        column: &str,
        strategy: &ImputeStrategy,
    ) -> Result<ImputeOutcome, ProcessorError> {
        let col = df
            .column(column)
            .map_err(|_| ProcessorError::ColumnNotFound(column.to_string()))?
            .clone();
        let missing = col.null_count();
        let kind = ColumnKind::of(col.dtype());

        if strategy.requires_numeric() && kind != ColumnKind::Numeric {
            return Err(ProcessorError::NotNumeric(column.to_string()));
        }

        let mut outcome = ImputeOutcome {
            column: column.to_string(),
            ..Default::default()
        };

        match strategy {
            ImputeStrategy::DropColumn => {
                df.drop_in_place(column)?;
                outcome.column_dropped = true;
            }
            ImputeStrategy::DropRows => {
                let mask = col.is_not_null();
                *df = df.filter(&mask)?;
                outcome.rows_dropped = missing;
            }
            ImputeStrategy::Mean | ImputeStrategy::Median => {
                let values = numeric_values(df, column);
                if values.is_empty() {
                    return Err(ProcessorError::NoValues(column.to_string()));
                }
                let fill = if *strategy == ImputeStrategy::Mean {
                    StatsCalculator::mean(&values)
                } else {
                    StatsCalculator::percentile(&StatsCalculator::sorted(&values), 50.0)
                };
                Self::fill_nulls(df, &col, FillValue::from_number(fill, col.dtype()))?;
                outcome.filled = missing;
            }
            ImputeStrategy::Mode => {
                let no_values = || ProcessorError::NoValues(column.to_string());
                let fill = match kind {
                    ColumnKind::Numeric if col.dtype().is_integer() => {
                        FillValue::Int(Self::integer_mode(&col).ok_or_else(no_values)?)
                    }
                    ColumnKind::Numeric => FillValue::Float(
                        Self::numeric_mode(&numeric_values(df, column)).ok_or_else(no_values)?,
                    ),
                    ColumnKind::Boolean => {
                        let mode = Self::text_mode(column_strings(&col).into_iter().flatten())
                            .ok_or_else(no_values)?;
                        FillValue::parse_bool(&mode, column)?
                    }
                    _ => FillValue::Text(
                        Self::text_mode(column_strings(&col).into_iter().flatten())
                            .ok_or_else(no_values)?,
                    ),
                };
                Self::fill_nulls(df, &col, fill)?;
                outcome.filled = missing;
            }
            ImputeStrategy::Constant(value) => {
                let fill = match kind {
                    ColumnKind::Numeric => FillValue::parse_number(value, col.dtype(), column)?,
                    ColumnKind::Boolean => FillValue::parse_bool(value, column)?,
                    _ => FillValue::Text(value.clone()),
                };
                Self::fill_nulls(df, &col, fill)?;
                outcome.filled = missing;
            }
        }

        info!(
            "Imputed '{}' with {}: filled={}, rows_dropped={}, column_dropped={}",
            column,
            strategy.label(),
            outcome.filled,
            outcome.rows_dropped,
            outcome.column_dropped
        );
        Ok(outcome)
    }

    /// Replace the nulls of `target` with `fill`; non-null values are left as they are.
    ///
    /// The column keeps its dtype, except that integer columns filled with a
    /// non-integral number become Float64. A fill that does not fit the dtype
    /// is rejected with `InvalidConstant`.
    fn fill_nulls(
        df: &mut DataFrame,
        target: &Column,
        fill: FillValue,
    ) -> Result<(), ProcessorError> {
        let name = target.name().to_string();
        let original = target.dtype().clone();
        let dtype = match &fill {
            FillValue::Float(_) if !original.is_float() => DataType::Float64,
            FillValue::Text(_) => DataType::String,
            _ => original.clone(),
        };
        let invalid = || ProcessorError::InvalidConstant(fill.to_string(), name.clone());

        // Range and format check before touching the column
        fill.scalar().strict_cast(&dtype).map_err(|_| invalid())?;

        let filled = DataFrame::new(vec![target.clone()])?
            .lazy()
            .select([col(name.as_str())
                .strict_cast(dtype.clone())
                .fill_null(fill.expr().strict_cast(dtype.clone()))])
            .collect()?;
        let mut series = filled.column(&name)?.as_materialized_series().clone();
        if dtype != original && matches!(fill, FillValue::Text(_)) {
            series = series.strict_cast(&original).map_err(|_| invalid())?;
        }
        debug!("Filled '{}' with {} as {}", name, fill, series.dtype());

        df.with_column(series)?;
        Ok(())
    }

    /// Most frequent integer, exact for the full i64 range; ties go to the smallest.
    fn integer_mode(column: &Column) -> Option<i64> {
        let series = column
            .as_materialized_series()
            .cast(&DataType::Int64)
            .ok()?;
        let mut counts: HashMap<i64, usize> = HashMap::new();
        for v in series.i64().ok()?.into_iter().flatten() {
            *counts.entry(v).or_default() += 1;
        }
        counts
            .into_iter()
            .max_by(|(va, ca), (vb, cb)| ca.cmp(cb).then_with(|| vb.cmp(va)))
            .map(|(value, _)| value)
    }

    /// Most frequent value; ties go to the smallest.
    pub fn numeric_mode(values: &[f64]) -> Option<f64> {
        let sorted = StatsCalculator::sorted(values);
        let mut best: Option<(f64, usize)> = None;
        let mut i = 0;
        while i < sorted.len() {
            let mut j = i;
            while j < sorted.len() && sorted[j] == sorted[i] {
                j += 1;
            }
            if best.map_or(true, |(_, count)| j - i > count) {
                best = Some((sorted[i], j - i));
            }
            i = j;
        }
        best.map(|(value, _)| value)
    }

    /// Most frequent string; ties go to the first in sort order.
    pub fn text_mode(values: impl IntoIterator<Item = String>) -> Option<String> {
        StatsCalculator::count_values(values)
            .into_iter()
            .next()
            .map(|vc| vc.value)
    }

    /// Remove the given columns.
    pub fn drop_columns(df: &mut DataFrame, columns: &[String]) -> Result<(), ProcessorError> {
        if columns.is_empty() {
            return Err(ProcessorError::EmptySelection);
        }
        for name in columns {
            df.drop_in_place(name)
                .map_err(|_| ProcessorError::ColumnNotFound(name.clone()))?;
        }
        info!("Dropped columns: {:?}", columns);
        Ok(())
    }

    /// Remove exact duplicate rows, keeping the first; returns how many were removed.
    pub fn drop_duplicate_rows(df: &mut DataFrame) -> Result<usize, ProcessorError> {
        let keep: Vec<bool> = duplicate_mask(df).into_iter().map(|dup| !dup).collect();
        let removed = keep.iter().filter(|&&k| !k).count();
        if removed > 0 {
            let mask = BooleanChunked::from_slice("keep".into(), &keep);
            *df = df.filter(&mask)?;
        }
        info!("Removed {} duplicate rows", removed);
        Ok(removed)
    }

    /// Group by one column and aggregate another, sorted by group key.
    /// Rows with a null group key are excluded.
    ///
    /// Output columns: [group_col, "<value_col>_<func>"]
    pub fn group_aggregate(
        df: &DataFrame,
        group_col: &str,
        value_col: &str,
        func: AggFunc,
    ) -> Result<DataFrame, ProcessorError> {
        df.column(group_col)
            .map_err(|_| ProcessorError::ColumnNotFound(group_col.to_string()))?;
        let value = df
            .column(value_col)
            .map_err(|_| ProcessorError::ColumnNotFound(value_col.to_string()))?;

        if func != AggFunc::Count && ColumnKind::of(value.dtype()) != ColumnKind::Numeric {
            return Err(ProcessorError::NotNumeric(value_col.to_string()));
        }

        let alias = format!("{}_{}", value_col, func.suffix());
        let result = df
            .clone()
            .lazy()
            .filter(col(group_col).is_not_null())
            .group_by([col(group_col)])
            .agg([func.expr(value_col).alias(alias.as_str())])
            .sort_by_exprs([col(group_col)], SortMultipleOptions::default())
            .collect()?;

        info!(
            "Grouped by '{}' with {}({}): {} groups",
            group_col,
            func.label(),
            value_col,
            result.height()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::numeric_values_with_nulls;

    fn sample() -> DataFrame {
        df!(
            "age" => [Some(20i64), None, Some(30), Some(30), None],
            "score" => [Some(1.5), Some(2.5), None, Some(4.0), Some(2.5)],
            "city" => [Some("Pune"), None, Some("Delhi"), Some("Pune"), Some("Delhi")],
            "dept" => ["a", "b", "a", "b", "a"]
        )
        .unwrap()
    }

    #[test]
    fn test_columns_with_missing() {
        let missing = DataProcessor::columns_with_missing(&sample());
        assert_eq!(
            missing,
            vec![
                ("age".to_string(), 2),
                ("score".to_string(), 1),
                ("city".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_impute_mean_upcasts_integer() {
        let mut df = sample();
        let outcome = DataProcessor::impute(&mut df, "age", &ImputeStrategy::Mean).unwrap();
        assert_eq!(outcome.filled, 2);
        assert_eq!(df.column("age").unwrap().null_count(), 0);
        assert_eq!(df.column("age").unwrap().dtype(), &DataType::Float64);
        let values = numeric_values_with_nulls(&df, "age");
        assert!((values[1].unwrap() - 80.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_impute_median_keeps_integer() {
        let mut df = sample();
        DataProcessor::impute(&mut df, "age", &ImputeStrategy::Median).unwrap();
        assert_eq!(df.column("age").unwrap().dtype(), &DataType::Int64);
        assert_eq!(numeric_values_with_nulls(&df, "age")[4], Some(30.0));
    }

    #[test]
    fn test_impute_mode_text_and_numeric() {
        let mut df = sample();
        DataProcessor::impute(&mut df, "city", &ImputeStrategy::Mode).unwrap();
        // tie between Delhi and Pune resolves to the first in sort order
        assert_eq!(
            crate::data::string_values(&df, "city")[1].as_deref(),
            Some("Delhi")
        );

        DataProcessor::impute(&mut df, "score", &ImputeStrategy::Mode).unwrap();
        assert_eq!(numeric_values_with_nulls(&df, "score")[2], Some(2.5));
    }

    #[test]
    fn test_impute_constant() {
        let mut df = sample();
        DataProcessor::impute(&mut df, "city", &ImputeStrategy::Constant("Unknown".into()))
            .unwrap();
        assert_eq!(
            crate::data::string_values(&df, "city")[1].as_deref(),
            Some("Unknown")
        );

        let err = DataProcessor::impute(&mut df, "score", &ImputeStrategy::Constant("abc".into()));
        assert!(matches!(err, Err(ProcessorError::InvalidConstant(..))));

        DataProcessor::impute(&mut df, "score", &ImputeStrategy::Constant("0".into())).unwrap();
        assert_eq!(numeric_values_with_nulls(&df, "score")[2], Some(0.0));
    }

    #[test]
    fn test_impute_drop_rows_and_column() {
        let mut df = sample();
        let outcome = DataProcessor::impute(&mut df, "age", &ImputeStrategy::DropRows).unwrap();
        assert_eq!(outcome.rows_dropped, 2);
        assert_eq!(df.height(), 3);

        let outcome = DataProcessor::impute(&mut df, "city", &ImputeStrategy::DropColumn).unwrap();
        assert!(outcome.column_dropped);
        assert!(df.column("city").is_err());
    }

    #[test]
    fn test_impute_errors() {
        let mut df = sample();
        assert!(matches!(
            DataProcessor::impute(&mut df, "city", &ImputeStrategy::Mean),
            Err(ProcessorError::NotNumeric(_))
        ));
        assert!(matches!(
            DataProcessor::impute(&mut df, "nope", &ImputeStrategy::Mode),
            Err(ProcessorError::ColumnNotFound(_))
        ));

        let mut empty = df!("x" => [None::<f64>, None]).unwrap();
        assert!(matches!(
            DataProcessor::impute(&mut empty, "x", &ImputeStrategy::Median),
            Err(ProcessorError::NoValues(_))
        ));
    }

    #[test]
    fn test_modes() {
        assert_eq!(DataProcessor::numeric_mode(&[3.0, 1.0, 3.0, 1.0, 2.0]), Some(1.0));
        assert_eq!(DataProcessor::numeric_mode(&[]), None);
        assert_eq!(
            DataProcessor::text_mode(vec!["b".to_string(), "a".to_string(), "b".to_string()]),
            Some("b".to_string())
        );
    }

    #[test]
    fn test_drop_columns() {
        let mut df = sample();
        DataProcessor::drop_columns(&mut df, &["age".to_string(), "dept".to_string()]).unwrap();
        assert_eq!(df.width(), 2);
        assert!(matches!(
            DataProcessor::drop_columns(&mut df, &[]),
            Err(ProcessorError::EmptySelection)
        ));
    }

    #[test]
    fn test_drop_duplicate_rows() {
        let mut df = df!("a" => [1i64, 1, 2], "b" => ["x", "x", "x"]).unwrap();
        assert_eq!(DataProcessor::drop_duplicate_rows(&mut df).unwrap(), 1);
        assert_eq!(df.height(), 2);
        assert_eq!(DataProcessor::drop_duplicate_rows(&mut df).unwrap(), 0);
    }

    #[test]
    fn test_group_aggregate() {
        let df = sample();
        let out = DataProcessor::group_aggregate(&df, "dept", "score", AggFunc::Sum).unwrap();
        let names: Vec<String> = out.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["dept", "score_sum"]);
        assert_eq!(out.height(), 2);
        assert_eq!(crate::data::string_values(&out, "dept")[0].as_deref(), Some("a"));
        assert_eq!(numeric_values_with_nulls(&out, "score_sum"), vec![Some(4.0), Some(6.5)]);

        let counts = DataProcessor::group_aggregate(&df, "dept", "city", AggFunc::Count).unwrap();
        assert_eq!(numeric_values_with_nulls(&counts, "city_count"), vec![Some(3.0), Some(1.0)]);
    }

    #[test]
    fn test_group_aggregate_errors() {
        let df = sample();
        assert!(matches!(
            DataProcessor::group_aggregate(&df, "dept", "city", AggFunc::Mean),
            Err(ProcessorError::NotNumeric(_))
        ));
        assert!(matches!(
            DataProcessor::group_aggregate(&df, "missing", "score", AggFunc::Mean),
            Err(ProcessorError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_fill_keeps_large_integers_exact() {
        let big = 9_007_199_254_740_993i64; // 2^53 + 1
        let mut df = df!("id" => [Some(big), None, Some(3)]).unwrap();
        DataProcessor::impute(&mut df, "id", &ImputeStrategy::Constant("0".into())).unwrap();

        let id = df.column("id").unwrap();
        assert_eq!(id.dtype(), &DataType::Int64);
        let values: Vec<Option<i64>> = id.i64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(big), Some(0), Some(3)]);

        let mut df = df!("id" => [Some(big), None, Some(big), Some(3)]).unwrap();
        DataProcessor::impute(&mut df, "id", &ImputeStrategy::Mode).unwrap();
        assert_eq!(df.column("id").unwrap().i64().unwrap().get(1), Some(big));
    }

    #[test]
    fn test_fill_boolean_column() {
        let mut df = df!("flag" => [Some(true), None, Some(true), Some(false)]).unwrap();
        let outcome = DataProcessor::impute(&mut df, "flag", &ImputeStrategy::Mode).unwrap();
        assert_eq!(outcome.filled, 1);
        let flag = df.column("flag").unwrap();
        assert_eq!(flag.dtype(), &DataType::Boolean);
        assert_eq!(flag.bool().unwrap().get(1), Some(true));

        let mut df = df!("flag" => [Some(true), None]).unwrap();
        DataProcessor::impute(&mut df, "flag", &ImputeStrategy::Constant("False".into()))
            .unwrap();
        assert_eq!(df.column("flag").unwrap().bool().unwrap().get(1), Some(false));

        let err = DataProcessor::impute(&mut df, "flag", &ImputeStrategy::Constant("maybe".into()));
        assert!(matches!(err, Err(ProcessorError::InvalidConstant(..))));
    }

    #[test]
    fn test_fill_out_of_range_is_rejected() {
        let mut df = df!("u" => [Some(1u32), None]).unwrap();
        let err = DataProcessor::impute(&mut df, "u", &ImputeStrategy::Constant("-1".into()));
        assert!(matches!(err, Err(ProcessorError::InvalidConstant(..))));
        // column untouched
        assert_eq!(df.column("u").unwrap().null_count(), 1);
        assert_eq!(df.column("u").unwrap().dtype(), &DataType::UInt32);

        DataProcessor::impute(&mut df, "u", &ImputeStrategy::Constant("7".into())).unwrap();
        let u = df.column("u").unwrap();
        assert_eq!(u.dtype(), &DataType::UInt32);
        assert_eq!(u.u32().unwrap().get(1), Some(7));
    }

    #[test]
    fn test_group_aggregate_skips_null_keys() {
        let df = df!(
            "g" => [Some("a"), None, Some("a"), None, Some("b")],
            "v" => [1.0, 100.0, 2.0, 100.0, 5.0]
        )
        .unwrap();
        let out = DataProcessor::group_aggregate(&df, "g", "v", AggFunc::Sum).unwrap();
        assert_eq!(out.height(), 2);
        assert_eq!(out.column("g").unwrap().null_count(), 0);
        assert_eq!(numeric_values_with_nulls(&out, "v_sum"), vec![Some(3.0), Some(5.0)]);
    }
}
