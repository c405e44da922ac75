//! CSV Data Loader Module
//! Handles CSV file loading, column classification and table previews using Polars.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("No data loaded")]
    NoData,
}

/// Broad column category used to decide which panels a column appears in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Boolean,
    Temporal,
    Other,
}

impl ColumnKind {
    pub fn of(dtype: &DataType) -> Self {
        match dtype {
            DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => ColumnKind::Numeric,
            DataType::String | DataType::Categorical(..) | DataType::Enum(..) => {
                ColumnKind::Categorical
            }
            DataType::Boolean => ColumnKind::Boolean,
            DataType::Date | DataType::Datetime(..) | DataType::Time | DataType::Duration(..) => {
                ColumnKind::Temporal
            }
            _ => ColumnKind::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Categorical => "categorical",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Temporal => "temporal",
            ColumnKind::Other => "other",
        }
    }
}

/// Per-column info for the dataset overview.
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
    pub kind: ColumnKind,
    pub null_count: usize,
    pub non_null: usize,
}

/// Rows rendered as strings for table display.
#[derive(Debug, Clone, Default)]
pub struct TablePreview {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read a CSV file into a DataFrame.
pub fn read_csv(file_path: &Path, infer_schema_length: usize) -> Result<DataFrame, LoaderError> {
    // Use lazy evaluation for memory efficiency, then collect
    let df = LazyCsvReader::new(file_path)
        .with_infer_schema_length(Some(infer_schema_length))
        .with_ignore_errors(true)
        .finish()?
        .collect()?;
    Ok(df)
}

/// Non-null, finite values of a column cast to f64.
pub fn numeric_values(df: &DataFrame, column: &str) -> Vec<f64> {
    numeric_values_with_nulls(df, column)
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect()
}

/// Positional values of a column cast to f64 (None for nulls or failed casts).
pub fn numeric_values_with_nulls(df: &DataFrame, column: &str) -> Vec<Option<f64>> {
    df.column(column)
        .ok()
        .and_then(|col| col.as_materialized_series().cast(&DataType::Float64).ok())
        .and_then(|series| series.f64().ok().map(|ca| ca.into_iter().collect()))
        .unwrap_or_default()
}

/// Positional values of a column rendered as strings (None for nulls).
pub fn string_values(df: &DataFrame, column: &str) -> Vec<Option<String>> {
    df.column(column)
        .ok()
        .map(column_strings)
        .unwrap_or_default()
}

/// Render every cell of a column as a string.
pub fn column_strings(col: &Column) -> Vec<Option<String>> {
    col.as_materialized_series()
        .cast(&DataType::String)
        .ok()
        .and_then(|series| {
            series
                .str()
                .ok()
                .map(|ca| ca.into_iter().map(|v| v.map(str::to_string)).collect())
        })
        .unwrap_or_else(|| {
            (0..col.len())
                .map(|i| {
                    col.get(i).ok().and_then(|val| {
                        if val.is_null() {
                            None
                        } else {
                            Some(val.to_string().trim_matches('"').to_string())
                        }
                    })
                })
                .collect()
        })
}

/// Holds the uploaded dataset for the session.
pub struct DataLoader {
    df: Option<DataFrame>,
    file_path: Option<PathBuf>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            df: None,
            file_path: None,
        }
    }

    /// Load a CSV file, replacing any previous dataset.
    pub fn load_csv(
        &mut self,
        file_path: &Path,
        infer_schema_length: usize,
    ) -> Result<&DataFrame, LoaderError> {
        let df = read_csv(file_path, infer_schema_length)?;
        self.file_path = Some(file_path.to_path_buf());
        self.df = Some(df);
        self.df.as_ref().ok_or(LoaderError::NoData)
    }

    /// Get list of column names from loaded DataFrame.
    pub fn get_columns(&self) -> Vec<String> {
        self.df
            .as_ref()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn columns_of_kind(&self, kind: ColumnKind) -> Vec<String> {
        let Some(df) = &self.df else {
            return Vec::new();
        };

        df.get_columns()
            .iter()
            .filter(|col| ColumnKind::of(col.dtype()) == kind)
            .map(|col| col.name().to_string())
            .collect()
    }

    /// Get list of numeric column names.
    pub fn get_numeric_columns(&self) -> Vec<String> {
        self.columns_of_kind(ColumnKind::Numeric)
    }

    /// Get list of text/categorical column names.
    pub fn get_categorical_columns(&self) -> Vec<String> {
        self.columns_of_kind(ColumnKind::Categorical)
    }

    /// Dtype, kind and missing count of every column.
    pub fn column_info(&self) -> Vec<ColumnInfo> {
        let Some(df) = &self.df else {
            return Vec::new();
        };

        df.get_columns()
            .iter()
            .map(|col| {
                let null_count = col.null_count();
                ColumnInfo {
                    name: col.name().to_string(),
                    dtype: col.dtype().to_string(),
                    kind: ColumnKind::of(col.dtype()),
                    null_count,
                    non_null: col.len() - null_count,
                }
            })
            .collect()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        self.df
            .as_ref()
            .map(|df| (df.height(), df.width()))
            .unwrap_or((0, 0))
    }

    /// First `limit` rows as strings.
    pub fn preview(&self, limit: usize) -> TablePreview {
        self.df
            .as_ref()
            .map(|df| Self::preview_frame(df, limit))
            .unwrap_or_default()
    }

    /// First `limit` rows of any DataFrame as strings; nulls render empty.
    pub fn preview_frame(df: &DataFrame, limit: usize) -> TablePreview {
        let head = df.head(Some(limit));
        let headers: Vec<String> = head
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let columns: Vec<Vec<Option<String>>> =
            head.get_columns().iter().map(column_strings).collect();

        let rows = (0..head.height())
            .map(|i| {
                columns
                    .iter()
                    .map(|col| col.get(i).cloned().flatten().unwrap_or_default())
                    .collect()
            })
            .collect();

        TablePreview { headers, rows }
    }

    /// Get a reference to the loaded DataFrame.
    pub fn get_dataframe(&self) -> Option<&DataFrame> {
        self.df.as_ref()
    }

    /// Mutable access for in-place cleaning operations.
    pub fn get_dataframe_mut(&mut self) -> Result<&mut DataFrame, LoaderError> {
        self.df.as_mut().ok_or(LoaderError::NoData)
    }

    /// Get file path.
    pub fn get_file_path(&self) -> Option<&PathBuf> {
        self.file_path.as_ref()
    }

    /// Set DataFrame directly (used for async loading)
    pub fn set_dataframe(&mut self, df: DataFrame, file_path: PathBuf) {
        self.df = Some(df);
        self.file_path = Some(file_path);
    }

    /// Discard the current dataset.
    pub fn clear(&mut self) {
        self.df = None;
        self.file_path = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_loader() -> DataLoader {
        let df = df!(
            "age" => [Some(25i64), Some(31), None, Some(47)],
            "income" => [50_000.0, 61_000.5, 72_000.0, 58_000.0],
            "city" => [Some("Pune"), Some("Delhi"), Some("Pune"), None],
            "member" => [true, false, true, true]
        )
        .unwrap();
        let mut loader = DataLoader::new();
        loader.set_dataframe(df, PathBuf::from("people.csv"));
        loader
    }

    #[test]
    fn test_empty_loader() {
        let loader = DataLoader::new();
        assert!(loader.get_columns().is_empty());
        assert!(loader.get_numeric_columns().is_empty());
        assert_eq!(loader.shape(), (0, 0));
        assert!(loader.preview(10).rows.is_empty());
    }

    #[test]
    fn test_column_classification() {
        let loader = sample_loader();
        assert_eq!(loader.get_numeric_columns(), vec!["age", "income"]);
        assert_eq!(loader.get_categorical_columns(), vec!["city"]);
        assert_eq!(loader.shape(), (4, 4));

        let info = loader.column_info();
        assert_eq!(info[0].null_count, 1);
        assert_eq!(info[0].non_null, 3);
        assert_eq!(info[3].kind, ColumnKind::Boolean);
    }

    #[test]
    fn test_preview_renders_nulls_empty() {
        let loader = sample_loader();
        let preview = loader.preview(3);
        assert_eq!(preview.headers, vec!["age", "income", "city", "member"]);
        assert_eq!(preview.rows.len(), 3);
        assert_eq!(preview.rows[0][0], "25");
        assert_eq!(preview.rows[0][2], "Pune");
        assert_eq!(preview.rows[2][0], "");
    }

    #[test]
    fn test_numeric_values_skip_nulls() {
        let loader = sample_loader();
        let df = loader.get_dataframe().unwrap();
        assert_eq!(numeric_values(df, "age"), vec![25.0, 31.0, 47.0]);
        assert_eq!(numeric_values_with_nulls(df, "age")[2], None);
        assert!(numeric_values(df, "missing").is_empty());
    }

    #[test]
    fn test_read_csv_file() {
        let path = std::env::temp_dir().join(format!("vizcraft_loader_{}.csv", std::process::id()));
        std::fs::write(&path, "name,score,grade\nana,9.5,A\nbo,,B\ncy,7.0,A\n").unwrap();

        let mut loader = DataLoader::new();
        let df = loader.load_csv(&path, 100).unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(loader.get_numeric_columns(), vec!["score"]);
        assert_eq!(loader.get_categorical_columns(), vec!["name", "grade"]);
        assert_eq!(loader.get_file_path(), Some(&path));

        let _ = std::fs::remove_file(&path);
    }
}
