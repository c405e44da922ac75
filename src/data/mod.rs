//! Data module - CSV loading and in-place dataset operations

mod loader;
mod processor;

pub use loader::{
    column_strings, numeric_values, numeric_values_with_nulls, read_csv, string_values,
    ColumnInfo, ColumnKind, DataLoader, TablePreview,
};
pub use processor::{AggFunc, DataProcessor, ImputeStrategy};
