//! Stats module - descriptive statistics and dataset profiling

mod calculator;
mod profile;

pub use calculator::{
    BoxStats, ColumnSummary, CorrelationMatrix, HistogramBin, StatsCalculator, ValueCount,
};
pub use profile::{duplicate_mask, profile_dataset, ColumnProfile, DatasetProfile};
