//! Chart Viewer Widget
//! Visualizations tab: numeric and categorical chart selectors, correlation
//! heatmap, pairplot and outlier boxplots.

use crate::charts::{ChartPlotter, PairplotData};
use crate::config::AppConfig;
use crate::data::{numeric_values, numeric_values_with_nulls, DataLoader};
use crate::stats::{BoxStats, CorrelationMatrix, HistogramBin, StatsCalculator, ValueCount};
use egui::{Color32, ComboBox, RichText, ScrollArea};
use polars::prelude::DataFrame;
use tracing::debug;

const CHART_HEIGHT: f32 = 380.0;
const PIE_SIZE: f32 = 340.0;
const PAIR_CELL: f32 = 170.0;
const PAIR_BINS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericChart {
    Histogram,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoricalChart {
    CountPlot,
    Pie,
}

/// Chart the user asked to save as PNG.
#[derive(Debug, Clone)]
pub enum ExportRequest {
    Histogram {
        column: String,
        bins: Vec<HistogramBin>,
    },
    ValueCounts {
        column: String,
        counts: Vec<ValueCount>,
    },
}

/// Actions triggered by the chart viewer
#[derive(Debug, Clone)]
pub enum ChartViewerAction {
    None,
    Export(ExportRequest),
}

pub struct ChartViewer {
    version: Option<u64>,
    numeric_cols: Vec<String>,
    categorical_cols: Vec<String>,

    selected_num: String,
    num_chart: NumericChart,
    selected_cat: String,
    cat_chart: CategoricalChart,

    histogram: Option<(String, Vec<HistogramBin>)>,
    line_values: Option<(String, Vec<Option<f64>>)>,
    counts: Option<(String, Vec<ValueCount>)>,
    correlation: Option<CorrelationMatrix>,

    pair_selection: Vec<bool>,
    pairplot: Option<PairplotData>,
    box_selection: Vec<bool>,
    boxes: Vec<(String, BoxStats)>,
}

impl Default for ChartViewer {
    fn default() -> Self {
        Self {
            version: None,
            numeric_cols: Vec::new(),
            categorical_cols: Vec::new(),
            selected_num: String::new(),
            num_chart: NumericChart::Histogram,
            selected_cat: String::new(),
            cat_chart: CategoricalChart::CountPlot,
            histogram: None,
            line_values: None,
            counts: None,
            correlation: None,
            pair_selection: Vec::new(),
            pairplot: None,
            box_selection: Vec::new(),
            boxes: Vec::new(),
        }
    }
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all charts
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Drop cached chart data when the dataset changed.
    pub fn refresh(&mut self, loader: &DataLoader, version: u64, config: &AppConfig) {
        if self.version == Some(version) {
            return;
        }
        self.version = Some(version);

        self.numeric_cols = loader.get_numeric_columns();
        self.categorical_cols = loader.get_categorical_columns();

        if !self.numeric_cols.contains(&self.selected_num) {
            self.selected_num = self.numeric_cols.first().cloned().unwrap_or_default();
        }
        if !self.categorical_cols.contains(&self.selected_cat) {
            self.selected_cat = self.categorical_cols.first().cloned().unwrap_or_default();
        }

        self.histogram = None;
        self.line_values = None;
        self.counts = None;
        self.correlation = None;
        self.pairplot = None;
        self.boxes.clear();

        let n = self.numeric_cols.len();
        self.pair_selection = (0..n).map(|i| i < config.pairplot_max_columns.min(3)).collect();
        self.box_selection = (0..n).map(|i| i == 0).collect();
        debug!("Chart viewer refreshed for dataset version {}", version);
    }

    fn selected(columns: &[String], selection: &[bool]) -> Vec<String> {
        columns
            .iter()
            .zip(selection.iter())
            .filter(|(_, &s)| s)
            .map(|(c, _)| c.clone())
            .collect()
    }

    /// Sample rows and build diagonal histograms for the pairplot.
    pub fn build_pairplot(df: &DataFrame, columns: &[String], max_points: usize) -> PairplotData {
        let indices = StatsCalculator::sample_indices(df.height(), max_points);
        let values = columns
            .iter()
            .map(|name| {
                let all = numeric_values_with_nulls(df, name);
                indices.iter().map(|&i| all.get(i).copied().flatten()).collect()
            })
            .collect();
        let histograms = columns
            .iter()
            .map(|name| StatsCalculator::histogram(&numeric_values(df, name), PAIR_BINS))
            .collect();

        PairplotData {
            columns: columns.to_vec(),
            values,
            histograms,
        }
    }

    fn ensure_numeric_cache(&mut self, df: &DataFrame, config: &AppConfig) {
        let column = self.selected_num.clone();
        match self.num_chart {
            NumericChart::Histogram => {
                if self.histogram.as_ref().map(|(c, _)| c) != Some(&column) {
                    let bins =
                        StatsCalculator::histogram(&numeric_values(df, &column), config.histogram_bins);
                    self.histogram = Some((column, bins));
                }
            }
            NumericChart::Line => {
                if self.line_values.as_ref().map(|(c, _)| c) != Some(&column) {
                    let values = numeric_values_with_nulls(df, &column);
                    self.line_values = Some((column, values));
                }
            }
        }
    }

    fn ensure_counts_cache(&mut self, df: &DataFrame) {
        let column = self.selected_cat.clone();
        if self.counts.as_ref().map(|(c, _)| c) != Some(&column) {
            let counts = StatsCalculator::value_counts(df, &column);
            self.counts = Some((column, counts));
        }
    }

    /// Draw the visualizations tab
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        loader: &DataLoader,
        config: &AppConfig,
    ) -> ChartViewerAction {
        let mut action = ChartViewerAction::None;
        let Some(df) = loader.get_dataframe() else {
            return action;
        };

        ui.label(RichText::new("📊 Explore Your Data").size(18.0).strong());
        ui.add_space(8.0);

        // ===== Numeric Visualization =====
        ui.label(RichText::new("📈 Visualize Numeric Column").size(15.0).strong());
        if self.numeric_cols.is_empty() {
            Self::info(ui, "No numeric columns available for visualization.");
        } else {
            ui.horizontal(|ui| {
                ui.label("Choose a numeric column");
                ComboBox::from_id_salt("num_col")
                    .width(200.0)
                    .selected_text(self.selected_num.as_str())
                    .show_ui(ui, |ui| {
                        for col in &self.numeric_cols {
                            ui.selectable_value(&mut self.selected_num, col.clone(), col);
                        }
                    });
                ui.add_space(12.0);
                ui.radio_value(&mut self.num_chart, NumericChart::Histogram, "Histogram");
                ui.radio_value(&mut self.num_chart, NumericChart::Line, "Line Chart");
            });

            self.ensure_numeric_cache(df, config);
            match self.num_chart {
                NumericChart::Histogram => {
                    if let Some((column, bins)) = &self.histogram {
                        ui.label(RichText::new(format!("Histogram of {}", column)).strong());
                        ChartPlotter::draw_histogram(ui, column, bins, CHART_HEIGHT);
                        if ui.button("💾 Export PNG").clicked() {
                            action = ChartViewerAction::Export(ExportRequest::Histogram {
                                column: column.clone(),
                                bins: bins.clone(),
                            });
                        }
                    }
                }
                NumericChart::Line => {
                    if let Some((column, values)) = &self.line_values {
                        ui.label(RichText::new(format!("Line Chart of {}", column)).strong());
                        ChartPlotter::draw_line_chart(ui, column, values, CHART_HEIGHT);
                    }
                }
            }
        }

        ui.add_space(12.0);
        ui.separator();

        // ===== Categorical Visualization =====
        ui.label(RichText::new("📊 Visualize Categorical Column").size(15.0).strong());
        if self.categorical_cols.is_empty() {
            Self::info(ui, "No categorical columns available for visualization.");
        } else {
            ui.horizontal(|ui| {
                ui.label("Choose a categorical column");
                ComboBox::from_id_salt("cat_col")
                    .width(200.0)
                    .selected_text(self.selected_cat.as_str())
                    .show_ui(ui, |ui| {
                        for col in &self.categorical_cols {
                            ui.selectable_value(&mut self.selected_cat, col.clone(), col);
                        }
                    });
                ui.add_space(12.0);
                ui.radio_value(&mut self.cat_chart, CategoricalChart::CountPlot, "Count Plot");
                ui.radio_value(&mut self.cat_chart, CategoricalChart::Pie, "Pie Chart");
            });

            self.ensure_counts_cache(df);
            if let Some((column, counts)) = &self.counts {
                match self.cat_chart {
                    CategoricalChart::CountPlot => {
                        ui.label(RichText::new(format!("Count Plot of {}", column)).strong());
                        ChartPlotter::draw_count_plot(ui, column, counts, CHART_HEIGHT);
                        if ui.button("💾 Export PNG").clicked() {
                            action = ChartViewerAction::Export(ExportRequest::ValueCounts {
                                column: column.clone(),
                                counts: counts.clone(),
                            });
                        }
                    }
                    CategoricalChart::Pie => {
                        ui.label(RichText::new(format!("Pie Chart of {}", column)).strong());
                        ChartPlotter::draw_pie_chart(ui, counts, PIE_SIZE);
                    }
                }
            }
        }

        ui.add_space(12.0);
        ui.separator();

        // ===== Correlation =====
        egui::CollapsingHeader::new(RichText::new("🔗 Correlation Heatmap").size(15.0).strong())
            .default_open(false)
            .show(ui, |ui| {
                if self.numeric_cols.len() < 2 {
                    Self::info(ui, "Need at least two numeric columns for correlations.");
                    return;
                }
                let matrix = self.correlation.get_or_insert_with(|| {
                    StatsCalculator::correlation_matrix(df, &self.numeric_cols)
                });
                let height = (matrix.columns.len() as f32 * 60.0).clamp(240.0, 640.0);
                ChartPlotter::draw_heatmap(ui, matrix, height);
            });

        // ===== Pairplot =====
        egui::CollapsingHeader::new(RichText::new("🔢 Pairplot").size(15.0).strong())
            .default_open(false)
            .show(ui, |ui| {
                if self.numeric_cols.len() < 2 {
                    Self::info(ui, "Need at least two numeric columns for a pairplot.");
                    return;
                }
                let max = config.pairplot_max_columns;
                ui.label(format!("Select up to {} numeric columns", max));
                ui.horizontal_wrapped(|ui| {
                    let count = self.pair_selection.iter().filter(|&&s| s).count();
                    for (i, col) in self.numeric_cols.iter().enumerate() {
                        if let Some(selected) = self.pair_selection.get_mut(i) {
                            ui.add_enabled_ui(*selected || count < max, |ui| {
                                ui.checkbox(selected, col);
                            });
                        }
                    }
                });

                let columns = Self::selected(&self.numeric_cols, &self.pair_selection);
                ui.add_enabled_ui(columns.len() >= 2, |ui| {
                    if ui.button("▶ Generate Pairplot").clicked() {
                        self.pairplot =
                            Some(Self::build_pairplot(df, &columns, config.pairplot_max_points));
                    }
                });

                if let Some(data) = &self.pairplot {
                    ScrollArea::both()
                        .id_salt("pairplot_scroll")
                        .max_height(PAIR_CELL * 4.0)
                        .show(ui, |ui| ChartPlotter::draw_pairplot(ui, data, PAIR_CELL));
                }
            });

        // ===== Outliers =====
        egui::CollapsingHeader::new(RichText::new("📦 Outlier Detection").size(15.0).strong())
            .default_open(false)
            .show(ui, |ui| {
                if self.numeric_cols.is_empty() {
                    Self::info(ui, "No numeric columns available for outlier detection.");
                    return;
                }
                let before = self.box_selection.clone();
                ui.horizontal_wrapped(|ui| {
                    for (i, col) in self.numeric_cols.iter().enumerate() {
                        if let Some(selected) = self.box_selection.get_mut(i) {
                            ui.checkbox(selected, col);
                        }
                    }
                });
                if before != self.box_selection || self.boxes.is_empty() {
                    self.boxes = Self::selected(&self.numeric_cols, &self.box_selection)
                        .into_iter()
                        .filter_map(|name| {
                            StatsCalculator::box_stats(&numeric_values(df, &name)).map(|bs| (name, bs))
                        })
                        .collect();
                }
                if self.boxes.is_empty() {
                    return;
                }

                ChartPlotter::draw_boxplots(ui, &self.boxes, CHART_HEIGHT);
                ui.add_space(6.0);
                egui::Grid::new("outlier_table")
                    .striped(true)
                    .spacing([16.0, 4.0])
                    .show(ui, |ui| {
                        for header in ["Column", "Mean", "Lower fence", "Upper fence", "Outliers"] {
                            ui.label(RichText::new(header).strong());
                        }
                        ui.end_row();
                        for (name, bs) in &self.boxes {
                            ui.label(name);
                            ui.label(format!("{:.3}", bs.mean));
                            ui.label(format!("{:.3}", bs.lower_fence));
                            ui.label(format!("{:.3}", bs.upper_fence));
                            let text = RichText::new(bs.outliers.len().to_string());
                            ui.label(if bs.outliers.is_empty() {
                                text
                            } else {
                                text.color(Color32::from_rgb(220, 53, 69))
                            });
                            ui.end_row();
                        }
                    });
            });

        action
    }

    fn info(ui: &mut egui::Ui, text: &str) {
        egui::Frame::none()
            .fill(Color32::from_rgb(209, 236, 241))
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.label(RichText::new(text).color(Color32::from_rgb(12, 84, 96)));
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use std::path::PathBuf;

    #[test]
    fn test_build_pairplot_samples_rows() {
        let df = df!(
            "a" => (0..100).map(|v| v as f64).collect::<Vec<_>>(),
            "b" => (0..100).map(|v| (v * 2) as f64).collect::<Vec<_>>()
        )
        .unwrap();
        let data =
            ChartViewer::build_pairplot(&df, &["a".to_string(), "b".to_string()], 10);
        assert_eq!(data.columns.len(), 2);
        assert_eq!(data.values[0].len(), 10);
        assert_eq!(data.values[1][1], Some(20.0));
        // diagonal histograms use every row
        assert_eq!(data.histograms[0].iter().map(|b| b.count).sum::<usize>(), 100);
    }

    #[test]
    fn test_refresh_picks_default_columns() {
        let df = df!(
            "x" => [1.0, 2.0],
            "y" => [3i64, 4],
            "label" => ["p", "q"]
        )
        .unwrap();
        let mut loader = DataLoader::new();
        loader.set_dataframe(df, PathBuf::from("t.csv"));

        let mut viewer = ChartViewer::new();
        viewer.refresh(&loader, 1, &AppConfig::default());
        assert_eq!(viewer.selected_num, "x");
        assert_eq!(viewer.selected_cat, "label");
        assert_eq!(viewer.pair_selection, vec![true, true]);
        assert_eq!(viewer.box_selection, vec![true, false]);
    }
}
