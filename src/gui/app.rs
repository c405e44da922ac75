//! VizCraft Main Application
//! Main window with control panel and the analysis tabs.

use crate::charts::StaticChartRenderer;
use crate::config::AppConfig;
use crate::data::{read_csv, DataLoader, DataProcessor, ImputeStrategy};
use crate::gui::{
    ChartViewer, ChartViewerAction, ControlPanel, ControlPanelAction, DataPanel, DataPanelAction,
    DatasetSummary, ExportRequest, ReportPanel, ReportPanelAction,
};
use crate::report::ReportGenerator;
use crate::stats::{profile_dataset, StatsCalculator};
use anyhow::Context;
use egui::{RichText, SidePanel};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::thread;
use tracing::{error, info, warn};

/// CSV loading result from background thread
enum LoadResult {
    Complete { df: DataFrame, path: PathBuf },
    Error(String),
}

/// Report generation result from background thread
enum ReportResult {
    /// Report written; `open_error` is set when the browser could not be launched.
    Complete {
        path: PathBuf,
        open_error: Option<String>,
    },
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Overview,
    Visualizations,
    Clean,
    Report,
}

impl Tab {
    const ALL: [Tab; 4] = [Tab::Overview, Tab::Visualizations, Tab::Clean, Tab::Report];

    fn label(self) -> &'static str {
        match self {
            Tab::Overview => "🔍 Overview",
            Tab::Visualizations => "📊 Visualizations",
            Tab::Clean => "🧹 Clean & Group",
            Tab::Report => "📑 Report",
        }
    }
}

/// Main application window.
pub struct VizCraftApp {
    config: AppConfig,
    loader: DataLoader,
    control_panel: ControlPanel,
    data_panel: DataPanel,
    chart_viewer: ChartViewer,
    report_panel: ReportPanel,
    tab: Tab,

    // Bumped on every load or in-place edit of the dataset
    dataset_version: u64,

    // Async CSV loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,

    // Async report generation
    report_rx: Option<Receiver<ReportResult>>,
}

impl VizCraftApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        initial_csv: Option<PathBuf>,
    ) -> Self {
        let mut app = Self {
            config,
            loader: DataLoader::new(),
            control_panel: ControlPanel::new(),
            data_panel: DataPanel::new(),
            chart_viewer: ChartViewer::new(),
            report_panel: ReportPanel::new(),
            tab: Tab::Overview,
            dataset_version: 0,
            load_rx: None,
            is_loading: false,
            report_rx: None,
        };
        if let Some(path) = initial_csv {
            app.load_initial(path);
        }
        app
    }

    /// Load the CSV given on the command line before the first frame.
    fn load_initial(&mut self, path: PathBuf) {
        info!("Loading CSV {:?}", path);
        self.control_panel.csv_path = Some(path.clone());
        match self.loader.load_csv(&path, self.config.infer_schema_length) {
            Ok(df) => {
                let status = format!(
                    "✅ File uploaded successfully! {} rows, {} columns",
                    df.height(),
                    df.width()
                );
                self.dataset_changed();
                self.control_panel.set_progress(100.0, &status);
            }
            Err(e) => {
                error!("CSV load failed: {}", e);
                self.control_panel.set_progress(0.0, &format!("Error: {}", e));
            }
        }
    }

    /// Handle CSV file selection
    fn handle_browse_csv(&mut self) {
        if self.is_loading {
            return;
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.start_load(path);
        }
    }

    /// Read the CSV in a background thread.
    fn start_load(&mut self, path: PathBuf) {
        info!("Loading CSV {:?}", path);
        self.control_panel.csv_path = Some(path.clone());
        self.control_panel.busy = true;
        self.control_panel.set_progress(10.0, "Loading CSV file...");
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        let infer = self.config.infer_schema_length;

        thread::spawn(move || {
            let result = match read_csv(&path, infer) {
                Ok(df) => LoadResult::Complete { df, path },
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(result);
        });
    }

    /// Check for CSV loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete { df, path }) => {
                let (rows, cols) = (df.height(), df.width());
                info!("Loaded {} rows, {} columns from {:?}", rows, cols, path);

                // Everything derived from the previous file is stale
                self.chart_viewer.clear();
                self.data_panel.reset();
                self.report_panel.reset();
                self.loader.set_dataframe(df, path);
                self.dataset_changed();

                self.control_panel.set_progress(
                    100.0,
                    &format!("✅ File uploaded successfully! {} rows, {} columns", rows, cols),
                );
                self.finish_loading();
            }
            Ok(LoadResult::Error(e)) => {
                error!("CSV load failed: {}", e);
                // A failed upload leaves no dataset behind
                self.loader.clear();
                self.chart_viewer.clear();
                self.data_panel.reset();
                self.report_panel.reset();
                self.dataset_changed();
                self.control_panel.set_progress(0.0, &format!("Error: {}", e));
                self.finish_loading();
            }
            Err(std::sync::mpsc::TryRecvError::Empty) => self.load_rx = Some(rx),
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                self.control_panel
                    .set_progress(0.0, "Error: loader thread exited unexpectedly");
                self.finish_loading();
            }
        }
    }

    fn finish_loading(&mut self) {
        self.is_loading = false;
        self.control_panel.busy = false;
    }

    /// Invalidate cached views after the dataset changed.
    fn dataset_changed(&mut self) {
        self.dataset_version += 1;
        self.control_panel.summary = self.loader.get_dataframe().map(|df| DatasetSummary {
            rows: df.height(),
            columns: df.width(),
            numeric: self.loader.get_numeric_columns().len(),
            categorical: self.loader.get_categorical_columns().len(),
            missing_cells: StatsCalculator::missing_counts(df).iter().map(|(_, n)| n).sum(),
        });
    }

    fn handle_data_action(&mut self, action: DataPanelAction) {
        match action {
            DataPanelAction::None => {}
            DataPanelAction::Impute { column, strategy } => self.handle_impute(&column, &strategy),
            DataPanelAction::DropColumns(columns) => {
                let result = self
                    .loader
                    .get_dataframe_mut()
                    .map_err(|e| e.to_string())
                    .and_then(|df| {
                        DataProcessor::drop_columns(df, &columns).map_err(|e| e.to_string())
                    });
                match result {
                    Ok(()) => {
                        self.dataset_changed();
                        self.control_panel
                            .set_progress(100.0, &format!("✅ Dropped columns: {}", columns.join(", ")));
                    }
                    Err(e) => self.report_error(&e),
                }
            }
            DataPanelAction::DropDuplicates => {
                let result = self
                    .loader
                    .get_dataframe_mut()
                    .map_err(|e| e.to_string())
                    .and_then(|df| DataProcessor::drop_duplicate_rows(df).map_err(|e| e.to_string()));
                match result {
                    Ok(removed) => {
                        self.dataset_changed();
                        self.control_panel
                            .set_progress(100.0, &format!("✅ Removed {} duplicate rows", removed));
                    }
                    Err(e) => self.report_error(&e),
                }
            }
            DataPanelAction::Aggregate {
                group_col,
                value_col,
                func,
            } => {
                let Some(df) = self.loader.get_dataframe() else {
                    return;
                };
                let result = DataProcessor::group_aggregate(df, &group_col, &value_col, func)
                    .map(|out| DataLoader::preview_frame(&out, self.config.preview_rows))
                    .map_err(|e| {
                        warn!("Aggregation failed: {}", e);
                        e.to_string()
                    });
                self.data_panel.set_aggregation(result);
            }
        }
    }

    fn handle_impute(&mut self, column: &str, strategy: &ImputeStrategy) {
        let result = self
            .loader
            .get_dataframe_mut()
            .map_err(|e| e.to_string())
            .and_then(|df| {
                DataProcessor::impute(df, column, strategy).map_err(|e| e.to_string())
            });

        match result {
            Ok(outcome) => {
                self.dataset_changed();
                let message = if outcome.column_dropped {
                    format!("✅ Dropped column '{}'", outcome.column)
                } else if outcome.rows_dropped > 0 {
                    format!(
                        "✅ Dropped {} rows with missing '{}'",
                        outcome.rows_dropped, outcome.column
                    )
                } else {
                    format!(
                        "✅ Filled {} missing values in '{}' ({})",
                        outcome.filled,
                        outcome.column,
                        strategy.label()
                    )
                };
                self.control_panel.set_progress(100.0, &message);
            }
            Err(e) => self.report_error(&e),
        }
    }

    fn report_error(&mut self, message: &str) {
        warn!("{}", message);
        self.control_panel.set_progress(0.0, &format!("Error: {}", message));
    }

    /// Save a chart as PNG at a user-chosen location.
    fn handle_export(&mut self, request: ExportRequest) {
        let column = match &request {
            ExportRequest::Histogram { column, .. } | ExportRequest::ValueCounts { column, .. } => {
                column.clone()
            }
        };

        let Some(mut path) = rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name(format!("{}.png", column))
            .save_file()
        else {
            return;
        };
        if path.extension().is_none() {
            path.set_extension("png");
        }

        let (width, height) = (self.config.export_width, self.config.export_height);
        let result = match &request {
            ExportRequest::Histogram { column, bins } => {
                StaticChartRenderer::render_histogram_png(&path, column, bins, width, height)
            }
            ExportRequest::ValueCounts { column, counts } => {
                StaticChartRenderer::render_value_counts_png(&path, column, counts, width, height)
            }
        };

        match result {
            Ok(()) => {
                info!("Chart exported to {:?}", path);
                self.control_panel
                    .set_progress(100.0, &format!("✅ Chart saved to {}", path.display()));
            }
            Err(e) => self.report_error(&format!("chart export failed: {}", e)),
        }
    }

    /// Profile the dataset in a background thread and open the report.
    fn start_report(&mut self) {
        if self.report_rx.is_some() {
            return;
        }
        let Some(df) = self.loader.get_dataframe().cloned() else {
            return;
        };
        let source_name = self
            .loader
            .get_file_path()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "dataset".to_string());
        let config = self.config.clone();

        let (tx, rx) = channel();
        self.report_rx = Some(rx);
        self.report_panel.generating = true;
        self.control_panel.set_progress(0.0, "Generating report...");

        thread::spawn(move || {
            let result = Self::run_report(&df, &source_name, &config, |path| open::that(path));
            let _ = tx.send(result);
        });
    }

    /// Run report generation (called from background thread)
    ///
    /// A written report is always returned, even when `open_in_browser` fails.
    fn run_report<F>(
        df: &DataFrame,
        source_name: &str,
        config: &AppConfig,
        open_in_browser: F,
    ) -> ReportResult
    where
        F: FnOnce(&Path) -> std::io::Result<()>,
    {
        let path = match Self::write_report(df, source_name, config) {
            Ok(path) => path,
            Err(e) => return ReportResult::Error(format!("{:#}", e)),
        };

        let open_error = open_in_browser(&path)
            .with_context(|| format!("Failed to open {}", path.display()))
            .err()
            .map(|e| {
                warn!("{:#}", e);
                format!("{:#}", e)
            });
        ReportResult::Complete { path, open_error }
    }

    fn write_report(df: &DataFrame, source_name: &str, config: &AppConfig) -> anyhow::Result<PathBuf> {
        let profile = profile_dataset(df, config.histogram_bins, config.report_top_values);
        ReportGenerator::write_html(&profile, source_name, &config.report_dir())
            .context("Failed to write profiling report")
    }

    /// Check for report results
    fn check_report_results(&mut self) {
        let Some(rx) = self.report_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(ReportResult::Complete { path, open_error }) => {
                match &open_error {
                    None => self
                        .control_panel
                        .set_progress(100.0, "✅ Report opened in a new browser tab"),
                    Some(e) => self.control_panel.set_progress(
                        100.0,
                        &format!("✅ Report saved to {} ({})", path.display(), e),
                    ),
                }
                self.report_panel.finish(Ok(path));
                self.report_panel.opened = open_error.is_none();
            }
            Ok(ReportResult::Error(e)) => {
                error!("Report generation failed: {}", e);
                self.control_panel.set_progress(0.0, &format!("Error: {}", e));
                self.report_panel.finish(Err(e));
            }
            Err(std::sync::mpsc::TryRecvError::Empty) => self.report_rx = Some(rx),
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                self.report_panel
                    .finish(Err("report thread exited unexpectedly".to_string()));
            }
        }
    }

    fn open_last_report(&mut self) {
        let Some(path) = self.report_panel.last_report.clone() else {
            return;
        };
        match open::that(&path) {
            Ok(()) => self.report_panel.opened = true,
            Err(e) => self.report_error(&format!("failed to open {}: {}", path.display(), e)),
        }
    }

    fn show_tabs(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            for tab in Tab::ALL {
                ui.selectable_value(&mut self.tab, tab, RichText::new(tab.label()).size(14.0));
            }
        });
        ui.separator();

        self.data_panel
            .refresh(&self.loader, self.dataset_version, &self.config);
        self.chart_viewer
            .refresh(&self.loader, self.dataset_version, &self.config);

        egui::ScrollArea::vertical()
            .id_salt("tab_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| match self.tab {
                Tab::Overview => self.data_panel.show_overview(ui),
                Tab::Visualizations => {
                    if let ChartViewerAction::Export(request) =
                        self.chart_viewer.show(ui, &self.loader, &self.config)
                    {
                        self.handle_export(request);
                    }
                }
                Tab::Clean => {
                    let action = self.data_panel.show_clean(ui);
                    self.handle_data_action(action);
                }
                Tab::Report => match self.report_panel.show(ui) {
                    ReportPanelAction::Generate => self.start_report(),
                    ReportPanelAction::OpenLast => self.open_last_report(),
                    ReportPanelAction::None => {}
                },
            });
    }
}

impl eframe::App for VizCraftApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();
        self.check_report_results();

        if self.is_loading || self.report_rx.is_some() {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(280.0)
            .max_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    if self.control_panel.show(ui) == ControlPanelAction::BrowseCsv {
                        self.handle_browse_csv();
                    }
                });
            });

        // Central panel - tabs
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.loader.get_dataframe().is_none() {
                ui.centered_and_justified(|ui| {
                    ui.label(
                        RichText::new("📂 Please upload a CSV file to begin.")
                            .size(18.0)
                            .color(egui::Color32::GRAY),
                    );
                });
                return;
            }
            self.show_tabs(ui);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_survives_browser_failure() {
        let dir = std::env::temp_dir().join(format!("vizcraft_app_report_{}", std::process::id()));
        let config = AppConfig {
            report_dir: Some(dir.clone()),
            ..AppConfig::default()
        };
        let df = df!("x" => [1.0, 2.0, 3.0], "label" => ["a", "b", "a"]).unwrap();

        let result = VizCraftApp::run_report(&df, "data.csv", &config, |_| {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no browser"))
        });
        match result {
            ReportResult::Complete { path, open_error } => {
                assert!(path.exists());
                assert!(open_error.is_some_and(|e| e.contains("no browser")));
            }
            ReportResult::Error(e) => panic!("report failed: {}", e),
        }

        let result = VizCraftApp::run_report(&df, "data.csv", &config, |_| Ok(()));
        assert!(matches!(result, ReportResult::Complete { open_error: None, .. }));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
