//! Data Panel Widget
//! Overview tab (raw data, dataset info, summary statistics) and the
//! Clean & Group tab (imputation, column drop, de-duplication, aggregation).

use crate::charts::ChartPlotter;
use crate::config::AppConfig;
use crate::data::{
    AggFunc, ColumnInfo, ColumnKind, DataLoader, DataProcessor, ImputeStrategy, TablePreview,
};
use crate::stats::{duplicate_mask, ColumnSummary, StatsCalculator};
use egui::{Color32, ComboBox, RichText, ScrollArea};

/// Actions triggered by the data panel
#[derive(Debug, Clone, PartialEq)]
pub enum DataPanelAction {
    None,
    Impute {
        column: String,
        strategy: ImputeStrategy,
    },
    DropColumns(Vec<String>),
    DropDuplicates,
    Aggregate {
        group_col: String,
        value_col: String,
        func: AggFunc,
    },
}

pub struct DataPanel {
    version: Option<u64>,
    shape: (usize, usize),
    columns: Vec<String>,
    column_info: Vec<ColumnInfo>,
    summaries: Vec<ColumnSummary>,
    preview: TablePreview,
    missing: Vec<(String, usize)>,
    duplicate_rows: usize,

    impute_column: String,
    impute_strategy: ImputeStrategy,
    constant_value: String,
    drop_selection: Vec<bool>,

    group_col: String,
    value_col: String,
    agg_func: AggFunc,
    agg_result: Option<TablePreview>,
    agg_error: Option<String>,
}

impl Default for DataPanel {
    fn default() -> Self {
        Self {
            version: None,
            shape: (0, 0),
            columns: Vec::new(),
            column_info: Vec::new(),
            summaries: Vec::new(),
            preview: TablePreview::default(),
            missing: Vec::new(),
            duplicate_rows: 0,
            impute_column: String::new(),
            impute_strategy: ImputeStrategy::Mean,
            constant_value: String::new(),
            drop_selection: Vec::new(),
            group_col: String::new(),
            value_col: String::new(),
            agg_func: AggFunc::default(),
            agg_result: None,
            agg_error: None,
        }
    }
}

impl DataPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything derived from the previous dataset.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Recompute cached tables when the dataset changed.
    pub fn refresh(&mut self, loader: &DataLoader, version: u64, config: &AppConfig) {
        if self.version == Some(version) {
            return;
        }
        self.version = Some(version);

        let Some(df) = loader.get_dataframe() else {
            return;
        };

        self.shape = loader.shape();
        self.columns = loader.get_columns();
        self.column_info = loader.column_info();
        self.summaries = StatsCalculator::describe(df, &loader.get_numeric_columns());
        self.preview = loader.preview(config.preview_rows);
        self.missing = DataProcessor::columns_with_missing(df);
        self.duplicate_rows = duplicate_mask(df).iter().filter(|&&d| d).count();
        self.drop_selection = vec![false; self.columns.len()];

        // Keep selections that still exist
        if !self.missing.iter().any(|(c, _)| *c == self.impute_column) {
            self.impute_column = self
                .missing
                .first()
                .map(|(c, _)| c.clone())
                .unwrap_or_default();
        }
        if !self.columns.contains(&self.group_col) {
            self.group_col = loader
                .get_categorical_columns()
                .first()
                .or(self.columns.first())
                .cloned()
                .unwrap_or_default();
        }
        if !self.columns.contains(&self.value_col) {
            self.value_col = loader
                .get_numeric_columns()
                .first()
                .or(self.columns.first())
                .cloned()
                .unwrap_or_default();
        }
    }

    /// Show the result (or error) of the last aggregation.
    pub fn set_aggregation(&mut self, result: Result<TablePreview, String>) {
        match result {
            Ok(table) => {
                self.agg_result = Some(table);
                self.agg_error = None;
            }
            Err(e) => {
                self.agg_result = None;
                self.agg_error = Some(e);
            }
        }
    }

    fn draw_table(ui: &mut egui::Ui, id: &str, table: &TablePreview, max_height: f32) {
        ScrollArea::both()
            .id_salt(id)
            .max_height(max_height)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                egui::Grid::new(format!("{}_grid", id))
                    .striped(true)
                    .min_col_width(60.0)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        ui.label(RichText::new("#").strong().color(Color32::GRAY));
                        for header in &table.headers {
                            ui.label(RichText::new(header).strong());
                        }
                        ui.end_row();

                        for (i, row) in table.rows.iter().enumerate() {
                            ui.label(RichText::new(i.to_string()).color(Color32::GRAY));
                            for cell in row {
                                ui.label(cell);
                            }
                            ui.end_row();
                        }
                    });
            });
    }

    /// Overview tab
    pub fn show_overview(&mut self, ui: &mut egui::Ui) {
        ui.label(RichText::new("🧾 Data Overview").size(18.0).strong());
        ui.add_space(8.0);

        egui::CollapsingHeader::new("📋 Show Raw Data")
            .default_open(false)
            .show(ui, |ui| {
                if self.shape.0 > self.preview.rows.len() {
                    ui.label(
                        RichText::new(format!(
                            "Showing first {} of {} rows",
                            self.preview.rows.len(),
                            self.shape.0
                        ))
                        .color(Color32::GRAY),
                    );
                }
                Self::draw_table(ui, "raw_data_table", &self.preview, 400.0);
            });

        egui::CollapsingHeader::new("🔍 Dataset Info")
            .default_open(true)
            .show(ui, |ui| {
                ui.label(format!("• Shape: ({}, {})", self.shape.0, self.shape.1));
                ui.add_space(6.0);
                egui::Grid::new("dtypes_table")
                    .striped(true)
                    .spacing([20.0, 4.0])
                    .show(ui, |ui| {
                        for header in ["Column", "Data Type", "Kind", "Non-Null", "Missing"] {
                            ui.label(RichText::new(header).strong());
                        }
                        ui.end_row();

                        for info in &self.column_info {
                            ui.label(&info.name);
                            ui.label(&info.dtype);
                            ui.label(info.kind.label());
                            ui.label(info.non_null.to_string());
                            let missing = RichText::new(info.null_count.to_string());
                            ui.label(if info.null_count > 0 {
                                missing.color(Color32::from_rgb(220, 53, 69))
                            } else {
                                missing
                            });
                            ui.end_row();
                        }
                    });
            });

        egui::CollapsingHeader::new("📈 Summary Statistics")
            .default_open(true)
            .show(ui, |ui| {
                if self.summaries.is_empty() {
                    ui.label("No numeric columns to describe.");
                } else {
                    ScrollArea::horizontal()
                        .id_salt("summary_scroll")
                        .show(ui, |ui| ChartPlotter::draw_summary_table(ui, &self.summaries));
                }
            });
    }

    fn column_combo(ui: &mut egui::Ui, id: &str, selected: &mut String, options: &[String]) {
        ComboBox::from_id_salt(id)
            .width(180.0)
            .selected_text(selected.as_str())
            .show_ui(ui, |ui| {
                for option in options {
                    ui.selectable_value(selected, option.clone(), option);
                }
            });
    }

    /// Clean & Group tab
    pub fn show_clean(&mut self, ui: &mut egui::Ui) -> DataPanelAction {
        let mut action = DataPanelAction::None;

        // ===== Missing values =====
        ui.label(RichText::new("🩹 Handle Missing Values").size(16.0).strong());
        ui.add_space(6.0);

        if self.missing.is_empty() {
            ui.label(RichText::new("✅ No missing values in the dataset.").color(Color32::from_rgb(40, 167, 69)));
        } else {
            let kind = self
                .column_info
                .iter()
                .find(|c| c.name == self.impute_column)
                .map(|c| c.kind);

            ui.horizontal(|ui| {
                ui.label("Column:");
                let missing = &self.missing;
                ComboBox::from_id_salt("impute_column")
                    .width(200.0)
                    .selected_text(self.impute_column.as_str())
                    .show_ui(ui, |ui| {
                        for (name, count) in missing {
                            ui.selectable_value(
                                &mut self.impute_column,
                                name.clone(),
                                format!("{} ({} missing)", name, count),
                            );
                        }
                    });
            });

            ui.horizontal_wrapped(|ui| {
                let choices = [
                    ImputeStrategy::Mean,
                    ImputeStrategy::Median,
                    ImputeStrategy::Mode,
                    ImputeStrategy::Constant(String::new()),
                    ImputeStrategy::DropRows,
                    ImputeStrategy::DropColumn,
                ];
                for choice in choices {
                    let enabled = !choice.requires_numeric() || kind == Some(ColumnKind::Numeric);
                    let selected = self.impute_strategy.label() == choice.label();
                    if ui
                        .add_enabled(enabled, egui::RadioButton::new(selected, choice.label()))
                        .clicked()
                    {
                        self.impute_strategy = choice;
                    }
                }
            });

            if matches!(self.impute_strategy, ImputeStrategy::Constant(_)) {
                ui.horizontal(|ui| {
                    ui.label("Fill value:");
                    ui.text_edit_singleline(&mut self.constant_value);
                });
            }

            let valid = !self.impute_strategy.requires_numeric() || kind == Some(ColumnKind::Numeric);
            if !valid {
                ui.label(
                    RichText::new("Mean and median need a numeric column.")
                        .color(Color32::from_rgb(220, 53, 69)),
                );
            }
            ui.add_enabled_ui(valid && !self.impute_column.is_empty(), |ui| {
                if ui.button("Apply").clicked() {
                    let strategy = match &self.impute_strategy {
                        ImputeStrategy::Constant(_) => {
                            ImputeStrategy::Constant(self.constant_value.clone())
                        }
                        other => other.clone(),
                    };
                    action = DataPanelAction::Impute {
                        column: self.impute_column.clone(),
                        strategy,
                    };
                }
            });
        }

        ui.add_space(12.0);
        ui.separator();

        // ===== Drop columns / duplicates =====
        ui.label(RichText::new("🗑 Drop Columns").size(16.0).strong());
        ui.add_space(6.0);
        ScrollArea::vertical()
            .id_salt("drop_columns_scroll")
            .max_height(140.0)
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    for (i, name) in self.columns.iter().enumerate() {
                        if let Some(selected) = self.drop_selection.get_mut(i) {
                            ui.checkbox(selected, name);
                        }
                    }
                });
            });
        let to_drop: Vec<String> = self
            .columns
            .iter()
            .zip(self.drop_selection.iter())
            .filter(|(_, &selected)| selected)
            .map(|(name, _)| name.clone())
            .collect();
        ui.add_enabled_ui(!to_drop.is_empty(), |ui| {
            if ui.button(format!("Drop {} selected", to_drop.len())).clicked() {
                action = DataPanelAction::DropColumns(to_drop.clone());
            }
        });

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.label(format!("Duplicate rows: {}", self.duplicate_rows));
            ui.add_enabled_ui(self.duplicate_rows > 0, |ui| {
                if ui.button("Remove duplicates").clicked() {
                    action = DataPanelAction::DropDuplicates;
                }
            });
        });

        ui.add_space(12.0);
        ui.separator();

        // ===== Group by =====
        ui.label(RichText::new("🧮 Group & Aggregate").size(16.0).strong());
        ui.add_space(6.0);
        ui.horizontal_wrapped(|ui| {
            ui.label("Group by:");
            Self::column_combo(ui, "group_col", &mut self.group_col, &self.columns);
            ui.label("Aggregate:");
            Self::column_combo(ui, "value_col", &mut self.value_col, &self.columns);
            ComboBox::from_id_salt("agg_func")
                .width(90.0)
                .selected_text(self.agg_func.label())
                .show_ui(ui, |ui| {
                    for func in AggFunc::ALL {
                        ui.selectable_value(&mut self.agg_func, func, func.label());
                    }
                });
            let ready = !self.group_col.is_empty() && !self.value_col.is_empty();
            ui.add_enabled_ui(ready, |ui| {
                if ui.button("▶ Run").clicked() {
                    action = DataPanelAction::Aggregate {
                        group_col: self.group_col.clone(),
                        value_col: self.value_col.clone(),
                        func: self.agg_func,
                    };
                }
            });
        });

        ui.add_space(6.0);
        if let Some(error) = &self.agg_error {
            egui::Frame::none()
                .fill(Color32::from_rgb(248, 215, 218))
                .rounding(5.0)
                .inner_margin(8.0)
                .show(ui, |ui| {
                    ui.label(
                        RichText::new(format!("Error: {}", error))
                            .color(Color32::from_rgb(114, 28, 36)),
                    );
                });
        } else if let Some(table) = &self.agg_result {
            Self::draw_table(ui, "aggregation_table", table, 300.0);
        }

        action
    }
}
