//! Control Panel Widget
//! Left side panel with the data source, dataset summary and status.

use egui::{Color32, RichText};
use std::path::PathBuf;

/// Dataset facts shown under the data source.
#[derive(Default, Clone)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: usize,
    pub numeric: usize,
    pub categorical: usize,
    pub missing_cells: usize,
}

/// Left side control panel with file selection and status.
pub struct ControlPanel {
    pub csv_path: Option<PathBuf>,
    pub summary: Option<DatasetSummary>,
    pub progress: f32,
    pub status: String,
    pub busy: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            csv_path: None,
            summary: None,
            progress: 0.0,
            status: "Ready".to_string(),
            busy: false,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📊 VizCraft")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("CSV Data Analysis")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== CSV File Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .csv_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    let color = if self.csv_path.is_some() {
                        ui.visuals().strong_text_color()
                    } else {
                        Color32::GRAY
                    };
                    let label = ui.label(RichText::new(&path_text).size(12.0).color(color));
                    if let Some(path) = &self.csv_path {
                        label.on_hover_text(path.display().to_string());
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.add_enabled_ui(!self.busy, |ui| {
                            if ui.button("📂 Browse").clicked() {
                                action = ControlPanelAction::BrowseCsv;
                            }
                        });
                    });
                });
            });

        // ===== Dataset Section =====
        if let Some(summary) = &self.summary {
            ui.add_space(15.0);
            ui.separator();
            ui.add_space(10.0);
            ui.label(RichText::new("🧾 Dataset").size(14.0).strong());
            ui.add_space(5.0);

            egui::Grid::new("dataset_summary")
                .num_columns(2)
                .spacing([20.0, 4.0])
                .show(ui, |ui| {
                    for (label, value) in [
                        ("Rows", summary.rows),
                        ("Columns", summary.columns),
                        ("Numeric", summary.numeric),
                        ("Categorical", summary.categorical),
                        ("Missing cells", summary.missing_cells),
                    ] {
                        ui.label(label);
                        ui.label(RichText::new(value.to_string()).strong());
                        ui.end_row();
                    }
                });
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.label(RichText::new("📊 Status").size(14.0).strong());
        ui.add_space(5.0);

        if self.busy {
            ui.add(
                egui::ProgressBar::new(self.progress / 100.0)
                    .show_percentage()
                    .animate(true),
            );
            ui.add_space(5.0);
        }

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.starts_with('✅') {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        ui.add_space(20.0);
        ui.separator();
        ui.label(
            RichText::new("Made by Mannan Gosrani • © 2025")
                .size(10.0)
                .color(Color32::GRAY),
        );

        action
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
}
