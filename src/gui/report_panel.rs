//! Report Panel Widget
//! Generates the profiling report and reopens the last one.

use egui::{Color32, RichText};
use std::path::PathBuf;

/// Actions triggered by the report panel
#[derive(Debug, Clone, PartialEq)]
pub enum ReportPanelAction {
    None,
    Generate,
    OpenLast,
}

#[derive(Default)]
pub struct ReportPanel {
    pub generating: bool,
    pub last_report: Option<PathBuf>,
    /// Whether the last report was shown in the browser.
    pub opened: bool,
    pub last_error: Option<String>,
}

impl ReportPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn finish(&mut self, result: Result<PathBuf, String>) {
        self.generating = false;
        match result {
            Ok(path) => {
                self.last_report = Some(path);
                self.opened = true;
                self.last_error = None;
            }
            Err(e) => self.last_error = Some(e),
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui) -> ReportPanelAction {
        let mut action = ReportPanelAction::None;

        ui.label(RichText::new("📑 Generate Profiling Report").size(18.0).strong());
        ui.add_space(4.0);
        ui.label(
            RichText::new(
                "Builds a full HTML report (overview, per-column statistics, \
                 histograms, top values and correlations) and opens it in your browser.",
            )
            .color(Color32::GRAY),
        );
        ui.add_space(10.0);

        ui.horizontal(|ui| {
            ui.add_enabled_ui(!self.generating, |ui| {
                if ui
                    .button(RichText::new("📄 Generate Report").size(14.0))
                    .clicked()
                {
                    action = ReportPanelAction::Generate;
                }
            });
            if self.generating {
                ui.spinner();
                ui.label("Generating report...");
            }
        });

        if let Some(err) = &self.last_error {
            ui.add_space(8.0);
            ui.label(
                RichText::new(format!("Error: {}", err)).color(Color32::from_rgb(220, 53, 69)),
            );
        }

        if let Some(path) = &self.last_report {
            ui.add_space(10.0);
            ui.separator();
            let message = if self.opened {
                "✅ Report opened in a new browser tab."
            } else {
                "✅ Report saved. The browser could not be opened; use the path below."
            };
            ui.label(RichText::new(message).color(Color32::from_rgb(40, 167, 69)));
            ui.label(RichText::new(path.display().to_string()).size(11.0).monospace());
            if ui.button("🔁 Open again").clicked() {
                action = ReportPanelAction::OpenLast;
            }
        }

        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_keeps_last_report_on_error() {
        let mut panel = ReportPanel::new();
        panel.generating = true;
        panel.finish(Ok(PathBuf::from("/tmp/r.html")));
        assert!(!panel.generating);
        assert_eq!(panel.last_report, Some(PathBuf::from("/tmp/r.html")));

        panel.generating = true;
        panel.finish(Err("disk full".to_string()));
        assert_eq!(panel.last_error.as_deref(), Some("disk full"));
        assert_eq!(panel.last_report, Some(PathBuf::from("/tmp/r.html")));
    }
}
