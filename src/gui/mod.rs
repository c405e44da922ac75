//! GUI module - User interface components

mod app;
mod chart_viewer;
mod control_panel;
mod data_panel;
mod report_panel;

pub use app::VizCraftApp;
pub use chart_viewer::{ChartViewer, ChartViewerAction, ExportRequest};
pub use control_panel::{ControlPanel, ControlPanelAction, DatasetSummary};
pub use data_panel::{DataPanel, DataPanelAction};
pub use report_panel::{ReportPanel, ReportPanelAction};
