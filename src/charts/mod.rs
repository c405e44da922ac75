//! Charts module - interactive plots and static chart export

mod plotter;
mod renderer;

pub use plotter::{ChartPlotter, PairplotData};
pub use renderer::StaticChartRenderer;
