//! Chart Plotter Module
//! Creates interactive visualizations using egui_plot.

use crate::stats::{BoxStats, ColumnSummary, CorrelationMatrix, HistogramBin, ValueCount};
use egui::{Align2, Color32, RichText, Sense, Shape, Stroke};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, Plot, PlotPoint,
    PlotPoints, Points, Polygon, Text,
};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Single-series colour (histograms, line charts)
pub const PRIMARY_COLOR: Color32 = Color32::from_rgb(99, 110, 250);

pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(99, 110, 250),  // Indigo
    Color32::from_rgb(239, 85, 59),   // Red
    Color32::from_rgb(0, 204, 150),   // Green
    Color32::from_rgb(171, 99, 250),  // Purple
    Color32::from_rgb(255, 161, 90),  // Orange
    Color32::from_rgb(25, 211, 243),  // Cyan
    Color32::from_rgb(255, 102, 146), // Pink
    Color32::from_rgb(182, 232, 128), // Lime
    Color32::from_rgb(255, 151, 255), // Magenta
    Color32::from_rgb(254, 203, 82),  // Yellow
];

const NAN_COLOR: Color32 = Color32::from_rgb(128, 128, 128);

/// Sampled numeric columns for the pairplot grid.
#[derive(Clone, Default)]
pub struct PairplotData {
    pub columns: Vec<String>,
    /// One vector per column, aligned by sampled row.
    pub values: Vec<Vec<Option<f64>>>,
    /// Diagonal histograms.
    pub histograms: Vec<Vec<HistogramBin>>,
}

/// Creates the explorer's charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn palette_color(index: usize) -> Color32 {
        PALETTE[index % PALETTE.len()]
    }

    /// Diverging blue-white-red scale for values in [-1, 1].
    pub fn diverging_color(value: f64) -> Color32 {
        if value.is_nan() {
            return NAN_COLOR;
        }
        let v = value.clamp(-1.0, 1.0) as f32;
        let blue = (59.0, 76.0, 192.0);
        let white = (242.0, 242.0, 242.0);
        let red = (180.0, 4.0, 38.0);
        let (from, to, t) = if v < 0.0 {
            (white, blue, -v)
        } else {
            (white, red, v)
        };
        let lerp = |a: f32, b: f32| (a + (b - a) * t).round() as u8;
        Color32::from_rgb(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
    }

    /// Grid marks at every integer position, used for categorical axes.
    fn category_marks(count: usize) -> Vec<GridMark> {
        (0..count)
            .map(|i| GridMark {
                value: i as f64,
                step_size: 1.0,
            })
            .collect()
    }

    fn category_label(labels: &[String], value: f64) -> String {
        let idx = value.round();
        if idx < 0.0 || (value - idx).abs() > 1e-6 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }

    /// Histogram with outlined bars and counts printed above them.
    pub fn draw_histogram(ui: &mut egui::Ui, column: &str, bins: &[HistogramBin], height: f32) {
        let bars: Vec<Bar> = bins
            .iter()
            .map(|bin| {
                Bar::new(bin.center(), bin.count as f64)
                    .width(bin.width() * 0.9)
                    .fill(PRIMARY_COLOR)
                    .stroke(Stroke::new(1.5, Color32::BLACK))
                    .name(format!("{:.3} – {:.3}", bin.start, bin.end))
            })
            .collect();

        Plot::new(format!("histogram_{}", column))
            .height(height)
            .x_axis_label(column.to_string())
            .y_axis_label("Count")
            .include_y(0.0)
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).name(column));

                for bin in bins.iter().filter(|b| b.count > 0) {
                    plot_ui.text(
                        Text::new(
                            PlotPoint::new(bin.center(), bin.count as f64),
                            RichText::new(bin.count.to_string()).size(10.0),
                        )
                        .anchor(Align2::CENTER_BOTTOM),
                    );
                }
            });
    }

    /// Line chart of value against row index; missing values break the line.
    pub fn draw_line_chart(ui: &mut egui::Ui, column: &str, values: &[Option<f64>], height: f32) {
        let mut segments: Vec<Vec<[f64; 2]>> = Vec::new();
        let mut current: Vec<[f64; 2]> = Vec::new();
        for (i, v) in values.iter().enumerate() {
            match v {
                Some(v) if v.is_finite() => current.push([i as f64, *v]),
                _ => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }

        Plot::new(format!("line_{}", column))
            .height(height)
            .x_axis_label("index")
            .y_axis_label(column.to_string())
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                for segment in segments {
                    if segment.len() == 1 {
                        plot_ui.points(
                            Points::new(PlotPoints::from(segment))
                                .radius(2.0)
                                .color(PRIMARY_COLOR),
                        );
                    } else {
                        plot_ui.line(
                            Line::new(PlotPoints::from(segment))
                                .color(PRIMARY_COLOR)
                                .width(1.5)
                                .name(column),
                        );
                    }
                }
            });
    }

    /// One coloured bar per category.
    pub fn draw_count_plot(ui: &mut egui::Ui, column: &str, counts: &[ValueCount], height: f32) {
        let labels: Vec<String> = counts.iter().map(|vc| vc.value.clone()).collect();
        let n = labels.len();

        Plot::new(format!("countplot_{}", column))
            .height(height)
            .x_axis_label(column.to_string())
            .y_axis_label("count")
            .include_y(0.0)
            .allow_scroll(false)
            .legend(Legend::default())
            .x_grid_spacer(move |_input| Self::category_marks(n))
            .x_axis_formatter(move |mark, _range| Self::category_label(&labels, mark.value))
            .show(ui, |plot_ui| {
                for (i, vc) in counts.iter().enumerate() {
                    let color = Self::palette_color(i);
                    let bar = Bar::new(i as f64, vc.count as f64)
                        .width(0.8)
                        .fill(color)
                        .name(&vc.value);
                    plot_ui.bar_chart(BarChart::new(vec![bar]).color(color).name(&vc.value));
                }
            });
    }

    /// Pie chart drawn with the painter, legend with percentages on the right.
    pub fn draw_pie_chart(ui: &mut egui::Ui, counts: &[ValueCount], size: f32) {
        let total: usize = counts.iter().map(|vc| vc.count).sum();
        if total == 0 {
            ui.label("No values to plot.");
            return;
        }

        ui.horizontal(|ui| {
            let (response, painter) =
                ui.allocate_painter(egui::vec2(size, size), Sense::hover());
            let center = response.rect.center();
            let radius = size / 2.0 - 8.0;

            // Slice boundaries in screen angles, starting at 12 o'clock
            let mut start = -FRAC_PI_2;
            let mut slices: Vec<(f32, f32)> = Vec::with_capacity(counts.len());
            for vc in counts {
                let sweep = TAU * vc.count as f32 / total as f32;
                slices.push((start, start + sweep));
                start += sweep;
            }

            for (i, &(a0, a1)) in slices.iter().enumerate() {
                let color = Self::palette_color(i);
                // Convex pieces of at most 45 degrees each
                let pieces = ((a1 - a0) / (PI / 4.0)).ceil().max(1.0) as usize;
                let piece = (a1 - a0) / pieces as f32;
                for p in 0..pieces {
                    let p0 = a0 + p as f32 * piece;
                    let steps = 8;
                    let mut points = vec![center];
                    for s in 0..=steps {
                        let a = p0 + piece * s as f32 / steps as f32;
                        points.push(center + radius * egui::vec2(a.cos(), a.sin()));
                    }
                    painter.add(Shape::convex_polygon(points, color, Stroke::NONE));
                }
                if slices.len() > 1 {
                    painter.line_segment(
                        [center, center + radius * egui::vec2(a0.cos(), a0.sin())],
                        Stroke::new(1.5, Color32::WHITE),
                    );
                }
            }

            let hovered = response.hover_pos().and_then(|pos| {
                let d = pos - center;
                if d.length() > radius {
                    return None;
                }
                let mut angle = d.y.atan2(d.x);
                if angle < -FRAC_PI_2 {
                    angle += TAU;
                }
                slices
                    .iter()
                    .position(|&(a0, a1)| angle >= a0 && angle < a1)
            });

            ui.vertical(|ui| {
                for (i, vc) in counts.iter().enumerate() {
                    ui.horizontal(|ui| {
                        let (rect, _) =
                            ui.allocate_exact_size(egui::vec2(14.0, 14.0), Sense::hover());
                        ui.painter().rect_filled(rect, 3.0, Self::palette_color(i));
                        let pct = vc.count as f64 * 100.0 / total as f64;
                        let text = RichText::new(format!("{} ({:.1}%)", vc.value, pct)).size(12.0);
                        ui.label(if hovered == Some(i) { text.strong() } else { text });
                    });
                }
            });

            if let Some(i) = hovered {
                let vc = &counts[i];
                response.on_hover_text(format!(
                    "{}\nCount: {}\n{:.1}%",
                    vc.value,
                    vc.count,
                    vc.count as f64 * 100.0 / total as f64
                ));
            }
        });
    }

    /// Correlation heatmap; first column at the top-left.
    pub fn draw_heatmap(ui: &mut egui::Ui, matrix: &CorrelationMatrix, height: f32) {
        let n = matrix.columns.len();
        let x_labels = matrix.columns.clone();
        let y_labels: Vec<String> = matrix.columns.iter().rev().cloned().collect();

        Plot::new("correlation_heatmap")
            .height(height)
            .data_aspect(1.0)
            .show_grid(false)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .show_x(false)
            .show_y(false)
            .x_grid_spacer(move |_input| Self::category_marks(n))
            .y_grid_spacer(move |_input| Self::category_marks(n))
            .x_axis_formatter(move |mark, _range| Self::category_label(&x_labels, mark.value))
            .y_axis_formatter(move |mark, _range| Self::category_label(&y_labels, mark.value))
            .show(ui, |plot_ui| {
                for row in 0..n {
                    for col in 0..n {
                        let v = matrix.get(row, col);
                        let x = col as f64;
                        let y = (n - 1 - row) as f64;
                        let cell = vec![
                            [x - 0.5, y - 0.5],
                            [x + 0.5, y - 0.5],
                            [x + 0.5, y + 0.5],
                            [x - 0.5, y + 0.5],
                        ];
                        let fill = Self::diverging_color(v);
                        plot_ui.polygon(
                            Polygon::new(PlotPoints::from(cell))
                                .fill_color(fill)
                                .stroke(Stroke::new(1.0, Color32::WHITE)),
                        );

                        let label = if v.is_nan() {
                            "–".to_string()
                        } else {
                            format!("{:.2}", v)
                        };
                        let text_color = if v.abs() > 0.6 {
                            Color32::WHITE
                        } else {
                            Color32::BLACK
                        };
                        plot_ui.text(
                            Text::new(PlotPoint::new(x, y), RichText::new(label).size(11.0))
                                .color(text_color),
                        );
                    }
                }
            });
    }

    /// Scatter grid of every column pair, histograms on the diagonal.
    pub fn draw_pairplot(ui: &mut egui::Ui, data: &PairplotData, cell_size: f32) {
        let n = data.columns.len();

        egui::Grid::new("pairplot_grid")
            .spacing([4.0, 4.0])
            .show(ui, |ui| {
                for row in 0..n {
                    for col in 0..n {
                        let plot = Plot::new(format!("pair_{}_{}", row, col))
                            .width(cell_size)
                            .height(cell_size)
                            .show_axes([row == n - 1, col == 0])
                            .allow_drag(false)
                            .allow_zoom(false)
                            .allow_scroll(false)
                            .x_axis_label(if row == n - 1 {
                                data.columns[col].clone()
                            } else {
                                String::new()
                            })
                            .y_axis_label(if col == 0 {
                                data.columns[row].clone()
                            } else {
                                String::new()
                            });

                        plot.show(ui, |plot_ui| {
                            if row == col {
                                let bars: Vec<Bar> = data.histograms[col]
                                    .iter()
                                    .map(|bin| {
                                        Bar::new(bin.center(), bin.count as f64)
                                            .width(bin.width())
                                            .fill(PRIMARY_COLOR.gamma_multiply(0.7))
                                    })
                                    .collect();
                                plot_ui.bar_chart(BarChart::new(bars));
                            } else {
                                let points: PlotPoints = data.values[col]
                                    .iter()
                                    .zip(data.values[row].iter())
                                    .filter_map(|(x, y)| Some([(*x)?, (*y)?]))
                                    .collect();
                                plot_ui.points(
                                    Points::new(points)
                                        .radius(1.5)
                                        .color(PRIMARY_COLOR.gamma_multiply(0.6)),
                                );
                            }
                        });
                    }
                    ui.end_row();
                }
            });
    }

    /// One box per column, outliers as points.
    pub fn draw_boxplots(ui: &mut egui::Ui, stats: &[(String, BoxStats)], height: f32) {
        let labels: Vec<String> = stats.iter().map(|(name, _)| name.clone()).collect();
        let n = labels.len();

        Plot::new("outlier_boxplot")
            .height(height)
            .allow_scroll(false)
            .legend(Legend::default())
            .y_axis_label("Value")
            .x_grid_spacer(move |_input| Self::category_marks(n))
            .x_axis_formatter(move |mark, _range| Self::category_label(&labels, mark.value))
            .show(ui, |plot_ui| {
                for (i, (name, bs)) in stats.iter().enumerate() {
                    let color = Self::palette_color(i);
                    let elem = BoxElem::new(
                        i as f64,
                        BoxSpread::new(bs.whisker_low, bs.q1, bs.median, bs.q3, bs.whisker_high),
                    )
                    .box_width(0.5)
                    .fill(color.gamma_multiply(0.3))
                    .stroke(Stroke::new(1.5, color));
                    plot_ui.box_plot(BoxPlot::new(vec![elem]).name(name));

                    if !bs.outliers.is_empty() {
                        let points: PlotPoints =
                            bs.outliers.iter().map(|&v| [i as f64, v]).collect();
                        plot_ui.points(
                            Points::new(points)
                                .radius(3.0)
                                .color(Color32::from_rgb(220, 53, 69))
                                .name(format!("{} outliers", name)),
                        );
                    }
                }
            });
    }

    fn fmt_stat(v: f64) -> String {
        if v.is_nan() {
            "NaN".to_string()
        } else {
            format!("{:.3}", v)
        }
    }

    /// Summary statistics table, one row per numeric column.
    pub fn draw_summary_table(ui: &mut egui::Ui, summaries: &[ColumnSummary]) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new("summary_stats_table")
                    .striped(true)
                    .min_col_width(60.0)
                    .spacing([10.0, 4.0])
                    .show(ui, |ui| {
                        for header in [
                            "Column", "count", "mean", "std", "min", "25%", "50%", "75%", "max",
                        ] {
                            ui.label(RichText::new(header).strong().size(12.0));
                        }
                        ui.end_row();

                        for s in summaries {
                            ui.label(RichText::new(&s.name).size(12.0).strong());
                            ui.label(RichText::new(s.count.to_string()).size(12.0));
                            for v in [s.mean, s.std, s.min, s.q25, s.median, s.q75, s.max] {
                                ui.label(RichText::new(Self::fmt_stat(v)).size(12.0));
                            }
                            ui.end_row();
                        }
                    });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diverging_color_endpoints() {
        assert_eq!(ChartPlotter::diverging_color(1.0), Color32::from_rgb(180, 4, 38));
        assert_eq!(ChartPlotter::diverging_color(-1.0), Color32::from_rgb(59, 76, 192));
        assert_eq!(ChartPlotter::diverging_color(0.0), Color32::from_rgb(242, 242, 242));
        assert_eq!(ChartPlotter::diverging_color(f64::NAN), NAN_COLOR);
    }

    #[test]
    fn test_category_label() {
        let labels = vec!["a".to_string(), "b".to_string()];
        assert_eq!(ChartPlotter::category_label(&labels, 1.0), "b");
        assert_eq!(ChartPlotter::category_label(&labels, 0.5), "");
        assert_eq!(ChartPlotter::category_label(&labels, 5.0), "");
        assert_eq!(ChartPlotter::category_label(&labels, -1.0), "");
    }

    #[test]
    fn test_palette_wraps() {
        assert_eq!(ChartPlotter::palette_color(0), ChartPlotter::palette_color(10));
    }
}
