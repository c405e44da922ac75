//! Static Chart Renderer
//! Draws histograms and count plots with plotters, either to PNG files
//! (chart download) or to inline SVG strings (profiling report).

use crate::stats::{HistogramBin, ValueCount};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;
use thiserror::Error;

const BAR_FILL: RGBColor = RGBColor(99, 110, 250);

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Nothing to draw")]
    Empty,
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("Image buffer has the wrong size")]
    Buffer,
    #[error("Failed to write image: {0}")]
    Image(#[from] image::ImageError),
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    fn draw_histogram<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        title: &str,
        x_desc: &str,
        bins: &[HistogramBin],
        font_size: f64,
    ) -> Result<(), RenderError> {
        let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
            return Err(RenderError::Empty);
        };
        let y_max = bins.iter().map(|b| b.count).max().unwrap_or(0) as u32;

        root.fill(&WHITE).map_err(draw_err)?;
        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", font_size + 6.0))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(first.start..last.end, 0u32..(y_max + y_max / 10 + 1))
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(x_desc)
            .y_desc("Count")
            .label_style(("sans-serif", font_size))
            .draw()
            .map_err(draw_err)?;

        let gap = (last.end - first.start) / bins.len() as f64 * 0.05;
        chart
            .draw_series(bins.iter().map(|b| {
                Rectangle::new(
                    [(b.start + gap, 0), (b.end - gap, b.count as u32)],
                    BAR_FILL.filled(),
                )
            }))
            .map_err(draw_err)?;
        chart
            .draw_series(bins.iter().map(|b| {
                Rectangle::new(
                    [(b.start + gap, 0), (b.end - gap, b.count as u32)],
                    BLACK.stroke_width(1),
                )
            }))
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
        Ok(())
    }

    fn draw_value_counts<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        title: &str,
        x_desc: &str,
        counts: &[ValueCount],
        font_size: f64,
    ) -> Result<(), RenderError> {
        if counts.is_empty() {
            return Err(RenderError::Empty);
        }
        let y_max = counts.iter().map(|v| v.count).max().unwrap_or(0) as u32;
        let labels: Vec<String> = counts.iter().map(|v| v.value.clone()).collect();
        let n = counts.len();

        root.fill(&WHITE).map_err(draw_err)?;
        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", font_size + 6.0))
            .margin(12)
            .x_label_area_size(50)
            .y_label_area_size(50)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0u32..(y_max + y_max / 10 + 1))
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n.min(40))
            .x_label_formatter(&|x| {
                let idx = x.round();
                if idx >= 0.0 && (x - idx).abs() < 1e-6 {
                    labels.get(idx as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .x_desc(x_desc)
            .y_desc("count")
            .label_style(("sans-serif", font_size))
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(counts.iter().enumerate().map(|(i, vc)| {
                let color = Palette99::pick(i).to_rgba();
                Rectangle::new(
                    [(i as f64 - 0.4, 0), (i as f64 + 0.4, vc.count as u32)],
                    color.filled(),
                )
            }))
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
        Ok(())
    }

    /// Render into an RGB buffer and save it as PNG through `image`.
    fn save_png<F>(path: &Path, width: u32, height: u32, draw: F) -> Result<(), RenderError>
    where
        F: FnOnce(&DrawingArea<BitMapBackend, Shift>) -> Result<(), RenderError>,
    {
        let mut buffer = vec![0u8; (width * height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            draw(&root)?;
        }
        let img = image::RgbImage::from_raw(width, height, buffer).ok_or(RenderError::Buffer)?;
        img.save(path)?;
        Ok(())
    }

    /// Histogram of a numeric column as a PNG file.
    pub fn render_histogram_png(
        path: &Path,
        column: &str,
        bins: &[HistogramBin],
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        if bins.is_empty() {
            return Err(RenderError::Empty);
        }
        let title = format!("Histogram of {}", column);
        Self::save_png(path, width, height, |root| {
            Self::draw_histogram(root, &title, column, bins, 16.0)
        })
    }

    /// Count plot of a categorical column as a PNG file.
    pub fn render_value_counts_png(
        path: &Path,
        column: &str,
        counts: &[ValueCount],
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        if counts.is_empty() {
            return Err(RenderError::Empty);
        }
        let title = format!("Count Plot of {}", column);
        Self::save_png(path, width, height, |root| {
            Self::draw_value_counts(root, &title, column, counts, 16.0)
        })
    }

    /// Histogram as an inline SVG document.
    pub fn render_histogram_svg(
        column: &str,
        bins: &[HistogramBin],
        width: u32,
        height: u32,
    ) -> Result<String, RenderError> {
        if bins.is_empty() {
            return Err(RenderError::Empty);
        }
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
            Self::draw_histogram(&root, "", column, bins, 12.0)?;
        }
        Ok(svg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_inputs_are_rejected() {
        let path = std::env::temp_dir().join("vizcraft_never_written.png");
        assert!(matches!(
            StaticChartRenderer::render_histogram_png(&path, "x", &[], 400, 300),
            Err(RenderError::Empty)
        ));
        assert!(matches!(
            StaticChartRenderer::render_value_counts_png(&path, "x", &[], 400, 300),
            Err(RenderError::Empty)
        ));
        assert!(matches!(
            StaticChartRenderer::render_histogram_svg("x", &[], 400, 300),
            Err(RenderError::Empty)
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_save_png_writes_decodable_image() {
        let path = std::env::temp_dir().join(format!("vizcraft_fill_{}.png", std::process::id()));
        StaticChartRenderer::save_png(&path, 64, 48, |root| {
            root.fill(&WHITE).map_err(draw_err)?;
            root.draw(&Rectangle::new([(0, 0), (32, 48)], BAR_FILL.filled()))
                .map_err(draw_err)?;
            root.present().map_err(draw_err)
        })
        .unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (64, 48));
        assert_eq!(img.get_pixel(10, 10).0, [99, 110, 250]);
        assert_eq!(img.get_pixel(60, 10).0, [255, 255, 255]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_histogram_png_has_requested_size() {
        let path = std::env::temp_dir().join(format!("vizcraft_hist_{}.png", std::process::id()));
        let bins = vec![
            HistogramBin { start: 0.0, end: 1.0, count: 3 },
            HistogramBin { start: 1.0, end: 2.0, count: 5 },
        ];
        match StaticChartRenderer::render_histogram_png(&path, "x", &bins, 320, 240) {
            Ok(()) => {
                let img = image::open(&path).unwrap();
                assert_eq!((img.width(), img.height()), (320, 240));
                let _ = std::fs::remove_file(&path);
            }
            // Hosts without a system sans-serif font cannot lay out labels
            Err(RenderError::Draw(_)) => assert!(!path.exists()),
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
}
