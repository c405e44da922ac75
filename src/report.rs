//! Profiling Report Generator Module
//! Renders a `DatasetProfile` as a self-contained HTML page and writes it to
//! a transient file that is then opened in the system browser.

use crate::charts::{ChartPlotter, StaticChartRenderer};
use crate::data::ColumnKind;
use crate::stats::{ColumnProfile, CorrelationMatrix, DatasetProfile, HistogramBin, ValueCount};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Inline histogram size in the report
const HIST_WIDTH: u32 = 520;
const HIST_HEIGHT: u32 = 260;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// HTML profiling report generator
pub struct ReportGenerator;

impl ReportGenerator {
    /// Render the report and write it into `dir`.
    pub fn write_html(
        profile: &DatasetProfile,
        source_name: &str,
        dir: &Path,
    ) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(dir)?;
        let now = chrono::Local::now();
        let path = dir.join(format!(
            "vizcraft_report_{}.html",
            now.format("%Y%m%d_%H%M%S_%3f")
        ));

        let html = Self::render_html(
            profile,
            source_name,
            &now.format("%Y-%m-%d %H:%M:%S").to_string(),
        );
        fs::write(&path, html)?;
        info!("Report written to {:?}", path);
        Ok(path)
    }

    /// Full HTML document.
    pub fn render_html(profile: &DatasetProfile, source_name: &str, generated_at: &str) -> String {
        let mut body = String::new();
        body.push_str(&Self::overview_html(profile, source_name, generated_at));
        for column in &profile.columns_profile {
            body.push_str(&Self::column_html(column));
        }
        body.push_str(&Self::correlation_html(&profile.correlations));

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>VizCraft Report - {title}</title>
<style>{style}</style>
</head>
<body>
<h1>&#128202; VizCraft Profiling Report</h1>
{body}
<footer>Generated by VizCraft</footer>
</body>
</html>
"#,
            title = escape_html(source_name),
            style = Self::style_css(),
            body = body,
        )
    }

    fn style_css() -> &'static str {
        r#"
body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 0 auto; max-width: 1100px; padding: 24px; background: #f7f8fa; color: #222; }
h1 { text-align: center; }
section { background: #fff; border-radius: 8px; padding: 16px 20px; margin: 16px 0; box-shadow: 0 1px 3px rgba(0,0,0,.08); }
.cards { display: flex; flex-wrap: wrap; gap: 12px; }
.card { background: #eef1ff; border-radius: 6px; padding: 10px 14px; min-width: 140px; }
.card .v { font-size: 20px; font-weight: 600; }
.kind { font-size: 12px; color: #fff; background: #636efa; border-radius: 4px; padding: 2px 6px; margin-left: 8px; }
.row { display: flex; flex-wrap: wrap; gap: 24px; align-items: flex-start; }
table { border-collapse: collapse; font-size: 13px; }
td, th { border: 1px solid #ddd; padding: 4px 8px; text-align: right; }
th { background: #f0f0f0; }
td.l, th.l { text-align: left; }
.warn { color: #b00020; }
footer { text-align: center; color: #888; margin-top: 24px; font-size: 12px; }
"#
    }

    fn overview_html(profile: &DatasetProfile, source_name: &str, generated_at: &str) -> String {
        let cards = [
            ("Rows", profile.rows.to_string()),
            ("Columns", profile.columns.to_string()),
            ("Numeric columns", profile.numeric_count().to_string()),
            (
                "Missing cells",
                format!("{} ({:.1}%)", profile.missing_cells, profile.missing_pct()),
            ),
            ("Duplicate rows", profile.duplicate_rows.to_string()),
            ("Memory", format_bytes(profile.estimated_bytes)),
        ];

        let mut html = String::new();
        let _ = write!(
            html,
            "<section><h2>Overview</h2><p>Source: <b>{}</b> &middot; generated {}</p><div class=\"cards\">",
            escape_html(source_name),
            escape_html(generated_at)
        );
        for (label, value) in cards {
            let _ = write!(
                html,
                "<div class=\"card\"><div>{}</div><div class=\"v\">{}</div></div>",
                label,
                escape_html(&value)
            );
        }
        html.push_str("</div></section>\n");
        html
    }

    fn column_html(column: &ColumnProfile) -> String {
        let mut html = String::new();
        let _ = write!(
            html,
            "<section><h2>{}<span class=\"kind\">{}</span></h2><div class=\"row\">",
            escape_html(&column.name),
            column.kind.label()
        );

        let missing_class = if column.missing > 0 { " class=\"warn\"" } else { "" };
        let mut rows: Vec<(String, String)> = vec![
            ("dtype".into(), column.dtype.clone()),
            ("count".into(), column.count.to_string()),
            (
                "missing".into(),
                format!("{} ({:.1}%)", column.missing, column.missing_pct),
            ),
            ("distinct".into(), column.distinct.to_string()),
        ];
        if let Some(numeric) = &column.numeric {
            let s = &numeric.summary;
            for (label, v) in [
                ("mean", s.mean),
                ("std", s.std),
                ("min", s.min),
                ("25%", s.q25),
                ("50%", s.median),
                ("75%", s.q75),
                ("max", s.max),
                ("skewness", numeric.skewness),
                ("kurtosis", numeric.kurtosis),
            ] {
                rows.push((label.into(), format_number(v)));
            }
            rows.push(("zeros".into(), numeric.zeros.to_string()));
        }

        html.push_str("<table>");
        for (label, value) in rows {
            let attr = if label == "missing" { missing_class } else { "" };
            let _ = write!(
                html,
                "<tr><th class=\"l\">{}</th><td{}>{}</td></tr>",
                escape_html(&label),
                attr,
                escape_html(&value)
            );
        }
        html.push_str("</table>");

        match &column.numeric {
            Some(numeric) if column.kind == ColumnKind::Numeric => {
                html.push_str(&Self::histogram_html(&column.name, &numeric.histogram));
            }
            _ => html.push_str(&Self::top_values_html(&column.top_values, column.count)),
        }

        html.push_str("</div></section>\n");
        html
    }

    /// Inline SVG histogram, or a bin table when the chart cannot be drawn.
    fn histogram_html(name: &str, bins: &[HistogramBin]) -> String {
        if bins.is_empty() {
            return "<p>No values.</p>".to_string();
        }
        match StaticChartRenderer::render_histogram_svg(name, bins, HIST_WIDTH, HIST_HEIGHT) {
            Ok(svg) => format!("<div>{}</div>", svg),
            Err(e) => {
                warn!("Histogram for '{}' rendered as table: {}", name, e);
                let mut html = String::from("<table><tr><th>from</th><th>to</th><th>count</th></tr>");
                for bin in bins {
                    let _ = write!(
                        html,
                        "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                        format_number(bin.start),
                        format_number(bin.end),
                        bin.count
                    );
                }
                html.push_str("</table>");
                html
            }
        }
    }

    fn top_values_html(values: &[ValueCount], total: usize) -> String {
        if values.is_empty() {
            return "<p>No values.</p>".to_string();
        }
        let mut html =
            String::from("<table><tr><th class=\"l\">value</th><th>count</th><th>%</th></tr>");
        for vc in values {
            let pct = if total == 0 {
                0.0
            } else {
                vc.count as f64 * 100.0 / total as f64
            };
            let _ = write!(
                html,
                "<tr><td class=\"l\">{}</td><td>{}</td><td>{:.1}</td></tr>",
                escape_html(&vc.value),
                vc.count,
                pct
            );
        }
        html.push_str("</table>");
        html
    }

    fn correlation_html(matrix: &CorrelationMatrix) -> String {
        if matrix.columns.len() < 2 {
            return String::new();
        }

        let mut html = String::from("<section><h2>Correlations (Pearson)</h2><table><tr><th></th>");
        for name in &matrix.columns {
            let _ = write!(html, "<th>{}</th>", escape_html(name));
        }
        html.push_str("</tr>");

        for (i, name) in matrix.columns.iter().enumerate() {
            let _ = write!(html, "<tr><th class=\"l\">{}</th>", escape_html(name));
            for j in 0..matrix.columns.len() {
                let v = matrix.get(i, j);
                let c = ChartPlotter::diverging_color(v);
                let fg = if v.abs() > 0.6 { "#fff" } else { "#000" };
                let _ = write!(
                    html,
                    "<td style=\"background: rgb({},{},{}); color: {}\">{}</td>",
                    c.r(),
                    c.g(),
                    c.b(),
                    fg,
                    if v.is_nan() {
                        "&ndash;".to_string()
                    } else {
                        format!("{:.2}", v)
                    }
                );
            }
            html.push_str("</tr>");
        }
        html.push_str("</table></section>\n");
        html
    }
}

/// Escape text for HTML element and attribute content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn format_number(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{:.4}", v)
    }
}

fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::profile_dataset;
    use polars::prelude::*;

    fn sample_profile() -> DatasetProfile {
        let df = df!(
            "price" => [Some(1.0), Some(2.5), None, Some(4.0)],
            "qty" => [3i64, 1, 2, 5],
            "<tag>" => [Some("a&b"), Some("c"), Some("a&b"), None]
        )
        .unwrap();
        profile_dataset(&df, 5, 3)
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_render_html_sections() {
        let html = ReportGenerator::render_html(&sample_profile(), "sales.csv", "2025-01-01 10:00:00");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("sales.csv"));
        assert!(html.contains("<h2>price"));
        assert!(html.contains("Correlations (Pearson)"));
        // column names and values are escaped
        assert!(html.contains("&lt;tag&gt;"));
        assert!(html.contains("a&amp;b"));
        assert!(!html.contains("<tag>"));
    }

    #[test]
    fn test_write_html_creates_file() {
        let dir = std::env::temp_dir().join(format!("vizcraft_report_test_{}", std::process::id()));
        let path = ReportGenerator::write_html(&sample_profile(), "sales.csv", &dir).unwrap();
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("html"));
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("VizCraft Profiling Report"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_formatters() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(2.5), "2.5000");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
    }
}
