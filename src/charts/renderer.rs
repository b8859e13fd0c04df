//! Static Chart Renderer
//! Writes line, bar, scatter and correlation heatmap images with plotters.
//!
//! The image format follows the output path extension (`.jpg`, `.png`).

use crate::charts::ColorMap;
use crate::data::{ProcessorError, Year, YearTable};
use crate::stats::CorrelationMatrix;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontTransform;
use std::ops::Range;
use std::path::Path;
use thiserror::Error;

/// Default image size in pixels
pub const DEFAULT_SIZE: (u32, u32) = (1400, 1000);

/// At most this many year labels on a line chart x-axis
const MAX_X_LABELS: usize = 6;

const FONT: &str = "sans-serif";

// tableau-colorblind10
const PALETTE: [RGBColor; 10] = [
    RGBColor(0, 107, 164),
    RGBColor(255, 128, 14),
    RGBColor(171, 171, 171),
    RGBColor(89, 89, 89),
    RGBColor(95, 158, 209),
    RGBColor(200, 82, 0),
    RGBColor(137, 137, 137),
    RGBColor(162, 200, 236),
    RGBColor(255, 188, 121),
    RGBColor(207, 207, 207),
];

const MISSING_CELL: RGBColor = RGBColor(220, 220, 220);

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Drawing(String),
    #[error("No data to plot")]
    NoData,
    #[error("Series '{name}' has {actual} values, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("Unknown color map '{0}'")]
    UnknownColorMap(String),
    #[error(transparent)]
    Data(#[from] ProcessorError),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for RenderError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        RenderError::Drawing(err.to_string())
    }
}

/// Title and axis descriptions of one chart.
#[derive(Debug, Clone, Default)]
pub struct ChartLabels {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

impl ChartLabels {
    pub fn new(title: &str, x_label: &str, y_label: &str) -> Self {
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
        }
    }
}

/// Renders static chart images.
#[derive(Debug, Clone, Copy)]
pub struct ChartRenderer {
    size: (u32, u32),
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE)
    }
}

impl ChartRenderer {
    pub fn new(size: (u32, u32)) -> Self {
        Self { size }
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// One line per series over the year axis, with a legend.
    pub fn draw_line_chart(
        &self,
        path: &Path,
        years: &[Year],
        series: &[Vec<f64>],
        names: &[String],
        labels: &ChartLabels,
    ) -> Result<(), RenderError> {
        if years.is_empty() || series.is_empty() {
            return Err(RenderError::NoData);
        }
        Self::check_lengths(series, names, years.len())?;

        let x_range = Self::year_range(years);
        let y_range = Self::padded_range(series.iter().flatten().copied(), false);

        let root = BitMapBackend::new(path, self.size).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(labels.title.as_str(), (FONT, 24))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(90)
            .build_cartesian_2d(x_range, y_range)?;

        chart
            .configure_mesh()
            .x_labels(MAX_X_LABELS)
            .x_desc(labels.x_label.as_str())
            .y_desc(labels.y_label.as_str())
            .x_label_formatter(&|v: &f64| format!("{:.0}", v))
            .y_label_formatter(&|v: &f64| format_value(*v))
            .draw()?;

        for (idx, (values, name)) in series.iter().zip(names).enumerate() {
            let color = PALETTE[idx % PALETTE.len()];
            let points = years
                .iter()
                .zip(values)
                .filter(|(_, v)| v.is_finite())
                .map(|(&year, &v)| (year as f64, v));

            chart
                .draw_series(LineSeries::new(points, color.stroke_width(2)))?
                .label(name.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }

    /// Grouped bars: one group per index year, one bar per column.
    pub fn draw_bar_chart(
        &self,
        path: &Path,
        table: &YearTable,
        labels: &ChartLabels,
    ) -> Result<(), RenderError> {
        let names = table.numeric_columns();
        if table.height() == 0 || names.is_empty() {
            return Err(RenderError::NoData);
        }
        let series = names
            .iter()
            .map(|name| table.column_values(name))
            .collect::<Result<Vec<_>, _>>()?;

        let groups = table.height();
        let x_range = -0.5..(groups as f64 - 0.5);
        let y_range = Self::padded_range(series.iter().flatten().copied(), true);
        let bar_width = 0.8 / names.len() as f64;

        let root = BitMapBackend::new(path, self.size).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(labels.title.as_str(), (FONT, 24))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(90)
            .build_cartesian_2d(x_range, y_range)?;

        let index = table.index().to_vec();
        let x_formatter = move |v: &f64| {
            let slot = v.round();
            if (v - slot).abs() < 1e-6 && slot >= 0.0 && (slot as usize) < index.len() {
                index[slot as usize].to_string()
            } else {
                String::new()
            }
        };

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(groups)
            .x_desc(labels.x_label.as_str())
            .y_desc(labels.y_label.as_str())
            .x_label_formatter(&x_formatter)
            .y_label_formatter(&|v: &f64| format_value(*v))
            .draw()?;

        for (k, (values, name)) in series.iter().zip(&names).enumerate() {
            let color = PALETTE[k % PALETTE.len()];
            let offset = -0.4 + k as f64 * bar_width;
            let bars = values
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_finite())
                .map(move |(i, &v)| {
                    let x0 = i as f64 + offset;
                    Rectangle::new([(x0, 0.0), (x0 + bar_width, v)], color.filled())
                });

            chart
                .draw_series(bars)?
                .label(name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }

    /// Point cloud of `y` against `x`; `legend` adds a legend entry.
    pub fn draw_scatter_chart(
        &self,
        path: &Path,
        x: &[f64],
        y: &[f64],
        labels: &ChartLabels,
        legend: Option<&str>,
    ) -> Result<(), RenderError> {
        if x.is_empty() {
            return Err(RenderError::NoData);
        }
        if x.len() != y.len() {
            return Err(RenderError::LengthMismatch {
                name: labels.y_label.clone(),
                expected: x.len(),
                actual: y.len(),
            });
        }

        let points: Vec<(f64, f64)> = x
            .iter()
            .zip(y)
            .filter(|(a, b)| a.is_finite() && b.is_finite())
            .map(|(&a, &b)| (a, b))
            .collect();
        let x_range = Self::padded_range(points.iter().map(|p| p.0), false);
        let y_range = Self::padded_range(points.iter().map(|p| p.1), false);
        let color = PALETTE[0];

        let root = BitMapBackend::new(path, self.size).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(labels.title.as_str(), (FONT, 24))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(90)
            .build_cartesian_2d(x_range, y_range)?;

        chart
            .configure_mesh()
            .x_desc(labels.x_label.as_str())
            .y_desc(labels.y_label.as_str())
            .x_label_formatter(&|v: &f64| format_value(*v))
            .y_label_formatter(&|v: &f64| format_value(*v))
            .draw()?;

        let anno = chart.draw_series(
            points
                .iter()
                .map(|&(a, b)| Circle::new((a, b), 5, color.filled())),
        )?;

        if let Some(legend) = legend {
            anno.label(legend)
                .legend(move |(x, y)| Circle::new((x, y), 5, color.filled()));
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }

        root.present()?;
        Ok(())
    }

    /// Correlation matrix as colored cells annotated with 2-decimal values,
    /// plus a color bar on the right.
    pub fn draw_heatmap(
        &self,
        path: &Path,
        matrix: &CorrelationMatrix,
        title: &str,
        color_map: ColorMap,
    ) -> Result<(), RenderError> {
        let n = matrix.len();
        if n == 0 {
            return Err(RenderError::NoData);
        }
        let (lo, hi) = matrix.finite_range().unwrap_or((-1.0, 1.0));
        let shade = |v: f64| {
            if !v.is_finite() {
                MISSING_CELL
            } else if hi > lo {
                color_map.color_at((v - lo) / (hi - lo))
            } else {
                color_map.color_at(0.5)
            }
        };

        let (width, _) = self.size;
        let bar_width = (width / 6).max(120);
        let label_area = (width / 6).clamp(120, 240);

        let root = BitMapBackend::new(path, self.size).into_drawing_area();
        root.fill(&WHITE)?;
        let (main, side) = root.split_horizontally(width.saturating_sub(bar_width) as i32);

        let mut chart = ChartBuilder::on(&main)
            .caption(title, (FONT, 24))
            .margin(20)
            .x_label_area_size(label_area)
            .y_label_area_size(label_area)
            .build_cartesian_2d(0.0..n as f64, 0.0..n as f64)?;

        let cells = (0..n).flat_map(|i| (0..n).map(move |j| (i, j)));
        chart.draw_series(cells.clone().map(|(i, j)| {
            let v = matrix.get(i, j).unwrap_or(f64::NAN);
            Rectangle::new(
                [(j as f64, i as f64), (j as f64 + 1.0, i as f64 + 1.0)],
                shade(v).filled(),
            )
        }))?;

        let annotation = (FONT, 16)
            .into_font()
            .color(&WHITE)
            .pos(Pos::new(HPos::Center, VPos::Center));
        chart.draw_series(cells.map(|(i, j)| {
            let v = matrix.get(i, j).unwrap_or(f64::NAN);
            Text::new(
                format!("{:.2}", v),
                (j as f64 + 0.5, i as f64 + 0.5),
                annotation.clone(),
            )
        }))?;

        let tick = (FONT, 14).into_font().color(&BLACK);
        let x_tick = tick
            .clone()
            .transform(FontTransform::Rotate90)
            .pos(Pos::new(HPos::Left, VPos::Center));
        let y_tick = tick.pos(Pos::new(HPos::Right, VPos::Center));
        for (k, label) in matrix.labels().iter().enumerate() {
            let (px, py) = chart.backend_coord(&(k as f64 + 0.5, 0.0));
            root.draw(&Text::new(label.as_str(), (px, py + 8), x_tick.clone()))?;
            let (px, py) = chart.backend_coord(&(0.0, k as f64 + 0.5));
            root.draw(&Text::new(label.as_str(), (px - 8, py), y_tick.clone()))?;
        }

        Self::draw_color_bar(&side, lo, hi, color_map, label_area)?;

        root.present()?;
        Ok(())
    }

    fn draw_color_bar(
        area: &DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>,
        lo: f64,
        hi: f64,
        color_map: ColorMap,
        bottom: u32,
    ) -> Result<(), RenderError> {
        let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, lo + 0.5) };
        let mut chart = ChartBuilder::on(area)
            .margin(10)
            .margin_top(60)
            .margin_bottom(bottom)
            .y_label_area_size(50)
            .build_cartesian_2d(0.0..1.0, lo..hi)?;

        const STEPS: usize = 100;
        let step = (hi - lo) / STEPS as f64;
        chart.draw_series((0..STEPS).map(|s| {
            let y0 = lo + s as f64 * step;
            let t = (s as f64 + 0.5) / STEPS as f64;
            Rectangle::new([(0.0, y0), (1.0, y0 + step)], color_map.color_at(t).filled())
        }))?;

        chart
            .configure_mesh()
            .disable_mesh()
            .disable_x_axis()
            .y_labels(8)
            .y_label_formatter(&|v: &f64| format!("{:.2}", v))
            .draw()?;
        Ok(())
    }

    fn check_lengths(
        series: &[Vec<f64>],
        names: &[String],
        expected: usize,
    ) -> Result<(), RenderError> {
        if names.len() != series.len() {
            return Err(RenderError::LengthMismatch {
                name: "legend".to_string(),
                expected: series.len(),
                actual: names.len(),
            });
        }
        for (values, name) in series.iter().zip(names) {
            if values.len() != expected {
                return Err(RenderError::LengthMismatch {
                    name: name.clone(),
                    expected,
                    actual: values.len(),
                });
            }
        }
        Ok(())
    }

    fn year_range(years: &[Year]) -> Range<f64> {
        let min = years.iter().copied().min().unwrap_or(0) as f64;
        let max = years.iter().copied().max().unwrap_or(0) as f64;
        if max > min {
            min..max
        } else {
            (min - 0.5)..(max + 0.5)
        }
    }

    /// Finite value range with 5% padding; `from_zero` anchors bars at 0.
    fn padded_range(values: impl Iterator<Item = f64>, from_zero: bool) -> Range<f64> {
        let (mut lo, mut hi) = values
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if lo > hi {
            return 0.0..1.0;
        }
        if from_zero {
            lo = lo.min(0.0);
            hi = hi.max(0.0);
        }
        if hi == lo {
            let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
            return (lo - pad)..(hi + pad);
        }
        let pad = (hi - lo) * 0.05;
        let lo = if from_zero && lo == 0.0 { 0.0 } else { lo - pad };
        lo..(hi + pad)
    }
}

/// Compact axis label: 1.2B, 35.0M, 4.5K, 0.25.
pub fn format_value(v: f64) -> String {
    let abs = v.abs();
    if abs >= 1e9 {
        format!("{:.1}B", v / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if abs >= 1e4 {
        format!("{:.1}K", v / 1e3)
    } else if abs >= 100.0 || v == v.trunc() {
        format!("{:.0}", v)
    } else {
        format!("{:.2}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(2.75e8), "275.0M");
        assert_eq!(format_value(1.5e9), "1.5B");
        assert_eq!(format_value(45000.0), "45.0K");
        assert_eq!(format_value(1970.0), "1970");
        assert_eq!(format_value(0.25), "0.25");
        assert_eq!(format_value(-0.5), "-0.50");
    }

    #[test]
    fn test_padded_range() {
        let r = ChartRenderer::padded_range([0.0, 10.0].into_iter(), false);
        assert_eq!(r, -0.5..10.5);

        let r = ChartRenderer::padded_range([5.0, 10.0].into_iter(), true);
        assert_eq!(r, 0.0..10.5);

        let r = ChartRenderer::padded_range([f64::NAN].into_iter(), false);
        assert_eq!(r, 0.0..1.0);

        let r = ChartRenderer::padded_range([4.0, 4.0].into_iter(), false);
        assert!(r.start < 4.0 && r.end > 4.0);
    }

    #[test]
    fn test_year_range() {
        assert_eq!(ChartRenderer::year_range(&[1970, 2021]), 1970.0..2021.0);
        assert_eq!(ChartRenderer::year_range(&[2000]), 1999.5..2000.5);
    }

    #[test]
    fn test_rejects_empty_or_ragged_input() {
        let renderer = ChartRenderer::default();
        let labels = ChartLabels::new("t", "x", "y");
        let path = Path::new("never_written.png");

        let err = renderer
            .draw_line_chart(path, &[], &[], &[], &labels)
            .unwrap_err();
        assert!(matches!(err, RenderError::NoData));

        let err = renderer
            .draw_line_chart(
                path,
                &[2000, 2001],
                &[vec![1.0]],
                &["a".to_string()],
                &labels,
            )
            .unwrap_err();
        assert!(matches!(err, RenderError::LengthMismatch { .. }));

        let err = renderer
            .draw_scatter_chart(path, &[1.0, 2.0], &[1.0], &labels, None)
            .unwrap_err();
        assert!(matches!(err, RenderError::LengthMismatch { .. }));
        assert!(!path.exists());
    }
}
