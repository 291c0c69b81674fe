//! PNG Chart Renderer
//! Draws chart specs with plotters into an RGB buffer and saves them as PNG files.
//!
//! Layouts:
//! - Trend: one line per series over the period labels, growth in the legend
//! - Bar: grouped bars per row label
//! - Pie: donut with percentages and a `label: value` legend
//! - Comparison: prior vs latest bars per series with the percent change on top
//! - Dashboard: grid of the above under a figure title

use super::spec::{ChartKind, ChartSpec, ChartStyle};
use crate::config::Rgb;
use crate::data::{Table, TypedColumn};
use crate::stats::{percent_change, ColumnSummary};
use plotters::coord::combinators::{BindKeyPoints, WithKeyPoints};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Share of a group slot covered by its bars.
const GROUP_WIDTH: f64 = 0.8;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to create output folder {}: {source}", path.display())]
    Folder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Drawing failed: {0}")]
    Drawing(String),
    #[error("Failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Column '{0}' not found in table")]
    MissingColumn(String),
    #[error("Column '{0}' is not numeric")]
    NotNumeric(String),
    #[error("Nothing to draw for '{0}'")]
    Empty(String),
}

impl<E> From<DrawingAreaErrorKind<E>> for RenderError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        Self::Drawing(err.to_string())
    }
}

/// Turns one chart spec into an image file.
pub trait Renderer {
    /// Render `spec` and return the written file.
    fn render(&self, spec: &ChartSpec) -> Result<PathBuf, RenderError>;
}

/// Renders charts from one table into a folder of PNG files.
pub struct PngRenderer<'a> {
    table: &'a Table,
    folder: PathBuf,
}

impl<'a> PngRenderer<'a> {
    pub fn new(table: &'a Table, folder: impl Into<PathBuf>) -> Self {
        Self {
            table,
            folder: folder.into(),
        }
    }

    fn column(&self, name: &str) -> Result<&'a TypedColumn, RenderError> {
        self.table
            .column(name)
            .ok_or_else(|| RenderError::MissingColumn(name.to_string()))
    }

    fn numbers(&self, name: &str) -> Result<&'a [Option<f64>], RenderError> {
        self.column(name)?
            .numbers()
            .ok_or_else(|| RenderError::NotNumeric(name.to_string()))
    }

    /// Fail before drawing when the spec does not fit the table.
    fn check(&self, spec: &ChartSpec) -> Result<(), RenderError> {
        for name in spec.columns() {
            self.column(name)?;
        }
        match &spec.kind {
            ChartKind::Trend { series, .. }
            | ChartKind::Bar { series, .. }
            | ChartKind::Comparison { series, .. } => {
                for name in series {
                    self.numbers(name)?;
                }
            }
            ChartKind::Pie { value, .. } => {
                self.numbers(value)?;
            }
            ChartKind::Dashboard { panels, .. } => {
                for panel in panels {
                    self.check(panel)?;
                }
            }
        }
        if let ChartKind::Comparison {
            prior_row,
            latest_row,
            ..
        } = spec.kind
        {
            if prior_row.max(latest_row) >= self.table.row_count() {
                return Err(RenderError::Empty(spec.title.clone()));
            }
        }
        Ok(())
    }

    fn draw_to_buffer(&self, spec: &ChartSpec) -> Result<Vec<u8>, RenderError> {
        let (width, height) = spec.style.size;
        let len = buffer_len(width, height).ok_or_else(|| {
            RenderError::Drawing(format!("{width}x{height} image is too large"))
        })?;
        let mut buffer = vec![0u8; len];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&color(spec.style.background))?;
            self.draw_chart(&root, spec)?;
            root.present()?;
        }
        Ok(buffer)
    }

    fn draw_chart<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        spec: &ChartSpec,
    ) -> Result<(), RenderError> {
        match &spec.kind {
            ChartKind::Trend { axis, series } => self.draw_trend(area, spec, axis, series),
            ChartKind::Pie { label, value } => self.draw_pie(area, spec, label, value),
            ChartKind::Bar { label, series } => {
                let groups = self.bar_groups(label.as_deref(), series)?;
                draw_groups(area, spec, &groups)
            }
            ChartKind::Comparison {
                label,
                prior_row,
                latest_row,
                series,
            } => {
                let groups = self.comparison_groups(label, *prior_row, *latest_row, series)?;
                draw_groups(area, spec, &groups)
            }
            ChartKind::Dashboard { panels, grid } => {
                let style = &spec.style;
                let inner = area.titled(&spec.title, title_style(style))?;
                let cells = inner.split_evenly(*grid);
                for (panel, cell) in panels.iter().zip(cells.iter()) {
                    cell.fill(&color(panel.style.background))?;
                    self.draw_chart(cell, panel)?;
                }
                Ok(())
            }
        }
    }

    fn draw_trend<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        spec: &ChartSpec,
        axis: &str,
        series: &[String],
    ) -> Result<(), RenderError> {
        let style = &spec.style;
        let axis_column = self.column(axis)?;
        let labels: Vec<String> = (0..self.table.row_count())
            .map(|row| axis_column.label(row).unwrap_or_default())
            .collect();

        let mut lines = Vec::with_capacity(series.len());
        for name in series {
            let values = self.numbers(name)?;
            let points = trend_points(values);
            let summary = ColumnSummary::from_values(values);
            lines.push((name.as_str(), points, summary.growth_percent()));
        }

        let all: Vec<f64> = lines
            .iter()
            .flat_map(|(_, points, _)| points.iter().map(|p| p.1))
            .collect();
        if all.is_empty() {
            return Err(RenderError::Empty(spec.title.clone()));
        }
        let (y_min, y_max) = value_range(&all, false);
        let n = labels.len();
        let keys: Vec<f64> = (0..n).map(|i| i as f64).collect();

        let mut chart = ChartBuilder::on(area)
            .caption(&spec.title, title_style(style))
            .margin(margin(style))
            .x_label_area_size(style.font_px * 3)
            .y_label_area_size(style.font_px * 5)
            .build_cartesian_2d(
                (-0.5..n as f64 - 0.5).with_key_points(keys),
                y_min..y_max,
            )?;
        chart.plotting_area().fill(&color(style.plot_background))?;

        let x_formatter = |x: &f64| category_label(&labels, *x);
        let y_formatter = |y: &f64| format_value(*y);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(humanize_axis(axis))
            .x_label_formatter(&x_formatter)
            .y_label_formatter(&y_formatter)
            .label_style(body_style(style))
            .axis_desc_style(body_style(style))
            .light_line_style(color(style.plot_background))
            .draw()?;

        for (i, (name, points, growth)) in lines.into_iter().enumerate() {
            let line_color = color(style.color(i));
            let legend = match growth {
                Some(growth) => format!("{name} ({growth:+.1}%)"),
                None => name.to_string(),
            };
            chart
                .draw_series(LineSeries::new(
                    points.iter().copied(),
                    line_color.stroke_width(3),
                ))?
                .label(legend)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 16, y)], line_color.stroke_width(3))
                });
            chart.draw_series(
                points
                    .iter()
                    .map(|p| Circle::new(*p, 5, line_color.filled())),
            )?;
            if style.value_labels {
                let anchor = small_style(style).pos(Pos::new(HPos::Center, VPos::Bottom));
                let offset = (y_max - y_min) * 0.015;
                chart.draw_series(points.iter().map(|(x, y)| {
                    Text::new(format_value(*y), (*x, *y + offset), anchor.clone())
                }))?;
            }
        }

        draw_legend(&mut chart, style)?;
        Ok(())
    }

    fn draw_pie<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        spec: &ChartSpec,
        label: &str,
        value: &str,
    ) -> Result<(), RenderError> {
        let style = &spec.style;
        let slices = pie_slices(self.column(label)?, self.numbers(value)?);
        if slices.is_empty() {
            return Err(RenderError::Empty(spec.title.clone()));
        }

        let inner = area.titled(&spec.title, title_style(style))?;
        let (width, _) = inner.dim_in_pixel();
        let (pie_area, legend_area) = inner.split_horizontally((width as f64 * 0.65) as i32);

        let (pie_w, pie_h) = pie_area.dim_in_pixel();
        let center = (pie_w as i32 / 2, pie_h as i32 / 2);
        let radius = pie_w.min(pie_h) as f64 * 0.38;
        let sizes: Vec<f64> = slices.iter().map(|(_, v)| *v).collect();
        let colors: Vec<RGBColor> = (0..slices.len()).map(|i| color(style.color(i))).collect();
        let labels: Vec<String> = slices.iter().map(|(l, _)| l.clone()).collect();

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(-90.0);
        pie.label_style(body_style(style));
        pie.percentages(body_style(style).color(&WHITE));
        if let Some(hole) = style.donut_hole {
            pie.donut_hole(radius * hole);
        }
        pie_area.draw(&pie)?;

        let text = body_style(style);
        let swatch = style.font_px as i32;
        let line = swatch * 2;
        let top = pie_h as i32 / 2 - line * slices.len() as i32 / 2;
        let heading = text.clone().pos(Pos::new(HPos::Left, VPos::Top));
        legend_area.draw_text(&humanize_axis(label), &heading, (0, top - line))?;
        for (i, (name, amount)) in slices.iter().enumerate() {
            let y = top + i as i32 * line;
            legend_area.draw(&Rectangle::new(
                [(0, y), (swatch, y + swatch)],
                colors[i].filled(),
            ))?;
            legend_area.draw_text(
                &format!("{name}: {}", format_value(*amount)),
                &heading,
                (swatch + swatch / 2, y),
            )?;
        }
        Ok(())
    }

    fn bar_groups(&self, label: Option<&str>, series: &[String]) -> Result<Groups, RenderError> {
        let rows = self.table.row_count();
        let labels = match label {
            Some(label) => {
                let column = self.column(label)?;
                (0..rows)
                    .map(|row| column.label(row).unwrap_or_default())
                    .collect()
            }
            None => (1..=rows).map(|row| row.to_string()).collect(),
        };
        let mut bars = Vec::with_capacity(series.len());
        for name in series {
            bars.push((name.clone(), self.numbers(name)?.to_vec()));
        }
        Ok(Groups {
            labels,
            bars,
            notes: Vec::new(),
            x_desc: label.map(humanize_axis).unwrap_or_else(|| "Row".to_string()),
        })
    }

    fn comparison_groups(
        &self,
        label: &str,
        prior_row: usize,
        latest_row: usize,
        series: &[String],
    ) -> Result<Groups, RenderError> {
        let column = self.column(label)?;
        let mut prior = Vec::with_capacity(series.len());
        let mut latest = Vec::with_capacity(series.len());
        let mut notes = Vec::with_capacity(series.len());
        for name in series {
            let values = self.numbers(name)?;
            let (before, after) = (values[prior_row], values[latest_row]);
            prior.push(before);
            latest.push(after);
            notes.push(match (before, after) {
                (Some(before), Some(after)) => {
                    percent_change(before, after).map(|change| format!("{change:+.1}%"))
                }
                _ => None,
            });
        }
        let row_name = |row| column.label(row).unwrap_or_else(|| format!("Row {}", row + 1));
        Ok(Groups {
            labels: series.iter().map(|s| humanize_axis(s)).collect(),
            bars: vec![(row_name(prior_row), prior), (row_name(latest_row), latest)],
            notes,
            x_desc: String::new(),
        })
    }
}

impl Renderer for PngRenderer<'_> {
    fn render(&self, spec: &ChartSpec) -> Result<PathBuf, RenderError> {
        fs::create_dir_all(&self.folder).map_err(|source| RenderError::Folder {
            path: self.folder.clone(),
            source,
        })?;
        self.check(spec)?;

        let (width, height) = spec.style.size;
        let buffer = self.draw_to_buffer(spec)?;
        let path = self.folder.join(format!("{}.png", spec.file_stem));
        let image = image::RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| RenderError::Drawing("pixel buffer size mismatch".to_string()))?;
        image.save(&path).map_err(|source| RenderError::Encode {
            path: path.clone(),
            source,
        })?;

        debug!("Wrote {}x{} image to {}", width, height, path.display());
        Ok(path)
    }
}

/// Grouped bar layout shared by bar and comparison charts.
struct Groups {
    /// One label per x slot.
    labels: Vec<String>,
    /// Legend name and one value per slot, per bar series.
    bars: Vec<(String, Vec<Option<f64>>)>,
    /// Optional text above each slot.
    notes: Vec<Option<String>>,
    x_desc: String,
}

fn draw_groups<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    groups: &Groups,
) -> Result<(), RenderError> {
    let style = &spec.style;
    let all: Vec<f64> = groups
        .bars
        .iter()
        .flat_map(|(_, values)| values.iter().flatten().copied())
        .collect();
    if all.is_empty() || groups.labels.is_empty() {
        return Err(RenderError::Empty(spec.title.clone()));
    }
    let (y_min, y_max) = value_range(&all, true);
    let n = groups.labels.len();
    let keys: Vec<f64> = (0..n).map(|i| i as f64).collect();

    let mut chart = ChartBuilder::on(area)
        .caption(&spec.title, title_style(style))
        .margin(margin(style))
        .x_label_area_size(style.font_px * 3)
        .y_label_area_size(style.font_px * 5)
        .build_cartesian_2d((-0.5..n as f64 - 0.5).with_key_points(keys), y_min..y_max)?;
    chart.plotting_area().fill(&color(style.plot_background))?;

    let x_formatter = |x: &f64| category_label(&groups.labels, *x);
    let y_formatter = |y: &f64| format_value(*y);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(groups.x_desc.as_str())
        .x_label_formatter(&x_formatter)
        .y_label_formatter(&y_formatter)
        .label_style(body_style(style))
        .axis_desc_style(body_style(style))
        .light_line_style(color(style.plot_background))
        .draw()?;

    let width = GROUP_WIDTH / groups.bars.len() as f64;
    let offset = (y_max - y_min) * 0.015;
    for (k, (name, values)) in groups.bars.iter().enumerate() {
        let bar_color = color(style.color(k));
        let bars = bar_positions(values, k, width);

        chart
            .draw_series(bars.iter().map(|&(x0, v)| {
                Rectangle::new([(x0, 0.0), (x0 + width * 0.95, v)], bar_color.filled())
            }))?
            .label(name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 12, y + 6)], bar_color.filled()));

        if style.value_labels {
            chart.draw_series(bars.iter().map(|&(x0, v)| {
                let (anchor, y) = if v >= 0.0 {
                    (VPos::Bottom, v + offset)
                } else {
                    (VPos::Top, v - offset)
                };
                let text = small_style(style).pos(Pos::new(HPos::Center, anchor));
                Text::new(format_value(v), (x0 + width / 2.0, y), text)
            }))?;
        }
    }

    let tops: Vec<f64> = (0..n)
        .map(|slot| {
            groups
                .bars
                .iter()
                .filter_map(|(_, values)| values.get(slot).copied().flatten())
                .fold(0.0, f64::max)
        })
        .collect();
    let emphasis = body_style(style).pos(Pos::new(HPos::Center, VPos::Bottom));
    chart.draw_series(groups.notes.iter().enumerate().filter_map(|(slot, note)| {
        let note = note.as_ref()?;
        Some(Text::new(
            note.clone(),
            (slot as f64, tops[slot] + offset * 5.0),
            emphasis.clone(),
        ))
    }))?;

    draw_legend(&mut chart, style)?;
    Ok(())
}

/// Line points per row index. Missing values leave a gap.
fn trend_points(values: &[Option<f64>]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
        .collect()
}

/// Left edge and height of the `series`-th bar in each slot. Missing values get no bar.
fn bar_positions(values: &[Option<f64>], series: usize, width: f64) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .filter_map(|(slot, v)| {
            v.map(|v| (slot as f64 - GROUP_WIDTH / 2.0 + series as f64 * width, v))
        })
        .collect()
}

/// Bytes of an RGB buffer, `None` when it cannot be addressed.
fn buffer_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(3)
}

type CategoryCoord = Cartesian2d<WithKeyPoints<RangedCoordf64>, RangedCoordf64>;

fn draw_legend<'a, DB: DrawingBackend + 'a>(
    chart: &mut ChartContext<'a, DB, CategoryCoord>,
    style: &ChartStyle,
) -> Result<(), RenderError> {
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.85))
        .border_style(&color(style.text_color))
        .label_font(body_style(style))
        .draw()?;
    Ok(())
}

/// Positive category slices aggregated per label in first-appearance order.
fn pie_slices(labels: &TypedColumn, values: &[Option<f64>]) -> Vec<(String, f64)> {
    let mut slices: Vec<(String, f64)> = Vec::new();
    for (row, value) in values.iter().enumerate() {
        let (Some(label), Some(value)) = (labels.label(row), *value) else {
            continue;
        };
        if value <= 0.0 {
            continue;
        }
        match slices.iter_mut().find(|(name, _)| *name == label) {
            Some((_, total)) => *total += value,
            None => slices.push((label, value)),
        }
    }
    slices
}

/// Label of the slot at `x`, blank between slots.
fn category_label(labels: &[String], x: f64) -> String {
    let slot = x.round();
    if (x - slot).abs() > 1e-6 || slot < 0.0 {
        return String::new();
    }
    labels.get(slot as usize).cloned().unwrap_or_default()
}

/// Axis range with padding. Bars always include zero.
fn value_range(values: &[f64], include_zero: bool) -> (f64, f64) {
    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    let mut span = hi - lo;
    if span <= 0.0 {
        span = hi.abs().max(1.0);
    }
    let pad = span * 0.1;
    let bottom = if include_zero && lo >= 0.0 { 0.0 } else { lo - pad };
    (bottom, hi + pad)
}

/// `12,114` for large values, `17.5` or `0.25` otherwise.
pub fn format_value(value: f64) -> String {
    if value.abs() >= 1000.0 {
        let digits = format!("{:.0}", value.abs());
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        return if value < 0.0 {
            format!("-{grouped}")
        } else {
            grouped
        };
    }
    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Whether `family` resolves to a font that can lay out text.
pub fn font_available(family: &str) -> bool {
    (family, 12.0).into_font().box_size("Ag").is_ok()
}

fn humanize_axis(name: &str) -> String {
    super::selector::humanize(name)
}

fn color(rgb: Rgb) -> RGBColor {
    RGBColor(rgb.0, rgb.1, rgb.2)
}

fn margin(style: &ChartStyle) -> i32 {
    (style.font_px * 2) as i32
}

fn title_style(style: &ChartStyle) -> TextStyle<'_> {
    (style.font_family.as_str(), style.title_px as f64)
        .into_font()
        .color(&color(style.text_color))
}

fn body_style(style: &ChartStyle) -> TextStyle<'_> {
    (style.font_family.as_str(), style.font_px as f64)
        .into_font()
        .color(&color(style.text_color))
}

fn small_style(style: &ChartStyle) -> TextStyle<'_> {
    (style.font_family.as_str(), style.font_px as f64 * 0.85)
        .into_font()
        .color(&color(style.text_color))
}
