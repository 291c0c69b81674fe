//! Chart Specifications
//! Declarative chart requests produced by the selector and consumed by a renderer.

use crate::config::Rgb;
use std::fmt;

/// Chart family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Archetype {
    Trend,
    Pie,
    Bar,
    Comparison,
    Dashboard,
}

impl Archetype {
    pub fn as_str(self) -> &'static str {
        match self {
            Archetype::Trend => "trend",
            Archetype::Pie => "pie",
            Archetype::Bar => "bar",
            Archetype::Comparison => "comparison",
            Archetype::Dashboard => "dashboard",
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved style for one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub palette: Vec<Rgb>,
    pub text_color: Rgb,
    pub background: Rgb,
    pub plot_background: Rgb,
    pub font_family: String,
    pub font_px: u32,
    pub title_px: u32,
    /// Canvas size in pixels.
    pub size: (u32, u32),
    pub dpi: u32,
    pub value_labels: bool,
    /// Donut hole as a fraction of the radius, pie only.
    pub donut_hole: Option<f64>,
}

impl ChartStyle {
    /// Palette color for the n-th series, cycling.
    pub fn color(&self, index: usize) -> Rgb {
        if self.palette.is_empty() {
            return self.text_color;
        }
        self.palette[index % self.palette.len()]
    }
}

/// Column roles per archetype.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartKind {
    /// Numeric series over a temporal axis.
    Trend { axis: String, series: Vec<String> },
    /// Share of a numeric column per category.
    Pie { label: String, value: String },
    /// Grouped bars per row. Rows are numbered when `label` is `None`.
    Bar {
        label: Option<String>,
        series: Vec<String>,
    },
    /// Prior versus latest period rows of `label`.
    Comparison {
        label: String,
        prior_row: usize,
        latest_row: usize,
        series: Vec<String>,
    },
    Dashboard {
        panels: Vec<ChartSpec>,
        /// (rows, columns)
        grid: (usize, usize),
    },
}

/// A request to render one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub file_stem: String,
    pub style: ChartStyle,
}

impl ChartKind {
    pub fn archetype(&self) -> Archetype {
        match self {
            ChartKind::Trend { .. } => Archetype::Trend,
            ChartKind::Pie { .. } => Archetype::Pie,
            ChartKind::Bar { .. } => Archetype::Bar,
            ChartKind::Comparison { .. } => Archetype::Comparison,
            ChartKind::Dashboard { .. } => Archetype::Dashboard,
        }
    }
}

impl ChartSpec {
    pub fn archetype(&self) -> Archetype {
        self.kind.archetype()
    }

    /// Every column name this chart reads, without duplicates.
    pub fn columns(&self) -> Vec<&str> {
        let mut names = Vec::new();
        match &self.kind {
            ChartKind::Trend { axis, series } => {
                push_unique(&mut names, axis);
                series.iter().for_each(|s| push_unique(&mut names, s));
            }
            ChartKind::Pie { label, value } => {
                push_unique(&mut names, label);
                push_unique(&mut names, value);
            }
            ChartKind::Bar { label, series } => {
                if let Some(label) = label {
                    push_unique(&mut names, label);
                }
                series.iter().for_each(|s| push_unique(&mut names, s));
            }
            ChartKind::Comparison { label, series, .. } => {
                push_unique(&mut names, label);
                series.iter().for_each(|s| push_unique(&mut names, s));
            }
            ChartKind::Dashboard { panels, .. } => {
                for name in panels.iter().flat_map(ChartSpec::columns) {
                    push_unique(&mut names, name);
                }
            }
        }
        names
    }

    /// Dashboard panels; empty for single charts.
    pub fn panels(&self) -> &[ChartSpec] {
        match &self.kind {
            ChartKind::Dashboard { panels, .. } => panels,
            _ => &[],
        }
    }
}

fn push_unique<'s>(names: &mut Vec<&'s str>, name: &'s str) {
    if !names.contains(&name) {
        names.push(name);
    }
}

/// Grid for a dashboard of `panels` charts as (rows, columns).
pub fn dashboard_grid(panels: usize) -> (usize, usize) {
    let cols = if panels <= 1 { 1 } else { 2 };
    (panels.max(1).div_ceil(cols), cols)
}
