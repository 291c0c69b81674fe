//! Charts module - chart selection and rendering

mod renderer;
mod selector;
mod spec;

pub use renderer::{font_available, format_value, PngRenderer, RenderError, Renderer};
pub use selector::{humanize, slug, ChartSelector, SelectionError, PIE_MAX_CATEGORIES};
pub use spec::{dashboard_grid, Archetype, ChartKind, ChartSpec, ChartStyle};
