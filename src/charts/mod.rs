//! Charts module - Static chart rendering

mod colormap;
mod renderer;

pub use colormap::ColorMap;
pub use renderer::{format_value, ChartLabels, ChartRenderer, RenderError, DEFAULT_SIZE};
