//! Dashboard module - view model and the pure page renderer

mod model;
mod render;

pub use model::*;
pub use render::{render, render_region_panel, DashboardSettings, FilterState, PAGE_TITLE};
