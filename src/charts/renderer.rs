//! Static Chart Renderer
//! Rasterizes view-model charts with plotters, for the page images and PNG export.
//!
//! - Heatmap: lift per (antecedent, consequent), "YlGnBu" scale, two-decimal annotations
//! - Network: spring-laid-out rule graph, red antecedents, blue consequents
//! - Bars: horizontal (largest on top) or vertical, one colour per category
//! - Lines: one series per sub-category across period labels

use crate::charts::plotter::PALETTE;
use crate::dashboard::{BarView, HeatmapView, LineView, NetworkView};
use crate::graph::NodeRole;
use image::RgbImage;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Drawing(String),
    #[error("Image buffer size mismatch")]
    Buffer,
}

const FONT: &str = "sans-serif";
const GRAY: RGBColor = RGBColor(150, 150, 150);
const ANTECEDENT_COLOR: RGBColor = RGBColor(220, 50, 47); // Red
const CONSEQUENT_COLOR: RGBColor = RGBColor(38, 110, 220); // Blue
const BAR_GREEN: RGBColor = RGBColor(0, 128, 0);

/// ColorBrewer YlGnBu, light to dark.
const YLGNBU: [(u8, u8, u8); 9] = [
    (255, 255, 217),
    (237, 248, 177),
    (199, 233, 180),
    (127, 205, 187),
    (65, 182, 196),
    (29, 145, 192),
    (34, 94, 168),
    (37, 52, 148),
    (8, 29, 88),
];

const NODE_RADIUS: i32 = 16;

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Drawing(e.to_string())
}

fn palette_color(idx: usize) -> RGBColor {
    let c = PALETTE[idx % PALETTE.len()];
    RGBColor(c.r(), c.g(), c.b())
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Map t in [0, 1] onto the YlGnBu scale.
    pub fn ylgnbu(t: f64) -> RGBColor {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let scaled = t * (YLGNBU.len() - 1) as f64;
        let lo = scaled.floor() as usize;
        let hi = (lo + 1).min(YLGNBU.len() - 1);
        let frac = scaled - lo as f64;
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        let (a, b) = (YLGNBU[lo], YLGNBU[hi]);
        RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
    }

    /// Dark text on light cells, white text on dark cells.
    fn annotation_color(cell: RGBColor) -> RGBColor {
        let luminance = 0.299 * cell.0 as f64 + 0.587 * cell.1 as f64 + 0.114 * cell.2 as f64;
        if luminance > 140.0 {
            BLACK
        } else {
            WHITE
        }
    }

    /// Allocate an RGB buffer, draw into it and hand back an image.
    fn render_with<F>(width: u32, height: u32, draw: F) -> Result<RgbImage, RenderError>
    where
        F: FnOnce(&DrawingArea<BitMapBackend, plotters::coord::Shift>) -> Result<(), RenderError>,
    {
        let mut buffer = vec![255u8; (width * height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;
            draw(&root)?;
            root.present().map_err(draw_err)?;
        }
        RgbImage::from_raw(width, height, buffer).ok_or(RenderError::Buffer)
    }

    pub fn render_heatmap(view: &HeatmapView, width: u32, height: u32) -> Result<RgbImage, RenderError> {
        let grid = &view.grid;
        let n_rows = grid.row_labels.len();
        let n_cols = grid.col_labels.len();
        let (lo, hi) = grid.value_range().unwrap_or((0.0, 1.0));
        let span = if hi > lo { hi - lo } else { 1.0 };

        Self::render_with(width, height, |root| {
            let mut chart = ChartBuilder::on(root)
                .caption(&view.title, (FONT, 24))
                .margin(10)
                .x_label_area_size(160)
                .y_label_area_size(180)
                .build_cartesian_2d(0.0..n_cols as f64, 0.0..n_rows as f64)
                .map_err(draw_err)?;

            chart
                .configure_mesh()
                .disable_mesh()
                .x_label_formatter(&|_| String::new())
                .y_label_formatter(&|_| String::new())
                .x_desc(view.x_label.as_str())
                .y_desc(view.y_label.as_str())
                .axis_desc_style((FONT, 16))
                .draw()
                .map_err(draw_err)?;

            for (r, row) in grid.cells.iter().enumerate() {
                // first row at the top
                let y = (n_rows - 1 - r) as f64;
                for (c, cell) in row.iter().enumerate() {
                    let Some(value) = cell else {
                        continue;
                    };
                    let x = c as f64;
                    let color = Self::ylgnbu((value - lo) / span);
                    chart
                        .draw_series(std::iter::once(Rectangle::new(
                            [(x, y), (x + 1.0, y + 1.0)],
                            color.filled(),
                        )))
                        .map_err(draw_err)?;
                    chart
                        .draw_series(std::iter::once(Rectangle::new(
                            [(x, y), (x + 1.0, y + 1.0)],
                            WHITE.stroke_width(1),
                        )))
                        .map_err(draw_err)?;

                    let style = (FONT, 13)
                        .into_font()
                        .color(&Self::annotation_color(color))
                        .pos(Pos::new(HPos::Center, VPos::Center));
                    chart
                        .draw_series(std::iter::once(Text::new(
                            format!("{:.2}", value),
                            (x + 0.5, y + 0.5),
                            style,
                        )))
                        .map_err(draw_err)?;
                }
            }

            let x_style = (FONT, 12)
                .into_font()
                .transform(FontTransform::Rotate90)
                .color(&BLACK)
                .pos(Pos::new(HPos::Left, VPos::Center));
            for (c, label) in grid.col_labels.iter().enumerate() {
                let (px, py) = chart.backend_coord(&(c as f64 + 0.5, 0.0));
                root.draw(&Text::new(label.clone(), (px, py + 8), x_style.clone()))
                    .map_err(draw_err)?;
            }

            let y_style = (FONT, 12).into_font().color(&BLACK).pos(Pos::new(HPos::Right, VPos::Center));
            for (r, label) in grid.row_labels.iter().enumerate() {
                let y = (n_rows - 1 - r) as f64 + 0.5;
                let (px, py) = chart.backend_coord(&(0.0, y));
                root.draw(&Text::new(label.clone(), (px - 8, py), y_style.clone()))
                    .map_err(draw_err)?;
            }

            Ok(())
        })
    }

    pub fn render_network(view: &NetworkView, width: u32, height: u32) -> Result<RgbImage, RenderError> {
        Self::render_with(width, height, |root| {
            let chart = ChartBuilder::on(root)
                .caption(&view.title, (FONT, 24))
                .margin(30)
                .build_cartesian_2d(-1.2..1.2, -1.2..1.2)
                .map_err(draw_err)?;

            for edge in &view.edges {
                let (Some(from), Some(to)) = (view.nodes.get(edge.source), view.nodes.get(edge.target)) else {
                    continue;
                };
                let start = chart.backend_coord(&(from.x, from.y));
                let end = chart.backend_coord(&(to.x, to.y));
                let stroke = ShapeStyle {
                    color: GRAY.to_rgba(),
                    filled: false,
                    stroke_width: edge.width.round().max(1.0) as u32,
                };
                root.draw(&PathElement::new(vec![start, end], stroke))
                    .map_err(draw_err)?;
                if let Some(head) = Self::arrow_head(start, end) {
                    root.draw(&Polygon::new(head, GRAY.filled())).map_err(draw_err)?;
                }
            }

            let label_style = (FONT, 13).into_font().color(&BLACK).pos(Pos::new(HPos::Center, VPos::Center));
            for node in &view.nodes {
                let center = chart.backend_coord(&(node.x, node.y));
                let color = match node.role {
                    NodeRole::Antecedent => ANTECEDENT_COLOR,
                    NodeRole::Consequent => CONSEQUENT_COLOR,
                };
                root.draw(&Circle::new(center, NODE_RADIUS, color.filled()))
                    .map_err(draw_err)?;
                root.draw(&Text::new(node.label.clone(), center, label_style.clone()))
                    .map_err(draw_err)?;
            }

            Ok(())
        })
    }

    /// Triangle pointing at `end`, stopping at the node's rim.
    fn arrow_head(start: (i32, i32), end: (i32, i32)) -> Option<Vec<(i32, i32)>> {
        let dx = (end.0 - start.0) as f64;
        let dy = (end.1 - start.1) as f64;
        let len = (dx * dx + dy * dy).sqrt();
        if len <= NODE_RADIUS as f64 * 2.0 {
            return None;
        }
        let (ux, uy) = (dx / len, dy / len);
        let tip = (end.0 as f64 - ux * NODE_RADIUS as f64, end.1 as f64 - uy * NODE_RADIUS as f64);
        let back = (tip.0 - ux * 14.0, tip.1 - uy * 14.0);
        let (px, py) = (-uy * 6.0, ux * 6.0);
        Some(vec![
            (tip.0.round() as i32, tip.1.round() as i32),
            ((back.0 + px).round() as i32, (back.1 + py).round() as i32),
            ((back.0 - px).round() as i32, (back.1 - py).round() as i32),
        ])
    }

    pub fn render_bars(view: &BarView, width: u32, height: u32) -> Result<RgbImage, RenderError> {
        let n = view.bars.len();
        let max = view.bars.iter().map(|b| b.value).fold(0.0f64, f64::max);
        let min = view.bars.iter().map(|b| b.value).fold(0.0f64, f64::min);
        let value_range = min * 1.1..if max > 0.0 { max * 1.1 } else { 1.0 };

        Self::render_with(width, height, |root| {
            let label_style = (FONT, 13).into_font().color(&BLACK);

            if view.horizontal {
                let mut chart = ChartBuilder::on(root)
                    .caption(&view.title, (FONT, 20))
                    .margin(15)
                    .x_label_area_size(40)
                    .y_label_area_size(120)
                    .build_cartesian_2d(value_range.clone(), 0.0..n as f64)
                    .map_err(draw_err)?;
                chart
                    .configure_mesh()
                    .disable_y_mesh()
                    .y_label_formatter(&|_| String::new())
                    .x_desc(view.value_label.as_str())
                    .y_desc(view.category_label.as_str())
                    .draw()
                    .map_err(draw_err)?;

                for (i, bar) in view.bars.iter().enumerate() {
                    let y = (n - 1 - i) as f64;
                    chart
                        .draw_series(std::iter::once(Rectangle::new(
                            [(0.0, y + 0.15), (bar.value, y + 0.85)],
                            BAR_GREEN.filled(),
                        )))
                        .map_err(draw_err)?;
                    let (px, py) = chart.backend_coord(&(value_range.start.min(0.0), y + 0.5));
                    root.draw(&Text::new(
                        bar.label.clone(),
                        (px - 8, py),
                        label_style.clone().pos(Pos::new(HPos::Right, VPos::Center)),
                    ))
                    .map_err(draw_err)?;
                }
            } else {
                let mut chart = ChartBuilder::on(root)
                    .caption(&view.title, (FONT, 20))
                    .margin(15)
                    .x_label_area_size(50)
                    .y_label_area_size(70)
                    .build_cartesian_2d(0.0..n as f64, value_range.clone())
                    .map_err(draw_err)?;
                chart
                    .configure_mesh()
                    .disable_x_mesh()
                    .x_label_formatter(&|_| String::new())
                    .x_desc(view.category_label.as_str())
                    .y_desc(view.value_label.as_str())
                    .draw()
                    .map_err(draw_err)?;

                for (i, bar) in view.bars.iter().enumerate() {
                    let x = i as f64;
                    chart
                        .draw_series(std::iter::once(Rectangle::new(
                            [(x + 0.15, 0.0), (x + 0.85, bar.value)],
                            palette_color(i).filled(),
                        )))
                        .map_err(draw_err)?;
                    let (px, py) = chart.backend_coord(&(x + 0.5, value_range.start.min(0.0)));
                    root.draw(&Text::new(
                        bar.label.clone(),
                        (px, py + 6),
                        label_style.clone().pos(Pos::new(HPos::Center, VPos::Top)),
                    ))
                    .map_err(draw_err)?;
                }
            }

            Ok(())
        })
    }

    pub fn render_lines(view: &LineView, width: u32, height: u32) -> Result<RgbImage, RenderError> {
        let n = view.categories.len();
        let values = view.series.iter().flat_map(|s| s.values.iter().flatten().copied());
        let (lo, hi) = values.fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let y_range = lo * 1.1..if hi > 0.0 { hi * 1.1 } else { 1.0 };

        Self::render_with(width, height, |root| {
            let mut chart = ChartBuilder::on(root)
                .caption(&view.title, (FONT, 20))
                .margin(15)
                .x_label_area_size(60)
                .y_label_area_size(70)
                .build_cartesian_2d(-0.5..n as f64 - 0.5, y_range.clone())
                .map_err(draw_err)?;
            chart
                .configure_mesh()
                .x_label_formatter(&|_| String::new())
                .x_desc(view.x_label.as_str())
                .y_desc(view.y_label.as_str())
                .draw()
                .map_err(draw_err)?;

            for (idx, series) in view.series.iter().enumerate() {
                let color = palette_color(idx);
                let points: Vec<(f64, f64)> = series
                    .values
                    .iter()
                    .enumerate()
                    .filter_map(|(x, v)| v.map(|v| (x as f64, v)))
                    .collect();
                chart
                    .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
                    .map_err(draw_err)?
                    .label(series.name.clone())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
                chart
                    .draw_series(points.into_iter().map(|p| Circle::new(p, 3, color.filled())))
                    .map_err(draw_err)?;
            }

            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(draw_err)?;

            let style = (FONT, 12).into_font().color(&BLACK).pos(Pos::new(HPos::Center, VPos::Top));
            for (i, label) in view.categories.iter().enumerate() {
                let (px, py) = chart.backend_coord(&(i as f64, y_range.start));
                root.draw(&Text::new(label.clone(), (px, py + 6), style.clone()))
                    .map_err(draw_err)?;
            }

            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ylgnbu_endpoints_and_clamping() {
        assert_eq!(StaticChartRenderer::ylgnbu(0.0), RGBColor(255, 255, 217));
        assert_eq!(StaticChartRenderer::ylgnbu(1.0), RGBColor(8, 29, 88));
        assert_eq!(StaticChartRenderer::ylgnbu(-3.0), StaticChartRenderer::ylgnbu(0.0));
        assert_eq!(StaticChartRenderer::ylgnbu(f64::NAN), StaticChartRenderer::ylgnbu(0.0));
    }

    #[test]
    fn ylgnbu_darkens_monotonically() {
        let lum = |c: RGBColor| c.0 as u32 + c.1 as u32 + c.2 as u32;
        let mut previous = u32::MAX;
        for step in 0..=20 {
            let current = lum(StaticChartRenderer::ylgnbu(step as f64 / 20.0));
            assert!(current <= previous);
            previous = current;
        }
    }

    #[test]
    fn annotations_contrast_with_cells() {
        assert_eq!(StaticChartRenderer::annotation_color(RGBColor(255, 255, 217)), BLACK);
        assert_eq!(StaticChartRenderer::annotation_color(RGBColor(8, 29, 88)), WHITE);
    }

    #[test]
    fn arrow_head_sits_on_target_rim() {
        let head = StaticChartRenderer::arrow_head((0, 0), (100, 0)).unwrap();
        assert_eq!(head[0], (100 - NODE_RADIUS, 0));
        assert!(StaticChartRenderer::arrow_head((0, 0), (10, 0)).is_none());
    }
}
