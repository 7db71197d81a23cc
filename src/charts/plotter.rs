//! Chart Plotter Module
//! Creates interactive visualizations using egui_plot.

use crate::dashboard::{BarView, LineView, ScatterView, TableView};
use egui::{Color32, RichText};
use egui_plot::{Bar as PlotBar, BarChart, Legend, Line, Plot, PlotPoints, Points};
use std::collections::BTreeMap;

/// Colour for single-series charts
pub const PRIMARY_COLOR: Color32 = Color32::from_rgb(52, 152, 219); // Blue

pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(231, 76, 60),  // Red
    Color32::from_rgb(46, 204, 113), // Green
    Color32::from_rgb(155, 89, 182), // Purple
    Color32::from_rgb(243, 156, 18), // Orange
    Color32::from_rgb(26, 188, 156), // Teal
    Color32::from_rgb(233, 30, 99),  // Pink
    Color32::from_rgb(0, 188, 212),  // Cyan
    Color32::from_rgb(255, 87, 34),  // Deep Orange
    Color32::from_rgb(121, 85, 72),  // Brown
    Color32::from_rgb(96, 125, 139), // Blue Grey
];

const MIN_RADIUS: f64 = 2.0;
const MAX_RADIUS: f64 = 10.0;
const TABLE_ROW_HEIGHT: f32 = 18.0;
const TABLE_COL_WIDTH: f32 = 110.0;

/// Creates interactive charts from view-model panels using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn series_color(index: usize) -> Color32 {
        PALETTE[index % PALETTE.len()]
    }

    /// Marker radius by area: sqrt-scaled between MIN_RADIUS and MAX_RADIUS.
    pub fn marker_radius(size: f64, max_size: f64) -> f32 {
        if max_size <= 0.0 || !size.is_finite() || size <= 0.0 {
            return MIN_RADIUS as f32;
        }
        let t = (size / max_size).clamp(0.0, 1.0).sqrt();
        (MIN_RADIUS + (MAX_RADIUS - MIN_RADIUS) * t) as f32
    }

    /// Label for a category axis tick; blank between categories.
    pub fn category_label(labels: &[String], value: f64) -> String {
        let rounded = value.round();
        if (value - rounded).abs() > 1e-6 || rounded < 0.0 {
            return String::new();
        }
        labels.get(rounded as usize).cloned().unwrap_or_default()
    }

    /// Scatter plot; points sharing a marker size are drawn as one series.
    pub fn draw_scatter(ui: &mut egui::Ui, view: &ScatterView, height: f32) {
        let max_size = view.points.iter().map(|p| p.size).fold(0.0f64, f64::max);

        let mut by_radius: BTreeMap<i64, Vec<[f64; 2]>> = BTreeMap::new();
        for p in &view.points {
            let radius = Self::marker_radius(p.size, max_size);
            by_radius
                .entry((radius * 10.0).round() as i64)
                .or_default()
                .push([p.x, p.y]);
        }

        Plot::new(format!("scatter_{}", view.title))
            .height(height)
            .allow_scroll(false)
            .x_axis_label(view.x_label.clone())
            .y_axis_label(view.y_label.clone())
            .show(ui, |plot_ui| {
                for (key, points) in by_radius {
                    plot_ui.points(
                        Points::new(PlotPoints::from(points))
                            .radius(key as f32 / 10.0)
                            .color(PRIMARY_COLOR.gamma_multiply(0.6)),
                    );
                }
            });
        ui.label(
            RichText::new(format!("Marker size: {}", view.size_label))
                .size(11.0)
                .weak(),
        );
    }

    /// Bar chart. Horizontal charts list the first bar at the top.
    pub fn draw_bars(ui: &mut egui::Ui, view: &BarView, height: f32) {
        let n = view.bars.len();
        let labels: Vec<String> = if view.horizontal {
            view.bars.iter().rev().map(|b| b.label.clone()).collect()
        } else {
            view.bars.iter().map(|b| b.label.clone()).collect()
        };

        let bars: Vec<PlotBar> = view
            .bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let position = if view.horizontal { n - 1 - i } else { i };
                let fill = if view.horizontal {
                    Color32::from_rgb(0, 128, 0)
                } else {
                    Self::series_color(i)
                };
                PlotBar::new(position as f64, bar.value)
                    .name(&bar.label)
                    .width(0.7)
                    .fill(fill)
            })
            .collect();

        let mut chart = BarChart::new(bars).name(&view.value_label);
        if view.horizontal {
            chart = chart.horizontal();
        }

        let category_labels = labels.clone();
        let mut plot = Plot::new(format!("bars_{}", view.title))
            .height(height)
            .allow_scroll(false)
            .allow_drag(false);
        plot = if view.horizontal {
            plot.x_axis_label(view.value_label.clone())
                .y_axis_label(view.category_label.clone())
                .y_axis_formatter(move |mark, _range| Self::category_label(&category_labels, mark.value))
        } else {
            plot.x_axis_label(view.category_label.clone())
                .y_axis_label(view.value_label.clone())
                .x_axis_formatter(move |mark, _range| Self::category_label(&category_labels, mark.value))
        };

        plot.show(ui, |plot_ui| plot_ui.bar_chart(chart));
    }

    /// One line per series over the category axis; gaps are skipped.
    pub fn draw_lines(ui: &mut egui::Ui, view: &LineView, height: f32) {
        let categories = view.categories.clone();

        Plot::new(format!("lines_{}", view.title))
            .height(height)
            .allow_scroll(false)
            .legend(Legend::default())
            .x_axis_label(view.x_label.clone())
            .y_axis_label(view.y_label.clone())
            .x_axis_formatter(move |mark, _range| Self::category_label(&categories, mark.value))
            .show(ui, |plot_ui| {
                for (idx, series) in view.series.iter().enumerate() {
                    let color = Self::series_color(idx);
                    let points: Vec<[f64; 2]> = series
                        .values
                        .iter()
                        .enumerate()
                        .filter_map(|(x, v)| v.map(|v| [x as f64, v]))
                        .collect();

                    plot_ui.line(
                        Line::new(PlotPoints::from(points.clone()))
                            .color(color)
                            .width(1.5)
                            .name(&series.name),
                    );
                    plot_ui.points(
                        Points::new(PlotPoints::from(points))
                            .radius(3.0)
                            .color(color)
                            .name(&series.name),
                    );
                }
            });
    }

    /// Scrollable table; only visible rows are laid out.
    pub fn draw_table(ui: &mut egui::Ui, table: &TableView, max_height: f32) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::ScrollArea::horizontal()
                    .id_salt(format!("table_h_{}", table.title))
                    .show(ui, |ui| {
                        ui.vertical(|ui| {
                            egui::Grid::new(format!("table_head_{}", table.title))
                                .min_col_width(TABLE_COL_WIDTH)
                                .max_col_width(TABLE_COL_WIDTH)
                                .spacing([8.0, 4.0])
                                .show(ui, |ui| {
                                    for column in &table.columns {
                                        ui.label(RichText::new(column).strong().size(11.0));
                                    }
                                    ui.end_row();
                                });
                            ui.separator();

                            egui::ScrollArea::vertical()
                                .id_salt(format!("table_v_{}", table.title))
                                .max_height(max_height)
                                .show_rows(ui, TABLE_ROW_HEIGHT, table.rows.len(), |ui, range| {
                                    egui::Grid::new(format!("table_body_{}", table.title))
                                        .striped(true)
                                        .min_col_width(TABLE_COL_WIDTH)
                                        .max_col_width(TABLE_COL_WIDTH)
                                        .spacing([8.0, 4.0])
                                        .show(ui, |ui| {
                                            for row in &table.rows[range] {
                                                for cell in row {
                                                    ui.label(RichText::new(cell).size(11.0));
                                                }
                                                ui.end_row();
                                            }
                                        });
                                });
                        });
                    });
            });
        ui.label(
            RichText::new(format!("{} rows", table.rows.len()))
                .size(11.0)
                .weak(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_radius_scales_by_area() {
        assert_eq!(ChartPlotter::marker_radius(14.0, 14.0), MAX_RADIUS as f32);
        assert_eq!(ChartPlotter::marker_radius(0.0, 14.0), MIN_RADIUS as f32);
        assert_eq!(ChartPlotter::marker_radius(3.0, 0.0), MIN_RADIUS as f32);
        let quarter = ChartPlotter::marker_radius(1.0, 4.0);
        assert!((quarter - 6.0).abs() < 1e-6);
    }

    #[test]
    fn category_label_only_on_whole_ticks() {
        let labels = vec!["2014 Q1".to_string(), "2014 Q2".to_string()];
        assert_eq!(ChartPlotter::category_label(&labels, 1.0), "2014 Q2");
        assert_eq!(ChartPlotter::category_label(&labels, 0.5), "");
        assert_eq!(ChartPlotter::category_label(&labels, -1.0), "");
        assert_eq!(ChartPlotter::category_label(&labels, 2.0), "");
    }

    #[test]
    fn palette_wraps() {
        assert_eq!(ChartPlotter::series_color(0), ChartPlotter::series_color(PALETTE.len()));
    }
}
