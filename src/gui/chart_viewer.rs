//! Chart Viewer Widget
//! Right side scrollable page showing every section of the dashboard in order.

use crate::charts::ChartPlotter;
use crate::dashboard::{ChartPanel, DashboardView, RegionPanel};
use egui::{Color32, ColorImage, RichText, ScrollArea, TextureHandle, TextureOptions};
use image::RgbImage;

const SECTION_SPACING: f32 = 20.0;
const CHART_HEIGHT: f32 = 380.0;
const TABLE_HEIGHT: f32 = 260.0;

/// Rasterized charts shown as images on the page.
#[derive(Default)]
pub struct PageImages {
    pub heatmap: Option<RgbImage>,
    pub network: Option<RgbImage>,
}

/// Scrollable dashboard page.
#[derive(Default)]
pub struct ChartViewer {
    pub view: Option<DashboardView>,
    heatmap: Option<TextureHandle>,
    network: Option<TextureHandle>,
    /// Why there is no page, when loading failed.
    error: Option<String>,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the page
    pub fn clear(&mut self) {
        self.view = None;
        self.heatmap = None;
        self.network = None;
        self.error = None;
    }

    pub fn set_error(&mut self, error: String) {
        self.clear();
        self.error = Some(error);
    }

    /// Show a freshly rendered page and upload its images.
    pub fn set_view(&mut self, ctx: &egui::Context, view: DashboardView, images: PageImages) {
        self.heatmap = images.heatmap.map(|img| Self::upload(ctx, "lift_heatmap", img));
        self.network = images.network.map(|img| Self::upload(ctx, "rule_network", img));
        self.view = Some(view);
        self.error = None;
    }

    /// Swap in a re-rendered region section; the rest of the page is untouched.
    pub fn set_region_panel(&mut self, panel: RegionPanel) {
        if let Some(view) = self.view.as_mut() {
            view.region_sales = panel;
        }
    }

    fn upload(ctx: &egui::Context, name: &str, img: RgbImage) -> TextureHandle {
        let size = [img.width() as usize, img.height() as usize];
        let color = ColorImage::from_rgb(size, img.as_raw());
        ctx.load_texture(name, color, TextureOptions::LINEAR)
    }

    /// Draw the page top to bottom
    pub fn show(&mut self, ui: &mut egui::Ui) {
        let Some(view) = &self.view else {
            ui.centered_and_justified(|ui| match &self.error {
                Some(error) => {
                    ui.label(
                        RichText::new(format!("Data unavailable\n\n{}", error))
                            .size(16.0)
                            .color(Color32::from_rgb(220, 53, 69)),
                    );
                }
                None => {
                    ui.label(RichText::new("No Data").size(20.0));
                }
            });
            return;
        };

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(RichText::new(&view.title).size(26.0).strong());
                });
                ui.add_space(SECTION_SPACING);

                Self::section(ui, &view.sales_table.title);
                ChartPlotter::draw_table(ui, &view.sales_table, TABLE_HEIGHT);
                ui.add_space(SECTION_SPACING);

                Self::section(ui, "Lift Heatmap");
                Self::draw_image_panel(ui, &view.lift_heatmap, self.heatmap.as_ref());
                ui.add_space(SECTION_SPACING);

                Self::section(ui, &view.rules_table.title);
                ChartPlotter::draw_table(ui, &view.rules_table, TABLE_HEIGHT);
                ui.add_space(SECTION_SPACING);

                Self::section(ui, "Sales vs Profit");
                Self::draw_panel(ui, &view.sales_profit, |ui, chart| {
                    ChartPlotter::draw_scatter(ui, chart, CHART_HEIGHT)
                });
                ui.add_space(SECTION_SPACING);

                Self::section(ui, "Best Sellers");
                Self::draw_panel(ui, &view.best_sellers, |ui, chart| {
                    ChartPlotter::draw_bars(ui, chart, CHART_HEIGHT)
                });
                ui.add_space(SECTION_SPACING);

                Self::section(ui, "Association Rules Network");
                Self::draw_image_panel(ui, &view.rule_network, self.network.as_ref());
                ui.add_space(SECTION_SPACING);

                let region = view.region_sales.selected.as_deref().unwrap_or("-");
                Self::section(ui, &format!("Sales by Sub-Category in {}", region));
                Self::draw_panel(ui, &view.region_sales.chart, |ui, chart| {
                    ChartPlotter::draw_bars(ui, chart, CHART_HEIGHT)
                });
                ui.add_space(SECTION_SPACING);

                Self::section(ui, "Sales Trends");
                Self::draw_panel(ui, &view.quarterly_sales, |ui, chart| {
                    ChartPlotter::draw_lines(ui, chart, CHART_HEIGHT)
                });
            });
    }

    fn section(ui: &mut egui::Ui, title: &str) {
        ui.label(RichText::new(title).size(18.0).strong());
        ui.add_space(6.0);
    }

    /// Draw a ready chart, or a placeholder saying why there is none.
    fn draw_panel<T>(ui: &mut egui::Ui, panel: &ChartPanel<T>, draw: impl FnOnce(&mut egui::Ui, &T)) {
        match panel {
            ChartPanel::Ready(chart) => draw(ui, chart),
            ChartPanel::Empty { message } => Self::placeholder(ui, message, Color32::GRAY),
            ChartPanel::Failed { message } => {
                Self::placeholder(ui, &format!("Error: {}", message), Color32::from_rgb(220, 53, 69))
            }
        }
    }

    fn draw_image_panel<T>(ui: &mut egui::Ui, panel: &ChartPanel<T>, texture: Option<&TextureHandle>) {
        Self::draw_panel(ui, panel, |ui, _| match texture {
            Some(texture) => {
                ui.add(egui::Image::new(texture).shrink_to_fit());
            }
            None => Self::placeholder(ui, "Chart image unavailable", Color32::GRAY),
        });
    }

    fn placeholder(ui: &mut egui::Ui, message: &str, color: Color32) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.0, color))
            .inner_margin(16.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(RichText::new(message).size(14.0).color(color));
            });
    }
}
