//! Minger Insights Main Application
//! Main window with control panel and dashboard page.

use crate::charts::StaticChartRenderer;
use crate::config::AppConfig;
use crate::dashboard::{self, ChartPanel, DashboardSettings, DashboardView, FilterState};
use crate::data::Datasets;
use crate::export::ReportExporter;
use crate::gui::chart_viewer::PageImages;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use egui::SidePanel;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;

const HEATMAP_SIZE: (u32, u32) = (1200, 1000);
const NETWORK_SIZE: (u32, u32) = (1000, 800);

/// Everything the background thread hands back after a load.
struct LoadedPage {
    datasets: Arc<Datasets>,
    view: DashboardView,
    images: PageImages,
}

/// Dataset loading result from background thread
enum LoadResult {
    Progress(f32, String),
    Complete(Box<LoadedPage>),
    Error(String),
}

/// Main application window.
pub struct DashboardApp {
    config: AppConfig,
    settings: DashboardSettings,
    datasets: Option<Arc<Datasets>>,
    filter: FilterState,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let mut app = Self {
            settings: config.dashboard.settings(),
            control_panel: ControlPanel::new(&config.data),
            config,
            datasets: None,
            filter: FilterState::default(),
            chart_viewer: ChartViewer::new(),
            load_rx: None,
            is_loading: false,
        };
        app.start_load();
        app
    }

    /// Fetch both tables and render the page in a background thread.
    fn start_load(&mut self) {
        if self.is_loading {
            return;
        }

        self.chart_viewer.clear();
        self.control_panel.export_enabled = false;
        self.control_panel.loading = true;
        self.control_panel.set_progress(5.0, "Loading datasets...");
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        let data_config = self.config.data.clone();
        let settings = self.settings.clone();
        let filter = self.filter.clone();

        thread::spawn(move || {
            Self::run_load(tx, data_config, filter, settings);
        });
    }

    /// Load, render and rasterize (called from background thread)
    fn run_load(
        tx: Sender<LoadResult>,
        data_config: crate::config::DataConfig,
        filter: FilterState,
        settings: DashboardSettings,
    ) {
        let _ = tx.send(LoadResult::Progress(10.0, "Fetching CSV data...".to_string()));

        let datasets = match Datasets::load(&data_config) {
            Ok(datasets) => datasets,
            Err(e) => {
                tracing::error!(error = %e, "dataset load failed");
                let _ = tx.send(LoadResult::Error(e.to_string()));
                return;
            }
        };
        tracing::info!(
            sales_rows = datasets.sales.height(),
            rule_rows = datasets.rules.height(),
            "datasets loaded"
        );

        let _ = tx.send(LoadResult::Progress(50.0, "Building charts...".to_string()));
        let view = dashboard::render(&datasets, &filter, &settings);

        let _ = tx.send(LoadResult::Progress(80.0, "Drawing images...".to_string()));
        let images = PageImages {
            heatmap: Self::rasterize("lift heatmap", &view.lift_heatmap, |chart| {
                StaticChartRenderer::render_heatmap(chart, HEATMAP_SIZE.0, HEATMAP_SIZE.1)
            }),
            network: Self::rasterize("rule network", &view.rule_network, |chart| {
                StaticChartRenderer::render_network(chart, NETWORK_SIZE.0, NETWORK_SIZE.1)
            }),
        };

        let _ = tx.send(LoadResult::Complete(Box::new(LoadedPage {
            datasets: Arc::new(datasets),
            view,
            images,
        })));
    }

    fn rasterize<T>(
        chart: &str,
        panel: &ChartPanel<T>,
        draw: impl FnOnce(&T) -> Result<image::RgbImage, crate::charts::RenderError>,
    ) -> Option<image::RgbImage> {
        let ready = panel.ready()?;
        draw(ready)
            .map_err(|e| tracing::warn!(chart, error = %e, "chart image failed"))
            .ok()
    }

    /// Check for loading results
    fn check_load_results(&mut self, ctx: &egui::Context) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    LoadResult::Progress(progress, status) => {
                        self.control_panel.set_progress(progress, &status);
                    }
                    LoadResult::Complete(page) => {
                        let LoadedPage {
                            datasets,
                            view,
                            images,
                        } = *page;
                        let status = format!(
                            "Complete! {} sales rows, {} rules",
                            datasets.sales.height(),
                            datasets.rules.height()
                        );
                        self.control_panel.update_regions(
                            view.region_sales.options.clone(),
                            view.region_sales.selected.clone(),
                        );
                        self.chart_viewer.set_view(ctx, view, images);
                        self.datasets = Some(datasets);
                        self.control_panel.set_progress(100.0, &status);
                        self.control_panel.export_enabled = true;
                        self.finish_loading();
                        should_keep_receiver = false;
                    }
                    LoadResult::Error(error) => {
                        self.control_panel
                            .set_progress(0.0, &format!("Error: {}", error));
                        self.chart_viewer.set_error(error);
                        self.finish_loading();
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    fn finish_loading(&mut self) {
        self.is_loading = false;
        self.control_panel.loading = false;
    }

    /// Re-render only the region chart for the new selection.
    fn handle_region_changed(&mut self, region: String) {
        let Some(datasets) = self.datasets.as_ref() else {
            return;
        };
        tracing::debug!(region = %region, "region selected");
        self.filter.region = Some(region);
        let panel = dashboard::render_region_panel(datasets, &self.filter, &self.settings);
        self.control_panel
            .update_regions(panel.options.clone(), panel.selected.clone());
        self.chart_viewer.set_region_panel(panel);
    }

    /// Export chart images and the view model into a chosen folder.
    fn handle_export(&mut self) {
        let Some(view) = self.chart_viewer.view.as_ref() else {
            self.control_panel.set_progress(0.0, "No charts to export");
            return;
        };

        let dir = match rfd::FileDialog::new()
            .set_title("Export charts to folder")
            .pick_folder()
        {
            Some(dir) => dir,
            None => return, // User cancelled
        };

        self.control_panel.set_progress(10.0, "Exporting charts...");

        match ReportExporter::export(view, &dir) {
            Ok(summary) => {
                self.control_panel.set_progress(
                    100.0,
                    &format!(
                        "Export Complete! {} files, {} charts skipped",
                        summary.written.len(),
                        summary.skipped.len()
                    ),
                );
                if let Err(e) = open::that(&dir) {
                    tracing::warn!(dir = %dir.display(), error = %e, "could not open export folder");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "export failed");
                self.control_panel
                    .set_progress(0.0, &format!("Export Error: {}", e));
            }
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results(ctx);

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::Reload => self.start_load(),
                        ControlPanelAction::RegionChanged(region) => {
                            self.handle_region_changed(region)
                        }
                        ControlPanelAction::Export => self.handle_export(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Dashboard page
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui);
        });
    }
}
