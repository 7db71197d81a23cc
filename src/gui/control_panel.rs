//! Control Panel Widget
//! Left side panel with data sources, the region selector and actions.

use crate::config::DataConfig;
use crate::data::DataSource;
use egui::{Color32, ComboBox, RichText};

/// Left side control panel with data sources, filters and export.
pub struct ControlPanel {
    pub sales_source: String,
    pub rules_source: String,
    pub regions: Vec<String>,
    pub selected_region: Option<String>,
    pub progress: f32,
    pub status: String,
    pub loading: bool,
    pub export_enabled: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            sales_source: String::new(),
            rules_source: String::new(),
            regions: Vec::new(),
            selected_region: None,
            progress: 0.0,
            status: "Ready".to_string(),
            loading: false,
            export_enabled: false,
        }
    }
}

impl ControlPanel {
    pub fn new(config: &DataConfig) -> Self {
        Self {
            sales_source: config.sales_source.clone(),
            rules_source: config.rules_source.clone(),
            ..Self::default()
        }
    }

    /// Update region options after a render
    pub fn update_regions(&mut self, regions: Vec<String>, selected: Option<String>) {
        self.regions = regions;
        self.selected_region = selected;
    }

    /// Short label for a source: host and table for URLs, file name for paths.
    fn display_name(table: &str, source: &str) -> String {
        match DataSource::parse(source) {
            DataSource::Url(url) => {
                let rest = url.split_once("://").map_or(url.as_str(), |(_, rest)| rest);
                let host = rest.split(['/', '?', '#']).next().unwrap_or(rest);
                format!("{} ({})", host, table)
            }
            DataSource::File(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| source.trim().to_string()),
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📊 Minger Insights")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Sales & Association Rules")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Sources").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                for (label, table, source) in [
                    ("Sales:", "sales", &self.sales_source),
                    ("Rules:", "rules", &self.rules_source),
                ] {
                    ui.horizontal(|ui| {
                        ui.add_sized([50.0, 20.0], egui::Label::new(label));
                        ui.label(RichText::new(Self::display_name(table, source)).size(12.0))
                            .on_hover_text(source.as_str());
                    });
                }

                ui.add_space(5.0);
                ui.add_enabled_ui(!self.loading, |ui| {
                    if ui.button("🔄 Reload").clicked() {
                        action = ControlPanelAction::Reload;
                    }
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Filter Section =====
        ui.label(RichText::new("🔧 Filters").size(14.0).strong());
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            ui.add_sized([70.0, 20.0], egui::Label::new("Region:"));
            let selected_text = self.selected_region.clone().unwrap_or_default();
            ComboBox::from_id_salt("region")
                .width(170.0)
                .selected_text(selected_text)
                .show_ui(ui, |ui| {
                    for region in &self.regions {
                        let is_selected = self.selected_region.as_deref() == Some(region.as_str());
                        if ui.selectable_label(is_selected, region).clicked() && !is_selected {
                            self.selected_region = Some(region.clone());
                            action = ControlPanelAction::RegionChanged(region.clone());
                        }
                    }
                });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.export_enabled && !self.loading, |ui| {
                let button = egui::Button::new(RichText::new("📄 Export Charts").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::Export;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.label(RichText::new("📊 Progress").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.loading),
        );

        ui.add_space(5.0);

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("Complete") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    Reload,
    RegionChanged(String),
    Export,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_uses_file_name_for_paths() {
        assert_eq!(ControlPanel::display_name("sales", "data/sales.csv"), "sales.csv");
        assert_eq!(ControlPanel::display_name("rules", "rules.csv"), "rules.csv");
    }

    #[test]
    fn display_name_shows_host_and_table_for_urls() {
        assert_eq!(
            ControlPanel::display_name("sales", "https://example.com/data/sales.csv"),
            "example.com (sales)"
        );
    }

    #[test]
    fn default_sources_are_told_apart() {
        let config = DataConfig::default();
        let sales = ControlPanel::display_name("sales", &config.sales_source);
        let rules = ControlPanel::display_name("rules", &config.rules_source);
        assert_ne!(sales, rules);
        assert_eq!(sales, "docs.google.com (sales)");
        assert_eq!(rules, "docs.google.com (rules)");
        assert!(!sales.contains("output=csv"));
    }

    #[test]
    fn new_panel_shows_configured_sources() {
        let config = DataConfig {
            sales_source: "sales.csv".to_string(),
            rules_source: "rules.csv".to_string(),
            ..DataConfig::default()
        };
        let panel = ControlPanel::new(&config);
        assert_eq!(panel.sales_source, "sales.csv");
        assert!(panel.selected_region.is_none());
        assert!(!panel.export_enabled);
    }
}
