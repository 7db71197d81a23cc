//! Report Exporter Module
//! Writes the rendered page to a folder: one PNG per chart plus the view model as JSON.
//!
//! Charts are rasterized in parallel with rayon; panels that are empty or
//! failed are skipped and reported in the summary.

use crate::charts::{RenderError, StaticChartRenderer};
use crate::dashboard::{ChartPanel, DashboardView};
use image::RgbImage;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const VIEW_FILE: &str = "dashboard.json";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Render error for {chart}: {source}")]
    Render {
        chart: &'static str,
        #[source]
        source: RenderError,
    },
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// What an export produced.
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub written: Vec<PathBuf>,
    /// Charts with nothing to draw.
    pub skipped: Vec<&'static str>,
}

/// A chart to rasterize: file stem and how to draw it.
struct ImageJob<'a> {
    name: &'static str,
    draw: Box<dyn Fn() -> Result<RgbImage, RenderError> + Send + Sync + 'a>,
}

pub struct ReportExporter;

impl ReportExporter {
    /// Export every ready chart of `view` into `dir`, creating it if needed.
    pub fn export(view: &DashboardView, dir: &Path) -> Result<ExportSummary, ExportError> {
        fs::create_dir_all(dir)?;

        let (jobs, skipped) = Self::collect_jobs(view);
        tracing::info!(
            dir = %dir.display(),
            charts = jobs.len(),
            skipped = skipped.len(),
            "exporting dashboard"
        );

        let mut written: Vec<PathBuf> = jobs
            .par_iter()
            .map(|job| -> Result<PathBuf, ExportError> {
                let image = (job.draw)().map_err(|source| ExportError::Render {
                    chart: job.name,
                    source,
                })?;
                let path = dir.join(format!("{}.png", job.name));
                image.save(&path)?;
                Ok(path)
            })
            .collect::<Result<Vec<_>, ExportError>>()?;

        written.push(Self::write_view_json(view, dir)?);

        Ok(ExportSummary { written, skipped })
    }

    fn collect_jobs(view: &DashboardView) -> (Vec<ImageJob<'_>>, Vec<&'static str>) {
        let mut jobs = Vec::new();
        let mut skipped = Vec::new();

        match &view.lift_heatmap {
            ChartPanel::Ready(chart) => jobs.push(ImageJob {
                name: "lift_heatmap",
                draw: Box::new(move || StaticChartRenderer::render_heatmap(chart, 1200, 1000)),
            }),
            _ => skipped.push("lift_heatmap"),
        }
        match &view.best_sellers {
            ChartPanel::Ready(chart) => jobs.push(ImageJob {
                name: "best_sellers",
                draw: Box::new(move || StaticChartRenderer::render_bars(chart, 900, 500)),
            }),
            _ => skipped.push("best_sellers"),
        }
        match &view.rule_network {
            ChartPanel::Ready(chart) => jobs.push(ImageJob {
                name: "rule_network",
                draw: Box::new(move || StaticChartRenderer::render_network(chart, 1000, 800)),
            }),
            _ => skipped.push("rule_network"),
        }
        match &view.region_sales.chart {
            ChartPanel::Ready(chart) => jobs.push(ImageJob {
                name: "region_sales",
                draw: Box::new(move || StaticChartRenderer::render_bars(chart, 900, 500)),
            }),
            _ => skipped.push("region_sales"),
        }
        match &view.quarterly_sales {
            ChartPanel::Ready(chart) => jobs.push(ImageJob {
                name: "quarterly_sales",
                draw: Box::new(move || StaticChartRenderer::render_lines(chart, 1200, 600)),
            }),
            _ => skipped.push("quarterly_sales"),
        }

        (jobs, skipped)
    }

    /// Serialize the full view model, tables included.
    pub fn write_view_json(view: &DashboardView, dir: &Path) -> Result<PathBuf, ExportError> {
        let path = dir.join(VIEW_FILE);
        let json = serde_json::to_string_pretty(view)?;
        fs::write(&path, json)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{RegionPanel, TableView};

    fn sparse_view() -> DashboardView {
        let table = TableView {
            title: "Sales Data".to_string(),
            columns: vec!["Region".to_string()],
            rows: vec![vec!["West".to_string()]],
        };
        DashboardView {
            title: "Key Insights on Minger".to_string(),
            sales_table: table.clone(),
            lift_heatmap: ChartPanel::failed("bad pivot"),
            rules_table: table,
            sales_profit: ChartPanel::empty("no rows"),
            best_sellers: ChartPanel::empty("no rows"),
            rule_network: ChartPanel::empty("no rules"),
            region_sales: RegionPanel {
                options: vec!["West".to_string()],
                selected: Some("West".to_string()),
                chart: ChartPanel::empty("No sales recorded for West"),
            },
            quarterly_sales: ChartPanel::failed("bad date"),
        }
    }

    #[test]
    fn writes_view_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = ReportExporter::write_view_json(&sparse_view(), dir.path()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["title"], "Key Insights on Minger");
        assert_eq!(json["lift_heatmap"]["status"], "failed");
        assert_eq!(json["region_sales"]["chart"]["status"], "empty");
        assert_eq!(json["sales_table"]["rows"][0][0], "West");
    }

    #[test]
    fn skips_panels_without_charts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report");
        let summary = ReportExporter::export(&sparse_view(), &out).unwrap();

        assert_eq!(summary.written, vec![out.join(VIEW_FILE)]);
        assert_eq!(
            summary.skipped,
            vec![
                "lift_heatmap",
                "best_sellers",
                "rule_network",
                "region_sales",
                "quarterly_sales"
            ]
        );
    }
}
