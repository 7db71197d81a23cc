//! Dashboard view model: everything the page shows, ready to draw or serialize.

use serde::Serialize;

use crate::data::PivotTable;
use crate::graph::NodeRole;

/// State of one chart on the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "chart", rename_all = "snake_case")]
pub enum ChartPanel<T> {
    Ready(T),
    /// The chart's filter left no rows.
    Empty { message: String },
    /// The chart's transform failed; the rest of the page is unaffected.
    Failed { message: String },
}

impl<T> ChartPanel<T> {
    pub fn empty(message: impl Into<String>) -> Self {
        ChartPanel::Empty {
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        ChartPanel::Failed {
            message: message.into(),
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ChartPanel::Ready(chart) => Some(chart),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapView {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub grid: PivotTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterView {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub size_label: String,
    pub points: Vec<ScatterPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarView {
    pub title: String,
    pub category_label: String,
    pub value_label: String,
    /// Horizontal bars list the first bar at the top.
    pub horizontal: bool,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkNode {
    pub label: String,
    pub role: NodeRole,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkEdge {
    pub source: usize,
    pub target: usize,
    pub support: f64,
    /// Stroke width in pixels, proportional to support.
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkView {
    pub title: String,
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<NetworkEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub name: String,
    /// One value per category; `None` where the series has no data.
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineView {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub categories: Vec<String>,
    pub series: Vec<LineSeries>,
}

/// The region-filterable chart and its selector options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionPanel {
    pub options: Vec<String>,
    pub selected: Option<String>,
    pub chart: ChartPanel<BarView>,
}

/// The whole page, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub title: String,
    pub sales_table: TableView,
    pub lift_heatmap: ChartPanel<HeatmapView>,
    pub rules_table: TableView,
    pub sales_profit: ChartPanel<ScatterView>,
    pub best_sellers: ChartPanel<BarView>,
    pub rule_network: ChartPanel<NetworkView>,
    pub region_sales: RegionPanel,
    pub quarterly_sales: ChartPanel<LineView>,
}
