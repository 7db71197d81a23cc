//! Dashboard Renderer
//! Pure functions from (datasets, filter state) to the page view model.

use polars::prelude::DataFrame;

use super::model::*;
use crate::config::DashboardConfig;
use crate::data::schema::{rules, sales};
use crate::data::{DataProcessor, Datasets, Period, SortOrder, TransformError};
use crate::graph::RuleGraph;

pub const PAGE_TITLE: &str = "Key Insights on Minger";

const MAX_EDGE_WIDTH: f64 = 7.0;

/// Inputs chosen by the user; the only state that changes between renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// `None` selects the first available region.
    pub region: Option<String>,
}

/// Fixed per-run parameters of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSettings {
    pub best_selling: Vec<String>,
    pub layout_seed: u64,
    pub layout_iterations: usize,
    /// Bucket size of the sales trend chart.
    pub trend_period: Period,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        DashboardConfig::default().settings()
    }
}

impl DashboardSettings {
    fn best_selling_refs(&self) -> Vec<&str> {
        self.best_selling.iter().map(|s| s.as_str()).collect()
    }
}

/// Build the whole page.
pub fn render(datasets: &Datasets, filter: &FilterState, settings: &DashboardSettings) -> DashboardView {
    DashboardView {
        title: PAGE_TITLE.to_string(),
        sales_table: table_view("Sales Data", &datasets.sales),
        lift_heatmap: settle("lift heatmap", lift_heatmap(&datasets.rules)),
        rules_table: table_view("Association Rules", &datasets.rules),
        sales_profit: settle("sales/profit scatter", sales_profit(&datasets.sales)),
        best_sellers: settle("best sellers", best_sellers(&datasets.sales, settings)),
        rule_network: settle("rule network", rule_network(&datasets.rules, settings)),
        region_sales: render_region_panel(datasets, filter, settings),
        quarterly_sales: settle("quarterly sales", quarterly_sales(&datasets.sales, settings)),
    }
}

/// Rebuild only the region-filtered chart and its selector.
pub fn render_region_panel(
    datasets: &Datasets,
    filter: &FilterState,
    settings: &DashboardSettings,
) -> RegionPanel {
    match region_panel(&datasets.sales, filter, settings) {
        Ok(panel) => panel,
        Err(e) => {
            tracing::warn!(chart = "region sales", error = %e, "chart failed");
            RegionPanel {
                options: Vec::new(),
                selected: filter.region.clone(),
                chart: ChartPanel::failed(e.to_string()),
            }
        }
    }
}

fn settle<T>(chart: &str, result: Result<ChartPanel<T>, TransformError>) -> ChartPanel<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!(chart, error = %e, "chart failed");
        ChartPanel::failed(e.to_string())
    })
}

fn table_view(title: &str, df: &DataFrame) -> TableView {
    TableView {
        title: title.to_string(),
        columns: df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect(),
        rows: DataProcessor::display_rows(df),
    }
}

/// Display form of an item-set cell: `frozenset({'A', 'B'})` becomes `A, B`.
pub fn itemset_label(raw: &str) -> String {
    let inner = raw
        .trim()
        .strip_prefix("frozenset(")
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(raw.trim());
    let inner = inner
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .unwrap_or(inner);
    inner
        .split(',')
        .map(|item| item.trim().trim_matches(|c| c == '\'' || c == '"'))
        .filter(|item| !item.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn lift_heatmap(rules_df: &DataFrame) -> Result<ChartPanel<HeatmapView>, TransformError> {
    let mut grid = DataProcessor::pivot(rules_df, rules::ANTECEDENTS, rules::CONSEQUENTS, rules::LIFT)?;
    if grid.is_empty() {
        return Ok(ChartPanel::empty("No association rules to show"));
    }
    grid.row_labels = grid.row_labels.iter().map(|l| itemset_label(l)).collect();
    grid.col_labels = grid.col_labels.iter().map(|l| itemset_label(l)).collect();

    Ok(ChartPanel::Ready(HeatmapView {
        title: "Heatmap for the Association Rules (Lift)".to_string(),
        x_label: "Consequents".to_string(),
        y_label: "Antecedents".to_string(),
        grid,
    }))
}

fn sales_profit(sales_df: &DataFrame) -> Result<ChartPanel<ScatterView>, TransformError> {
    let xs = DataProcessor::numeric_values(sales_df, sales::SALES)?;
    let ys = DataProcessor::numeric_values(sales_df, sales::PROFIT)?;
    let sizes = DataProcessor::numeric_values(sales_df, sales::QUANTITY)?;

    let points: Vec<ScatterPoint> = xs
        .into_iter()
        .zip(ys)
        .zip(sizes)
        .filter_map(|((x, y), size)| Some(ScatterPoint { x: x?, y: y?, size: size? }))
        .collect();
    if points.is_empty() {
        return Ok(ChartPanel::empty("No sales records"));
    }

    Ok(ChartPanel::Ready(ScatterView {
        title: "Relationship between Sales and Profits using Scatter Plot.".to_string(),
        x_label: sales::SALES.to_string(),
        y_label: sales::PROFIT.to_string(),
        size_label: sales::QUANTITY.to_string(),
        points,
    }))
}

fn bars(df: &DataFrame, label_col: &str, value_col: &str) -> Result<Vec<Bar>, TransformError> {
    let labels = DataProcessor::text_values(df, label_col)?;
    let values = DataProcessor::numeric_values(df, value_col)?;
    Ok(labels
        .into_iter()
        .zip(values)
        .filter_map(|(label, value)| {
            Some(Bar {
                label: label?,
                value: value.unwrap_or(0.0),
            })
        })
        .collect())
}

fn best_sellers(
    sales_df: &DataFrame,
    settings: &DashboardSettings,
) -> Result<ChartPanel<BarView>, TransformError> {
    let filtered = DataProcessor::filter_in(sales_df, sales::SUB_CATEGORY, &settings.best_selling_refs())?;
    let grouped = DataProcessor::group_sum(
        &filtered,
        &[sales::SUB_CATEGORY],
        sales::SALES,
        SortOrder::ValueDescending,
    )?;
    if grouped.height() == 0 {
        return Ok(ChartPanel::empty("No sales for the best-selling sub-categories"));
    }

    Ok(ChartPanel::Ready(BarView {
        title: "Sales of Best-Selling Products by Sub-Category".to_string(),
        category_label: sales::SUB_CATEGORY.to_string(),
        value_label: sales::SALES.to_string(),
        horizontal: true,
        bars: bars(&grouped, sales::SUB_CATEGORY, sales::SALES)?,
    }))
}

fn rule_network(
    rules_df: &DataFrame,
    settings: &DashboardSettings,
) -> Result<ChartPanel<NetworkView>, TransformError> {
    let graph = RuleGraph::from_rules(rules_df)?;
    if graph.node_count() == 0 {
        return Ok(ChartPanel::empty("No association rules to show"));
    }

    let positions = graph.layout(settings.layout_seed, settings.layout_iterations);
    let nodes = graph
        .nodes()
        .into_iter()
        .zip(positions)
        .map(|(node, [x, y])| NetworkNode {
            label: itemset_label(&node.label),
            role: node.role,
            x,
            y,
        })
        .collect();

    let edges = graph.edges();
    let max_support = edges.iter().map(|e| e.2).fold(0.0f64, f64::max);
    let edges = edges
        .into_iter()
        .map(|(source, target, support)| NetworkEdge {
            source,
            target,
            support,
            width: if max_support > 0.0 {
                MAX_EDGE_WIDTH * support / max_support
            } else {
                0.0
            },
        })
        .collect();

    Ok(ChartPanel::Ready(NetworkView {
        title: "Association Rules Network Graph".to_string(),
        nodes,
        edges,
    }))
}

fn region_panel(
    sales_df: &DataFrame,
    filter: &FilterState,
    settings: &DashboardSettings,
) -> Result<RegionPanel, TransformError> {
    let filtered = DataProcessor::filter_in(sales_df, sales::SUB_CATEGORY, &settings.best_selling_refs())?;
    let grouped = DataProcessor::group_sum(
        &filtered,
        &[sales::REGION, sales::SUB_CATEGORY],
        sales::SALES,
        SortOrder::Keys,
    )?;
    let options = DataProcessor::unique_text(&grouped, sales::REGION)?;
    let selected = filter.region.clone().or_else(|| options.first().cloned());

    let Some(region) = selected.clone() else {
        return Ok(RegionPanel {
            options,
            selected,
            chart: ChartPanel::empty("No regions available"),
        });
    };

    let region_rows = DataProcessor::filter_eq(&grouped, sales::REGION, &region)?;
    let chart = if region_rows.height() == 0 {
        ChartPanel::empty(format!("No sales recorded for {}", region))
    } else {
        ChartPanel::Ready(BarView {
            title: format!("Sales by Sub-Category in {}", region),
            category_label: sales::SUB_CATEGORY.to_string(),
            value_label: "Total Sales".to_string(),
            horizontal: false,
            bars: bars(&region_rows, sales::SUB_CATEGORY, sales::SALES)?,
        })
    };

    Ok(RegionPanel {
        options,
        selected,
        chart,
    })
}

fn quarterly_sales(
    sales_df: &DataFrame,
    settings: &DashboardSettings,
) -> Result<ChartPanel<LineView>, TransformError> {
    let filtered = DataProcessor::filter_in(sales_df, sales::SUB_CATEGORY, &settings.best_selling_refs())?;
    let period = settings.trend_period;
    let bucketed = DataProcessor::bucket_by_period(&filtered, sales::SHIP_DATE, period, period.name())?;
    let grouped = DataProcessor::group_sum(
        &bucketed,
        &[period.name(), sales::SUB_CATEGORY],
        sales::SALES,
        SortOrder::Keys,
    )?;
    if grouped.height() == 0 {
        return Ok(ChartPanel::empty("No shipped sales for the selected sub-categories"));
    }

    let categories = DataProcessor::unique_text(&grouped, period.name())?;
    let names = DataProcessor::unique_text(&grouped, sales::SUB_CATEGORY)?;
    let quarters = DataProcessor::text_values(&grouped, period.name())?;
    let subs = DataProcessor::text_values(&grouped, sales::SUB_CATEGORY)?;
    let totals = DataProcessor::numeric_values(&grouped, sales::SALES)?;

    let mut series: Vec<LineSeries> = names
        .into_iter()
        .map(|name| LineSeries {
            name,
            values: vec![None; categories.len()],
        })
        .collect();
    for ((quarter, sub), total) in quarters.iter().zip(&subs).zip(&totals) {
        let (Some(quarter), Some(sub)) = (quarter, sub) else {
            continue;
        };
        let x = categories.iter().position(|c| c == quarter);
        let s = series.iter_mut().find(|s| &s.name == sub);
        if let (Some(x), Some(s)) = (x, s) {
            s.values[x] = *total;
        }
    }

    Ok(ChartPanel::Ready(LineView {
        title: format!("{} Sales Trends for Specific Sub-Categories", period.adjective()),
        x_label: period.name().to_string(),
        y_label: "Total Sales".to_string(),
        categories,
        series,
    }))
}
