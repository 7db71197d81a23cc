//! Application Configuration
//! Optional `minger.toml` next to the binary; every field has a default.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::dashboard::DashboardSettings;
use crate::data::{DataSource, Period};

pub const CONFIG_FILE: &str = "minger.toml";

const DEFAULT_SALES_SOURCE: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vRQib_xqSDNclt9e2Pb9lMPKa3T95nvHng4kQ_7pZxaK0_uOrGmxmd_DG9JW0A3HPLGlS3EgKdfdYdy/pub?output=csv";
const DEFAULT_RULES_SOURCE: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vTMnEgv2ppA9uArqbNDa0u1qe7kAzW14XRD2GmTq1eZybf3ZViSnip6KWdeMaodOxV46TMT8gPlOI3Z/pub?output=csv";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    #[serde(default = "default_sales_source")]
    pub sales_source: String,
    #[serde(default = "default_rules_source")]
    pub rules_source: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_sales_source() -> String {
    DEFAULT_SALES_SOURCE.to_string()
}
fn default_rules_source() -> String {
    DEFAULT_RULES_SOURCE.to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            sales_source: default_sales_source(),
            rules_source: default_rules_source(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl DataConfig {
    pub fn sales(&self) -> DataSource {
        DataSource::parse(&self.sales_source)
    }

    pub fn rules(&self) -> DataSource {
        DataSource::parse(&self.rules_source)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    /// Sub-categories used by the best-seller, region and quarterly charts.
    #[serde(default = "default_best_selling")]
    pub best_selling_sub_categories: Vec<String>,
    #[serde(default = "default_layout_seed")]
    pub layout_seed: u64,
    #[serde(default = "default_layout_iterations")]
    pub layout_iterations: usize,
    /// `month`, `quarter` or `year`.
    #[serde(default)]
    pub trend_period: Period,
}

fn default_best_selling() -> Vec<String> {
    ["Bookcases", "Chairs", "Supplies", "Tables"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_layout_seed() -> u64 {
    32
}
fn default_layout_iterations() -> usize {
    50
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            best_selling_sub_categories: default_best_selling(),
            layout_seed: default_layout_seed(),
            layout_iterations: default_layout_iterations(),
            trend_period: Period::default(),
        }
    }
}

impl DashboardConfig {
    pub fn settings(&self) -> DashboardSettings {
        DashboardSettings {
            best_selling: self.best_selling_sub_categories.clone(),
            layout_seed: self.layout_seed,
            layout_iterations: self.layout_iterations,
            trend_period: self.trend_period,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse config TOML")
    }

    /// Load the config file if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let config = Self::load(path)?;
            tracing::info!(path = %path.display(), "loaded configuration");
            Ok(config)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }
}
