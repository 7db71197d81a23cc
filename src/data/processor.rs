//! Data Processor Module
//! Pivoting, grouping, filtering and period bucketing of loaded tables.

use polars::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use thiserror::Error;

use super::period::Period;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Column '{0}' not found")]
    MissingColumn(String),
    #[error("Row {row}: cannot parse date '{value}'")]
    InvalidDate { row: usize, value: String },
    #[error("Duplicate pivot entry for ({row}, {column})")]
    DuplicatePivotEntry { row: String, column: String },
}

/// Row order of a grouped table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending by group keys.
    Keys,
    /// Descending by summed value; ties keep key order.
    ValueDescending,
}

/// Two-dimensional lookup: row key x column key -> value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl PivotTable {
    #[cfg(test)]
    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let r = self.row_labels.iter().position(|l| l == row)?;
        let c = self.col_labels.iter().position(|l| l == col)?;
        self.cells[r][c]
    }

    pub fn is_empty(&self) -> bool {
        self.row_labels.is_empty() || self.col_labels.is_empty()
    }

    /// Min and max over present cells.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.cells
            .iter()
            .flatten()
            .flatten()
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Handles table transformations. Every operation is pure.
pub struct DataProcessor;

impl DataProcessor {
    fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, TransformError> {
        if df.get_column_index(name).is_none() {
            return Err(TransformError::MissingColumn(name.to_string()));
        }
        Ok(df.column(name)?)
    }

    /// Read a column as optional strings.
    pub fn text_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, TransformError> {
        let text = Self::column(df, name)?.cast(&DataType::String)?;
        let values = text
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect();
        Ok(values)
    }

    /// Read a column as optional floats; NaN reads as missing.
    pub fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, TransformError> {
        let numbers = Self::column(df, name)?.cast(&DataType::Float64)?;
        let values = numbers
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();
        Ok(values)
    }

    /// Sorted unique non-null values of a column.
    pub fn unique_text(df: &DataFrame, name: &str) -> Result<Vec<String>, TransformError> {
        let unique: BTreeSet<String> = Self::text_values(df, name)?.into_iter().flatten().collect();
        Ok(unique.into_iter().collect())
    }

    /// Spread `value` over a grid of `row_key` x `col_key`.
    ///
    /// Labels are sorted ascending; absent combinations are `None`.
    pub fn pivot(
        df: &DataFrame,
        row_key: &str,
        col_key: &str,
        value: &str,
    ) -> Result<PivotTable, TransformError> {
        let rows = Self::text_values(df, row_key)?;
        let cols = Self::text_values(df, col_key)?;
        let values = Self::numeric_values(df, value)?;

        let mut entries: HashMap<(String, String), Option<f64>> = HashMap::new();
        let mut row_set = BTreeSet::new();
        let mut col_set = BTreeSet::new();

        for ((r, c), v) in rows.into_iter().zip(cols).zip(values) {
            let (Some(r), Some(c)) = (r, c) else {
                continue;
            };
            if entries.contains_key(&(r.clone(), c.clone())) {
                return Err(TransformError::DuplicatePivotEntry { row: r, column: c });
            }
            row_set.insert(r.clone());
            col_set.insert(c.clone());
            entries.insert((r, c), v);
        }

        let row_labels: Vec<String> = row_set.into_iter().collect();
        let col_labels: Vec<String> = col_set.into_iter().collect();
        let cells = row_labels
            .iter()
            .map(|r| {
                col_labels
                    .iter()
                    .map(|c| entries.get(&(r.clone(), c.clone())).copied().flatten())
                    .collect()
            })
            .collect();

        Ok(PivotTable {
            row_labels,
            col_labels,
            cells,
        })
    }

    /// Sum `measure` per unique combination of `group_keys`.
    ///
    /// Output columns: the group keys (as text) followed by the measure.
    /// Rows with a missing key are dropped; missing measures count as zero.
    pub fn group_sum(
        df: &DataFrame,
        group_keys: &[&str],
        measure: &str,
        order: SortOrder,
    ) -> Result<DataFrame, TransformError> {
        let key_values: Vec<Vec<Option<String>>> = group_keys
            .iter()
            .map(|k| Self::text_values(df, k))
            .collect::<Result<_, _>>()?;
        let measure_values = Self::numeric_values(df, measure)?;

        let mut sums: BTreeMap<Vec<String>, f64> = BTreeMap::new();
        for (i, v) in measure_values.iter().enumerate() {
            let key: Option<Vec<String>> = key_values.iter().map(|col| col[i].clone()).collect();
            if let Some(key) = key {
                *sums.entry(key).or_insert(0.0) += v.unwrap_or(0.0);
            }
        }

        let mut rows: Vec<(Vec<String>, f64)> = sums.into_iter().collect();
        if order == SortOrder::ValueDescending {
            rows.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        }

        let mut columns: Vec<Column> = group_keys
            .iter()
            .enumerate()
            .map(|(k, name)| {
                let values: Vec<String> = rows.iter().map(|(key, _)| key[k].clone()).collect();
                Column::new((*name).into(), values)
            })
            .collect();
        let totals: Vec<f64> = rows.iter().map(|(_, total)| *total).collect();
        columns.push(Column::new(measure.into(), totals));

        Ok(DataFrame::new(columns)?)
    }

    /// Keep rows whose `column` value is one of `allowed`, in their original order.
    pub fn filter_in(
        df: &DataFrame,
        column: &str,
        allowed: &[&str],
    ) -> Result<DataFrame, TransformError> {
        let allowed: HashSet<&str> = allowed.iter().copied().collect();
        let mask: Vec<bool> = Self::text_values(df, column)?
            .iter()
            .map(|v| v.as_deref().is_some_and(|s| allowed.contains(s)))
            .collect();
        let mask = BooleanChunked::from_slice("mask".into(), &mask);
        Ok(df.filter(&mask)?)
    }

    /// Keep rows whose text `column` equals `value`.
    pub fn filter_eq(df: &DataFrame, column: &str, value: &str) -> Result<DataFrame, TransformError> {
        Self::column(df, column)?;
        let filtered = df
            .clone()
            .lazy()
            .filter(col(column).eq(lit(value)))
            .collect()?;
        Ok(filtered)
    }

    /// Append `output` holding the period label of each `date_column` value.
    pub fn bucket_by_period(
        df: &DataFrame,
        date_column: &str,
        period: Period,
        output: &str,
    ) -> Result<DataFrame, TransformError> {
        let labels: Vec<Option<String>> = Self::text_values(df, date_column)?
            .into_iter()
            .enumerate()
            .map(|(row, raw)| match raw {
                Some(raw) => period
                    .bucket(&raw)
                    .map(Some)
                    .ok_or(TransformError::InvalidDate { row, value: raw }),
                None => Ok(None),
            })
            .collect::<Result<_, _>>()?;

        let mut result = df.clone();
        result.with_column(Column::new(output.into(), labels))?;
        Ok(result)
    }

    /// Render every cell of a table as display text.
    pub fn display_rows(df: &DataFrame) -> Vec<Vec<String>> {
        let columns = df.get_columns();
        (0..df.height())
            .map(|i| {
                columns
                    .iter()
                    .map(|col| match col.get(i) {
                        Ok(val) if !val.is_null() => val.to_string().trim_matches('"').to_string(),
                        _ => String::new(),
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales() -> DataFrame {
        DataFrame::new(vec![
            Column::new("Region".into(), vec!["East", "West", "East", "South", "West"]),
            Column::new(
                "Sub-Category".into(),
                vec!["Chairs", "Tables", "Chairs", "Phones", "Chairs"],
            ),
            Column::new(
                "Ship Date".into(),
                vec!["2016-01-05", "03/31/2016", "2016-07-01", "2017-12-24", "11/11/2016"],
            ),
            Column::new("Sales".into(), vec![100.0, 20.0, 50.0, 7.5, 30.0]),
        ])
        .unwrap()
    }

    fn rules() -> DataFrame {
        DataFrame::new(vec![
            Column::new("antecedents".into(), vec!["Chairs", "Tables", "Chairs"]),
            Column::new("consequents".into(), vec!["Tables", "Chairs", "Phones"]),
            Column::new("lift".into(), vec![1.25, 1.5, 0.9]),
        ])
        .unwrap()
    }

    fn column_total(df: &DataFrame, name: &str) -> f64 {
        DataProcessor::numeric_values(df, name)
            .unwrap()
            .into_iter()
            .flatten()
            .sum()
    }

    #[test]
    fn group_sum_scenario_chairs() {
        let df = DataFrame::new(vec![
            Column::new("Region".into(), vec!["East", "East"]),
            Column::new("Sub-Category".into(), vec!["Chairs", "Chairs"]),
            Column::new("Sales".into(), vec![100.0, 50.0]),
        ])
        .unwrap();

        let grouped = DataProcessor::group_sum(&df, &["Sub-Category"], "Sales", SortOrder::Keys).unwrap();
        assert_eq!(grouped.height(), 1);
        assert_eq!(
            DataProcessor::text_values(&grouped, "Sub-Category").unwrap(),
            vec![Some("Chairs".to_string())]
        );
        assert_eq!(
            DataProcessor::numeric_values(&grouped, "Sales").unwrap(),
            vec![Some(150.0)]
        );
    }

    #[test]
    fn group_sum_preserves_total_for_any_keys() {
        let df = sales();
        let total = column_total(&df, "Sales");
        for keys in [
            vec!["Region"],
            vec!["Sub-Category"],
            vec!["Region", "Sub-Category"],
        ] {
            let grouped = DataProcessor::group_sum(&df, &keys, "Sales", SortOrder::Keys).unwrap();
            assert!((column_total(&grouped, "Sales") - total).abs() < 1e-9, "{keys:?}");
        }
    }

    #[test]
    fn group_sum_keys_are_unique_and_sorted() {
        let grouped =
            DataProcessor::group_sum(&sales(), &["Region", "Sub-Category"], "Sales", SortOrder::Keys)
                .unwrap();
        let regions = DataProcessor::text_values(&grouped, "Region").unwrap();
        let subs = DataProcessor::text_values(&grouped, "Sub-Category").unwrap();
        let pairs: Vec<(String, String)> = regions
            .into_iter()
            .flatten()
            .zip(subs.into_iter().flatten())
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("East".into(), "Chairs".into()),
                ("South".into(), "Phones".into()),
                ("West".into(), "Chairs".into()),
                ("West".into(), "Tables".into()),
            ]
        );
    }

    #[test]
    fn group_sum_value_descending() {
        let grouped =
            DataProcessor::group_sum(&sales(), &["Sub-Category"], "Sales", SortOrder::ValueDescending)
                .unwrap();
        assert_eq!(
            DataProcessor::numeric_values(&grouped, "Sales").unwrap(),
            vec![Some(180.0), Some(20.0), Some(7.5)]
        );
    }

    #[test]
    fn group_sum_drops_missing_keys() {
        let df = DataFrame::new(vec![
            Column::new("Region".into(), vec![Some("East"), None]),
            Column::new("Sales".into(), vec![Some(1.0), Some(2.0)]),
        ])
        .unwrap();
        let grouped = DataProcessor::group_sum(&df, &["Region"], "Sales", SortOrder::Keys).unwrap();
        assert_eq!(grouped.height(), 1);
    }

    #[test]
    fn pivot_lookup_returns_source_values() {
        let df = rules();
        let pivot = DataProcessor::pivot(&df, "antecedents", "consequents", "lift").unwrap();
        assert_eq!(pivot.row_labels, vec!["Chairs", "Tables"]);
        assert_eq!(pivot.col_labels, vec!["Chairs", "Phones", "Tables"]);
        assert_eq!(pivot.get("Chairs", "Tables"), Some(1.25));
        assert_eq!(pivot.get("Tables", "Chairs"), Some(1.5));
        assert_eq!(pivot.get("Chairs", "Phones"), Some(0.9));
        assert_eq!(pivot.get("Tables", "Phones"), None);
        assert_eq!(pivot.value_range(), Some((0.9, 1.5)));
    }

    #[test]
    fn pivot_rejects_duplicate_pairs() {
        let df = DataFrame::new(vec![
            Column::new("antecedents".into(), vec!["Chairs", "Chairs"]),
            Column::new("consequents".into(), vec!["Tables", "Tables"]),
            Column::new("lift".into(), vec![1.0, 2.0]),
        ])
        .unwrap();
        let err = DataProcessor::pivot(&df, "antecedents", "consequents", "lift").unwrap_err();
        assert!(matches!(err, TransformError::DuplicatePivotEntry { .. }));
    }

    #[test]
    fn filter_in_keeps_members_in_order() {
        let filtered = DataProcessor::filter_in(&sales(), "Sub-Category", &["Chairs", "Tables"]).unwrap();
        assert_eq!(
            DataProcessor::numeric_values(&filtered, "Sales").unwrap(),
            vec![Some(100.0), Some(20.0), Some(50.0), Some(30.0)]
        );
        let subs = DataProcessor::text_values(&filtered, "Sub-Category").unwrap();
        assert!(subs
            .iter()
            .flatten()
            .all(|s| s == "Chairs" || s == "Tables"));
    }

    #[test]
    fn filter_with_no_match_is_empty_not_error() {
        let east_only = DataProcessor::filter_eq(&sales(), "Region", "East").unwrap();
        let west = DataProcessor::filter_eq(&east_only, "Region", "West").unwrap();
        assert_eq!(west.height(), 0);
        let none = DataProcessor::filter_in(&east_only, "Region", &["West"]).unwrap();
        assert_eq!(none.height(), 0);
    }

    #[test]
    fn missing_column_is_reported() {
        let err = DataProcessor::filter_in(&sales(), "Segment", &["Consumer"]).unwrap_err();
        assert!(matches!(err, TransformError::MissingColumn(c) if c == "Segment"));
    }

    #[test]
    fn bucket_by_period_adds_quarter_labels() {
        let bucketed =
            DataProcessor::bucket_by_period(&sales(), "Ship Date", Period::Quarter, "Quarter").unwrap();
        let quarters: Vec<String> = DataProcessor::text_values(&bucketed, "Quarter")
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(quarters, vec!["2016Q1", "2016Q1", "2016Q3", "2017Q4", "2016Q4"]);
    }

    #[test]
    fn bucket_by_period_is_idempotent() {
        let once =
            DataProcessor::bucket_by_period(&sales(), "Ship Date", Period::Quarter, "Quarter").unwrap();
        let twice =
            DataProcessor::bucket_by_period(&once, "Quarter", Period::Quarter, "Quarter").unwrap();
        assert_eq!(
            DataProcessor::text_values(&once, "Quarter").unwrap(),
            DataProcessor::text_values(&twice, "Quarter").unwrap()
        );
    }

    #[test]
    fn bucket_by_period_reports_bad_dates() {
        let df = DataFrame::new(vec![Column::new(
            "Ship Date".into(),
            vec!["2016-01-05", "someday"],
        )])
        .unwrap();
        let err = DataProcessor::bucket_by_period(&df, "Ship Date", Period::Quarter, "Quarter").unwrap_err();
        assert!(matches!(err, TransformError::InvalidDate { row: 1, .. }));
    }

    #[test]
    fn display_rows_render_nulls_as_blank() {
        let df = DataFrame::new(vec![
            Column::new("Region".into(), vec![Some("East"), None]),
            Column::new("Sales".into(), vec![Some(1.5), None]),
        ])
        .unwrap();
        let rows = DataProcessor::display_rows(&df);
        assert_eq!(rows, vec![vec!["East".to_string(), "1.5".to_string()], vec![String::new(), String::new()]]);
    }
}
