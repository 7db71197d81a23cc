//! Table Schemas
//! Declared column names and types for the two input datasets.

use polars::prelude::*;

use super::loader::DataError;

/// Declared type of an input column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Number,
}

impl ColumnType {
    fn dtype(self) -> DataType {
        match self {
            ColumnType::Text => DataType::String,
            ColumnType::Number => DataType::Float64,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnType,
}

const fn text(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnType::Text,
    }
}

const fn number(name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        kind: ColumnType::Number,
    }
}

/// Columns a table must carry. Extra columns are kept untouched.
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    pub table: &'static str,
    pub columns: &'static [ColumnSpec],
}

pub mod sales {
    pub const REGION: &str = "Region";
    pub const SUB_CATEGORY: &str = "Sub-Category";
    pub const SHIP_DATE: &str = "Ship Date";
    pub const SALES: &str = "Sales";
    pub const PROFIT: &str = "Profit";
    pub const QUANTITY: &str = "Quantity";
}

pub mod rules {
    pub const ANTECEDENTS: &str = "antecedents";
    pub const CONSEQUENTS: &str = "consequents";
    pub const SUPPORT: &str = "support";
    pub const LIFT: &str = "lift";
}

pub const SALES_SCHEMA: TableSchema = TableSchema {
    table: "sales",
    columns: &[
        text(sales::REGION),
        text(sales::SUB_CATEGORY),
        text(sales::SHIP_DATE),
        number(sales::SALES),
        number(sales::PROFIT),
        number(sales::QUANTITY),
    ],
};

pub const RULES_SCHEMA: TableSchema = TableSchema {
    table: "association rules",
    columns: &[
        text(rules::ANTECEDENTS),
        text(rules::CONSEQUENTS),
        number(rules::SUPPORT),
        number(rules::LIFT),
    ],
};

impl TableSchema {
    /// Check that every declared column exists and cast it to its declared type.
    pub fn validate(&self, mut df: DataFrame) -> Result<DataFrame, DataError> {
        let present: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        for spec in self.columns {
            if !present.iter().any(|c| c == spec.name) {
                return Err(DataError::MissingColumn {
                    table: self.table,
                    column: spec.name,
                });
            }

            let column = df.column(spec.name)?;
            if column.dtype() != &spec.kind.dtype() {
                let cast = column.cast(&spec.kind.dtype())?;
                df.with_column(cast)?;
            }
        }

        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules_frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("antecedents".into(), vec!["Chairs", "Tables"]),
            Column::new("consequents".into(), vec!["Tables", "Chairs"]),
            Column::new("support".into(), vec![0.1f64, 0.2]),
            Column::new("lift".into(), vec![1i64, 2]),
            Column::new("confidence".into(), vec![0.5f64, 0.6]),
        ])
        .unwrap()
    }

    #[test]
    fn validate_casts_declared_numeric_columns() {
        let df = RULES_SCHEMA.validate(rules_frame()).unwrap();
        assert_eq!(df.column("lift").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.width(), 5);
    }

    #[test]
    fn validate_reports_missing_column() {
        let df = rules_frame().drop("support").unwrap();
        match RULES_SCHEMA.validate(df) {
            Err(DataError::MissingColumn { table, column }) => {
                assert_eq!(table, "association rules");
                assert_eq!(column, "support");
            }
            other => panic!("expected MissingColumn, got {:?}", other.err()),
        }
    }

    #[test]
    fn validate_keeps_column_order() {
        let df = RULES_SCHEMA.validate(rules_frame()).unwrap();
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            names,
            vec!["antecedents", "consequents", "support", "lift", "confidence"]
        );
    }
}
