//! Data module - CSV loading, schemas and transforms

mod loader;
mod period;
mod processor;
pub mod schema;

pub use loader::{DataSource, Datasets};
pub use period::Period;
pub use processor::{DataProcessor, PivotTable, SortOrder, TransformError};
