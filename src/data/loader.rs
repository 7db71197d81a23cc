//! CSV Data Loader Module
//! Fetches the sales and association-rule tables and checks them against
//! their schemas.

use polars::prelude::*;
use std::fmt;
use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use super::schema::{TableSchema, RULES_SCHEMA, SALES_SCHEMA};
use crate::config::DataConfig;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Data unavailable from {origin}: {reason}")]
    DataUnavailable { origin: String, reason: String },
    #[error("Column '{column}' missing from {table} table")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
    #[error("Invalid table data: {0}")]
    Polars(#[from] PolarsError),
}

/// Where a CSV table comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Url(String),
    File(PathBuf),
}

impl DataSource {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            DataSource::Url(raw.to_string())
        } else {
            DataSource::File(PathBuf::from(raw))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Url(url) => write!(f, "{}", url),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Both input tables, validated.
#[derive(Debug, Clone)]
pub struct Datasets {
    pub sales: DataFrame,
    pub rules: DataFrame,
}

impl Datasets {
    /// Load and validate both tables from the configured sources.
    pub fn load(config: &DataConfig) -> Result<Self, DataError> {
        let loader = DataLoader::new(Duration::from_secs(config.timeout_secs));
        let sales = loader.load(&config.sales(), &SALES_SCHEMA)?;
        let rules = loader.load(&config.rules(), &RULES_SCHEMA)?;
        Ok(Self { sales, rules })
    }
}

/// Handles CSV loading with Polars; remote sources go through a blocking HTTP agent.
pub struct DataLoader {
    agent: ureq::Agent,
}

impl DataLoader {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    /// Load a table and validate it against `schema`.
    pub fn load(&self, source: &DataSource, schema: &TableSchema) -> Result<DataFrame, DataError> {
        let df = match source {
            DataSource::Url(url) => {
                let bytes = self.fetch(url)?;
                Self::parse_csv(bytes).map_err(|e| unavailable(source, e))?
            }
            DataSource::File(path) => {
                let path_str = path.to_string_lossy().to_string();
                LazyCsvReader::new(&path_str)
                    .with_infer_schema_length(Some(10000))
                    .with_ignore_errors(true)
                    .finish()
                    .and_then(|lazy| lazy.collect())
                    .map_err(|e| unavailable(source, e))?
            }
        };

        tracing::info!(
            table = schema.table,
            source = %source,
            rows = df.height(),
            columns = df.width(),
            "loaded table"
        );

        schema.validate(df)
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, DataError> {
        let origin = || DataSource::Url(url.to_string());

        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                return Err(unavailable(&origin(), format!("HTTP error {code}")));
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(unavailable(&origin(), transport));
            }
        };

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| unavailable(&origin(), e))?;
        tracing::debug!(url, bytes = bytes.len(), "fetched remote table");
        Ok(bytes)
    }

    /// Parse CSV bytes with a header row.
    pub fn parse_csv(bytes: Vec<u8>) -> PolarsResult<DataFrame> {
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()
    }
}

fn unavailable(source: &DataSource, reason: impl fmt::Display) -> DataError {
    DataError::DataUnavailable {
        origin: source.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    const SALES_CSV: &str = "Order ID,Ship Date,Region,Sub-Category,Sales,Quantity,Profit\n\
        CA-1,11/11/2016,East,Chairs,100.0,2,10.5\n\
        CA-2,06/16/2016,West,Tables,50.5,1,-4.0\n";

    fn loader() -> DataLoader {
        DataLoader::new(Duration::from_secs(5))
    }

    /// Answer a single HTTP request with `status` and `body`, returning the URL to call.
    fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            stream.flush().unwrap();
        });
        format!("http://{addr}/table.csv")
    }

    #[test]
    fn source_parse_distinguishes_urls_and_paths() {
        assert_eq!(
            DataSource::parse("https://example.com/a.csv"),
            DataSource::Url("https://example.com/a.csv".into())
        );
        assert_eq!(
            DataSource::parse(" data/sales.csv "),
            DataSource::File(PathBuf::from("data/sales.csv"))
        );
    }

    #[test]
    fn parse_csv_reads_header_and_rows() {
        let df = DataLoader::parse_csv(SALES_CSV.as_bytes().to_vec()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 7);
    }

    #[test]
    fn load_file_validates_schema() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SALES_CSV.as_bytes()).unwrap();

        let loader = loader();
        let source = DataSource::File(file.path().to_path_buf());
        let df = loader.load(&source, &SALES_SCHEMA).unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.column("Quantity").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("Ship Date").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn load_file_against_wrong_schema_is_missing_column() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SALES_CSV.as_bytes()).unwrap();

        let loader = loader();
        let source = DataSource::File(file.path().to_path_buf());
        let err = loader.load(&source, &RULES_SCHEMA).unwrap_err();
        assert!(matches!(
            err,
            DataError::MissingColumn {
                column: "antecedents",
                ..
            }
        ));
    }

    #[test]
    fn missing_file_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader();
        let source = DataSource::File(dir.path().join("absent.csv"));
        let err = loader.load(&source, &SALES_SCHEMA).unwrap_err();
        assert!(matches!(err, DataError::DataUnavailable { .. }));
    }

    #[test]
    fn refused_connection_is_data_unavailable() {
        let source = DataSource::Url("http://127.0.0.1:1/x.csv".to_string());
        let err = loader().load(&source, &SALES_SCHEMA).unwrap_err();
        match err {
            DataError::DataUnavailable { origin, .. } => {
                assert_eq!(origin, "http://127.0.0.1:1/x.csv")
            }
            other => panic!("expected DataUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn http_error_status_is_data_unavailable() {
        let url = serve_once("404 Not Found", "missing");
        let err = loader().load(&DataSource::Url(url), &SALES_SCHEMA).unwrap_err();
        match err {
            DataError::DataUnavailable { reason, .. } => assert_eq!(reason, "HTTP error 404"),
            other => panic!("expected DataUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn http_csv_body_loads_and_validates() {
        let url = serve_once("200 OK", SALES_CSV);
        let df = loader().load(&DataSource::Url(url), &SALES_SCHEMA).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("Sales").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("Region").unwrap().dtype(), &DataType::String);
    }
}
