//! Indicator CSV Loader Module
//! Handles loading World Bank style indicator files using Polars.

use polars::prelude::*;
use rayon::prelude::*;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Calendar year as found in the header of a wide indicator table.
pub type Year = i32;

/// Metadata columns of a wide indicator table.
pub const COUNTRY_NAME: &str = "Country Name";
pub const COUNTRY_CODE: &str = "Country Code";
pub const INDICATOR_NAME: &str = "Indicator Name";
pub const INDICATOR_CODE: &str = "Indicator Code";

/// Number of preamble lines before the header in World Bank exports.
pub const DEFAULT_SKIP_ROWS: usize = 4;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Indicator table '{table}' has no '{column}' column")]
    MissingColumn { table: String, column: String },
    #[error("Indicator table '{table}' has non-numeric value '{value}' in column '{column}'")]
    InvalidValue {
        table: String,
        column: String,
        value: String,
    },
}

/// A wide indicator table: one row per country, one column per year.
#[derive(Debug, Clone)]
pub struct IndicatorTable {
    name: String,
    df: DataFrame,
}

impl IndicatorTable {
    /// Wrap a frame, checking that it carries the country name column.
    pub fn from_dataframe(name: impl Into<String>, df: DataFrame) -> Result<Self, LoaderError> {
        let name = name.into();
        if df.column(COUNTRY_NAME).is_err() {
            return Err(LoaderError::MissingColumn {
                table: name,
                column: COUNTRY_NAME.to_string(),
            });
        }
        Ok(Self { name, df })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Country names in file order (nulls skipped).
    pub fn countries(&self) -> Vec<String> {
        self.string_values(COUNTRY_NAME)
            .into_iter()
            .flatten()
            .collect()
    }

    /// The indicator description carried by the first row, if any.
    pub fn indicator_name(&self) -> Option<String> {
        self.string_values(INDICATOR_NAME).into_iter().flatten().next()
    }

    /// Year columns as `(year, column name)`, ascending by year.
    ///
    /// Only headers made of exactly four ASCII digits count as years; the
    /// metadata columns and any trailing unnamed column are ignored.
    pub fn year_columns(&self) -> Vec<(Year, String)> {
        let mut years: Vec<(Year, String)> = self
            .df
            .get_column_names()
            .iter()
            .filter_map(|name| parse_year(name.as_str()).map(|y| (y, name.to_string())))
            .collect();
        years.sort_by_key(|(year, _)| *year);
        years
    }

    /// Row index of the first row whose country name equals `country`.
    pub fn country_row(&self, country: &str) -> Option<usize> {
        self.string_values(COUNTRY_NAME)
            .iter()
            .position(|name| name.as_deref() == Some(country))
    }

    /// Numeric values of a year column, one entry per row.
    ///
    /// Empty cells are missing values; any other cell that is not a number
    /// is an error.
    pub fn year_values(&self, column: &str) -> Result<Vec<Option<f64>>, LoaderError> {
        let col = self.df.column(column)?;
        if col.dtype() == &DataType::String {
            return col
                .as_materialized_series()
                .str()?
                .into_iter()
                .map(|cell| self.parse_cell(column, cell))
                .collect();
        }

        let values = col.strict_cast(&DataType::Float64)?;
        let ca = values.f64()?;
        Ok(ca.into_iter().map(|v| v.filter(|x| !x.is_nan())).collect())
    }

    fn parse_cell(&self, column: &str, cell: Option<&str>) -> Result<Option<f64>, LoaderError> {
        match cell.map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => text
                .parse::<f64>()
                .map(|v| Some(v).filter(|x| !x.is_nan()))
                .map_err(|_| LoaderError::InvalidValue {
                    table: self.name.clone(),
                    column: column.to_string(),
                    value: text.to_string(),
                }),
        }
    }

    /// Check that every year column holds only numbers or empty cells.
    pub fn validate_year_columns(&self) -> Result<(), LoaderError> {
        for (_, column) in self.year_columns() {
            self.year_values(&column)?;
        }
        Ok(())
    }

    fn string_values(&self, column: &str) -> Vec<Option<String>> {
        self.df
            .column(column)
            .ok()
            .and_then(|col| col.cast(&DataType::String).ok())
            .map(|col| {
                let series = col.as_materialized_series();
                series
                    .str()
                    .map(|ca| {
                        ca.into_iter()
                            .map(|v| v.map(|s| s.trim().to_string()))
                            .collect()
                    })
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }
}

/// Parse a column header as a four digit year.
pub fn parse_year(header: &str) -> Option<Year> {
    let header = header.trim();
    if header.len() == 4 && header.bytes().all(|b| b.is_ascii_digit()) {
        header.parse().ok()
    } else {
        None
    }
}

/// Loads indicator CSV files with Polars.
#[derive(Debug, Clone)]
pub struct IndicatorLoader {
    skip_rows: usize,
}

impl Default for IndicatorLoader {
    fn default() -> Self {
        Self::new(DEFAULT_SKIP_ROWS)
    }
}

impl IndicatorLoader {
    pub fn new(skip_rows: usize) -> Self {
        Self { skip_rows }
    }

    /// Load one indicator file, skipping the preamble lines before the header.
    pub fn load_csv(&self, name: &str, path: &Path) -> Result<IndicatorTable, LoaderError> {
        let raw = std::fs::read(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let body = strip_preamble(&raw, self.skip_rows);

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .into_reader_with_file_handle(Cursor::new(body))
            .finish()?;

        info!(
            dataset = name,
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            "loaded indicator table"
        );
        let table = IndicatorTable::from_dataframe(name, df)?;
        table.validate_year_columns()?;
        Ok(table)
    }

    /// Load several named files in parallel. Fails on the first error.
    pub fn load_all(
        &self,
        sources: &[(String, PathBuf)],
    ) -> Result<HashMap<String, IndicatorTable>, LoaderError> {
        debug!(count = sources.len(), "loading indicator tables");
        sources
            .par_iter()
            .map(|(name, path)| {
                self.load_csv(name, path)
                    .map(|table| (name.clone(), table))
            })
            .collect()
    }
}

/// Drop the first `skip` lines (and a leading byte order mark).
fn strip_preamble(raw: &[u8], skip: usize) -> Vec<u8> {
    let raw = raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw);
    let mut start = 0;
    for _ in 0..skip {
        match raw[start..].iter().position(|&b| b == b'\n') {
            Some(pos) => start += pos + 1,
            None => {
                start = raw.len();
                break;
            }
        }
    }
    raw[start..].to_vec()
}
