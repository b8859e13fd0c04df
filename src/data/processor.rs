//! Data Processor Module
//! Handles wide-to-tidy reshaping, year window filtering and per-country joins.

use crate::data::loader::{IndicatorTable, LoaderError, Year};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Name of the year column of a tidy table.
pub const YEARS_COLUMN: &str = "Years";

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error("No countries requested")]
    NoCountries,
    #[error("No datasets to join")]
    NoDatasets,
    #[error("Country '{country}' not found in '{table}'")]
    MissingCountry { country: String, table: String },
    #[error("Country '{0}' requested more than once")]
    DuplicateCountry(String),
    #[error("Column '{0}' not found")]
    MissingColumn(String),
    #[error("No observations to fill '{column}' in {start}..={end}")]
    NoObservations {
        column: String,
        start: Year,
        end: Year,
    },
}

/// How missing values are filled after the year window is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStrategy {
    /// Each country column is filled with its own mean over the window
    ColumnMean,
    /// Each year row is filled with the mean of the other countries that year
    RowMean,
}

impl Default for FillStrategy {
    fn default() -> Self {
        FillStrategy::ColumnMean
    }
}

/// One row per year, one column per country, then the `Years` column.
#[derive(Debug, Clone)]
pub struct TidyTable {
    df: DataFrame,
    countries: Vec<String>,
}

impl TidyTable {
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Country columns in request order.
    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// The year axis, ascending.
    pub fn years(&self) -> Result<Vec<Year>, ProcessorError> {
        let years = self.df.column(YEARS_COLUMN)?.cast(&DataType::Int32)?;
        Ok(years.i32()?.into_iter().flatten().collect())
    }

    pub fn column_values(&self, name: &str) -> Result<Vec<f64>, ProcessorError> {
        f64_values(&self.df, name)
    }

    /// One value list per country column, in column order.
    pub fn value_lists(&self) -> Result<Vec<Vec<f64>>, ProcessorError> {
        self.countries
            .iter()
            .map(|country| self.column_values(country))
            .collect()
    }
}

/// Value columns with the years promoted to a separate row index.
#[derive(Debug, Clone)]
pub struct YearTable {
    index: Vec<Year>,
    df: DataFrame,
}

impl YearTable {
    pub fn index(&self) -> &[Year] {
        &self.index
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.index.len()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Get list of numeric column names.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.df
            .get_columns()
            .iter()
            .filter(|col| {
                matches!(
                    col.dtype(),
                    DataType::Float32
                        | DataType::Float64
                        | DataType::Int8
                        | DataType::Int16
                        | DataType::Int32
                        | DataType::Int64
                        | DataType::UInt8
                        | DataType::UInt16
                        | DataType::UInt32
                        | DataType::UInt64
                )
            })
            .map(|col| col.name().to_string())
            .collect()
    }

    pub fn column_values(&self, name: &str) -> Result<Vec<f64>, ProcessorError> {
        f64_values(&self.df, name)
    }
}

fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<f64>, ProcessorError> {
    let column = df
        .column(name)
        .map_err(|_| ProcessorError::MissingColumn(name.to_string()))?;
    let values = column.cast(&DataType::Float64)?;
    Ok(values
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Handles reshaping and joining of indicator tables.
pub struct DataProcessor;

impl DataProcessor {
    /// Reshape a wide indicator table into a tidy table for `countries`,
    /// restricted to years in `start..=end`.
    ///
    /// A `Years` entry in `countries` is accepted and ignored; the year column
    /// is always emitted last. An inverted or non-matching window yields an
    /// empty table rather than an error.
    pub fn refine(
        table: &IndicatorTable,
        countries: &[String],
        start: Year,
        end: Year,
        fill: FillStrategy,
    ) -> Result<TidyTable, ProcessorError> {
        let mut selected: Vec<String> = Vec::with_capacity(countries.len());
        for country in countries.iter().filter(|c| c.as_str() != YEARS_COLUMN) {
            if selected.contains(country) {
                return Err(ProcessorError::DuplicateCountry(country.clone()));
            }
            selected.push(country.clone());
        }
        if selected.is_empty() {
            return Err(ProcessorError::NoCountries);
        }

        let rows = selected
            .iter()
            .map(|country| {
                table
                    .country_row(country)
                    .ok_or_else(|| ProcessorError::MissingCountry {
                        country: country.clone(),
                        table: table.name().to_string(),
                    })
            })
            .collect::<Result<Vec<usize>, _>>()?;

        let window: Vec<(Year, String)> = table
            .year_columns()
            .into_iter()
            .filter(|(year, _)| (start..=end).contains(year))
            .collect();
        if window.is_empty() {
            warn!(
                table = table.name(),
                start, end, "year window selects no columns"
            );
        }

        let mut raw: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(window.len()); rows.len()];
        for (_, column) in &window {
            let values = table.year_values(column)?;
            for (slot, &row) in raw.iter_mut().zip(rows.iter()) {
                slot.push(values.get(row).copied().flatten());
            }
        }

        let filled = Self::fill_missing(&raw, &selected, start, end, fill)?;
        let years: Vec<Year> = window.iter().map(|(year, _)| *year).collect();

        let mut columns: Vec<Column> = selected
            .iter()
            .zip(filled)
            .map(|(country, values)| Column::new(country.as_str().into(), values))
            .collect();
        columns.push(Column::new(YEARS_COLUMN.into(), years));

        debug!(
            table = table.name(),
            countries = selected.len(),
            rows = window.len(),
            "refined indicator table"
        );
        Ok(TidyTable {
            df: DataFrame::new(columns)?,
            countries: selected,
        })
    }

    fn fill_missing(
        raw: &[Vec<Option<f64>>],
        names: &[String],
        start: Year,
        end: Year,
        fill: FillStrategy,
    ) -> Result<Vec<Vec<f64>>, ProcessorError> {
        let no_observations = |column: &str| ProcessorError::NoObservations {
            column: column.to_string(),
            start,
            end,
        };

        match fill {
            FillStrategy::ColumnMean => raw
                .iter()
                .zip(names)
                .map(|(values, name)| {
                    let present: Vec<f64> = values.iter().flatten().copied().collect();
                    if present.len() == values.len() {
                        return Ok(present);
                    }
                    if present.is_empty() {
                        return Err(no_observations(name));
                    }
                    let mean = present.iter().sum::<f64>() / present.len() as f64;
                    Ok(values.iter().map(|v| v.unwrap_or(mean)).collect())
                })
                .collect(),
            FillStrategy::RowMean => {
                let height = raw.first().map(|c| c.len()).unwrap_or(0);
                let mut out: Vec<Vec<f64>> = vec![Vec::with_capacity(height); raw.len()];
                for row in 0..height {
                    let present: Vec<f64> = raw.iter().filter_map(|c| c[row]).collect();
                    let mean = if present.is_empty() {
                        None
                    } else {
                        Some(present.iter().sum::<f64>() / present.len() as f64)
                    };
                    for ((target, values), name) in out.iter_mut().zip(raw).zip(names) {
                        let value = values[row]
                            .or(mean)
                            .ok_or_else(|| no_observations(name))?;
                        target.push(value);
                    }
                }
                Ok(out)
            }
        }
    }

    /// Join several indicator tables for one country, one column per dataset.
    ///
    /// Rows are the years present in every dataset. A dataset name repeated
    /// later in `sources` is dropped; distinct datasets with equal values are
    /// both kept. The years become the row index.
    pub fn join_country(
        sources: &[(&str, &IndicatorTable)],
        country: &str,
        start: Year,
        end: Year,
        fill: FillStrategy,
    ) -> Result<YearTable, ProcessorError> {
        let request = [country.to_string()];
        let mut joined: Vec<(String, BTreeMap<Year, f64>)> = Vec::with_capacity(sources.len());

        for (name, table) in sources {
            if joined.iter().any(|(existing, _)| existing == name) {
                warn!(dataset = *name, "dropping duplicate column");
                continue;
            }
            let tidy = Self::refine(table, &request, start, end, fill)?;
            let by_year: BTreeMap<Year, f64> = tidy
                .years()?
                .into_iter()
                .zip(tidy.column_values(country)?)
                .collect();
            joined.push((name.to_string(), by_year));
        }

        let Some((_, first)) = joined.first() else {
            return Err(ProcessorError::NoDatasets);
        };
        let index: Vec<Year> = first
            .keys()
            .copied()
            .filter(|year| joined.iter().all(|(_, values)| values.contains_key(year)))
            .collect();

        let columns: Vec<Column> = joined
            .iter()
            .map(|(name, values)| {
                if values.len() != index.len() {
                    debug!(
                        dataset = name.as_str(),
                        dropped = values.len() - index.len(),
                        "years outside the shared index"
                    );
                }
                let aligned: Vec<f64> = index
                    .iter()
                    .filter_map(|year| values.get(year).copied())
                    .collect();
                Column::new(name.as_str().into(), aligned)
            })
            .collect();

        debug!(
            country,
            datasets = columns.len(),
            rows = index.len(),
            "joined country table"
        );
        Ok(YearTable {
            index,
            df: DataFrame::new(columns)?,
        })
    }

    /// Keep the rows whose year is in `years` and promote the years to the index.
    pub fn select_years(tidy: &TidyTable, years: &[Year]) -> Result<YearTable, ProcessorError> {
        let all_years = tidy.years()?;
        let mask: BooleanChunked = all_years.iter().map(|y| years.contains(y)).collect();
        let index: Vec<Year> = all_years
            .into_iter()
            .filter(|y| years.contains(y))
            .collect();

        let df = tidy.dataframe().filter(&mask)?.drop(YEARS_COLUMN)?;
        Ok(YearTable { index, df })
    }
}
