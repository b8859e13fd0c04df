//! Data module - Indicator loading and reshaping

mod loader;
mod processor;

pub use loader::{
    parse_year, IndicatorLoader, IndicatorTable, LoaderError, Year, COUNTRY_CODE, COUNTRY_NAME,
    DEFAULT_SKIP_ROWS, INDICATOR_CODE, INDICATOR_NAME,
};
pub use processor::{
    DataProcessor, FillStrategy, ProcessorError, TidyTable, YearTable, YEARS_COLUMN,
};
