//! Indicator Trends - World Bank indicator reshaping & chart generation
//!
//! Loads wide indicator tables (one row per country, one column per year),
//! reshapes them into tidy per-year tables, joins indicators per country and
//! renders line, bar, scatter and correlation heatmap images.

pub mod charts;
pub mod cli;
pub mod config;
pub mod data;
pub mod report;
pub mod stats;
