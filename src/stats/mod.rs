//! Statistics module - Correlation analysis

mod calculator;

pub use calculator::{CorrelationMatrix, StatsCalculator};
