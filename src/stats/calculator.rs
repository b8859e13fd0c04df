//! Statistics Calculator Module
//! Handles Pearson correlation between indicator columns.

use crate::data::{ProcessorError, YearTable};
use rayon::prelude::*;
use statrs::statistics::Statistics;

/// Square matrix of Pearson coefficients, labelled by column.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    labels: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Coefficient at row `i`, column `j`.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(i).and_then(|row| row.get(j)).copied()
    }

    /// Smallest and largest finite coefficient, if any.
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .flatten()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Handles statistical calculations with multi-threading support.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Sample Pearson correlation coefficient.
    ///
    /// Returns NaN for mismatched lengths, fewer than two points or a
    /// constant series.
    pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
        if x.len() != y.len() || x.len() < 2 {
            return f64::NAN;
        }

        let sx = x.iter().std_dev();
        let sy = y.iter().std_dev();
        if sx == 0.0 || sy == 0.0 || sx.is_nan() || sy.is_nan() {
            return f64::NAN;
        }

        let r = x.iter().covariance(y.iter()) / (sx * sy);
        r.clamp(-1.0, 1.0)
    }

    /// Pairwise correlation of every numeric column of `table`.
    pub fn correlation_matrix(table: &YearTable) -> Result<CorrelationMatrix, ProcessorError> {
        let labels = table.numeric_columns();
        let columns = labels
            .iter()
            .map(|name| table.column_values(name))
            .collect::<Result<Vec<_>, _>>()?;

        // Use rayon for parallel computation
        let values: Vec<Vec<f64>> = (0..columns.len())
            .into_par_iter()
            .map(|i| {
                columns
                    .iter()
                    .map(|other| Self::pearson(&columns[i], other))
                    .collect()
            })
            .collect();

        Ok(CorrelationMatrix { labels, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataProcessor, FillStrategy, IndicatorTable};
    use polars::prelude::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_pearson_perfect() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        let neg: Vec<f64> = x.iter().map(|v| -v).collect();

        assert_close(StatsCalculator::pearson(&x, &x), 1.0);
        assert_close(StatsCalculator::pearson(&x, &y), 1.0);
        assert_close(StatsCalculator::pearson(&x, &neg), -1.0);
    }

    #[test]
    fn test_pearson_known_value() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 1.0, 4.0, 3.0, 5.0];
        assert_close(StatsCalculator::pearson(&x, &y), 0.8);
    }

    #[test]
    fn test_pearson_degenerate() {
        assert!(StatsCalculator::pearson(&[1.0], &[1.0]).is_nan());
        assert!(StatsCalculator::pearson(&[1.0, 2.0], &[1.0]).is_nan());
        assert!(StatsCalculator::pearson(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]).is_nan());
    }

    #[test]
    fn test_correlation_matrix_of_joined_table() {
        let a = df!(
            "Country Name" => ["Pakistan"],
            "2000" => [1.0], "2001" => [2.0], "2002" => [3.0], "2003" => [4.0]
        )
        .unwrap();
        let b = df!(
            "Country Name" => ["Pakistan"],
            "2000" => [8.0], "2001" => [6.0], "2002" => [4.0], "2003" => [2.0]
        )
        .unwrap();
        let a = IndicatorTable::from_dataframe("a", a).unwrap();
        let b = IndicatorTable::from_dataframe("b", b).unwrap();

        let joined = DataProcessor::join_country(
            &[("up", &a), ("down", &b)],
            "Pakistan",
            2000,
            2003,
            FillStrategy::default(),
        )
        .unwrap();
        let matrix = StatsCalculator::correlation_matrix(&joined).unwrap();

        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix.labels(), ["up".to_string(), "down".to_string()].as_slice());
        assert_close(matrix.get(0, 0).unwrap(), 1.0);
        assert_close(matrix.get(0, 1).unwrap(), -1.0);
        assert_close(matrix.get(1, 0).unwrap(), -1.0);
        assert_eq!(matrix.get(2, 0), None);

        let (lo, hi) = matrix.finite_range().unwrap();
        assert_close(lo, -1.0);
        assert_close(hi, 1.0);
    }
}
