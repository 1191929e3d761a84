use crate::utils::to_f64_values;
use anyhow::{Result, anyhow};
use polars::prelude::*;
use tracing::debug;

/// K-nearest-neighbors imputer over a small dense feature matrix.
///
/// Distances are NaN-aware Euclidean: coordinates missing in either row are
/// skipped and the squared sum is scaled by `n_features / n_present`. A
/// missing entry is replaced by the plain mean of the target values of its
/// `k` closest donors, where a donor is any other row whose target is present.
pub struct KNNImputer {
    n_neighbors: usize,
}

impl KNNImputer {
    /// Create a new KNN imputer with specified number of neighbors
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1), // Ensure at least 1 neighbor
        }
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    /// Fill the missing entries of column `target_col` of `matrix`.
    ///
    /// `matrix` is row-major; every row must have the same width. Present
    /// target values are returned unchanged. When a row has no donor at a
    /// finite distance its value falls back to the mean of the present target
    /// values, or `0.0` when the column is entirely missing.
    pub fn impute_column(&self, matrix: &[Vec<Option<f64>>], target_col: usize) -> Vec<f64> {
        let column_mean = {
            let present: Vec<f64> = matrix.iter().filter_map(|row| row[target_col]).collect();
            if present.is_empty() {
                0.0
            } else {
                present.iter().sum::<f64>() / present.len() as f64
            }
        };

        matrix
            .iter()
            .enumerate()
            .map(|(row_idx, row)| match row[target_col] {
                Some(value) => value,
                None => self
                    .impute_value(matrix, row_idx, target_col)
                    .unwrap_or(column_mean),
            })
            .collect()
    }

    /// Impute the `target` column of `df` from `features` (which may include
    /// `target` itself). Returns the filled column as Float64.
    pub fn fit_transform(&self, df: &DataFrame, features: &[String], target: &str) -> Result<Series> {
        let mut columns: Vec<String> = features.to_vec();
        if !columns.iter().any(|c| c == target) {
            columns.push(target.to_string());
        }

        let target_col = columns
            .iter()
            .position(|c| c == target)
            .ok_or_else(|| anyhow!("Column not found"))?;

        let matrix = self.create_data_matrix(df, &columns)?;
        let missing = matrix.iter().filter(|row| row[target_col].is_none()).count();
        debug!(
            "KNN imputing {} values in '{}' using {} features",
            missing,
            target,
            columns.len()
        );

        let filled = self.impute_column(&matrix, target_col);
        Ok(Series::new(target.into(), filled))
    }

    /// Create a data matrix from the dataframe for distance calculations
    fn create_data_matrix(&self, df: &DataFrame, columns: &[String]) -> Result<Vec<Vec<Option<f64>>>> {
        let n_rows = df.height();
        let n_cols = columns.len();
        let mut matrix = vec![vec![None; n_cols]; n_rows];

        for (col_idx, col_name) in columns.iter().enumerate() {
            let series = df.column(col_name)?.as_materialized_series();
            let values = to_f64_values(series)?;

            for (row, value) in matrix.iter_mut().zip(values) {
                row[col_idx] = value;
            }
        }

        Ok(matrix)
    }

    /// Mean target value of the nearest donors of `target_row`, `None` when
    /// no donor shares a present feature with it.
    fn impute_value(
        &self,
        matrix: &[Vec<Option<f64>>],
        target_row: usize,
        target_col: usize,
    ) -> Option<f64> {
        let mut distances: Vec<(usize, f64)> = matrix
            .iter()
            .enumerate()
            .filter(|(row_idx, row)| *row_idx != target_row && row[target_col].is_some())
            .map(|(row_idx, row)| (row_idx, self.calculate_distance(&matrix[target_row], row)))
            .filter(|(_, distance)| distance.is_finite())
            .collect();

        if distances.is_empty() {
            return None;
        }

        // stable: equal distances keep row order
        distances.sort_by(|a, b| a.1.total_cmp(&b.1));

        let k = self.n_neighbors.min(distances.len());
        let sum: f64 = distances
            .iter()
            .take(k)
            .filter_map(|(idx, _)| matrix[*idx][target_col])
            .sum();

        Some(sum / k as f64)
    }

    /// NaN-aware Euclidean distance between two rows.
    fn calculate_distance(&self, row1: &[Option<f64>], row2: &[Option<f64>]) -> f64 {
        let n_cols = row1.len();
        let mut sum_squared_diff = 0.0;
        let mut present = 0;

        for (a, b) in row1.iter().zip(row2) {
            if let (Some(val1), Some(val2)) = (a, b) {
                let diff = val1 - val2;
                sum_squared_diff += diff * diff;
                present += 1;
            }
        }

        if present > 0 {
            (sum_squared_diff * n_cols as f64 / present as f64).sqrt()
        } else {
            f64::INFINITY // No common non-null features
        }
    }
}
